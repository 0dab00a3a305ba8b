// migration/src/lib.rs
pub use sea_orm_migration::prelude::*;

// 認証関連マイグレーション
mod m20250801_000001_create_users_table;
mod m20250801_000002_create_admins_table;
mod m20250801_000003_create_refresh_tokens_table;
mod m20250801_000004_create_otps_table;

// 診療関連マイグレーション
mod m20250801_000005_create_personnels_table;
mod m20250801_000006_create_appointments_table;
mod m20250801_000007_create_blocked_time_slots_table;
mod m20250801_000008_create_medical_records_table;

// 会計・在庫関連マイグレーション
mod m20250801_000009_create_inventory_items_table;
mod m20250801_000010_create_billings_table;
mod m20250801_000011_create_billing_items_table;
mod m20250801_000012_create_inventory_transactions_table;

// 通知
mod m20250801_000013_create_notifications_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            // 1. アカウント（依存関係なし）
            Box::new(m20250801_000001_create_users_table::Migration),
            Box::new(m20250801_000002_create_admins_table::Migration),
            Box::new(m20250801_000003_create_refresh_tokens_table::Migration),
            Box::new(m20250801_000004_create_otps_table::Migration),
            // 2. 職員・予約（usersテーブルに依存）
            Box::new(m20250801_000005_create_personnels_table::Migration),
            Box::new(m20250801_000006_create_appointments_table::Migration),
            Box::new(m20250801_000007_create_blocked_time_slots_table::Migration),
            Box::new(m20250801_000008_create_medical_records_table::Migration),
            // 3. 在庫と請求（外部キーの順序に注意）
            Box::new(m20250801_000009_create_inventory_items_table::Migration),
            Box::new(m20250801_000010_create_billings_table::Migration),
            Box::new(m20250801_000011_create_billing_items_table::Migration),
            Box::new(m20250801_000012_create_inventory_transactions_table::Migration),
            // 4. 通知
            Box::new(m20250801_000013_create_notifications_table::Migration),
        ]
    }
}
