// tests/common/app_helper.rs

use axum::Router;
use clinic_backend::{
    api::{create_app, AppState},
    config::AppConfig,
    db::connect_options,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;

use crate::common;

/// テスト用アプリ（ルーターとサービスへの直接アクセス）
#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// インメモリSQLiteにマイグレーションを流してアプリを組み立てる
pub async fn setup_app() -> TestApp {
    common::init_test_env();

    let config = AppConfig::for_testing();
    let db = Database::connect(connect_options(&config.database_url))
        .await
        .expect("failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");

    let state = AppState::build(db, &config).expect("failed to build app state");
    let router = create_app(state.clone());

    TestApp { router, state }
}
