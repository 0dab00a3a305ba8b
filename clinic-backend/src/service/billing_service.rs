// src/service/billing_service.rs

//! 請求と在庫の突き合わせ
//!
//! 作成・明細変更・削除はすべて一つのトランザクションで在庫数と台帳を動かす。
//! 品目の行ロックは ID 順に取る。

use crate::api::dto::billing_dto::*;
use crate::db::DbPool;
use crate::domain::account::{AuthClaims, Role};
use crate::domain::billing_item_model::{self, ActiveModel as BillingItemActiveModel};
use crate::domain::billing_model::{compute_totals, ActiveModel as BillingActiveModel, BillingTotals};
use crate::domain::inventory_item_model;
use crate::domain::inventory_transaction_model::InventoryTransactionType;
use crate::domain::notification_model::NotificationCategory;
use crate::error::{AppError, AppResult};
use crate::repository::billing_repository::{BillingFilter, BillingRepository};
use crate::repository::medical_record_repository::MedicalRecordRepository;
use crate::repository::user_repository::UserRepository;
use crate::service::inventory_service::{InventoryService, StockMovement};
use crate::service::notification_service::NotificationService;
use crate::types::PaginatedResponse;
use crate::utils::error_helper::{forbidden_error, not_found_error};
use crate::utils::transaction::TransactionManager;
use chrono::Utc;
use sea_orm::{ActiveModelBehavior, ConnectionTrait, IntoActiveModel, Set};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct BillingService {
    db: DbPool,
    billing_repo: Arc<BillingRepository>,
    record_repo: Arc<MedicalRecordRepository>,
    user_repo: Arc<UserRepository>,
}

/// 品目ごとの数量に加算する。i32 を超える合計は 400
fn accumulate(quantities: &mut BTreeMap<Uuid, i32>, item_id: Uuid, quantity: i32) -> AppResult<()> {
    let entry = quantities.entry(item_id).or_insert(0);
    *entry = entry
        .checked_add(quantity)
        .ok_or_else(|| AppError::BadRequest("Billing quantity is too large".to_string()))?;
    Ok(())
}

/// 品目ごとの数量合計（ID 順）
fn quantities_by_item(items: &[BillingItemInput]) -> AppResult<BTreeMap<Uuid, i32>> {
    let mut quantities = BTreeMap::new();
    for item in items {
        accumulate(&mut quantities, item.inventory_item_id, item.quantity)?;
    }
    Ok(quantities)
}

fn totals_or_bad_request(
    lines: &[(i32, i64)],
    doctor_fee: i64,
    discount: i64,
) -> AppResult<BillingTotals> {
    compute_totals(lines, doctor_fee, discount).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// 明細を作り直す（品名と単価はロック済み品目のスナップショット）
async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    billing_id: Uuid,
    inputs: &[BillingItemInput],
    locked: &HashMap<Uuid, inventory_item_model::Model>,
) -> AppResult<Vec<billing_item_model::Model>> {
    let mut items = Vec::with_capacity(inputs.len());
    for input in inputs {
        let item = locked.get(&input.inventory_item_id).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Inventory item {} does not exist",
                input.inventory_item_id
            ))
        })?;
        let line_total = i64::from(input.quantity)
            .checked_mul(item.unit_price)
            .ok_or_else(|| AppError::BadRequest("billing amount is too large".to_string()))?;

        let created = BillingRepository::insert_item(
            conn,
            BillingItemActiveModel {
                billing_id: Set(billing_id),
                inventory_item_id: Set(item.id),
                item_name: Set(item.name.clone()),
                quantity: Set(input.quantity),
                unit_price: Set(item.unit_price),
                line_total: Set(line_total),
                ..BillingItemActiveModel::new()
            },
        )
        .await?;
        items.push(created);
    }
    Ok(items)
}

/// 品目ごとの差分を在庫に反映する（正なら入庫、負なら出庫）
async fn apply_net_deltas<C: ConnectionTrait>(
    conn: &C,
    deltas: BTreeMap<Uuid, i32>,
    locked: &mut HashMap<Uuid, inventory_item_model::Model>,
    billing_id: Uuid,
    note: String,
    performed_by: Uuid,
) -> AppResult<()> {
    for (item_id, delta) in deltas {
        if delta == 0 {
            continue;
        }
        let item = match locked.remove(&item_id) {
            Some(item) => item,
            None => InventoryService::lock_item(conn, item_id).await?,
        };
        let transaction_type = if delta > 0 {
            InventoryTransactionType::StockIn
        } else {
            InventoryTransactionType::StockOut
        };
        let (updated, _) = InventoryService::apply_movement(
            conn,
            item,
            StockMovement {
                transaction_type,
                delta,
                reference_billing_id: Some(billing_id),
                note: Some(note.clone()),
                performed_by: Some(performed_by),
            },
        )
        .await?;
        locked.insert(item_id, updated);
    }
    Ok(())
}

/// 請求に使う品目をロックして読む。新たに追加する品目は有効であること
async fn lock_items<C: ConnectionTrait>(
    conn: &C,
    item_ids: impl IntoIterator<Item = Uuid>,
    must_be_active: &BTreeMap<Uuid, i32>,
) -> AppResult<HashMap<Uuid, inventory_item_model::Model>> {
    let mut locked = HashMap::new();
    for item_id in item_ids {
        let item = InventoryService::lock_item(conn, item_id).await?;
        if !item.is_active && must_be_active.contains_key(&item_id) {
            return Err(AppError::BadRequest(format!(
                "Inventory item {} is inactive",
                item.name
            )));
        }
        locked.insert(item_id, item);
    }
    Ok(locked)
}

impl BillingService {
    pub fn new(db: DbPool) -> Self {
        Self {
            billing_repo: Arc::new(BillingRepository::new(db.clone())),
            record_repo: Arc::new(MedicalRecordRepository::new(db.clone())),
            user_repo: Arc::new(UserRepository::new(db.clone())),
            db,
        }
    }

    pub async fn list(
        &self,
        claims: &AuthClaims,
        query: BillingListQuery,
    ) -> AppResult<PaginatedResponse<BillingResponse>> {
        let (page, per_page) = query.pagination.get_pagination();
        let filter = BillingFilter {
            patient_id: if claims.is_clinic_staff() {
                query.patient_id
            } else {
                Some(claims.account_id)
            },
            medical_record_id: query.medical_record_id,
            payment_status: query.payment_status,
        };

        let (billings, total) = self
            .billing_repo
            .find_paginated(&filter, query.pagination.get_offset(), query.pagination.limit())
            .await?;

        let mut responses = Vec::with_capacity(billings.len());
        for billing in billings {
            let items = BillingRepository::find_items(&self.db, billing.id).await?;
            responses.push(BillingResponse::new(billing, items));
        }

        Ok(PaginatedResponse::new(responses, page, per_page, total as i64))
    }

    pub async fn get(&self, claims: &AuthClaims, id: Uuid) -> AppResult<BillingResponse> {
        let billing = self
            .billing_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Billing", id, "billing_service::get"))?;

        if !claims.is_clinic_staff() && !claims.is_self(billing.patient_id) {
            return Err(forbidden_error(
                "You can only access your own billings",
                "billing_service::get",
                claims,
            ));
        }

        let items = BillingRepository::find_items(&self.db, billing.id).await?;
        Ok(BillingResponse::new(billing, items))
    }

    /// 請求の作成。明細の数量だけ在庫を引き当て、足りなければ全体を取り消す
    pub async fn create(
        &self,
        claims: &AuthClaims,
        request: CreateBillingRequest,
    ) -> AppResult<BillingResponse> {
        self.ensure_patient(request.patient_id).await?;
        if let Some(record_id) = request.medical_record_id {
            self.ensure_record_of(record_id, request.patient_id).await?;
        }

        let performed_by = claims.account_id;
        let (billing, items) = self
            .db
            .execute_in_transaction(move |txn| {
                Box::pin(async move {
                    let requested = quantities_by_item(&request.items)?;
                    let mut locked = lock_items(txn, requested.keys().copied(), &requested).await?;

                    let lines: Vec<(i32, i64)> = request
                        .items
                        .iter()
                        .map(|input| {
                            let unit_price = locked
                                .get(&input.inventory_item_id)
                                .map_or(0, |item| item.unit_price);
                            (input.quantity, unit_price)
                        })
                        .collect();
                    let totals =
                        totals_or_bad_request(&lines, request.doctor_fee, request.discount)?;

                    let number = BillingRepository::next_number(txn).await?;
                    let billing = BillingRepository::insert(
                        txn,
                        BillingActiveModel {
                            billing_number: Set(number),
                            medical_record_id: Set(request.medical_record_id),
                            patient_id: Set(request.patient_id),
                            doctor_fee: Set(totals.doctor_fee),
                            discount: Set(totals.discount),
                            subtotal: Set(totals.subtotal),
                            total_amount: Set(totals.total_amount),
                            notes: Set(request.notes),
                            ..BillingActiveModel::new()
                        },
                    )
                    .await?;

                    let items = insert_items(txn, billing.id, &request.items, &locked).await?;

                    let deltas = requested.into_iter().map(|(id, q)| (id, -q)).collect();
                    apply_net_deltas(
                        txn,
                        deltas,
                        &mut locked,
                        billing.id,
                        format!("Billing #{}", number),
                        performed_by,
                    )
                    .await?;

                    NotificationService::notify_patient(
                        txn,
                        billing.patient_id,
                        NotificationCategory::Billing,
                        "New billing issued",
                        format!(
                            "Billing #{} has been issued. Total amount: {}.",
                            billing.billing_number, billing.total_amount
                        ),
                    )
                    .await?;

                    Ok((billing, items))
                })
            })
            .await?;

        info!(
            billing_id = %billing.id,
            billing_number = billing.billing_number,
            patient_id = %billing.patient_id,
            total_amount = billing.total_amount,
            item_count = items.len(),
            "Billing created"
        );

        Ok(BillingResponse::new(billing, items))
    }

    /// 金額・明細の変更
    ///
    /// 明細を差し替える場合は旧数量を戻して新数量を引く（品目ごとの差分だけ動かす）。
    /// 支払い済みの請求は変更できない。
    pub async fn update(
        &self,
        claims: &AuthClaims,
        id: Uuid,
        request: UpdateBillingRequest,
    ) -> AppResult<BillingResponse> {
        let existing = self
            .billing_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Billing", id, "billing_service::update"))?;
        if let Some(record_id) = request.medical_record_id {
            self.ensure_record_of(record_id, existing.patient_id).await?;
        }

        let performed_by = claims.account_id;
        let (billing, items) = self
            .db
            .execute_in_transaction(move |txn| {
                Box::pin(async move {
                    let billing = BillingRepository::find_by_id_in(txn, id)
                        .await?
                        .ok_or_else(|| {
                            not_found_error("Billing", id, "billing_service::update")
                        })?;
                    if billing.payment_status().is_paid() {
                        return Err(AppError::BadRequest(
                            "A paid billing cannot be modified".to_string(),
                        ));
                    }

                    let current_items = BillingRepository::find_items(txn, id).await?;
                    let doctor_fee = request.doctor_fee.unwrap_or(billing.doctor_fee);
                    let discount = request.discount.unwrap_or(billing.discount);

                    let (lines, items) = match request.items {
                        Some(new_inputs) => {
                            let mut previous: BTreeMap<Uuid, i32> = BTreeMap::new();
                            for item in &current_items {
                                accumulate(&mut previous, item.inventory_item_id, item.quantity)?;
                            }
                            let requested = quantities_by_item(&new_inputs)?;

                            // 新たに加わる品目だけ有効チェックの対象
                            let added: BTreeMap<Uuid, i32> = requested
                                .iter()
                                .filter(|(item_id, _)| !previous.contains_key(item_id))
                                .map(|(item_id, q)| (*item_id, *q))
                                .collect();

                            let mut deltas: BTreeMap<Uuid, i32> = BTreeMap::new();
                            for (item_id, quantity) in &previous {
                                accumulate(&mut deltas, *item_id, *quantity)?;
                            }
                            for (item_id, quantity) in &requested {
                                accumulate(&mut deltas, *item_id, -quantity)?;
                            }

                            let mut locked = lock_items(txn, deltas.keys().copied(), &added).await?;

                            let lines: Vec<(i32, i64)> = new_inputs
                                .iter()
                                .map(|input| {
                                    let unit_price = locked
                                        .get(&input.inventory_item_id)
                                        .map_or(0, |item| item.unit_price);
                                    (input.quantity, unit_price)
                                })
                                .collect();
                            // 在庫を動かす前に金額を検証する
                            totals_or_bad_request(&lines, doctor_fee, discount)?;

                            BillingRepository::delete_items(txn, id).await?;
                            let items = insert_items(txn, id, &new_inputs, &locked).await?;
                            apply_net_deltas(
                                txn,
                                deltas,
                                &mut locked,
                                id,
                                format!("Billing #{} updated", billing.billing_number),
                                performed_by,
                            )
                            .await?;
                            (lines, items)
                        }
                        None => {
                            let lines = current_items
                                .iter()
                                .map(|item| (item.quantity, item.unit_price))
                                .collect();
                            (lines, current_items)
                        }
                    };

                    let totals = totals_or_bad_request(&lines, doctor_fee, discount)?;

                    let mut active = billing.into_active_model();
                    if let Some(record_id) = request.medical_record_id {
                        active.medical_record_id = Set(Some(record_id));
                    }
                    active.doctor_fee = Set(totals.doctor_fee);
                    active.discount = Set(totals.discount);
                    active.subtotal = Set(totals.subtotal);
                    active.total_amount = Set(totals.total_amount);
                    if let Some(notes) = request.notes {
                        active.notes = Set(Some(notes));
                    }

                    let updated = BillingRepository::update(txn, active).await?;
                    Ok((updated, items))
                })
            })
            .await?;

        info!(
            billing_id = %id,
            total_amount = billing.total_amount,
            updated_by = %claims.account_id,
            "Billing updated"
        );

        Ok(BillingResponse::new(billing, items))
    }

    /// 支払い状況の変更。paid で paid_at を入れ、paid 以外に戻すと消す
    pub async fn update_payment_status(
        &self,
        claims: &AuthClaims,
        id: Uuid,
        request: UpdatePaymentStatusRequest,
    ) -> AppResult<BillingResponse> {
        let new_status = request.payment_status;

        let (billing, items) = self
            .db
            .execute_in_transaction(move |txn| {
                Box::pin(async move {
                    let billing = BillingRepository::find_by_id_in(txn, id)
                        .await?
                        .ok_or_else(|| {
                            not_found_error(
                                "Billing",
                                id,
                                "billing_service::update_payment_status",
                            )
                        })?;
                    let items = BillingRepository::find_items(txn, id).await?;
                    let current = billing.payment_status();
                    if current == new_status {
                        return Ok((billing, items));
                    }

                    let mut active = billing.into_active_model();
                    active.payment_status = Set(new_status.to_string());
                    active.paid_at = Set(if new_status.is_paid() {
                        Some(Utc::now())
                    } else {
                        None
                    });
                    let updated = BillingRepository::update(txn, active).await?;

                    if new_status.is_paid() {
                        NotificationService::notify_patient(
                            txn,
                            updated.patient_id,
                            NotificationCategory::Billing,
                            "Payment received",
                            format!(
                                "Payment for billing #{} has been received. Thank you.",
                                updated.billing_number
                            ),
                        )
                        .await?;
                    }

                    Ok((updated, items))
                })
            })
            .await?;

        info!(
            billing_id = %id,
            payment_status = %new_status,
            changed_by = %claims.account_id,
            "Billing payment status changed"
        );

        Ok(BillingResponse::new(billing, items))
    }

    /// 削除。明細の数量は stock_in で在庫に戻す
    pub async fn delete(&self, claims: &AuthClaims, id: Uuid) -> AppResult<()> {
        let performed_by = claims.account_id;

        let billing_number = self
            .db
            .execute_in_transaction(move |txn| {
                Box::pin(async move {
                    let billing = BillingRepository::find_by_id_in(txn, id)
                        .await?
                        .ok_or_else(|| {
                            not_found_error("Billing", id, "billing_service::delete")
                        })?;

                    let items = BillingRepository::find_items(txn, id).await?;
                    let mut restored: BTreeMap<Uuid, i32> = BTreeMap::new();
                    for item in &items {
                        accumulate(&mut restored, item.inventory_item_id, item.quantity)?;
                    }

                    let mut locked = HashMap::new();
                    apply_net_deltas(
                        txn,
                        restored,
                        &mut locked,
                        id,
                        format!("Billing #{} deleted", billing.billing_number),
                        performed_by,
                    )
                    .await?;

                    BillingRepository::delete_items(txn, id).await?;
                    BillingRepository::delete(txn, id).await?;
                    Ok(billing.billing_number)
                })
            })
            .await?;

        info!(
            billing_id = %id,
            billing_number,
            deleted_by = %performed_by,
            "Billing deleted and stock restored"
        );
        Ok(())
    }

    async fn ensure_patient(&self, patient_id: Uuid) -> AppResult<()> {
        match self.user_repo.find_by_id(patient_id).await? {
            Some(user) if user.normalized_role() == Role::Patient => Ok(()),
            Some(_) => Err(AppError::BadRequest(format!(
                "User {} is not a patient",
                patient_id
            ))),
            None => Err(AppError::BadRequest(format!(
                "Patient {} does not exist",
                patient_id
            ))),
        }
    }

    async fn ensure_record_of(&self, record_id: Uuid, patient_id: Uuid) -> AppResult<()> {
        let record = self.record_repo.find_by_id(record_id).await?.ok_or_else(|| {
            AppError::BadRequest(format!("Medical record {} does not exist", record_id))
        })?;
        if record.patient_id != patient_id {
            return Err(AppError::BadRequest(
                "Medical record belongs to a different patient".to_string(),
            ));
        }
        Ok(())
    }
}
