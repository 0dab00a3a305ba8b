// src/repository/otp_repository.rs

use crate::domain::otp_model::{self, ActiveModel as OtpActiveModel, Entity as OtpEntity, OtpPurpose};
use chrono::{DateTime, Utc};
use sea_orm::entity::*;
use sea_orm::sea_query::Expr;
use sea_orm::{Condition, ConnectionTrait, DbConn, DbErr, Order, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

pub struct OtpRepository {
    db: DbConn,
}

#[derive(Debug, Clone)]
pub struct CreateOtp {
    pub email: String,
    pub purpose: OtpPurpose,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl OtpRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    fn open_condition(email: &str, purpose: OtpPurpose) -> Condition {
        Condition::all()
            .add(otp_model::Column::Email.eq(email))
            .add(otp_model::Column::Purpose.eq(purpose.as_str()))
            .add(otp_model::Column::IsInvalidated.eq(false))
            .add(otp_model::Column::ConsumedAt.is_null())
    }

    /// 同じメール・用途で最後に発行されたOTP（無効化済みも含む）
    pub async fn find_latest_issued(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<otp_model::Model>, DbErr> {
        OtpEntity::find()
            .filter(otp_model::Column::Email.eq(email))
            .filter(otp_model::Column::Purpose.eq(purpose.as_str()))
            .order_by(otp_model::Column::CreatedAt, Order::Desc)
            .one(&self.db)
            .await
    }

    /// 未使用・未無効化の最新OTP
    pub async fn find_latest_open<C: ConnectionTrait>(
        conn: &C,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<otp_model::Model>, DbErr> {
        OtpEntity::find()
            .filter(Self::open_condition(email, purpose))
            .order_by(otp_model::Column::CreatedAt, Order::Desc)
            .one(conn)
            .await
    }

    /// 古いOTPを無効化してから新しいOTPを保存
    pub async fn replace<C: ConnectionTrait>(
        conn: &C,
        create_otp: CreateOtp,
    ) -> Result<otp_model::Model, DbErr> {
        OtpEntity::update_many()
            .col_expr(otp_model::Column::IsInvalidated, Expr::value(true))
            .col_expr(otp_model::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Self::open_condition(&create_otp.email, create_otp.purpose))
            .exec(conn)
            .await?;

        let otp = OtpActiveModel {
            email: Set(create_otp.email),
            purpose: Set(create_otp.purpose.to_string()),
            code_hash: Set(create_otp.code_hash),
            expires_at: Set(create_otp.expires_at),
            ..OtpActiveModel::new()
        };
        otp.insert(conn).await
    }

    /// 試行回数を一つ確保する。上限に達していれば false
    ///
    /// 確認と加算を一つの UPDATE で行うので、並行した試行でも上限を超えない。
    pub async fn reserve_attempt(&self, id: Uuid, max_attempts: i32) -> Result<bool, DbErr> {
        let result = OtpEntity::update_many()
            .col_expr(
                otp_model::Column::Attempts,
                Expr::col(otp_model::Column::Attempts).add(1),
            )
            .col_expr(otp_model::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(otp_model::Column::Id.eq(id))
            .filter(otp_model::Column::Attempts.lt(max_attempts))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// 検証成功。確保した試行回数を戻し、最初の検証時刻だけを残す
    pub async fn mark_verified(&self, id: Uuid) -> Result<(), DbErr> {
        let now = Utc::now();
        OtpEntity::update_many()
            .col_expr(
                otp_model::Column::Attempts,
                Expr::col(otp_model::Column::Attempts).sub(1),
            )
            .col_expr(otp_model::Column::UpdatedAt, Expr::value(now))
            .filter(otp_model::Column::Id.eq(id))
            .filter(otp_model::Column::Attempts.gt(0))
            .exec(&self.db)
            .await?;

        OtpEntity::update_many()
            .col_expr(otp_model::Column::VerifiedAt, Expr::value(Some(now)))
            .filter(otp_model::Column::Id.eq(id))
            .filter(otp_model::Column::VerifiedAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// 未使用のときだけ使用済みにする（二重使用の防止）
    pub async fn mark_consumed<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<bool, DbErr> {
        let now = Utc::now();
        let result = OtpEntity::update_many()
            .col_expr(otp_model::Column::ConsumedAt, Expr::value(Some(now)))
            .col_expr(otp_model::Column::UpdatedAt, Expr::value(now))
            .filter(otp_model::Column::Id.eq(id))
            .filter(otp_model::Column::ConsumedAt.is_null())
            .exec(conn)
            .await?;
        Ok(result.rows_affected == 1)
    }
}
