// src/service/otp_service.rs

use crate::api::dto::otp_dto::{SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse};
use crate::config::OtpConfig;
use crate::db::DbPool;
use crate::domain::otp_model::{self, OtpPurpose};
use crate::error::{AppError, AppResult};
use crate::repository::admin_repository::AdminRepository;
use crate::repository::otp_repository::{CreateOtp, OtpRepository};
use crate::repository::user_repository::UserRepository;
use crate::utils::email::{mask_email, normalize_email, EmailService};
use crate::utils::error_helper::ErrorHelperExt;
use crate::utils::token::{generate_numeric_code, hash_otp_code, verify_otp_code};
use crate::utils::transaction::TransactionManager;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// 発行直後のOTP（平文コードは呼び出し側でメール送信にだけ使う）
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub otp: otp_model::Model,
}

pub struct OtpService {
    db: DbPool,
    otp_repo: Arc<OtpRepository>,
    user_repo: Arc<UserRepository>,
    admin_repo: Arc<AdminRepository>,
    email_service: Arc<EmailService>,
    config: OtpConfig,
}

impl OtpService {
    pub fn new(db: DbPool, email_service: Arc<EmailService>, config: OtpConfig) -> Self {
        Self {
            otp_repo: Arc::new(OtpRepository::new(db.clone())),
            user_repo: Arc::new(UserRepository::new(db.clone())),
            admin_repo: Arc::new(AdminRepository::new(db.clone())),
            db,
            email_service,
            config,
        }
    }

    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// どちらかのモデルに登録済みのメールアドレスか
    pub async fn is_registered(&self, email: &str) -> AppResult<bool> {
        if self.admin_repo.find_by_email(email).await?.is_some() {
            return Ok(true);
        }
        Ok(self.user_repo.find_by_email(email).await?.is_some())
    }

    /// 新しいOTPを発行し、同じメール・用途の古いOTPを無効化する
    pub async fn issue(&self, email: &str, purpose: OtpPurpose) -> AppResult<IssuedOtp> {
        let email = normalize_email(email);
        let now = Utc::now();

        if let Some(latest) = self.otp_repo.find_latest_issued(&email, purpose).await? {
            let next_allowed = latest.created_at + Duration::seconds(self.config.resend_interval_seconds);
            if next_allowed > now {
                let wait = (next_allowed - now).num_seconds().max(1);
                warn!(
                    email = %mask_email(&email),
                    purpose = %purpose,
                    retry_after_seconds = wait,
                    "OTP resend requested too early"
                );
                return Err(AppError::TooManyRequests(format!(
                    "Please wait {} seconds before requesting a new code",
                    wait
                )));
            }
        }

        let code = generate_numeric_code(self.config.code_length);
        let code_hash = hash_otp_code(&self.config.secret, &code)
            .map_internal_error("otp_service::issue", "Failed to issue code")?;

        let create_otp = CreateOtp {
            email: email.clone(),
            purpose,
            code_hash,
            expires_at: now + Duration::minutes(self.config.ttl_minutes),
        };

        let otp = self
            .db
            .execute_in_transaction(move |txn| {
                Box::pin(async move { Ok(OtpRepository::replace(txn, create_otp).await?) })
            })
            .await?;

        info!(
            otp_id = %otp.id,
            email = %mask_email(&email),
            purpose = %purpose,
            "OTP issued"
        );

        Ok(IssuedOtp { code, otp })
    }

    /// 発行してメールで送る
    pub async fn issue_and_send(&self, email: &str, purpose: OtpPurpose) -> AppResult<otp_model::Model> {
        let issued = self.issue(email, purpose).await?;
        self.email_service
            .send_otp_email(&issued.otp.email, purpose, &issued.code, self.config.ttl_minutes)
            .await?;
        Ok(issued.otp)
    }

    /// `/otp/send`
    ///
    /// 登録用は既存アカウントなら 409。パスワードリセット用は存在しないアカウントでも
    /// 同じ応答を返し、送信だけを省く。
    pub async fn send(&self, request: SendOtpRequest) -> AppResult<SendOtpResponse> {
        let email = normalize_email(&request.email);
        let registered = self.is_registered(&email).await?;

        let expires_at = match request.purpose {
            OtpPurpose::Registration if registered => {
                return Err(AppError::Conflict(
                    "Email address is already registered".to_string(),
                ));
            }
            OtpPurpose::PasswordReset if !registered => {
                info!(
                    email = %mask_email(&email),
                    "Password reset code requested for unknown email"
                );
                Utc::now() + Duration::minutes(self.config.ttl_minutes)
            }
            purpose => self.issue_and_send(&email, purpose).await?.expires_at,
        };

        Ok(SendOtpResponse {
            message: "Verification code sent".to_string(),
            expires_at,
            expires_in_seconds: self.config.ttl_minutes * 60,
        })
    }

    /// コードを検証し、一致すれば検証済みにする
    ///
    /// 比較の前に試行回数を確保し、上限に達したOTPはコードに関係なく 429 を返す。
    /// 再検証しても最初の検証時刻は動かない。
    pub async fn verify(
        &self,
        email: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> AppResult<otp_model::Model> {
        let email = normalize_email(email);
        let now = Utc::now();

        let otp = OtpRepository::find_latest_open(&self.db, &email, purpose)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("No active verification code for this email".to_string())
            })?;

        if otp.is_expired_at(now) {
            return Err(AppError::BadRequest(
                "Verification code has expired".to_string(),
            ));
        }

        if !self
            .otp_repo
            .reserve_attempt(otp.id, self.config.max_attempts)
            .await?
        {
            warn!(otp_id = %otp.id, email = %mask_email(&email), "Locked OTP verification attempt");
            return Err(AppError::TooManyRequests(
                "Too many failed attempts. Please request a new code".to_string(),
            ));
        }

        if !verify_otp_code(&self.config.secret, code, &otp.code_hash) {
            let remaining = (self.config.max_attempts - otp.attempts - 1).max(0);
            warn!(
                otp_id = %otp.id,
                email = %mask_email(&email),
                remaining_attempts = remaining,
                "Invalid OTP code"
            );
            return Err(AppError::BadRequest(format!(
                "Invalid verification code ({} attempts remaining)",
                remaining
            )));
        }

        self.otp_repo.mark_verified(otp.id).await?;
        info!(otp_id = %otp.id, purpose = %purpose, "OTP verified");

        Ok(otp_model::Model {
            verified_at: otp.verified_at.or(Some(now)),
            ..otp
        })
    }

    /// `/otp/verify`
    pub async fn verify_request(&self, request: VerifyOtpRequest) -> AppResult<VerifyOtpResponse> {
        self.verify(&request.email, request.purpose, &request.code)
            .await?;
        Ok(VerifyOtpResponse {
            message: "Verification successful".to_string(),
            verified: true,
            purpose: request.purpose,
        })
    }
}
