// src/service/auth_service.rs

use crate::api::dto::auth_dto::*;
use crate::config::{InitialAdminConfig, OtpConfig};
use crate::db::DbPool;
use crate::domain::account::{AccountKind, AuthClaims, UserRole};
use crate::domain::otp_model::OtpPurpose;
use crate::domain::refresh_token_model::CreateRefreshToken;
use crate::domain::{admin_model, user_model};
use crate::error::{AppError, AppResult};
use crate::repository::admin_repository::{AdminRepository, CreateAdmin};
use crate::repository::otp_repository::OtpRepository;
use crate::repository::personnel_repository::PersonnelRepository;
use crate::repository::refresh_token_repository::RefreshTokenRepository;
use crate::repository::user_repository::{CreateUser, UserRepository};
use crate::service::otp_service::OtpService;
use crate::utils::email::{mask_email, normalize_email, EmailService};
use crate::utils::error_helper::internal_server_error;
use crate::utils::jwt::{JwtError, JwtManager, TokenPair};
use crate::utils::password::PasswordManager;
use crate::utils::token::hash_refresh_token;
use crate::utils::transaction::TransactionManager;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 二つのアカウントモデルのどちらか
#[derive(Debug, Clone)]
pub enum Account {
    User(user_model::Model),
    Admin(admin_model::Model),
}

impl Account {
    pub fn id(&self) -> Uuid {
        match self {
            Self::User(user) => user.id,
            Self::Admin(admin) => admin.id,
        }
    }

    pub fn kind(&self) -> AccountKind {
        match self {
            Self::User(_) => AccountKind::User,
            Self::Admin(_) => AccountKind::Admin,
        }
    }

    pub fn claims(&self) -> AuthClaims {
        match self {
            Self::User(user) => user.to_auth_claims(),
            Self::Admin(admin) => admin.to_auth_claims(),
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Self::User(user) => user.is_active,
            Self::Admin(admin) => admin.is_active,
        }
    }

    fn password_hash(&self) -> &str {
        match self {
            Self::User(user) => &user.password_hash,
            Self::Admin(admin) => &admin.password_hash,
        }
    }
}

/// 認証サービス
pub struct AuthService {
    db: DbPool,
    user_repo: Arc<UserRepository>,
    admin_repo: Arc<AdminRepository>,
    refresh_token_repo: Arc<RefreshTokenRepository>,
    personnel_repo: Arc<PersonnelRepository>,
    password_manager: Arc<PasswordManager>,
    jwt_manager: Arc<JwtManager>,
    email_service: Arc<EmailService>,
    otp_service: Arc<OtpService>,
    otp_config: OtpConfig,
}

impl AuthService {
    pub fn new(
        db: DbPool,
        password_manager: Arc<PasswordManager>,
        jwt_manager: Arc<JwtManager>,
        email_service: Arc<EmailService>,
        otp_service: Arc<OtpService>,
    ) -> Self {
        Self {
            user_repo: Arc::new(UserRepository::new(db.clone())),
            admin_repo: Arc::new(AdminRepository::new(db.clone())),
            refresh_token_repo: Arc::new(RefreshTokenRepository::new(db.clone())),
            personnel_repo: Arc::new(PersonnelRepository::new(db.clone())),
            otp_config: otp_service.config().clone(),
            db,
            password_manager,
            jwt_manager,
            email_service,
            otp_service,
        }
    }

    // --- 登録・ログイン ---

    /// 患者アカウントの登録
    ///
    /// 直近に検証済みの registration OTP を消費してからユーザーを作る。
    pub async fn signup(&self, signup_data: SignupRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&signup_data.email);

        if self.otp_service.is_registered(&email).await? {
            return Err(AppError::Conflict(
                "Email address is already registered".to_string(),
            ));
        }

        let password_hash = self.hash_new_password(&signup_data.password)?;
        let window = Duration::minutes(self.otp_config.registration_window_minutes);

        let create_user = CreateUser {
            email: email.clone(),
            first_name: signup_data.first_name.trim().to_string(),
            last_name: signup_data.last_name.trim().to_string(),
            phone: signup_data.phone.clone(),
            role: UserRole::Patient.as_str().to_string(),
            password_hash,
            email_verified: true,
        };

        let user = self
            .db
            .execute_in_transaction(move |txn| {
                Box::pin(async move {
                    let otp = OtpRepository::find_latest_open(
                        txn,
                        &create_user.email,
                        OtpPurpose::Registration,
                    )
                    .await?
                    .filter(|otp| otp.is_verified_within(window, Utc::now()))
                    .ok_or_else(|| {
                        AppError::BadRequest(
                            "Email address has not been verified. Please verify the code sent to your email"
                                .to_string(),
                        )
                    })?;

                    if !OtpRepository::mark_consumed(txn, otp.id).await? {
                        return Err(AppError::BadRequest(
                            "Verification code has already been used".to_string(),
                        ));
                    }

                    Ok(UserRepository::insert(txn, create_user).await?)
                })
            })
            .await?;

        info!(
            user_id = %user.id,
            email = %mask_email(&user.email),
            "Patient registered successfully"
        );

        if let Err(e) = self
            .email_service
            .send_welcome_email(&user.email, &user.full_name())
            .await
        {
            warn!(user_id = %user.id, error = %e, "Failed to send welcome email");
        }

        let account = Account::User(user);
        let tokens = self.issue_tokens(&account).await?;

        Ok(AuthResponse {
            account: account.claims(),
            tokens,
            message: "Registration successful".to_string(),
        })
    }

    /// ログイン（admins を先に、次に users を探す）
    pub async fn signin(&self, signin_data: SigninRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&signin_data.email);

        let account = self.find_account_by_email(&email).await?.ok_or_else(|| {
            warn!(email = %mask_email(&email), "Signin attempt for unknown email");
            AppError::Unauthorized("Invalid email or password".to_string())
        })?;

        let password_ok = self
            .password_manager
            .verify_password(&signin_data.password, account.password_hash())
            .map_err(|e| internal_server_error(e, "auth_service::signin", "Signin failed"))?;

        if !password_ok {
            warn!(
                account_id = %account.id(),
                account_kind = %account.kind(),
                "Signin failed: invalid password"
            );
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        if !account.is_active() {
            warn!(account_id = %account.id(), "Signin attempt for inactive account");
            return Err(AppError::Unauthorized("Account is deactivated".to_string()));
        }

        match &account {
            Account::User(user) => self.user_repo.update_last_login(user.id).await?,
            Account::Admin(admin) => self.admin_repo.update_last_login(admin.id).await?,
        }

        let tokens = self.issue_tokens(&account).await?;

        info!(
            account_id = %account.id(),
            account_kind = %account.kind(),
            "Signed in successfully"
        );

        Ok(AuthResponse {
            account: account.claims(),
            tokens,
            message: "Signin successful".to_string(),
        })
    }

    /// リフレッシュトークンのローテーション
    ///
    /// 使用済み・失効済みのトークンも、無効化されたアカウントも 401。
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self
            .jwt_manager
            .verify_refresh_token(refresh_token)
            .map_err(jwt_to_unauthorized)?;
        let account_id = claims.account_id().map_err(jwt_to_unauthorized)?;

        let token_hash = hash_refresh_token(refresh_token);
        let stored = self
            .refresh_token_repo
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

        if stored.account_id != account_id || stored.account_kind != claims.kind.as_str() {
            warn!(token_id = %stored.id, "Refresh token does not match its claims");
            return Err(AppError::Unauthorized("Invalid refresh token".to_string()));
        }

        if !stored.is_usable() {
            warn!(
                token_id = %stored.id,
                account_id = %account_id,
                revoked = stored.is_revoked,
                "Unusable refresh token presented"
            );
            return Err(AppError::Unauthorized(
                "Refresh token has been revoked or expired".to_string(),
            ));
        }

        let account = self
            .load_account(claims.kind, account_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

        if !account.is_active() {
            return Err(AppError::Unauthorized("Account is deactivated".to_string()));
        }

        if !self.refresh_token_repo.revoke_if_active(stored.id).await? {
            warn!(token_id = %stored.id, "Refresh token was rotated concurrently");
            return Err(AppError::Unauthorized(
                "Refresh token has been revoked or expired".to_string(),
            ));
        }

        let tokens = self.issue_tokens(&account).await?;

        info!(
            account_id = %account_id,
            account_kind = %claims.kind,
            "Refresh token rotated"
        );

        Ok(AuthResponse {
            account: account.claims(),
            tokens,
            message: "Token refreshed".to_string(),
        })
    }

    /// ログアウト（トークンが無くても成功扱い）
    pub async fn signout(&self, refresh_token: Option<&str>) -> AppResult<()> {
        if let Some(token) = refresh_token.filter(|t| !t.is_empty()) {
            let revoked = self
                .refresh_token_repo
                .revoke_by_token_hash(&hash_refresh_token(token))
                .await?;
            info!(revoked_tokens = revoked, "Signed out");
        }
        Ok(())
    }

    pub async fn me(&self, claims: &AuthClaims) -> AppResult<CurrentAccountResponse> {
        let account = self
            .load_account(claims.account_kind, claims.account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        Ok(match &account {
            Account::User(user) => {
                let personnel_id = self
                    .personnel_repo
                    .find_by_user_id(user.id)
                    .await?
                    .map(|p| p.id);
                CurrentAccountResponse::from_user(user, personnel_id)
            }
            Account::Admin(admin) => CurrentAccountResponse::from_admin(admin),
        })
    }

    // --- パスワード ---

    /// パスワード変更。成功すると全端末のリフレッシュトークンを失効させる
    pub async fn change_password(
        &self,
        claims: &AuthClaims,
        request: ChangePasswordRequest,
    ) -> AppResult<MessageResponse> {
        let account = self
            .load_account(claims.account_kind, claims.account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        let current_ok = self
            .password_manager
            .verify_password(&request.current_password, account.password_hash())
            .map_err(|e| {
                internal_server_error(e, "auth_service::change_password", "Password change failed")
            })?;
        if !current_ok {
            return Err(AppError::BadRequest(
                "Current password is incorrect".to_string(),
            ));
        }
        if request.current_password == request.new_password {
            return Err(AppError::BadRequest(
                "New password must be different from the current password".to_string(),
            ));
        }

        let password_hash = self.hash_new_password(&request.new_password)?;
        self.replace_password(account.kind(), account.id(), password_hash)
            .await?;

        info!(
            account_id = %account.id(),
            account_kind = %account.kind(),
            "Password changed"
        );

        Ok(MessageResponse::new(
            "Password changed successfully. Please sign in again on other devices",
        ))
    }

    /// パスワードリセットコードの送信
    ///
    /// アカウントの有無や送信失敗は応答に出さない。
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> MessageResponse {
        let email = normalize_email(&request.email);

        match self.otp_service.is_registered(&email).await {
            Ok(true) => {
                if let Err(e) = self
                    .otp_service
                    .issue_and_send(&email, OtpPurpose::PasswordReset)
                    .await
                {
                    warn!(email = %mask_email(&email), error = %e, "Password reset code was not sent");
                }
            }
            Ok(false) => {
                info!(email = %mask_email(&email), "Password reset requested for unknown email");
            }
            Err(e) => {
                warn!(email = %mask_email(&email), error = %e, "Password reset lookup failed");
            }
        }

        MessageResponse::new("If the email is registered, a reset code has been sent")
    }

    /// コードを検証してパスワードを再設定し、全リフレッシュトークンを失効させる
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> AppResult<MessageResponse> {
        let email = normalize_email(&request.email);

        let otp = self
            .otp_service
            .verify(&email, OtpPurpose::PasswordReset, &request.code)
            .await?;

        let account = self
            .find_account_by_email(&email)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid password reset request".to_string()))?;

        let password_hash = self.hash_new_password(&request.new_password)?;
        let kind = account.kind();
        let account_id = account.id();
        let otp_id = otp.id;

        self.db
            .execute_in_transaction(move |txn| {
                Box::pin(async move {
                    if !OtpRepository::mark_consumed(txn, otp_id).await? {
                        return Err(AppError::BadRequest(
                            "Verification code has already been used".to_string(),
                        ));
                    }
                    update_password_in(txn, kind, account_id, &password_hash).await?;
                    RefreshTokenRepository::revoke_all_for_account(txn, account_id, kind.as_str())
                        .await?;
                    Ok(())
                })
            })
            .await?;

        info!(account_id = %account_id, account_kind = %kind, "Password reset completed");

        Ok(MessageResponse::new("Password has been reset successfully"))
    }

    // --- 初期データ ---

    /// 初期管理者を投入（既に存在すれば何もしない）
    pub async fn seed_initial_admin(
        &self,
        config: &InitialAdminConfig,
    ) -> AppResult<Option<admin_model::Model>> {
        let email = normalize_email(&config.email);
        if self.admin_repo.find_by_email(&email).await?.is_some() {
            return Ok(None);
        }

        let admin = self
            .admin_repo
            .create(CreateAdmin {
                email,
                name: config.name.clone(),
                role: "superadmin".to_string(),
                password_hash: config.password_hash.clone(),
            })
            .await?;

        info!(admin_id = %admin.id, email = %mask_email(&admin.email), "Initial admin created");
        Ok(Some(admin))
    }

    // --- 内部処理 ---

    pub async fn load_account(&self, kind: AccountKind, id: Uuid) -> AppResult<Option<Account>> {
        Ok(match kind {
            AccountKind::User => self.user_repo.find_by_id(id).await?.map(Account::User),
            AccountKind::Admin => self.admin_repo.find_by_id(id).await?.map(Account::Admin),
        })
    }

    async fn find_account_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        if let Some(admin) = self.admin_repo.find_by_email(email).await? {
            return Ok(Some(Account::Admin(admin)));
        }
        Ok(self.user_repo.find_by_email(email).await?.map(Account::User))
    }

    fn hash_new_password(&self, password: &str) -> AppResult<String> {
        self.password_manager
            .validate_password_strength(password)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        self.password_manager
            .hash_password(password)
            .map_err(|e| internal_server_error(e, "auth_service::hash_password", "Password hashing failed"))
    }

    async fn replace_password(
        &self,
        kind: AccountKind,
        account_id: Uuid,
        password_hash: String,
    ) -> AppResult<()> {
        self.db
            .execute_in_transaction(move |txn| {
                Box::pin(async move {
                    update_password_in(txn, kind, account_id, &password_hash).await?;
                    RefreshTokenRepository::revoke_all_for_account(txn, account_id, kind.as_str())
                        .await?;
                    Ok(())
                })
            })
            .await
    }

    /// アクセス・リフレッシュトークンを発行し、リフレッシュ側のハッシュを保存
    async fn issue_tokens(&self, account: &Account) -> AppResult<TokenPair> {
        let access_token = self
            .jwt_manager
            .generate_access_token(account.claims())
            .map_err(|e| internal_server_error(e, "auth_service::issue_tokens", "Token generation failed"))?;
        let refresh_token = self
            .jwt_manager
            .generate_refresh_token(account.id(), account.kind())
            .map_err(|e| internal_server_error(e, "auth_service::issue_tokens", "Token generation failed"))?;

        self.refresh_token_repo
            .create(CreateRefreshToken {
                account_id: account.id(),
                account_kind: account.kind().to_string(),
                token_hash: hash_refresh_token(&refresh_token),
                expires_at: self.jwt_manager.refresh_token_expires_at(),
            })
            .await?;

        Ok(TokenPair::create_with_jwt_manager(
            access_token,
            refresh_token,
            &self.jwt_manager,
        ))
    }
}

async fn update_password_in<C: sea_orm::ConnectionTrait>(
    conn: &C,
    kind: AccountKind,
    account_id: Uuid,
    password_hash: &str,
) -> AppResult<()> {
    match kind {
        AccountKind::User => UserRepository::update_password_hash(conn, account_id, password_hash).await?,
        AccountKind::Admin => {
            AdminRepository::update_password_hash(conn, account_id, password_hash).await?
        }
    }
    Ok(())
}

fn jwt_to_unauthorized(error: JwtError) -> AppError {
    match error {
        JwtError::TokenExpired => AppError::Unauthorized("Refresh token has expired".to_string()),
        _ => AppError::Unauthorized("Invalid refresh token".to_string()),
    }
}
