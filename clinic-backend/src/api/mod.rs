// src/api/mod.rs
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::logging::{inject_request_context, logging_middleware};
use crate::middleware::auth::{
    cors_layer, jwt_auth_middleware, security_headers_middleware, AuthMiddlewareConfig,
};
use crate::service::{
    appointment_service::AppointmentService, auth_service::AuthService,
    billing_service::BillingService, blocked_time_slot_service::BlockedTimeSlotService,
    dashboard_service::DashboardService, inventory_service::InventoryService,
    medical_record_service::MedicalRecordService, notification_service::NotificationService,
    otp_service::OtpService, personnel_service::PersonnelService, report_service::ReportService,
    user_service::UserService,
};
use crate::utils::email::EmailService;
use crate::utils::jwt::JwtManager;
use crate::utils::password::PasswordManager;
use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod dto;
pub mod handlers;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub otp_service: Arc<OtpService>,
    pub user_service: Arc<UserService>,
    pub personnel_service: Arc<PersonnelService>,
    pub appointment_service: Arc<AppointmentService>,
    pub blocked_time_slot_service: Arc<BlockedTimeSlotService>,
    pub medical_record_service: Arc<MedicalRecordService>,
    pub billing_service: Arc<BillingService>,
    pub inventory_service: Arc<InventoryService>,
    pub notification_service: Arc<NotificationService>,
    pub report_service: Arc<ReportService>,
    pub dashboard_service: Arc<DashboardService>,
    pub jwt_manager: Arc<JwtManager>,
    pub db: DbPool,
    pub cookie_config: CookieConfig,
    pub config: Arc<AppConfig>,
}

/// Cookie設定
#[derive(Clone, Debug)]
pub struct CookieConfig {
    pub access_token_name: String,
    pub refresh_token_name: String,
    pub secure: bool,
    pub http_only: bool,
    pub path: String,
}

impl CookieConfig {
    pub fn from_app_config(app_config: &AppConfig) -> Self {
        Self {
            access_token_name: "access_token".to_string(),
            refresh_token_name: "refresh_token".to_string(),
            secure: app_config.security.cookie_secure,
            http_only: true,
            path: "/".to_string(),
        }
    }
}

impl AppState {
    /// 設定とDB接続から全サービスを組み立てる
    pub fn build(db: DbPool, app_config: &AppConfig) -> AppResult<Self> {
        let password_manager = Arc::new(
            PasswordManager::new(
                app_config.argon2.clone(),
                app_config.password_policy.clone(),
            )
            .map_err(|e| AppError::InternalServerError(format!("Password manager: {}", e)))?,
        );
        let jwt_manager = Arc::new(
            JwtManager::new(app_config.jwt.clone())
                .map_err(|e| AppError::InternalServerError(format!("JWT manager: {}", e)))?,
        );
        let email_service = Arc::new(
            EmailService::new(app_config.email.clone())
                .map_err(|e| AppError::InternalServerError(format!("Email service: {}", e)))?,
        );

        let otp_service = Arc::new(OtpService::new(
            db.clone(),
            email_service.clone(),
            app_config.otp.clone(),
        ));
        let auth_service = Arc::new(AuthService::new(
            db.clone(),
            password_manager.clone(),
            jwt_manager.clone(),
            email_service,
            otp_service.clone(),
        ));
        let user_service = Arc::new(UserService::new(
            db.clone(),
            password_manager,
            otp_service.clone(),
        ));

        Ok(Self {
            auth_service,
            otp_service,
            user_service,
            personnel_service: Arc::new(PersonnelService::new(db.clone())),
            appointment_service: Arc::new(AppointmentService::new(db.clone())),
            blocked_time_slot_service: Arc::new(BlockedTimeSlotService::new(db.clone())),
            medical_record_service: Arc::new(MedicalRecordService::new(db.clone())),
            billing_service: Arc::new(BillingService::new(db.clone())),
            inventory_service: Arc::new(InventoryService::new(db.clone())),
            notification_service: Arc::new(NotificationService::new(db.clone())),
            report_service: Arc::new(ReportService::new(db.clone())),
            dashboard_service: Arc::new(DashboardService::new(db.clone())),
            jwt_manager,
            db,
            cookie_config: CookieConfig::from_app_config(app_config),
            config: Arc::new(app_config.clone()),
        })
    }
}

/// 全ルーターとミドルウェアを束ねたアプリ本体
pub fn create_app(app_state: AppState) -> Router {
    let auth_config = AuthMiddlewareConfig::new(
        app_state.jwt_manager.clone(),
        &app_state.cookie_config.access_token_name,
    );
    let config = app_state.config.clone();

    let api = Router::new()
        .merge(handlers::auth_handler::auth_router(app_state.clone()))
        .merge(handlers::otp_handler::otp_router(app_state.clone()))
        .merge(handlers::user_handler::user_router(app_state.clone()))
        .merge(handlers::personnel_handler::personnel_router(app_state.clone()))
        .merge(handlers::appointment_handler::appointment_router(app_state.clone()))
        .merge(handlers::blocked_time_slot_handler::blocked_time_slot_router(app_state.clone()))
        .merge(handlers::medical_record_handler::medical_record_router(app_state.clone()))
        .merge(handlers::billing_handler::billing_router(app_state.clone()))
        .merge(handlers::inventory_handler::inventory_router(app_state.clone()))
        .merge(handlers::notification_handler::notification_router(app_state.clone()))
        .merge(handlers::report_handler::report_router(app_state.clone()))
        .merge(handlers::dashboard_handler::dashboard_router(app_state.clone()));

    // 後から追加したレイヤーほど外側で実行される
    Router::new()
        .nest("/api", api)
        .merge(handlers::system_handler::system_router(app_state))
        .layer(axum_middleware::from_fn_with_state(
            auth_config,
            jwt_auth_middleware,
        ))
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(DefaultBodyLimit::max(config.server.body_limit))
        .layer(cors_layer(&config))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(axum_middleware::from_fn(inject_request_context))
        .layer(TraceLayer::new_for_http())
}
