// src/api/handlers/auth_handler.rs

use crate::api::dto::auth_dto::*;
use crate::api::{AppState, CookieConfig};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::types::ApiResponse;
use crate::utils::error_helper::convert_validation_errors;
use crate::utils::jwt::TokenPair;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::info;
use validator::Validate;

/// 患者の新規登録
pub async fn signup_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, CookieJar, ApiResponse<AuthResponse>)> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "auth_handler::signup"))?;

    let response = app_state.auth_service.signup(payload).await?;
    let jar = create_auth_cookies(&response.tokens, &app_state.cookie_config);

    Ok((StatusCode::CREATED, jar, ApiResponse::success(response)))
}

pub async fn signin_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<SigninRequest>,
) -> AppResult<(CookieJar, ApiResponse<AuthResponse>)> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "auth_handler::signin"))?;

    let response = app_state.auth_service.signin(payload).await?;
    let jar = create_auth_cookies(&response.tokens, &app_state.cookie_config);

    Ok((jar, ApiResponse::success(response)))
}

/// ログアウト。トークンが無効でもCookieは必ず消す
pub async fn signout_handler(
    State(app_state): State<AppState>,
    cookie_jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, ApiResponse<MessageResponse>)> {
    let refresh_token = resolve_refresh_token(&body, &cookie_jar, &app_state.cookie_config);

    app_state
        .auth_service
        .signout(refresh_token.as_deref())
        .await?;

    Ok((
        create_expired_auth_cookies(&app_state.cookie_config),
        ApiResponse::success(MessageResponse::new("Signed out successfully")),
    ))
}

/// リフレッシュトークンのローテーション（ボディ優先、無ければCookie）
pub async fn refresh_handler(
    State(app_state): State<AppState>,
    cookie_jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, ApiResponse<AuthResponse>)> {
    let refresh_token = resolve_refresh_token(&body, &cookie_jar, &app_state.cookie_config)
        .ok_or_else(|| AppError::Unauthorized("Refresh token is required".to_string()))?;

    info!("Token refresh attempt");

    let response = app_state.auth_service.refresh(&refresh_token).await?;
    let jar = create_auth_cookies(&response.tokens, &app_state.cookie_config);

    Ok((jar, ApiResponse::success(response)))
}

pub async fn me_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<ApiResponse<CurrentAccountResponse>> {
    let account = app_state.auth_service.me(&user.claims).await?;
    Ok(ApiResponse::success(account))
}

pub async fn change_password_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<(CookieJar, ApiResponse<MessageResponse>)> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "auth_handler::change_password"))?;

    let response = app_state
        .auth_service
        .change_password(&user.claims, payload)
        .await?;

    // リフレッシュトークンは全て失効しているので、この端末でも再ログインさせる
    Ok((
        create_expired_auth_cookies(&app_state.cookie_config),
        ApiResponse::success(response),
    ))
}

pub async fn forgot_password_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<ApiResponse<MessageResponse>> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "auth_handler::forgot_password"))?;

    Ok(ApiResponse::success(
        app_state.auth_service.forgot_password(payload).await,
    ))
}

pub async fn reset_password_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<ApiResponse<MessageResponse>> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "auth_handler::reset_password"))?;

    let response = app_state.auth_service.reset_password(payload).await?;
    Ok(ApiResponse::success(response))
}

// --- ヘルパー関数 ---

/// ボディの refresh_token を優先し、無ければCookieを見る
fn resolve_refresh_token(
    body: &Bytes,
    cookie_jar: &CookieJar,
    config: &CookieConfig,
) -> Option<String> {
    let from_body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<RefreshTokenRequest>(body)
            .ok()
            .and_then(|request| request.refresh_token)
    };

    from_body
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            cookie_jar
                .get(&config.refresh_token_name)
                .map(|cookie| cookie.value().to_string())
                .filter(|token| !token.is_empty())
        })
}

fn build_cookie(
    name: &str,
    value: String,
    max_age_seconds: i64,
    config: &CookieConfig,
) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .path(config.path.clone())
        .secure(config.secure)
        .http_only(config.http_only)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(max_age_seconds))
        .build()
}

/// 認証用Cookieを作成
fn create_auth_cookies(tokens: &TokenPair, config: &CookieConfig) -> CookieJar {
    CookieJar::new()
        .add(build_cookie(
            &config.access_token_name,
            tokens.access_token.clone(),
            tokens.access_token_expires_in,
            config,
        ))
        .add(build_cookie(
            &config.refresh_token_name,
            tokens.refresh_token.clone(),
            tokens.refresh_token_expires_in,
            config,
        ))
}

/// 期限切れ認証Cookieを作成（削除用）
fn create_expired_auth_cookies(config: &CookieConfig) -> CookieJar {
    CookieJar::new()
        .add(build_cookie(&config.access_token_name, String::new(), 0, config))
        .add(build_cookie(&config.refresh_token_name, String::new(), 0, config))
}

// --- ルーター ---

pub fn auth_router(app_state: AppState) -> Router {
    Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/signin", post(signin_handler))
        .route("/auth/signout", post(signout_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route("/auth/me", get(me_handler))
        .route("/auth/change-password", put(change_password_handler))
        .route("/auth/forgot-password", post(forgot_password_handler))
        .route("/auth/reset-password", post(reset_password_handler))
        .with_state(app_state)
}
