// src/middleware/auth.rs

use crate::config::AppConfig;
use crate::domain::account::AuthClaims;
use crate::error::AppError;
use crate::logging::RequestContext;
use crate::utils::error_helper::forbidden_error;
use crate::utils::jwt::JwtManager;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, warn};
use uuid::Uuid;

/// JWT認証ミドルウェアの設定
#[derive(Clone)]
pub struct AuthMiddlewareConfig {
    pub jwt_manager: Arc<JwtManager>,
    pub access_token_cookie_name: String,
    pub skip_auth_paths: Vec<String>,
    pub admin_only_paths: Vec<String>,
}

impl AuthMiddlewareConfig {
    pub fn new(jwt_manager: Arc<JwtManager>, access_token_cookie_name: &str) -> Self {
        Self {
            jwt_manager,
            access_token_cookie_name: access_token_cookie_name.to_string(),
            skip_auth_paths: vec![
                "/health".to_string(),
                "/api/auth/signup".to_string(),
                "/api/auth/signin".to_string(),
                "/api/auth/signout".to_string(),
                "/api/auth/refresh".to_string(),
                "/api/auth/forgot-password".to_string(),
                "/api/auth/reset-password".to_string(),
                "/api/otp/".to_string(),
            ],
            admin_only_paths: vec!["/api/users".to_string()],
        }
    }
}

/// 認証済みアカウント（ハンドラーの引数に取る）
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claims: AuthClaims,
}

impl AuthenticatedUser {
    pub fn new(claims: AuthClaims) -> Self {
        Self { claims }
    }

    pub fn account_id(&self) -> Uuid {
        self.claims.account_id
    }

    pub fn is_admin(&self) -> bool {
        self.claims.is_admin()
    }

    pub fn ensure_admin(&self) -> Result<(), AppError> {
        if self.claims.is_admin() {
            return Ok(());
        }
        Err(forbidden_error(
            "Admin access required",
            "auth::ensure_admin",
            &self.claims,
        ))
    }

    /// 管理者・医師・スタッフ
    pub fn ensure_clinic_staff(&self) -> Result<(), AppError> {
        if self.claims.is_clinic_staff() {
            return Ok(());
        }
        Err(forbidden_error(
            "Clinic staff access required",
            "auth::ensure_clinic_staff",
            &self.claims,
        ))
    }
}

/// JWT認証ミドルウェア
///
/// Authorization ヘッダーを優先し、無ければ access_token クッキーを見る。
pub async fn jwt_auth_middleware(
    State(config): State<AuthMiddlewareConfig>,
    headers: HeaderMap,
    cookie_jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    if should_skip_auth(&path, &config.skip_auth_paths) {
        return Ok(next.run(request).await);
    }

    let token = extract_token(&headers, &cookie_jar, &config.access_token_cookie_name)
        .ok_or_else(|| {
            warn!(path = %path, "Missing authentication token");
            AppError::Unauthorized("Authentication required".to_string())
        })?;

    let access_claims = config.jwt_manager.verify_access_token(&token).map_err(|e| {
        warn!(path = %path, error = %e, "Invalid access token");
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;
    let claims = access_claims.account;

    if should_require_admin(&path, &config.admin_only_paths) && !claims.is_admin() {
        warn!(
            account_id = %claims.account_id,
            role = %claims.role,
            path = %path,
            "Access denied: admin permission required"
        );
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    debug!(
        account_id = %claims.account_id,
        account_kind = %claims.account_kind,
        role = %claims.role,
        path = %path,
        "Authenticated request"
    );

    let context = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .map(|mut context| {
            context.account_id = Some(claims.account_id);
            context
        });
    request
        .extensions_mut()
        .insert(AuthenticatedUser::new(claims));

    let mut response = next.run(request).await;
    // ロギングミドルウェアがアカウントIDを拾えるようにレスポンス側にも載せる
    if let Some(context) = context {
        response.extensions_mut().insert(context);
    }
    Ok(response)
}

/// 設定された許可オリジンで CORS レイヤーを作る（不正な値は読み飛ばす）
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// セキュリティヘッダーミドルウェア
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
    );

    response
}

// --- Axum Extractors ---

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

// --- ヘルパー関数 ---

fn extract_token(headers: &HeaderMap, cookie_jar: &CookieJar, cookie_name: &str) -> Option<String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    auth_header.or_else(|| {
        cookie_jar
            .get(cookie_name)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

fn should_skip_auth(path: &str, skip_paths: &[String]) -> bool {
    skip_paths.iter().any(|skip_path| path.starts_with(skip_path.as_str()))
}

fn should_require_admin(path: &str, admin_paths: &[String]) -> bool {
    admin_paths
        .iter()
        .any(|admin_path| path == admin_path || path.starts_with(&format!("{}/", admin_path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Cookie;

    fn paths(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_should_skip_auth() {
        let skip_paths = paths(&["/api/auth/signin", "/api/otp/", "/health"]);

        assert!(should_skip_auth("/api/auth/signin", &skip_paths));
        assert!(should_skip_auth("/api/otp/send", &skip_paths));
        assert!(should_skip_auth("/health", &skip_paths));
        assert!(!should_skip_auth("/api/auth/me", &skip_paths));
        assert!(!should_skip_auth("/api/appointments", &skip_paths));
    }

    #[test]
    fn test_should_require_admin() {
        let admin_paths = paths(&["/api/users"]);

        assert!(should_require_admin("/api/users", &admin_paths));
        assert!(should_require_admin("/api/users/abc/status", &admin_paths));
        assert!(!should_require_admin("/api/usersettings", &admin_paths));
        assert!(!should_require_admin("/api/personnels", &admin_paths));
    }

    #[test]
    fn test_extract_token_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );
        let jar = CookieJar::new().add(Cookie::new("access_token", "cookie-token"));

        assert_eq!(
            extract_token(&headers, &jar, "access_token"),
            Some("header-token".to_string())
        );
        assert_eq!(
            extract_token(&HeaderMap::new(), &jar, "access_token"),
            Some("cookie-token".to_string())
        );
        assert_eq!(
            extract_token(&HeaderMap::new(), &CookieJar::new(), "access_token"),
            None
        );
    }
}
