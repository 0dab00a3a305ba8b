use crate::utils::email::EmailConfig;
use crate::utils::jwt::JwtConfig;
use crate::utils::password::{Argon2Config, PasswordPolicy};
use std::env;

#[derive(Clone, Debug)]
pub struct SecurityConfig {
    pub cookie_secure: bool,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub body_limit: usize,
}

/// OTP 設定
#[derive(Clone, Debug)]
pub struct OtpConfig {
    /// コードのHMACキー
    pub secret: String,
    pub code_length: usize,
    pub ttl_minutes: i64,
    pub max_attempts: i32,
    pub resend_interval_seconds: i64,
    /// 検証済み登録OTPでサインアップできる期間
    pub registration_window_minutes: i64,
}

impl OtpConfig {
    fn from_env(fallback_secret: &str) -> Result<Self, String> {
        let defaults = Self::with_secret(fallback_secret);
        Ok(Self {
            secret: env::var("OTP_SECRET").unwrap_or(defaults.secret),
            code_length: defaults.code_length,
            ttl_minutes: parse_env("OTP_TTL_MINUTES", defaults.ttl_minutes)?,
            max_attempts: parse_env("OTP_MAX_ATTEMPTS", defaults.max_attempts)?,
            resend_interval_seconds: parse_env(
                "OTP_RESEND_INTERVAL_SECONDS",
                defaults.resend_interval_seconds,
            )?,
            registration_window_minutes: parse_env(
                "OTP_REGISTRATION_WINDOW_MINUTES",
                defaults.registration_window_minutes,
            )?,
        })
    }

    pub fn with_secret(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
            code_length: 6,
            ttl_minutes: 5,
            max_attempts: 3,
            resend_interval_seconds: 60,
            registration_window_minutes: 15,
        }
    }
}

/// 起動時に投入する初期管理者
#[derive(Clone, Debug)]
pub struct InitialAdminConfig {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

impl InitialAdminConfig {
    fn from_env() -> Option<Self> {
        let email = env::var("INITIAL_ADMIN_EMAIL").ok()?;
        let password_hash = env::var("INITIAL_ADMIN_PASSWORD_HASH").ok()?;
        Some(Self {
            email,
            name: env::var("INITIAL_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
            password_hash,
        })
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub database_url: String,
    pub frontend_url: String,
    pub security: SecurityConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub argon2: Argon2Config,
    pub password_policy: PasswordPolicy,
    pub email: EmailConfig,
    pub otp: OtpConfig,
    pub initial_admin: Option<InitialAdminConfig>,
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| format!("Invalid {} value: {}", key, value)),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let is_production = environment == "production";

        let jwt = JwtConfig::from_env().map_err(|e| e.to_string())?;
        let email = EmailConfig::from_env().map_err(|e| e.to_string())?;
        let otp = OtpConfig::from_env(&jwt.secret_key)?;

        Ok(Self {
            environment,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_env("PORT", 5000)?,
            cors_allowed_origins: split_origins(
                &env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            ),
            database_url: env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            security: SecurityConfig {
                cookie_secure: is_production,
            },
            server: ServerConfig {
                body_limit: parse_env("BODY_LIMIT_BYTES", 2 * 1024 * 1024)?,
            },
            jwt,
            argon2: Argon2Config::from_env(),
            password_policy: PasswordPolicy::from_env(),
            email,
            otp,
            initial_admin: InitialAdminConfig::from_env(),
        })
    }

    pub fn is_test(&self) -> bool {
        self.environment == "test"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// テスト用の設定を作成
    pub fn for_testing() -> Self {
        let jwt = JwtConfig {
            secret_key: "test-secret-key-that-is-at-least-32-characters-long".to_string(),
            ..JwtConfig::default()
        };

        Self {
            environment: "test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors_allowed_origins: vec!["http://localhost:3001".to_string()],
            database_url: "sqlite::memory:".to_string(),
            frontend_url: "http://localhost:3001".to_string(),
            security: SecurityConfig {
                cookie_secure: false,
            },
            server: ServerConfig {
                body_limit: 2 * 1024 * 1024,
            },
            otp: OtpConfig::with_secret("test-otp-secret"),
            jwt,
            argon2: Argon2Config::for_testing(),
            password_policy: PasswordPolicy::default(),
            email: EmailConfig::default(),
            initial_admin: None,
        }
    }
}
