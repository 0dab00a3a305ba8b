pub mod app;

pub use app::{AppConfig, InitialAdminConfig, OtpConfig, SecurityConfig, ServerConfig};
