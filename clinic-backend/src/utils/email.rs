// src/utils/email.rs

use crate::domain::otp_model::OtpPurpose;
use crate::error::{AppError, AppResult};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::env;
use thiserror::Error;
use tracing::{error, info};

/// メール送信エラー
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("SMTP configuration error: {0}")]
    ConfigurationError(String),

    #[error("Failed to send email: {0}")]
    SendError(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Missing email configuration")]
    MissingConfiguration,
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        match err {
            EmailError::InvalidAddress(addr) => {
                AppError::ValidationError(format!("Invalid email address: {}", addr))
            }
            other => AppError::ExternalServiceError(other.to_string()),
        }
    }
}

/// メール設定
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    /// 送信者メールアドレス
    pub from_email: String,
    /// 送信者名
    pub from_name: String,
    /// STARTTLS を使用するか
    pub use_tls: bool,
    /// 開発モードかどうか（ログ出力のみ）
    pub development_mode: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@clinic.example.com".to_string(),
            from_name: "Clinic".to_string(),
            use_tls: true,
            development_mode: true,
        }
    }
}

impl EmailConfig {
    /// 環境変数から設定を読み込み
    pub fn from_env() -> Result<Self, EmailError> {
        let development_mode = env::var("EMAIL_DEVELOPMENT_MODE")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        if development_mode {
            return Ok(Self {
                development_mode: true,
                ..Default::default()
            });
        }

        let smtp_host = env::var("SMTP_HOST").map_err(|_| EmailError::MissingConfiguration)?;
        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .map_err(|_| EmailError::ConfigurationError("Invalid SMTP port".to_string()))?;
        let smtp_username =
            env::var("SMTP_USERNAME").map_err(|_| EmailError::MissingConfiguration)?;
        let smtp_password =
            env::var("SMTP_PASSWORD").map_err(|_| EmailError::MissingConfiguration)?;
        let from_email = env::var("FROM_EMAIL").map_err(|_| EmailError::MissingConfiguration)?;
        let from_name = env::var("FROM_NAME").unwrap_or_else(|_| "Clinic".to_string());
        let use_tls = env::var("SMTP_USE_TLS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_email,
            from_name,
            use_tls,
            development_mode: false,
        })
    }

    pub fn validate(&self) -> Result<(), EmailError> {
        if self.development_mode {
            return Ok(());
        }

        if self.smtp_host.is_empty() {
            return Err(EmailError::ConfigurationError(
                "SMTP host is required".to_string(),
            ));
        }

        if !is_valid_email(&self.from_email) {
            return Err(EmailError::InvalidAddress(self.from_email.clone()));
        }

        Ok(())
    }
}

/// メール送信内容
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// メール送信サービス
pub struct EmailService {
    config: EmailConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        config.validate()?;

        let transport = if config.development_mode {
            None
        } else {
            Some(build_transport(&config)?)
        };

        Ok(Self { config, transport })
    }

    /// メールを送信
    pub async fn send_email(&self, message: EmailMessage) -> AppResult<()> {
        if !is_valid_email(&message.to_email) {
            return Err(EmailError::InvalidAddress(message.to_email).into());
        }

        let Some(transport) = &self.transport else {
            self.log_email(&message);
            return Ok(());
        };

        let email = self.build_message(&message)?;
        transport.send(email).await.map_err(|e| {
            error!(
                to_email = %mask_email(&message.to_email),
                error = %e,
                "Failed to send email"
            );
            EmailError::SendError(e.to_string())
        })?;

        info!(
            to_email = %mask_email(&message.to_email),
            subject = %message.subject,
            "Email sent successfully"
        );

        Ok(())
    }

    /// ワンタイムコードを送信
    pub async fn send_otp_email(
        &self,
        to_email: &str,
        purpose: OtpPurpose,
        code: &str,
        ttl_minutes: i64,
    ) -> AppResult<()> {
        let (subject, lead) = match purpose {
            OtpPurpose::Registration => (
                "Your registration code",
                "Use the following code to finish creating your clinic account.",
            ),
            OtpPurpose::PasswordReset => (
                "Your password reset code",
                "Use the following code to reset your clinic account password.",
            ),
        };

        let text_body = format!(
            "{}\n\nCode: {}\n\nThis code expires in {} minutes. If you did not request it, you can ignore this email.",
            lead, code, ttl_minutes
        );
        let html_body = format!(
            "<p>{}</p><p style=\"font-size:24px;letter-spacing:4px\"><strong>{}</strong></p><p>This code expires in {} minutes. If you did not request it, you can ignore this email.</p>",
            lead, code, ttl_minutes
        );

        self.send_email(EmailMessage {
            to_email: to_email.to_string(),
            to_name: None,
            subject: subject.to_string(),
            html_body,
            text_body,
        })
        .await
    }

    /// 登録完了メールを送信
    pub async fn send_welcome_email(&self, to_email: &str, to_name: &str) -> AppResult<()> {
        let text_body = format!(
            "Hello {},\n\nYour clinic account is ready. You can now sign in and book appointments.",
            to_name
        );
        let html_body = format!(
            "<p>Hello {},</p><p>Your clinic account is ready. You can now sign in and book appointments.</p>",
            to_name
        );

        self.send_email(EmailMessage {
            to_email: to_email.to_string(),
            to_name: Some(to_name.to_string()),
            subject: "Welcome to the clinic".to_string(),
            html_body,
            text_body,
        })
        .await
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, EmailError> {
        let from = parse_mailbox(Some(&self.config.from_name), &self.config.from_email)?;
        let to = parse_mailbox(message.to_name.as_deref(), &message.to_email)?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                message.html_body.clone(),
            ))
            .map_err(|e| EmailError::SendError(e.to_string()))
    }

    /// 開発モードでのメールログ出力
    fn log_email(&self, message: &EmailMessage) {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.text_body,
            "EMAIL (Development Mode)"
        );
    }
}

fn build_transport(
    config: &EmailConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
    let builder = if config.use_tls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| EmailError::ConfigurationError(e.to_string()))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
    };

    let mut builder = builder.port(config.smtp_port);
    if !config.smtp_username.is_empty() {
        builder = builder.credentials(Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        ));
    }

    Ok(builder.build())
}

fn parse_mailbox(name: Option<&str>, email: &str) -> Result<Mailbox, EmailError> {
    let address = email
        .parse()
        .map_err(|_| EmailError::InvalidAddress(email.to_string()))?;
    Ok(Mailbox::new(name.map(str::to_string), address))
}

/// 照合用にメールアドレスを正規化（前後の空白除去・小文字化）
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 簡単なメールアドレス検証
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// メールアドレスをマスク
pub fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let masked_local = if local.len() <= 2 {
            "*".repeat(local.len())
        } else {
            format!("{}****", &local[..1])
        };
        format!("{}{}", masked_local, domain)
    } else {
        "****@****".to_string()
    }
}
