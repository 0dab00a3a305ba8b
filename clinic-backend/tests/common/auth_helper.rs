// tests/common/auth_helper.rs

use axum::http::StatusCode;
use clinic_backend::config::InitialAdminConfig;
use clinic_backend::domain::otp_model::OtpPurpose;
use clinic_backend::utils::password::{Argon2Config, PasswordManager, PasswordPolicy};
use serde_json::{json, Value};
use uuid::Uuid;

use super::app_helper::TestApp;
use super::request::send;

pub const TEST_PASSWORD: &str = "Clinic#Visit2481";

/// テスト用のログイン済みアカウント
#[derive(Debug, Clone)]
pub struct TestAccount {
    pub id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestAccount {
    fn from_auth_response(email: &str, data: &Value) -> Self {
        Self {
            id: Uuid::parse_str(data["account"]["account_id"].as_str().unwrap()).unwrap(),
            email: email.to_string(),
            access_token: data["tokens"]["access_token"].as_str().unwrap().to_string(),
            refresh_token: data["tokens"]["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        Some(self.access_token.as_str())
    }
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

pub async fn signin(app: &TestApp, email: &str, password: &str) -> TestAccount {
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/signin",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "signin failed: {}", body);
    TestAccount::from_auth_response(email, &body["data"])
}

/// 初期管理者を投入してログインする
pub async fn create_admin(app: &TestApp) -> TestAccount {
    let email = unique_email("admin");
    let password_hash = PasswordManager::new(Argon2Config::for_testing(), PasswordPolicy::default())
        .unwrap()
        .hash_password(TEST_PASSWORD)
        .unwrap();

    app.state
        .auth_service
        .seed_initial_admin(&InitialAdminConfig {
            email: email.clone(),
            name: "Test Admin".to_string(),
            password_hash,
        })
        .await
        .unwrap();

    signin(app, &email, TEST_PASSWORD).await
}

/// 登録用OTPを検証済みにする（平文コードはサービスから直接受け取る）
pub async fn verify_registration_email(app: &TestApp, email: &str) {
    let issued = app
        .state
        .otp_service
        .issue(email, OtpPurpose::Registration)
        .await
        .unwrap();

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/otp/verify",
        None,
        Some(json!({ "email": email, "purpose": "registration", "code": issued.code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "otp verify failed: {}", body);
}

pub fn signup_body(email: &str) -> Value {
    json!({
        "email": email,
        "first_name": "Hana",
        "last_name": "Sato",
        "phone": "+81 90-1234-5678",
        "password": TEST_PASSWORD,
    })
}

/// 患者としてOTP検証からサインアップまで行う
pub async fn register_patient(app: &TestApp) -> TestAccount {
    let email = unique_email("patient");
    verify_registration_email(app, &email).await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/signup",
        None,
        Some(signup_body(&email)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
    TestAccount::from_auth_response(&email, &body["data"])
}

/// 管理者がスタッフ・医師アカウントを作ってログインする
pub async fn create_staff_account(app: &TestApp, admin: &TestAccount, role: &str) -> TestAccount {
    let email = unique_email(role);
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/users",
        admin.token(),
        Some(json!({
            "email": email,
            "first_name": "Ken",
            "last_name": "Mori",
            "role": role,
            "password": TEST_PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create user failed: {}", body);

    signin(app, &email, TEST_PASSWORD).await
}

/// 医師の職員レコードを作成してIDを返す
pub async fn create_doctor(app: &TestApp, admin: &TestAccount) -> Uuid {
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/personnels",
        admin.token(),
        Some(json!({
            "first_name": "Yuki",
            "last_name": "Tanaka",
            "position": "doctor",
            "specialization": "Internal medicine",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create personnel failed: {}", body);
    Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap()
}
