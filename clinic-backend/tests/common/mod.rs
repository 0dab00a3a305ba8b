// tests/common/mod.rs
#![allow(dead_code)]

pub mod app_helper;
pub mod auth_helper;
pub mod fixture_helper;
pub mod request;

use std::sync::Once;

static INIT: Once = Once::new();

/// テスト環境を初期化（ログは一度だけ登録）
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("clinic_backend=debug,tower_http=info")
            .with_test_writer()
            .try_init();
    });
}
