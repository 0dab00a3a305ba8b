// src/main.rs
use clinic_backend::api::{create_app, AppState};
use clinic_backend::config::AppConfig;
use clinic_backend::db::create_db_pool;
use clinic_backend::logging::init_tracing;
use clinic_backend::repository::refresh_token_repository::RefreshTokenRepository;
use migration::{Migrator, MigratorTrait};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env は無くてもよい
    let _ = dotenvy::dotenv();

    init_tracing();
    tracing::info!("Starting Clinic Backend server...");

    // 設定を読み込む
    let app_config = AppConfig::from_env()?;
    tracing::info!(
        environment = %app_config.environment,
        addr = %app_config.server_addr(),
        "Configuration loaded"
    );

    // データベース接続を作成してマイグレーションを適用
    let db_pool = create_db_pool(&app_config).await?;
    Migrator::up(&db_pool, None).await?;
    tracing::info!("Database pool created and migrations applied.");

    let app_state = AppState::build(db_pool.clone(), &app_config)?;

    if let Some(initial_admin) = &app_config.initial_admin {
        match app_state.auth_service.seed_initial_admin(initial_admin).await? {
            Some(admin) => tracing::info!(admin_id = %admin.id, "Initial admin created"),
            None => tracing::debug!("Initial admin already exists"),
        }
    }

    // 起動時に期限切れのリフレッシュトークンを掃除する
    match RefreshTokenRepository::new(db_pool).delete_expired().await {
        Ok(deleted) => tracing::info!(deleted, "Expired refresh tokens removed"),
        Err(e) => tracing::warn!(error = %e, "Failed to remove expired refresh tokens"),
    }

    let app_router = create_app(app_state);

    // サーバーの起動
    let listener = TcpListener::bind(app_config.server_addr()).await?;
    tracing::info!("Router configured. Server listening on {}", app_config.server_addr());
    axum::serve(listener, app_router.into_make_service()).await?;

    Ok(())
}
