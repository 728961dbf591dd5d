use lenscritic::{app, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "lenscritic=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init()?;
    tracing::info!(
        upload_dir = %state.config.upload_dir.display(),
        retention = ?state.config.retention,
        timeout = ?state.config.scoring.timeout,
        "scoring service configured"
    );

    let host = state.config.host.clone();
    let port = state.config.port;
    let router = app::build_app(state)?;
    app::serve(router, &host, port).await
}
