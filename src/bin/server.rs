use shop_ask::server::{router, AppState};
use shop_ask::utils::{logger, validation::Validate};
use shop_ask::{AppConfig, AskPipeline, StubAnalytics};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 配置檔路徑由環境變數提供
    let config_path = std::env::var("SHOP_ASK_CONFIG").ok().map(PathBuf::from);

    let config = AppConfig::load(config_path.as_deref())?;
    logger::init_server_logger(config.logging.level.as_deref(), config.logging.json);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let pipeline = AskPipeline::from_settings(StubAnalytics::new(), &config);
    let app = router(AppState::new(pipeline));

    let listener = tokio::net::TcpListener::bind(config.server.bind_address.as_str()).await?;
    tracing::info!("🚀 shop-ask server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
