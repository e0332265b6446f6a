use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use courier_core::config::Config;
use courier_core::tracing::init_tracing;

use courier_dispatch::config::DispatchConfig;
use courier_dispatch::infra::channel::HttpChannelGateway;
use courier_dispatch::router::build_router;
use courier_dispatch::state::AppState;
use courier_dispatch::usecase::signature::WebhookVerifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = DispatchConfig::from_env().context("load dispatch config")?;
    init_tracing(config.log_format);

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;

    let gateway = HttpChannelGateway::new(config.channel_settings(), config.retry_policy())?;
    let verifier = WebhookVerifier::new(config.channel_secret.clone());
    if !verifier.is_configured() {
        tracing::warn!("CHANNEL_SECRET not set, webhook signatures will not be verified");
    }

    let state = AppState {
        db,
        gateway,
        verifier,
        scheduler_secret: config.scheduler_secret.clone(),
        scheduler_deadline: config.scheduler_deadline(),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.dispatch_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!("dispatch service listening on {addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
