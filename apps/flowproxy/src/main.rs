use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use flowproxy_provider::{FlowProvider, UpstreamClientConfig, WreqUpstreamClient};
use flowproxy_router::{ApiKeyAuth, AppState, router};
use tracing::info;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("flowproxy failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = Arc::new(cli.flow_config());
    info!(
        base_url = %config.base_url(),
        bearer_token_set = config.bearer_token.is_some(),
        api_key_set = cli.api_key().is_some(),
        models = config.model_map.len(),
        timeout_secs = config.request_timeout.as_secs(),
        proxy = %config.proxy.as_deref().unwrap_or(""),
        "config loaded"
    );

    let client = WreqUpstreamClient::new(UpstreamClientConfig::from_flow(&config))?;
    let state = AppState {
        provider: FlowProvider::new(config, Arc::new(client)),
        auth: ApiKeyAuth::new(cli.api_key()),
    };
    let app = router(Arc::new(state));

    let bind = cli.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(addr = %bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "flowproxy=info,flowproxy_provider=info,flowproxy_router=info",
        )
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
