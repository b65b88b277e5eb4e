use std::sync::Arc;

use confido_auth::{
    api::{build_router, start_api_server, ApiState},
    config::AppConfig,
    domain::SystemClock,
    mail::sender_from_config,
    observability::{init_observability, log_config_info},
    storage::create_pool,
    Result, APP_NAME, VERSION,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (optional - won't fail if missing)
    // This must happen before any config is read from environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = AppConfig::from_env();
    init_observability(&config.observability)?;

    info!(app_name = APP_NAME, version = VERSION, "Starting Confido authentication service");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e);
    }
    log_config_info(&config);

    let pool = create_pool(&config.database).await?;
    let mail_sender = sender_from_config(&config.mail)?;
    let state = ApiState::from_config(&config, pool.clone(), mail_sender, Arc::new(SystemClock))?;
    let router = build_router(state, &config.server);

    let result = start_api_server(&config.server, router).await;
    pool.close().await;

    if let Err(e) = &result {
        error!(error = %e, "API server terminated with error");
    }
    result
}
