mod error;
mod properties;
mod router;
mod telemetry;

use std::net::SocketAddr;

use tracing::info;

use estate_core::ReviewRules;
use estate_storage::Database;
use estate_util::{load_env_file, AppConfig, ReviewValidation};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let database = Database::connect(&config.database_url).await?;
    database.run_migrations().await?;
    info!(stage = "storage", "document store ready");

    let review_rules = review_rules(config.review_validation);
    info!(stage = "app", review_validation = config.review_validation.as_str(), "review rules configured");

    let state = router::AppState::new(metrics, database, review_rules);

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}

fn review_rules(validation: ReviewValidation) -> ReviewRules {
    match validation {
        ReviewValidation::Lenient => ReviewRules::Lenient,
        ReviewValidation::Strict {
            rating_min,
            rating_max,
        } => ReviewRules::Strict {
            rating_min,
            rating_max,
        },
    }
}
