use std::sync::Arc;

use intake::{
    app,
    models::AppState,
    services::messages::Messages,
    utils::static_object::{BIND_ADDR, LOG_FORMAT, UPLOAD_ROOT, UPLOAD_SETTINGS},
};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "intake=info".into());
    if LOG_FORMAT.as_str() == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let state = match AppState::new(
        UPLOAD_ROOT.clone(),
        UPLOAD_SETTINGS.clone(),
        Messages::english(),
    ) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Invalid upload settings: {}", e);
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(BIND_ADDR.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", BIND_ADDR.as_str(), e);
            std::process::exit(1);
        }
    };
    info!("Server starting at http://{}", BIND_ADDR.as_str());

    if let Err(e) = axum::serve(listener, app(state).into_make_service()).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
