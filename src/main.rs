use tracing_subscriber::EnvFilter;

use feedback_api::config::config;
use feedback_api::handlers;
use feedback_api::state::AppState;
use feedback_api::store::postgres;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config();

    let state = match &config.database_url {
        Some(url) => {
            let pool = match postgres::connect(url, config.database_max_connections).await {
                Ok(pool) => pool,
                Err(err) => {
                    tracing::error!("failed to connect to database: {err}");
                    std::process::exit(1);
                }
            };
            if let Err(err) = postgres::ensure_schema(&pool).await {
                tracing::error!("failed to apply schema: {err}");
                std::process::exit(1);
            }
            tracing::info!("using postgres store");
            AppState::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, falling back to in-memory store");
            AppState::in_memory()
        }
    };

    let app = handlers::routes(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind {addr}: {err}");
            std::process::exit(1);
        }
    };
    tracing::info!("listening on {addr}");

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("server error: {err}");
        std::process::exit(1);
    }
}
