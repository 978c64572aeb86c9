use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use quiz_backend::{
    config::{get_config, init_config},
    database::{
        pool::{create_pool, run_migrations},
        quiz_store::PgQuizStore,
    },
    middleware::cors::frontend_cors,
    routes,
    services::ai_service::AIService,
    AppState,
};
use reqwest::Client;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    init_config()?;
    let config = get_config()?;
    info!("Starting up Quiz Generator API...");

    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;

    let http_client = Client::builder()
        .timeout(Duration::from_secs(config.model_timeout_secs))
        .build()?;
    let ai_service = AIService::from_config(config, http_client);

    match &ai_service {
        Some(ai) => {
            if ai.test_connection().await {
                info!("Gemini API connection successful");
            } else {
                warn!("Gemini API connection test failed");
            }
        }
        None => warn!("GEMINI_API_KEY not set; quiz generation disabled, feedback uses templates"),
    }

    let store = Arc::new(PgQuizStore::new(pool));
    let app_state = AppState::new(store, ai_service, config.quiz.clone());
    let app = routes::create_router(app_state, frontend_cors(&config.frontend_url));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down Quiz Generator API...");
        })
        .await?;

    Ok(())
}
