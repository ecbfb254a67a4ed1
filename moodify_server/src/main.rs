pub mod handlers;

use axum::routing::post;
use axum::Router;
use handlers::{card_requested, playlist_requested};
use lib::env_keys::PORT;
use lib::service::MoodifyService;
use tracing_subscriber::EnvFilter;


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let service = MoodifyService::new();

    let app = Router::new()
        .route("/playlist", post(playlist_requested))
        .route("/card", post(card_requested))
        .with_state(service);

    let port = std::env::var(PORT).unwrap_or_else(|_| "8080".to_owned());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
