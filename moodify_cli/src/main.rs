
use anyhow::{Context, Result};
use lib::service::card_service::CARD_FILE_NAME;
use lib::service::catalog_service::is_placeholder;
use lib::service::MoodifyService;
use lib::session::MoodSession;
use tracing_subscriber::EnvFilter;


#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let image_path = args.next().context("usage: moodify_cli <image> [mood]")?;
    let mood_override = args.next();

    let image_bytes =
        std::fs::read(&image_path).with_context(|| format!("unable to read {}", image_path))?;

    let mut session = MoodSession::new();
    session.set_image(image_bytes);
    if let Some(mood) = &mood_override {
        session.set_mood_override(mood);
    }

    let service = MoodifyService::new();
    let request = session.to_request().context("no image selected")?;
    let outcome = service.run(&request).await?;

    match &outcome.degraded_reason {
        Some(reason) => println!("mood: {} (fallback: {})", outcome.emotion.label, reason),
        None => println!(
            "mood: {} (confidence {:.0}%)",
            outcome.emotion.label,
            outcome.emotion.confidence * 100.0
        ),
    }
    if outcome.effective_mood != outcome.emotion.label {
        println!("using override mood: {}", outcome.effective_mood);
    }

    if outcome.playlist.is_empty() {
        println!("no tracks found for this mood");
    }
    for track in &outcome.playlist {
        let cover = if is_placeholder(track.thumbnail_url.as_deref()) {
            "no cover"
        } else {
            "cover"
        };
        println!(
            "- {} by {} [{}] {}",
            track.name, track.artist, cover, track.destination_url
        );
    }

    if let Some(card) = &outcome.card {
        std::fs::write(CARD_FILE_NAME, card)
            .with_context(|| format!("unable to write {}", CARD_FILE_NAME))?;
        println!("card written to {}", CARD_FILE_NAME);
    }

    session.reset();
    Ok(())
}
