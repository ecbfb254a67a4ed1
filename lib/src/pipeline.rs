
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::service::catalog_service::DEFAULT_TRACK_LIMIT;
use crate::service::common_structs::{EmotionResult, TrackRecord};
use crate::service::mood_map;
use crate::service::MoodifyService;


#[derive(Debug, Clone)]
pub struct PlaylistRequest {
    pub image: Vec<u8>,
    pub mood_override: Option<String>,
    pub limit: usize,
    // pick a random query phrase instead of the fixed tag lookup
    pub variety: bool,
    pub seed: Option<u64>,
    pub render_card: bool,
}

impl PlaylistRequest {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            mood_override: None,
            limit: DEFAULT_TRACK_LIMIT,
            variety: false,
            seed: None,
            render_card: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    // always the original detection, even when an override drove the query
    pub emotion: EmotionResult,
    pub degraded_reason: Option<String>,
    pub effective_mood: String,
    pub playlist: Vec<TrackRecord>,
    pub card: Option<Vec<u8>>,
}

impl MoodifyService {
    // classify -> map -> search -> render. Classification and card problems
    // degrade in place; catalog errors are the caller's to handle.
    pub async fn run(&self, request: &PlaylistRequest) -> Result<PipelineOutcome> {
        let classification = self.emotion.classify(&request.image).await;
        let detected = classification.result().clone();
        let degraded_reason = classification.degraded_reason().map(|reason| reason.to_owned());

        let effective_mood = match &request.mood_override {
            Some(mood) if !mood.trim().is_empty() => mood_map::normalize(mood),
            _ => detected.label.clone(),
        };

        let playlist = if request.variety {
            let mut rng = match request.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let phrase = mood_map::pick_query_phrase(&effective_mood, &mut rng);
            tracing::info!("searching catalog for: {}", phrase);
            self.catalog.search_tracks(phrase, request.limit).await?
        } else {
            let tag = mood_map::tag_for_mood(&effective_mood);
            tracing::info!("fetching top tracks for tag: {}", tag);
            self.catalog.top_tracks(tag, request.limit).await?
        };

        let card = if request.render_card {
            match playlist.first() {
                Some(track) => match self.card.render_card(&effective_mood, track).await {
                    Ok(buffer) => Some(buffer),
                    Err(error) => {
                        tracing::warn!("card rendering failed: {}", error);
                        None
                    }
                },
                None => None,
            }
        } else {
            None
        };

        Ok(PipelineOutcome {
            emotion: detected,
            degraded_reason,
            effective_mood,
            playlist,
            card,
        })
    }
}
