pub mod card_service;
pub mod catalog_service;
pub mod common_structs;
pub mod emotion_service;
pub mod mood_map;


#[derive(Debug, Clone)]
pub struct MoodifyService {
    pub emotion: emotion_service::EmotionService,
    pub catalog: catalog_service::LastfmService,
    pub card: card_service::CardService,
}

impl MoodifyService {
    pub fn new() -> Self {
        Self {
            emotion: emotion_service::EmotionService::new(),
            catalog: catalog_service::LastfmService::new(),
            card: card_service::CardService::new(),
        }
    }
}

impl Default for MoodifyService {
    fn default() -> Self {
        Self::new()
    }
}
