
use crate::pipeline::PlaylistRequest;
use crate::service::mood_map;

// One user interaction's worth of state: the last selected image and an
// optional manual mood override. Owned by the caller and cleared explicitly,
// never shared between interactions.
#[derive(Debug, Default, Clone)]
pub struct MoodSession {
    image: Option<Vec<u8>>,
    mood_override: Option<String>,
}

impl MoodSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_image(&mut self, image: Vec<u8>) {
        self.image = Some(image);
    }

    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }

    pub fn set_mood_override(&mut self, mood: &str) {
        let normalized = mood_map::normalize(mood);
        self.mood_override = if normalized.is_empty() {
            None
        } else {
            Some(normalized)
        };
    }

    pub fn mood_override(&self) -> Option<&str> {
        self.mood_override.as_deref()
    }

    pub fn reset(&mut self) {
        self.image = None;
        self.mood_override = None;
    }

    // None until an image has been selected.
    pub fn to_request(&self) -> Option<PlaylistRequest> {
        let image = self.image.clone()?;
        let mut request = PlaylistRequest::new(image);
        request.mood_override = self.mood_override.clone();
        Some(request)
    }
}
