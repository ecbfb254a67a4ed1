
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use reqwest::Client;

use crate::env_keys::CARD_FONT_PATH;
use super::catalog_service::is_placeholder;
use super::common_structs::TrackRecord;
use super::mood_map;

pub const CARD_WIDTH: u32 = 1080;
pub const CARD_HEIGHT: u32 = 1920;
pub const CARD_FILE_NAME: &str = "moodify_card.png";

const THUMB_SIZE: u32 = 600;
const THUMB_CENTER_Y: i64 = 760;
const THUMB_RING_WIDTH: f32 = 6.0;
const THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(10);

const TEXT_MAX_WIDTH: u32 = 920;
const SCALE_STEP: f32 = 6.0;
const MIN_SCALE: f32 = 44.0;
const MOOD_BASE_SCALE: f32 = 120.0;
const TRACK_BASE_SCALE: f32 = 72.0;
const ARTIST_BASE_SCALE: f32 = 56.0;
const BRANDING_SCALE: f32 = 40.0;

const MOOD_TEXT_Y: i32 = 260;
const TRACK_TEXT_Y: i32 = 1260;
const ARTIST_TEXT_Y: i32 = 1370;
const BRANDING_TEXT_Y: i32 = 1780;

const BRANDING: &str = "Moodify | Photo-to-Playlist";
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);


#[derive(Debug, Clone)]
pub struct CardService {
    client: Client,
}

impl CardService {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    // The card is regenerated fresh for every request and only the png
    // encoding itself can fail; a missing thumbnail or font just leaves the
    // card plainer.
    pub async fn render_card(&self, mood: &str, track: &TrackRecord) -> Result<Vec<u8>> {
        let mood = mood_map::normalize(mood);
        let mut canvas = RgbaImage::new(CARD_WIDTH, CARD_HEIGHT);

        let (top, bottom) = gradient_colors(&mood);
        draw_gradient(&mut canvas, top, bottom);

        if let Some(thumbnail) = self.fetch_thumbnail(track.thumbnail_url.as_deref()).await {
            let masked = circular_thumbnail(&thumbnail);
            let x = ((CARD_WIDTH - THUMB_SIZE) / 2) as i64;
            let y = THUMB_CENTER_Y - (THUMB_SIZE as i64) / 2;
            imageops::overlay(&mut canvas, &masked, x, y);
        }

        if let Some(font) = resolve_font() {
            let headline = format!("{} mood", title_case(&mood));
            draw_centered_text(&mut canvas, &font, MOOD_BASE_SCALE, MOOD_TEXT_Y, &headline);
            draw_centered_text(&mut canvas, &font, TRACK_BASE_SCALE, TRACK_TEXT_Y, &track.name);
            draw_centered_text(&mut canvas, &font, ARTIST_BASE_SCALE, ARTIST_TEXT_Y, &track.artist);
            draw_centered_text(&mut canvas, &font, BRANDING_SCALE, BRANDING_TEXT_Y, BRANDING);
        }

        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut buffer, ImageFormat::Png)
            .context("failed to encode card png")?;
        Ok(buffer.into_inner())
    }

    // Missing url, placeholder, network, http and decode problems all end
    // up as None; the card still renders.
    async fn fetch_thumbnail(&self, url: Option<&str>) -> Option<DynamicImage> {
        if is_placeholder(url) {
            return None;
        }
        let url = url?;

        let response = match self
            .client
            .get(url)
            .timeout(THUMBNAIL_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!("thumbnail fetch failed for {}: {}", url, error);
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::warn!("thumbnail fetch for {} returned {}", url, response.status());
            return None;
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!("thumbnail body read failed for {}: {}", url, error);
                return None;
            }
        };
        match image::load_from_memory(&bytes) {
            Ok(decoded) => Some(decoded),
            Err(error) => {
                tracing::warn!("thumbnail decode failed for {}: {}", url, error);
                None
            }
        }
    }
}

impl Default for CardService {
    fn default() -> Self {
        Self::new()
    }
}


fn gradient_colors(mood: &str) -> ([u8; 3], [u8; 3]) {
    match mood {
        "happy" => ([255, 200, 87], [255, 95, 109]),
        "sad" => ([58, 97, 134], [17, 23, 43]),
        "angry" => ([155, 27, 48], [36, 8, 16]),
        "fear" => ([66, 39, 90], [17, 17, 34]),
        "disgust" => ([74, 103, 65], [24, 34, 20]),
        "surprise" => ([255, 126, 185], [255, 187, 92]),
        "neutral" => ([136, 150, 164], [52, 58, 64]),
        _ => ([120, 120, 120], [60, 60, 60]),
    }
}

fn draw_gradient(canvas: &mut RgbaImage, top: [u8; 3], bottom: [u8; 3]) {
    let rows = canvas.height();
    let span = rows.saturating_sub(1).max(1) as f32;
    for y in 0..rows {
        let t = y as f32 / span;
        let pixel = Rgba([
            lerp(top[0], bottom[0], t),
            lerp(top[1], bottom[1], t),
            lerp(top[2], bottom[2], t),
            255,
        ]);
        for x in 0..canvas.width() {
            canvas.put_pixel(x, y, pixel);
        }
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

// Square resize, then a circular alpha mask with a thin white ring.
fn circular_thumbnail(thumbnail: &DynamicImage) -> RgbaImage {
    let square = thumbnail
        .resize_exact(THUMB_SIZE, THUMB_SIZE, FilterType::Lanczos3)
        .to_rgba8();
    let mut masked = RgbaImage::new(THUMB_SIZE, THUMB_SIZE);
    let center = THUMB_SIZE as f32 / 2.0;
    let radius = center;
    let ring_inner = radius - THUMB_RING_WIDTH;

    for y in 0..THUMB_SIZE {
        for x in 0..THUMB_SIZE {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let distance = (dx * dx + dy * dy).sqrt();
            let pixel = if distance > radius {
                Rgba([0, 0, 0, 0])
            } else if distance > ring_inner {
                Rgba([255, 255, 255, 255])
            } else {
                *square.get_pixel(x, y)
            };
            masked.put_pixel(x, y, pixel);
        }
    }
    masked
}

// Configured font first, then the usual system locations. No match means
// the card renders without text.
fn font_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(configured) = std::env::var(CARD_FONT_PATH) {
        if !configured.is_empty() {
            candidates.push(PathBuf::from(configured));
        }
    }
    candidates.push(PathBuf::from(
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    ));
    candidates.push(PathBuf::from(
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    ));
    candidates.push(PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"));
    candidates.push(PathBuf::from(
        "/System/Library/Fonts/Supplemental/Arial.ttf",
    ));
    candidates
}

fn resolve_font() -> Option<FontVec> {
    for path in font_candidates() {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => return Some(font),
            Err(error) => {
                tracing::warn!("unusable card font {}: {}", path.display(), error);
            }
        }
    }
    tracing::warn!("no usable card font found, rendering card without text");
    None
}

// Shrink from the base size until the measured width fits the budget,
// floored at the minimum size.
fn shrink_to_fit(width_at: impl Fn(f32) -> u32, base: f32, min: f32, step: f32, max_width: u32) -> f32 {
    let mut scale = base;
    while width_at(scale) > max_width && scale > min {
        scale = (scale - step).max(min);
    }
    scale
}

fn draw_centered_text(canvas: &mut RgbaImage, font: &FontVec, base_scale: f32, y: i32, text: &str) {
    if text.is_empty() {
        return;
    }
    let fitted = shrink_to_fit(
        |scale| text_size(PxScale::from(scale), font, text).0,
        base_scale,
        MIN_SCALE,
        SCALE_STEP,
        TEXT_MAX_WIDTH,
    );
    let scale = PxScale::from(fitted);
    let (width, _) = text_size(scale, font, text);
    let x = (CARD_WIDTH.saturating_sub(width) / 2) as i32;
    draw_text_mut(canvas, TEXT_COLOR, x, y, scale, font, text);
}

fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn track_without_thumbnail() -> TrackRecord {
        TrackRecord {
            name: "Test Song".to_owned(),
            artist: "Test Artist".to_owned(),
            thumbnail_url: None,
            destination_url: "https://open.spotify.com/search/Test%20Artist%20Test%20Song"
                .to_owned(),
        }
    }

    #[tokio::test]
    async fn renders_a_png_at_the_fixed_dimensions_without_a_thumbnail() {
        let service = CardService::new();
        let buffer = service
            .render_card("happy", &track_without_thumbnail())
            .await
            .unwrap();

        let decoded = image::load_from_memory(&buffer).unwrap();
        assert_eq!(decoded.width(), CARD_WIDTH);
        assert_eq!(decoded.height(), CARD_HEIGHT);
    }

    #[tokio::test]
    async fn placeholder_thumbnail_is_ignored() {
        let mut track = track_without_thumbnail();
        track.thumbnail_url = Some(
            "https://lastfm.freetls.fastly.net/i/u/2a96cbd8b46e442fc41c2b86b821562f.png"
                .to_owned(),
        );
        let buffer = CardService::new().render_card("sad", &track).await.unwrap();
        let decoded = image::load_from_memory(&buffer).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (CARD_WIDTH, CARD_HEIGHT));
    }

    #[test]
    fn gradient_interpolates_between_the_endpoints() {
        let mut canvas = RgbaImage::new(4, 5);
        draw_gradient(&mut canvas, [0, 0, 0], [255, 255, 255]);
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(3, 4), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn unmapped_mood_gets_the_gray_pair() {
        assert_eq!(gradient_colors("contempt"), ([120, 120, 120], [60, 60, 60]));
        assert_ne!(gradient_colors("happy"), gradient_colors("contempt"));
    }

    #[test]
    fn circular_mask_clears_corners_and_keeps_the_center() {
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            10,
            10,
            Rgba([10, 20, 30, 255]),
        ));
        let masked = circular_thumbnail(&source);
        assert_eq!(masked.get_pixel(0, 0)[3], 0);
        assert_eq!(masked.get_pixel(THUMB_SIZE - 1, 0)[3], 0);
        assert_eq!(masked.get_pixel(THUMB_SIZE / 2, THUMB_SIZE / 2)[3], 255);
        // ring sits just inside the rim
        assert_eq!(
            masked.get_pixel(THUMB_SIZE / 2, 2),
            &Rgba([255, 255, 255, 255])
        );
    }

    #[test]
    fn shrink_to_fit_steps_down_until_the_budget_holds() {
        let fitted = shrink_to_fit(|scale| (scale * 10.0) as u32, 120.0, 44.0, 6.0, 800);
        assert_eq!(fitted, 78.0);
    }

    #[test]
    fn shrink_to_fit_respects_the_floor() {
        let fitted = shrink_to_fit(|_| u32::MAX, 120.0, 44.0, 6.0, 800);
        assert_eq!(fitted, 44.0);
    }

    #[test]
    fn shrink_to_fit_keeps_text_that_already_fits() {
        let fitted = shrink_to_fit(|_| 10, 40.0, 44.0, 6.0, 800);
        assert_eq!(fitted, 40.0);
    }

    #[test]
    fn configured_font_path_is_tried_first() {
        std::env::set_var("CARD_FONT_PATH", "/tmp/custom-font.ttf");
        let candidates = font_candidates();
        assert_eq!(candidates[0], PathBuf::from("/tmp/custom-font.ttf"));
        std::env::remove_var("CARD_FONT_PATH");
    }

    #[test]
    fn titles_the_mood_label() {
        assert_eq!(title_case("happy"), "Happy");
        assert_eq!(title_case(""), "");
    }
}
