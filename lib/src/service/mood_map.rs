
use rand::seq::SliceRandom;
use rand::Rng;

pub const DEFAULT_TAG: &str = "pop";
pub const DEFAULT_QUERY_PHRASE: &str = "chill music";


pub fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

// Catalog tag per mood. "fear" and "disgust" land on tags with an actual
// track pool behind them.
pub fn tag_for_mood(label: &str) -> &'static str {
    match normalize(label).as_str() {
        "happy" => "happy",
        "sad" => "sad",
        "angry" => "angry",
        "fear" => "dark",
        "disgust" => "grunge",
        "surprise" => "funk",
        "neutral" => "chill",
        _ => DEFAULT_TAG,
    }
}

pub fn query_phrases_for_mood(label: &str) -> &'static [&'static str] {
    match normalize(label).as_str() {
        "happy" => &["happy music", "upbeat songs", "feel good playlist"],
        "sad" => &["sad songs", "acoustic chill", "lofi for sad vibes"],
        "angry" => &["angry music", "metal workout", "trap hype"],
        "fear" => &["dark ambient", "cinematic tension music"],
        "disgust" => &["grunge", "punk rock"],
        "surprise" => &["funk party", "synthwave"],
        "neutral" => &["chill vibes", "coffee shop playlist", "indie folk"],
        _ => &[DEFAULT_QUERY_PHRASE],
    }
}

// The rng comes from the caller so runs can be reproduced with a seed.
pub fn pick_query_phrase(label: &str, rng: &mut impl Rng) -> &'static str {
    query_phrases_for_mood(label)
        .choose(rng)
        .copied()
        .unwrap_or(DEFAULT_QUERY_PHRASE)
}
