pub static HF_TOKEN: &str = "HF_TOKEN";
pub static LASTFM_API_KEY: &str = "LASTFM_API_KEY";

pub static CARD_FONT_PATH: &str = "CARD_FONT_PATH";
pub static PORT: &str = "PORT";
