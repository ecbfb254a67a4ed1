
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;

use crate::env_keys::HF_TOKEN;
use crate::utilities::detect_image_mime;
use super::common_structs::{Classification, EmotionResult};

const MODEL_REPO: &str = "dima806/facial_emotions_image_detection";
const CLASSIFY_TIMEOUT: Duration = Duration::from_secs(60);


#[derive(Debug, Deserialize)]
struct ScoredLabel {
    label: String,
    score: f64,
}

#[derive(Debug, Clone)]
pub struct EmotionService {
    client: Client,
    endpoint: String,
}

impl EmotionService {
    pub fn new() -> Self {
        Self::with_endpoint(&format!(
            "https://router.huggingface.co/hf-inference/models/{}",
            MODEL_REPO
        ))
    }

    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_owned(),
        }
    }

    // Single attempt, no retry. Any failure degrades to the neutral
    // zero-confidence fallback carrying the reason; the pipeline keeps going.
    pub async fn classify(&self, image_bytes: &[u8]) -> Classification {
        match self.request_top_score(image_bytes).await {
            Ok(result) => Classification::Detected(result),
            Err(error) => {
                let reason = format!("emotion detection failed: {}", error);
                tracing::warn!("{}", reason);
                Classification::degraded(reason)
            }
        }
    }

    async fn request_top_score(&self, image_bytes: &[u8]) -> Result<EmotionResult> {
        if image_bytes.is_empty() {
            bail!("empty image");
        }
        let token = std::env::var(HF_TOKEN).context("HF_TOKEN not set")?;

        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", token);
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&bearer)?);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(detect_image_mime(image_bytes)),
        );

        let response = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .timeout(CLASSIFY_TIMEOUT)
            .body(image_bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        let body_string = response.text().await?;
        if !status.is_success() {
            bail!("classification endpoint returned {}: {}", status, body_string);
        }

        parse_classification(&body_string)
    }
}

impl Default for EmotionService {
    fn default() -> Self {
        Self::new()
    }
}

// The endpoint answers with a ranked list of {label, score} pairs, or with
// an error object.
pub(crate) fn parse_classification(body: &str) -> Result<EmotionResult> {
    let value: serde_json::Value =
        serde_json::from_str(body).context("classification response is not json")?;
    if let Some(error) = value.get("error") {
        bail!("classification endpoint error: {}", error);
    }

    let scores: Vec<ScoredLabel> =
        serde_json::from_value(value).context("unexpected classification response shape")?;
    let top = scores
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .context("classification response contained no labels")?;

    Ok(EmotionResult::new(&top.label, top.score))
}
