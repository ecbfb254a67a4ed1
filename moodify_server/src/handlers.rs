
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use lib::pipeline::PlaylistRequest;
use lib::service::card_service::CARD_FILE_NAME;
use lib::service::catalog_service::DEFAULT_TRACK_LIMIT;
use lib::service::MoodifyService;


#[derive(Debug, Deserialize)]
pub struct PlaylistParams {
    pub mood: Option<String>,
    pub limit: Option<usize>,
    pub variety: Option<bool>,
    pub seed: Option<u64>,
}

fn build_error_response(status: StatusCode, message: &str) -> Response {
    let mut json_header = HeaderMap::new();
    json_header.insert(CONTENT_TYPE, "application/json".parse().unwrap());

    let body = json!({
        "success": false,
        "message": message
    });
    (status, json_header, body.to_string()).into_response()
}

fn build_success_response(body: &Value) -> Response {
    let mut json_header = HeaderMap::new();
    json_header.insert(CONTENT_TYPE, "application/json".parse().unwrap());
    (json_header, body.to_string()).into_response()
}

fn to_pipeline_request(params: &PlaylistParams, image: Bytes, render_card: bool) -> PlaylistRequest {
    let mut request = PlaylistRequest::new(image.to_vec());
    request.mood_override = params.mood.clone();
    request.limit = params.limit.unwrap_or(DEFAULT_TRACK_LIMIT);
    request.variety = params.variety.unwrap_or(false);
    request.seed = params.seed;
    request.render_card = render_card;
    request
}


pub async fn playlist_requested(
    State(service): State<MoodifyService>,
    Query(params): Query<PlaylistParams>,
    image: Bytes,
) -> Response {
    let request_id = Uuid::new_v4();
    tracing::info!("request {}: playlist, {} image bytes", request_id, image.len());

    if image.is_empty() {
        return build_error_response(StatusCode::BAD_REQUEST, "missing image body");
    }

    let request = to_pipeline_request(&params, image, false);
    let outcome = match service.run(&request).await {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::error!("request {}: pipeline failed: {:?}", request_id, error);
            return build_error_response(StatusCode::BAD_GATEWAY, "catalog lookup failed");
        }
    };

    let mut body = json!({
        "success": true,
        "emotion": outcome.emotion.label,
        "confidence": outcome.emotion.confidence,
        "effective_mood": outcome.effective_mood,
        "tracks": outcome.playlist,
    });
    if let Some(reason) = outcome.degraded_reason {
        body["degraded_reason"] = json!(reason);
    }
    build_success_response(&body)
}


pub async fn card_requested(
    State(service): State<MoodifyService>,
    Query(params): Query<PlaylistParams>,
    image: Bytes,
) -> Response {
    let request_id = Uuid::new_v4();
    tracing::info!("request {}: card, {} image bytes", request_id, image.len());

    if image.is_empty() {
        return build_error_response(StatusCode::BAD_REQUEST, "missing image body");
    }

    let request = to_pipeline_request(&params, image, true);
    let outcome = match service.run(&request).await {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::error!("request {}: pipeline failed: {:?}", request_id, error);
            return build_error_response(StatusCode::BAD_GATEWAY, "catalog lookup failed");
        }
    };

    let Some(card) = outcome.card else {
        if outcome.playlist.is_empty() {
            return build_error_response(StatusCode::NOT_FOUND, "no tracks found for this mood");
        }
        return build_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "card rendering unavailable",
        );
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, "image/png".parse().unwrap());
    headers.insert(
        CONTENT_DISPOSITION,
        format!("attachment; filename=\"{}\"", CARD_FILE_NAME)
            .parse()
            .unwrap(),
    );
    (headers, card).into_response()
}
