
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::env_keys::LASTFM_API_KEY;
use super::common_structs::TrackRecord;

pub const DEFAULT_TRACK_LIMIT: usize = 10;

const CATALOG_ENDPOINT: &str = "https://ws.audioscrobbler.com/2.0/";
const CATALOG_TIMEOUT: Duration = Duration::from_secs(15);

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const PREFERRED_IMAGE_SIZE: &str = "large";

// Last.fm serves this image hash when it has no real cover for a track.
const PLACEHOLDER_SIGNATURE: &str = "2a96cbd8b46e442fc41c2b86b821562f";


pub fn is_placeholder(url: Option<&str>) -> bool {
    match url {
        None => true,
        Some(url) => url.is_empty() || url.contains(PLACEHOLDER_SIGNATURE),
    }
}


// tag.gettoptracks nests the artist as an object; track.search flattens it
// to a plain string. Both shapes normalize into TrackRecord.

#[derive(Debug, Deserialize)]
struct TopTracksResponse {
    tracks: TopTracksList,
}

#[derive(Debug, Deserialize)]
struct TopTracksList {
    #[serde(default)]
    track: Vec<TopTrackEntry>,
}

#[derive(Debug, Deserialize)]
struct TopTrackEntry {
    name: String,
    artist: Option<ArtistRef>,
    #[serde(default)]
    image: Vec<ImageRef>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: SearchResults,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    trackmatches: TrackMatches,
}

#[derive(Debug, Deserialize)]
struct TrackMatches {
    #[serde(default)]
    track: Vec<SearchTrackEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchTrackEntry {
    name: String,
    artist: Option<String>,
    #[serde(default)]
    image: Vec<ImageRef>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    #[serde(rename = "#text")]
    text: String,
    size: Option<String>,
}


#[derive(Debug, Clone)]
pub struct LastfmService {
    client: Client,
    endpoint: String,
}

impl LastfmService {
    pub fn new() -> Self {
        Self::with_endpoint(CATALOG_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_owned(),
        }
    }

    pub async fn top_tracks(&self, tag: &str, limit: usize) -> Result<Vec<TrackRecord>> {
        let body = self
            .request(&[("method", "tag.gettoptracks"), ("tag", tag)], limit)
            .await?;
        parse_top_tracks(&body, limit)
    }

    pub async fn search_tracks(&self, phrase: &str, limit: usize) -> Result<Vec<TrackRecord>> {
        let body = self
            .request(&[("method", "track.search"), ("track", phrase)], limit)
            .await?;
        parse_search_tracks(&body, limit)
    }

    async fn request(&self, params: &[(&str, &str)], limit: usize) -> Result<String> {
        let api_key = std::env::var(LASTFM_API_KEY).context("LASTFM_API_KEY not set")?;
        let limit_string = limit.to_string();

        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("limit", &limit_string));
        query.push(("api_key", &api_key));
        query.push(("format", "json"));

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .timeout(CATALOG_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let body_string = response.text().await?;
        if !status.is_success() {
            bail!("catalog endpoint returned {}: {}", status, body_string);
        }

        Ok(body_string)
    }
}

impl Default for LastfmService {
    fn default() -> Self {
        Self::new()
    }
}


pub(crate) fn parse_top_tracks(body: &str, limit: usize) -> Result<Vec<TrackRecord>> {
    let response: TopTracksResponse =
        serde_json::from_str(body).context("unexpected tag.gettoptracks response shape")?;
    Ok(response
        .tracks
        .track
        .into_iter()
        .take(limit)
        .map(|entry| {
            let artist = entry.artist.map(|a| a.name);
            normalized_track(entry.name, artist, &entry.image, entry.url)
        })
        .collect())
}

pub(crate) fn parse_search_tracks(body: &str, limit: usize) -> Result<Vec<TrackRecord>> {
    let response: SearchResponse =
        serde_json::from_str(body).context("unexpected track.search response shape")?;
    Ok(response
        .results
        .trackmatches
        .track
        .into_iter()
        .take(limit)
        .map(|entry| normalized_track(entry.name, entry.artist, &entry.image, entry.url))
        .collect())
}

fn normalized_track(
    name: String,
    artist: Option<String>,
    images: &[ImageRef],
    url: Option<String>,
) -> TrackRecord {
    let artist = artist
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_owned());
    let destination_url = destination_url(&name, &artist, url.as_deref());
    TrackRecord {
        thumbnail_url: preferred_image_url(images),
        name,
        artist,
        destination_url,
    }
}

// The "large" rendition when present, else whatever the highest-resolution
// (last) non-empty entry is.
fn preferred_image_url(images: &[ImageRef]) -> Option<String> {
    images
        .iter()
        .find(|image| image.size.as_deref() == Some(PREFERRED_IMAGE_SIZE) && !image.text.is_empty())
        .or_else(|| images.iter().rev().find(|image| !image.text.is_empty()))
        .map(|image| image.text.clone())
}

fn destination_url(name: &str, artist: &str, track_url: Option<&str>) -> String {
    match track_url {
        Some(url) if !url.is_empty() => url.to_owned(),
        _ => format!(
            "https://open.spotify.com/search/{}",
            urlencoding::encode(&format!("{} {}", artist, name))
        ),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const TOP_TRACKS_BODY: &str = r##"{
        "tracks": {"track": [
            {
                "name": "First Song",
                "artist": {"name": "First Artist"},
                "image": [
                    {"#text": "http://img.example/small.png", "size": "small"},
                    {"#text": "http://img.example/large.png", "size": "large"},
                    {"#text": "http://img.example/mega.png", "size": "mega"}
                ],
                "url": "https://www.last.fm/music/First+Artist/_/First+Song"
            },
            {
                "name": "Second Song",
                "image": [
                    {"#text": "", "size": "large"},
                    {"#text": "http://img.example/extralarge.png", "size": "extralarge"}
                ],
                "url": ""
            },
            {
                "name": "Third Song",
                "artist": {"name": "Third Artist"},
                "image": []
            }
        ]}
    }"##;

    const SEARCH_BODY: &str = r##"{
        "results": {"trackmatches": {"track": [
            {
                "name": "Found Song",
                "artist": "Found Artist",
                "image": [{"#text": "http://img.example/cover.png", "size": "large"}],
                "url": "https://www.last.fm/music/Found+Artist/_/Found+Song"
            }
        ]}}
    }"##;

    #[test]
    fn normalizes_artist_object_shape() {
        let tracks = parse_top_tracks(TOP_TRACKS_BODY, 10).unwrap();
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].name, "First Song");
        assert_eq!(tracks[0].artist, "First Artist");
        assert_eq!(
            tracks[0].destination_url,
            "https://www.last.fm/music/First+Artist/_/First+Song"
        );
    }

    #[test]
    fn normalizes_artist_string_shape() {
        let tracks = parse_search_tracks(SEARCH_BODY, 10).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].artist, "Found Artist");
        assert_eq!(
            tracks[0].thumbnail_url.as_deref(),
            Some("http://img.example/cover.png")
        );
    }

    #[test]
    fn missing_artist_becomes_unknown() {
        let tracks = parse_top_tracks(TOP_TRACKS_BODY, 10).unwrap();
        assert_eq!(tracks[1].artist, "Unknown Artist");
    }

    #[test]
    fn prefers_the_large_image() {
        let tracks = parse_top_tracks(TOP_TRACKS_BODY, 10).unwrap();
        assert_eq!(
            tracks[0].thumbnail_url.as_deref(),
            Some("http://img.example/large.png")
        );
    }

    #[test]
    fn falls_back_to_last_non_empty_image() {
        let tracks = parse_top_tracks(TOP_TRACKS_BODY, 10).unwrap();
        // "large" entry is empty, the extralarge rendition wins
        assert_eq!(
            tracks[1].thumbnail_url.as_deref(),
            Some("http://img.example/extralarge.png")
        );
        assert_eq!(tracks[2].thumbnail_url, None);
    }

    #[test]
    fn missing_track_url_becomes_a_search_link() {
        let tracks = parse_top_tracks(TOP_TRACKS_BODY, 10).unwrap();
        assert_eq!(
            tracks[1].destination_url,
            "https://open.spotify.com/search/Unknown%20Artist%20Second%20Song"
        );
    }

    #[test]
    fn result_count_is_capped_at_the_limit() {
        let tracks = parse_top_tracks(TOP_TRACKS_BODY, 2).unwrap();
        assert_eq!(tracks.len(), 2);
    }

    #[test]
    fn empty_track_list_is_a_valid_response() {
        let tracks = parse_top_tracks(r#"{"tracks": {"track": []}}"#, 10).unwrap();
        assert!(tracks.is_empty());
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(parse_top_tracks("not json", 10).is_err());
        assert!(parse_search_tracks(r#"{"unexpected": true}"#, 10).is_err());
    }

    #[test]
    fn placeholder_detection() {
        assert!(is_placeholder(None));
        assert!(is_placeholder(Some("")));
        assert!(is_placeholder(Some(
            "https://lastfm.freetls.fastly.net/i/u/2a96cbd8b46e442fc41c2b86b821562f.png"
        )));
        assert!(!is_placeholder(Some("http://img.example/cover.png")));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        std::env::remove_var("LASTFM_API_KEY");
        let service = LastfmService::with_endpoint("http://127.0.0.1:1/2.0/");
        let error = service.top_tracks("chill", 10).await.unwrap_err();
        assert!(error.to_string().contains("LASTFM_API_KEY"));
    }
}
