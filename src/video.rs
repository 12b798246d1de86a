use crate::chapters::Chapter;
use crate::config::MetadataConfig;
use crate::error::{InterpreterError, Result};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Video information assembled after metadata lookup and chapter extraction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub id: String,
    pub url: String,
    pub title: String,
    pub thumbnail: String,
    /// Duration in seconds, 0 when unknown
    #[serde(default)]
    pub duration: u32,
    pub chapters: Vec<Chapter>,
}

impl VideoInfo {
    /// Link that opens the video at a given offset
    pub fn timestamp_url(&self, start_time: u32) -> String {
        format!("https://www.youtube.com/watch?v={}&t={}s", self.id, start_time)
    }
}

/// Title and thumbnail resolved for a video before chapters are known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub id: String,
    pub url: String,
    pub title: String,
    pub thumbnail: String,
}

impl VideoMetadata {
    pub fn into_video_info(self, chapters: Vec<Chapter>) -> VideoInfo {
        VideoInfo {
            id: self.id,
            url: self.url,
            title: self.title,
            thumbnail: self.thumbnail,
            duration: 0,
            chapters,
        }
    }
}

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^.*((youtu\.be/)|(v/)|(/u/\w/)|(embed/)|(watch\?))\??v?=?([^#&?]*).*")
            .expect("video id pattern is valid")
    })
}

/// Extract the 11-character YouTube video id from a URL
pub fn extract_video_id(url: &str) -> Option<String> {
    let captures = video_id_regex().captures(url)?;
    let id = captures.get(7)?.as_str();
    (id.len() == 11).then(|| id.to_string())
}

/// Whether the URL points at a YouTube host. Pasted links without a
/// scheme are read as `https://`.
pub fn is_supported_url(url: &str) -> bool {
    let url = url.trim();
    let parsed = match url::Url::parse(url) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => match url::Url::parse(&format!("https://{}", url)) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        },
        Err(_) => return false,
    };
    match parsed.host_str() {
        Some(host) => host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com"),
        None => false,
    }
}

/// Validate a user-supplied URL and return its video id
pub fn validate_url(url: &str) -> Result<String> {
    let url = url.trim();
    if !is_supported_url(url) {
        return Err(InterpreterError::InvalidUrl(url.to_string()));
    }
    extract_video_id(url).ok_or_else(|| InterpreterError::InvalidUrl(url.to_string()))
}

/// Trimmed URL with an `https://` scheme added when the user left it out
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Thumbnail URL that exists for every public video id
pub fn fallback_thumbnail(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/hqdefault.jpg", video_id)
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    thumbnail_url: Option<String>,
    error: Option<String>,
}

/// oEmbed-style metadata lookup
#[derive(Clone)]
pub struct MetadataClient {
    client: Client,
    endpoint: String,
}

impl MetadataClient {
    pub fn new(config: &MetadataConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Resolve title and thumbnail for a video.
    ///
    /// Only an unrecognisable URL is an error; lookup failures fall back to
    /// a placeholder title and the static thumbnail.
    pub async fn fetch(&self, url: &str) -> Result<VideoMetadata> {
        let video_id = extract_video_id(url).ok_or_else(|| InterpreterError::InvalidUrl(url.to_string()))?;

        match self.lookup(url).await {
            Ok(response) => {
                info!("📄 Fetched metadata for video {}", video_id);
                Ok(VideoMetadata {
                    url: url.to_string(),
                    title: response
                        .title
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| format!("Video {}", video_id)),
                    thumbnail: response
                        .thumbnail_url
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| fallback_thumbnail(&video_id)),
                    id: video_id,
                })
            }
            Err(e) => {
                warn!("Metadata fetch failed, using fallback: {}", e);
                Ok(VideoMetadata {
                    url: url.to_string(),
                    title: format!("YouTube Video ({})", video_id),
                    thumbnail: fallback_thumbnail(&video_id),
                    id: video_id,
                })
            }
        }
    }

    async fn lookup(&self, url: &str) -> Result<OEmbedResponse> {
        let request_url = format!("{}?url={}", self.endpoint, urlencoding::encode(url));
        debug!("Requesting metadata from {}", request_url);

        let response = self
            .client
            .get(&request_url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InterpreterError::Metadata(format!("lookup returned HTTP {}", response.status())));
        }

        let body: OEmbedResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(InterpreterError::Metadata(format!("lookup error: {}", error)));
        }

        Ok(body)
    }
}
