//! YouTube transcript source.
//!
//! Search goes through the YouTube Data API when a key is configured and
//! falls back to `yt-dlp`'s `ytsearchdate` otherwise. Caption tracks are
//! discovered with `yt-dlp --dump-json` and downloaded as WebVTT.

use super::{
    vtt_to_text, CaptionKind, SkipReason, SkippedVideo, TranscriptBatch, TranscriptSource,
    VideoTranscript,
};
use crate::error::{Result, TubeqError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/search";

/// Settings for [`YoutubeSource`].
#[derive(Debug, Clone)]
pub struct YoutubeSourceConfig {
    /// YouTube Data API key. Without one, search uses yt-dlp.
    pub api_key: Option<String>,
    /// Maximum number of videos per search.
    pub max_results: usize,
    /// Caption language code.
    pub language: String,
    /// yt-dlp executable.
    pub ytdlp_path: String,
    /// Timeout for each network call or yt-dlp run.
    pub timeout: Duration,
}

impl Default for YoutubeSourceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            max_results: 5,
            language: "en".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// A search hit.
#[derive(Debug, Clone, PartialEq)]
struct VideoHit {
    id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    #[serde(default)]
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    #[serde(default)]
    title: String,
}

/// The subset of `yt-dlp --dump-json` output needed to pick a caption track.
#[derive(Debug, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    subtitles: HashMap<String, Vec<CaptionFormat>>,
    #[serde(default)]
    automatic_captions: HashMap<String, Vec<CaptionFormat>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CaptionFormat {
    ext: String,
    url: String,
}

/// YouTube transcript source.
pub struct YoutubeSource {
    config: YoutubeSourceConfig,
    http: reqwest::Client,
}

impl YoutubeSource {
    pub fn new(config: YoutubeSourceConfig) -> Result<Self> {
        if config.max_results == 0 {
            return Err(TubeqError::Config(
                "youtube.max_results must be greater than zero".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TubeqError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Search for videos on `topic`, newest first.
    #[instrument(skip(self))]
    async fn search(&self, topic: &str) -> Result<Vec<VideoHit>> {
        match self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => self.search_api(topic, key).await,
            None => self.search_ytdlp(topic).await,
        }
    }

    async fn search_api(&self, topic: &str, key: &str) -> Result<Vec<VideoHit>> {
        let max_results = self.config.max_results.to_string();
        let url = url::Url::parse_with_params(
            SEARCH_ENDPOINT,
            &[
                ("part", "snippet"),
                ("q", topic),
                ("maxResults", max_results.as_str()),
                ("type", "video"),
                ("order", "date"),
                ("key", key),
            ],
        )
        .map_err(|e| TubeqError::TranscriptSource(format!("Invalid search URL: {}", e)))?;

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TubeqError::TranscriptSource(format!(
                "YouTube search failed ({}): {}",
                status, body
            )));
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parse_search_items(parsed))
    }

    async fn search_ytdlp(&self, topic: &str) -> Result<Vec<VideoHit>> {
        let query = format!("ytsearchdate{}:{}", self.config.max_results, topic);
        let stdout = self
            .run_ytdlp(&["--flat-playlist", "--dump-json", "--no-warnings", &query])
            .await?;
        Ok(parse_flat_playlist(&stdout))
    }

    /// Fetch the transcript of one video.
    #[instrument(skip(self))]
    async fn fetch_transcript(&self, hit: &VideoHit) -> std::result::Result<VideoTranscript, SkipReason> {
        let url = format!("https://www.youtube.com/watch?v={}", hit.id);
        let stdout = self
            .run_ytdlp(&["--dump-json", "--skip-download", "--no-warnings", &url])
            .await
            .map_err(|e| SkipReason::FetchFailed(e.to_string()))?;

        let info: VideoInfo = serde_json::from_str(stdout.trim())
            .map_err(|e| SkipReason::FetchFailed(format!("Failed to parse yt-dlp output: {}", e)))?;

        let (kind, track) = select_track(&info, &self.config.language)?;
        debug!("Using {:?} captions for {}", kind, hit.id);

        let response = self
            .http
            .get(&track.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SkipReason::FetchFailed(e.to_string()))?;
        let body = response
            .text()
            .await
            .map_err(|e| SkipReason::FetchFailed(e.to_string()))?;

        let title = info
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| hit.title.clone());

        Ok(VideoTranscript {
            video_id: hit.id.clone(),
            title,
            kind,
            text: vtt_to_text(&body),
        })
    }

    async fn run_ytdlp(&self, args: &[&str]) -> Result<String> {
        let output = tokio::process::Command::new(&self.config.ytdlp_path)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.config.timeout, output)
            .await
            .map_err(|_| {
                TubeqError::TranscriptSource(format!(
                    "yt-dlp timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TubeqError::ToolNotFound(self.config.ytdlp_path.clone())
                } else {
                    TubeqError::TranscriptSource(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TubeqError::TranscriptSource(format!(
                "yt-dlp failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TranscriptSource for YoutubeSource {
    #[instrument(skip(self))]
    async fn fetch_transcripts(&self, topic: &str) -> TranscriptBatch {
        let hits = match self.search(topic).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Search for '{}' failed: {}", topic, e);
                return TranscriptBatch::failed(topic, e.to_string());
            }
        };

        info!("Found {} videos for '{}'", hits.len(), topic);

        let mut batch = TranscriptBatch {
            topic: topic.to_string(),
            videos_found: hits.len(),
            ..Default::default()
        };

        for hit in &hits {
            match self.fetch_transcript(hit).await {
                Ok(transcript) => {
                    info!("Transcript found for {}", hit.id);
                    batch.transcripts.push(transcript);
                }
                Err(reason) => {
                    warn!("Skipping {}: {}", hit.id, reason);
                    batch.skipped.push(SkippedVideo {
                        video_id: hit.id.clone(),
                        reason,
                    });
                }
            }
        }

        batch
    }
}

fn parse_search_items(response: SearchResponse) -> Vec<VideoHit> {
    response
        .items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.video_id?;
            let title = item.snippet.map(|s| s.title).unwrap_or_default();
            Some(VideoHit { id, title })
        })
        .collect()
}

fn parse_flat_playlist(stdout: &str) -> Vec<VideoHit> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .filter_map(|json| {
            let id = json["id"].as_str()?.to_string();
            let title = json["title"].as_str().unwrap_or("Unknown Title").to_string();
            Some(VideoHit { id, title })
        })
        .collect()
}

/// Pick a caption track in `language`: uploaded captions first, then
/// generated ones. Exact language codes win over regional variants.
fn select_track(
    info: &VideoInfo,
    language: &str,
) -> std::result::Result<(CaptionKind, CaptionFormat), SkipReason> {
    if info.subtitles.is_empty() && info.automatic_captions.is_empty() {
        return Err(SkipReason::TranscriptsDisabled);
    }

    let candidates = [
        (CaptionKind::Manual, &info.subtitles),
        (CaptionKind::Generated, &info.automatic_captions),
    ];

    for (kind, tracks) in candidates {
        if let Some(format) = find_language(tracks, language) {
            return Ok((kind, format));
        }
    }

    Err(SkipReason::NoEnglishTranscript)
}

fn find_language(
    tracks: &HashMap<String, Vec<CaptionFormat>>,
    language: &str,
) -> Option<CaptionFormat> {
    let regional = format!("{}-", language);
    let mut keys: Vec<&String> = tracks
        .keys()
        .filter(|k| *k == language || k.starts_with(&regional))
        .collect();
    // Exact code first, then regional variants in a stable order.
    keys.sort_by(|a, b| {
        (a.as_str() != language)
            .cmp(&(b.as_str() != language))
            .then_with(|| a.cmp(b))
    });

    keys.into_iter()
        .filter_map(|k| tracks.get(k))
        .find_map(|formats| formats.iter().find(|f| f.ext == "vtt").cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vtt(url: &str) -> Vec<CaptionFormat> {
        vec![
            CaptionFormat {
                ext: "json3".to_string(),
                url: format!("{}.json3", url),
            },
            CaptionFormat {
                ext: "vtt".to_string(),
                url: format!("{}.vtt", url),
            },
        ]
    }

    fn info(subs: &[&str], auto: &[&str]) -> VideoInfo {
        VideoInfo {
            title: Some("t".to_string()),
            subtitles: subs.iter().map(|l| (l.to_string(), vtt(l))).collect(),
            automatic_captions: auto.iter().map(|l| (l.to_string(), vtt(l))).collect(),
        }
    }

    #[test]
    fn test_manual_captions_preferred() {
        let (kind, track) = select_track(&info(&["en"], &["en", "de"]), "en").unwrap();
        assert_eq!(kind, CaptionKind::Manual);
        assert_eq!(track.url, "en.vtt");
    }

    #[test]
    fn test_generated_captions_fallback() {
        let (kind, _) = select_track(&info(&["fr"], &["en"]), "en").unwrap();
        assert_eq!(kind, CaptionKind::Generated);
    }

    #[test]
    fn test_regional_variant_accepted() {
        let (kind, track) = select_track(&info(&["en-GB", "en-US"], &[]), "en").unwrap();
        assert_eq!(kind, CaptionKind::Manual);
        assert_eq!(track.url, "en-GB.vtt");
    }

    #[test]
    fn test_skip_reasons() {
        assert_eq!(
            select_track(&info(&[], &[]), "en").unwrap_err(),
            SkipReason::TranscriptsDisabled
        );
        assert_eq!(
            select_track(&info(&["de"], &["fr"]), "en").unwrap_err(),
            SkipReason::NoEnglishTranscript
        );
        // "eng" is not a regional variant of "en"
        assert_eq!(
            select_track(&info(&["eng"], &[]), "en").unwrap_err(),
            SkipReason::NoEnglishTranscript
        );
    }

    #[test]
    fn test_parse_search_items() {
        let json = r#"{
            "items": [
                {"id": {"kind": "youtube#video", "videoId": "dQw4w9WgXcQ"}, "snippet": {"title": "First"}},
                {"id": {"kind": "youtube#channel", "channelId": "UC123"}},
                {"id": {"videoId": "abcdefghijk"}}
            ]
        }"#;
        let hits = parse_search_items(serde_json::from_str(json).unwrap());
        assert_eq!(
            hits,
            vec![
                VideoHit {
                    id: "dQw4w9WgXcQ".to_string(),
                    title: "First".to_string()
                },
                VideoHit {
                    id: "abcdefghijk".to_string(),
                    title: String::new()
                },
            ]
        );
    }

    #[test]
    fn test_parse_flat_playlist() {
        let stdout = "{\"id\": \"dQw4w9WgXcQ\", \"title\": \"Never\"}\n\nnot json\n{\"id\": \"abcdefghijk\"}\n";
        let hits = parse_flat_playlist(stdout);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Never");
        assert_eq!(hits[1].title, "Unknown Title");
    }

    #[test]
    fn test_zero_max_results_rejected() {
        let config = YoutubeSourceConfig {
            max_results: 0,
            ..Default::default()
        };
        assert!(YoutubeSource::new(config).is_err());
    }

    #[tokio::test]
    async fn test_missing_ytdlp_yields_failed_batch() {
        let source = YoutubeSource::new(YoutubeSourceConfig {
            ytdlp_path: "definitely-not-a-real-yt-dlp-binary".to_string(),
            ..Default::default()
        })
        .unwrap();

        let batch = source.fetch_transcripts("rust").await;
        assert!(batch.is_empty());
        assert_eq!(batch.videos_found, 0);
        assert!(batch.search_failure.unwrap().contains("not found"));
    }
}
