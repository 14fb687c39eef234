//! HTTP client for the generation backend
//!
//! Every endpoint takes and returns JSON except media upload (multipart) and
//! video download (binary stream). A reply carrying an `error` field is a
//! backend-reported failure; anything that is not JSON is a transport failure.

use crate::database::ScriptLength;
use crate::error::AppError;
use futures_util::StreamExt;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// The operations the studio needs from a generation backend.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn generate_title(&self, request: &TitleRequest) -> Result<TitleResponse, AppError>;
    async fn generate_script(&self, request: &ScriptRequest) -> Result<ScriptResponse, AppError>;
    async fn generate_images(&self, request: &ImageRequest) -> Result<ImageResponse, AppError>;
    async fn list_voices(&self, elevenlabs_api_key: &str) -> Result<Vec<Voice>, AppError>;
    async fn generate_audio(&self, request: &AudioRequest) -> Result<AudioResponse, AppError>;
    async fn upload_media(&self, files: &[PathBuf]) -> Result<Vec<String>, AppError>;
    async fn create_video(&self, request: &CreateVideoRequest) -> Result<String, AppError>;
    /// Stream `/download_video/<filename>` into `dest`, returning bytes written.
    async fn download_video(&self, filename: &str, dest: &Path) -> Result<u64, AppError>;
    async fn tiktok_status(&self) -> Result<TikTokStatus, AppError>;
    async fn schedule_post(&self, request: &ScheduleRequest) -> Result<(), AppError>;
    async fn generate_all_previews(&self, elevenlabs_api_key: &str) -> Result<String, AppError>;
}

/// Client for a generation backend reached over plain HTTP
pub struct StudioClient {
    client: reqwest::Client,
    base_url: Url,
}

impl StudioClient {
    /// No timeout unless one is given: a hung backend hangs the call.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Validation(format!("Invalid backend URL '{}': {}", base_url, e)))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Validation(format!("Backend URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T, AppError> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to call {}: {}", what, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to read {} response: {}", what, e)))?;

        log::debug!("{} returned {} ({} bytes)", what, status, body.len());
        parse_reply(status, &body)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let url = self.endpoint(&[path])?;
        self.send(self.client.post(url).json(body), path).await
    }

    /// Check that the backend is up
    pub async fn ping(&self) -> Result<String, AppError> {
        let url = self.endpoint(&["ping"])?;
        let reply: MessageResponse = self.send(self.client.get(url), "ping").await?;
        Ok(reply.message.unwrap_or_default())
    }
}

impl Backend for StudioClient {
    async fn generate_title(&self, request: &TitleRequest) -> Result<TitleResponse, AppError> {
        log::info!("Requesting title: model={}, topic_len={}", request.model, request.topic.len());
        self.post_json("generate_title", request).await
    }

    async fn generate_script(&self, request: &ScriptRequest) -> Result<ScriptResponse, AppError> {
        log::info!(
            "Requesting script: model={}, length={}",
            request.model,
            request.length
        );
        self.post_json("generate_script", request).await
    }

    async fn generate_images(&self, request: &ImageRequest) -> Result<ImageResponse, AppError> {
        log::info!(
            "Requesting {} image(s) at {}",
            request.num_images,
            request.image_size
        );
        self.post_json("generate_image", request).await
    }

    async fn list_voices(&self, elevenlabs_api_key: &str) -> Result<Vec<Voice>, AppError> {
        let mut url = self.endpoint(&["list_voices"])?;
        url.query_pairs_mut()
            .append_pair("elevenlabs_api_key", elevenlabs_api_key);

        let reply: VoicesResponse = self.send(self.client.get(url), "list_voices").await?;
        log::info!("Backend listed {} voice(s)", reply.voices.len());
        Ok(reply.voices)
    }

    async fn generate_audio(&self, request: &AudioRequest) -> Result<AudioResponse, AppError> {
        log::info!(
            "Requesting narration: voice={}, script_len={}",
            request.voice_id,
            request.script.len()
        );
        self.post_json("generate_audio_elevenlabs", request).await
    }

    async fn upload_media(&self, files: &[PathBuf]) -> Result<Vec<String>, AppError> {
        let mut form = reqwest::multipart::Form::new();
        for path in files {
            let bytes = tokio::fs::read(path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload".to_string());
            form = form.part(
                "files",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );
        }

        log::info!("Uploading {} media file(s)", files.len());
        let url = self.endpoint(&["upload_media"])?;
        let reply: UploadResponse = self
            .send(self.client.post(url).multipart(form), "upload_media")
            .await?;
        Ok(reply.media_urls)
    }

    async fn create_video(&self, request: &CreateVideoRequest) -> Result<String, AppError> {
        log::info!(
            "Requesting video assembly: {} media, split={:?}",
            request.media_urls.len(),
            request.media_split_config.split_type
        );
        let reply: CreateVideoResponse = self.post_json("create_video", request).await?;
        Ok(reply.video_url)
    }

    async fn download_video(&self, filename: &str, dest: &Path) -> Result<u64, AppError> {
        let url = self.endpoint(&["download_video", filename])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to call download_video: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("download_video {} returned {}", filename, status);
            return Err(AppError::Backend("Failed to download video.".to_string()));
        }

        let result = write_stream(response, dest).await;
        if result.is_err() {
            // Clean up partial file
            let _ = tokio::fs::remove_file(dest).await;
        }
        result
    }

    async fn tiktok_status(&self) -> Result<TikTokStatus, AppError> {
        let url = self.endpoint(&["tiktok_status"])?;
        self.send(self.client.get(url), "tiktok_status").await
    }

    async fn schedule_post(&self, request: &ScheduleRequest) -> Result<(), AppError> {
        log::info!(
            "Scheduling video {} for {}",
            request.video_id,
            request.scheduled_time
        );
        let url = self.endpoint(&["schedule_post"])?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to call schedule_post: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        parse_schedule_reply(status, &body)
    }

    async fn generate_all_previews(&self, elevenlabs_api_key: &str) -> Result<String, AppError> {
        let reply: MessageResponse = self
            .post_json(
                "generate_all_previews",
                &PreviewsRequest {
                    elevenlabs_api_key: elevenlabs_api_key.to_string(),
                },
            )
            .await?;
        Ok(reply
            .message
            .unwrap_or_else(|| "Previews generated successfully.".to_string()))
    }
}

async fn write_stream(response: reqwest::Response, dest: &Path) -> Result<u64, AppError> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AppError::Transport(format!("Download interrupted: {}", e)))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    log::info!("Downloaded {} bytes to {}", written, dest.display());
    Ok(written)
}

/// Classify a backend reply.
///
/// An `error` string wins regardless of status. A failure status without one
/// is still backend-reported. A body that is not JSON means the exchange
/// itself failed.
fn parse_reply<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, AppError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        AppError::Transport(format!("Backend returned non-JSON response ({}): {}", status, e))
    })?;

    if let Some(message) = error_message(&value) {
        return Err(AppError::Backend(message));
    }
    if !status.is_success() {
        return Err(AppError::Backend(format!("Backend returned {}", status)));
    }

    serde_json::from_value(value)
        .map_err(|e| AppError::Transport(format!("Unexpected response shape: {}", e)))
}

fn parse_schedule_reply(status: StatusCode, body: &str) -> Result<(), AppError> {
    if status.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| error_message(&v))
        .unwrap_or_else(|| "Failed to schedule post on TikTok.".to_string());
    Err(AppError::Backend(message))
}

fn error_message(value: &serde_json::Value) -> Option<String> {
    value
        .get("error")
        .and_then(|e| e.as_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_string())
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TitleRequest {
    pub topic: String,
    pub model: String,
    pub user_api_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptRequest {
    pub topic: String,
    pub model: String,
    pub length: ScriptLength,
    pub user_api_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub image_size: String,
    pub num_images: u32,
    pub user_api_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AudioRequest {
    pub script: String,
    pub voice_id: String,
    pub elevenlabs_api_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    Equal,
    Custom,
}

/// How the backend divides narration time across the media list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaSplitConfig {
    pub split_type: SplitType,
    pub duration_per_media: Option<f64>,
}

impl MediaSplitConfig {
    pub fn equal() -> Self {
        Self {
            split_type: SplitType::Equal,
            duration_per_media: None,
        }
    }

    pub fn custom(seconds: f64) -> Self {
        Self {
            split_type: SplitType::Custom,
            duration_per_media: Some(seconds),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateVideoRequest {
    pub audio_url: String,
    pub media_urls: Vec<String>,
    pub media_split_config: MediaSplitConfig,
    pub user_api_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRequest {
    pub video_id: String,
    pub scheduled_time: String,
    pub tiktok_access_token: String,
}

#[derive(Debug, Serialize)]
struct PreviewsRequest {
    elevenlabs_api_key: String,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TitleResponse {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cost: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScriptResponse {
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub script_cost: Option<f64>,
}

/// Older backends answer with a single `image_url`, newer ones with a list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageResponse {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
    #[serde(default)]
    pub cost: Option<f64>,
}

impl ImageResponse {
    pub fn urls(&self) -> Vec<String> {
        let mut urls = self.image_urls.clone().unwrap_or_default();
        if let Some(single) = &self.image_url {
            if !urls.contains(single) {
                urls.insert(0, single.clone());
            }
        }
        urls
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<Voice>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AudioResponse {
    #[serde(default)]
    pub audio_file_url: String,
    #[serde(default)]
    pub cost: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    media_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CreateVideoResponse {
    #[serde(default)]
    video_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TikTokStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}
