//! Request orchestration for the create-video and library screens
//!
//! Every user action is validated against the current screen state, mapped to
//! at most one backend call, and its outcome folded back into the state:
//!
//! - success: the reducer applies the payload and adds any cost
//! - backend-reported error: message shown verbatim, state untouched
//! - transport failure: logged, generic message shown, state untouched
//!
//! Nothing is retried and nothing can be cancelled once sent.

mod library;
pub mod rules;
pub mod state;

#[cfg(test)]
mod tests;

pub use library::{parse_schedule_time, Library, LibraryAction};
pub use state::{CreateVideoState, LibraryState, Loading};

use crate::backend::{
    AudioRequest, AudioResponse, Backend, CreateVideoRequest, ImageRequest, ImageResponse,
    ScriptRequest, ScriptResponse, TitleRequest, TitleResponse, Voice,
};
use crate::database::Database;
use crate::error::AppError;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// The message shown to the user after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.severity, self.message)
    }
}

/// User actions on the create-video screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    GenerateTitle,
    GenerateScript,
    GenerateImages,
    FetchVoices,
    GenerateAudio,
    UploadMedia(Vec<PathBuf>),
    RemoveMedia(usize),
    CreateVideo,
    /// Save the finished video into this directory.
    DownloadVideo(PathBuf),
    GeneratePreviews,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::GenerateTitle => "generate_title",
            Action::GenerateScript => "generate_script",
            Action::GenerateImages => "generate_images",
            Action::FetchVoices => "fetch_voices",
            Action::GenerateAudio => "generate_audio",
            Action::UploadMedia(_) => "upload_media",
            Action::RemoveMedia(_) => "remove_media",
            Action::CreateVideo => "create_video",
            Action::DownloadVideo(_) => "download_video",
            Action::GeneratePreviews => "generate_previews",
        }
    }

    /// Generic message for failures that are not the backend's own words.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Action::GenerateTitle => "Error generating title.",
            Action::GenerateScript => "Error generating script.",
            Action::GenerateImages => "Error generating images.",
            Action::FetchVoices => "Error fetching voices.",
            Action::GenerateAudio => "Error generating audio.",
            Action::UploadMedia(_) => "Error uploading media.",
            Action::RemoveMedia(_) => "Error removing media.",
            Action::CreateVideo => "Error creating video.",
            Action::DownloadVideo(_) => "Error downloading video.",
            Action::GeneratePreviews => "Error generating previews.",
        }
    }
}

/// The one request an action resolves to.
#[derive(Debug, Clone)]
pub enum Call {
    Title(TitleRequest),
    Script(ScriptRequest),
    Images(ImageRequest),
    Voices(String),
    Audio(AudioRequest),
    Upload(Vec<PathBuf>),
    CreateVideo(CreateVideoRequest),
    Download { filename: String, dest: PathBuf },
    Previews(String),
    /// Handled without the backend.
    Local(Outcome),
}

/// A successful result, ready to be reduced into the state.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    TitleGenerated(TitleResponse),
    ScriptGenerated(ScriptResponse),
    ImagesGenerated(ImageResponse),
    VoicesListed(Vec<Voice>),
    AudioGenerated(AudioResponse),
    MediaUploaded(Vec<String>),
    MediaRemoved(usize),
    VideoCreated(String),
    VideoDownloaded { path: PathBuf, bytes: u64 },
    PreviewsGenerated(String),
}

async fn execute<B: Backend>(backend: &B, call: Call) -> Result<Outcome, AppError> {
    match call {
        Call::Title(request) => backend
            .generate_title(&request)
            .await
            .map(Outcome::TitleGenerated),
        Call::Script(request) => backend
            .generate_script(&request)
            .await
            .map(Outcome::ScriptGenerated),
        Call::Images(request) => backend
            .generate_images(&request)
            .await
            .map(Outcome::ImagesGenerated),
        Call::Voices(key) => backend.list_voices(&key).await.map(Outcome::VoicesListed),
        Call::Audio(request) => backend
            .generate_audio(&request)
            .await
            .map(Outcome::AudioGenerated),
        Call::Upload(paths) => backend
            .upload_media(&paths)
            .await
            .map(Outcome::MediaUploaded),
        Call::CreateVideo(request) => backend
            .create_video(&request)
            .await
            .map(Outcome::VideoCreated),
        Call::Download { filename, dest } => {
            let bytes = backend.download_video(&filename, &dest).await?;
            Ok(Outcome::VideoDownloaded { path: dest, bytes })
        }
        Call::Previews(key) => backend
            .generate_all_previews(&key)
            .await
            .map(Outcome::PreviewsGenerated),
        Call::Local(outcome) => Ok(outcome),
    }
}

/// Orchestrator for the create-video screen.
pub struct Studio<B> {
    backend: B,
    db: Arc<Database>,
    state: CreateVideoState,
}

impl<B: Backend> Studio<B> {
    pub fn new(backend: B, db: Arc<Database>) -> Self {
        Self::with_state(backend, db, CreateVideoState::default())
    }

    pub fn with_state(backend: B, db: Arc<Database>, mut state: CreateVideoState) -> Self {
        rules::apply(&mut state);
        Self { backend, db, state }
    }

    pub fn state(&self) -> &CreateVideoState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Change form fields, then re-derive dependent fields.
    pub fn edit(&mut self, change: impl FnOnce(&mut CreateVideoState)) {
        change(&mut self.state);
        rules::apply(&mut self.state);
    }

    /// Entering an ElevenLabs key fetches the voice list right away.
    pub async fn set_elevenlabs_key(&mut self, key: &str) -> Option<Notice> {
        if self.state.elevenlabs_api_key == key {
            return None;
        }
        self.edit(|s| s.elevenlabs_api_key = key.to_string());
        if key.is_empty() {
            return None;
        }
        Some(self.dispatch(Action::FetchVoices).await)
    }

    /// Run one user action to completion and return what to show.
    pub async fn dispatch(&mut self, action: Action) -> Notice {
        let call = match self.state.prepare(&action) {
            Ok(call) => call,
            Err(e) => {
                log::info!("{} rejected: {}", action.name(), e);
                return self.show(Notice::warning(e.to_string()));
            }
        };

        if let Some(busy) = self.state.loading.slot(&action) {
            *busy = true;
        }

        let span = tracing::info_span!("action", name = action.name());
        let result = execute(&self.backend, call).instrument(span).await;

        if let Some(busy) = self.state.loading.slot(&action) {
            *busy = false;
        }

        let notice = match result {
            Ok(outcome) => {
                let created = matches!(outcome, Outcome::VideoCreated(_));
                let notice = self.state.reduce(outcome);
                rules::apply(&mut self.state);
                if created {
                    self.save_current_video().unwrap_or(notice)
                } else {
                    notice
                }
            }
            Err(AppError::Backend(message)) => {
                log::warn!("{} failed on backend: {}", action.name(), message);
                Notice::error(message)
            }
            Err(e) => {
                log::error!("{} error: {}", action.name(), e);
                Notice::error(action.failure_message())
            }
        };

        self.show(notice)
    }

    /// Persist the freshly created video. Returns a warning if the write
    /// failed; the video URL stays on screen either way.
    fn save_current_video(&mut self) -> Option<Notice> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let record = self.state.to_record(id.clone(), created_at);

        match self.db.store_video(record) {
            Ok(()) => {
                self.state.saved_video_id = Some(id);
                None
            }
            Err(e) => {
                let e = AppError::from(e);
                log::error!("Failed to save video locally: {}", e);
                Some(Notice::warning(format!(
                    "Video created, but saving it to My Videos failed: {}",
                    e
                )))
            }
        }
    }

    fn show(&mut self, notice: Notice) -> Notice {
        self.state.notice = Some(notice.clone());
        notice
    }
}
