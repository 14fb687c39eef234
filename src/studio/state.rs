use super::{Action, Call, Notice, Outcome};
use crate::backend::{
    AudioRequest, CreateVideoRequest, ImageRequest, MediaSplitConfig, ScriptRequest, SplitType,
    TitleRequest, Voice,
};
use crate::database::{ScriptLength, VideoRecord};
use crate::error::AppError;
use crate::metrics::ScriptMetrics;
use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_IMAGE_SIZE: &str = "512x512";
pub const DEFAULT_SCREEN_SIZE: &str = "1920x1080";
pub const DEFAULT_NUM_IMAGES: u32 = 3;
const FALLBACK_FILE_NAME: &str = "final_video";

/// Per-action busy flags. A set flag disables the matching control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Loading {
    pub title: bool,
    pub script: bool,
    pub image: bool,
    pub voices: bool,
    pub audio: bool,
    pub media: bool,
    pub video: bool,
    pub download: bool,
    pub previews: bool,
}

impl Loading {
    pub fn slot(&mut self, action: &Action) -> Option<&mut bool> {
        match action {
            Action::GenerateTitle => Some(&mut self.title),
            Action::GenerateScript => Some(&mut self.script),
            Action::GenerateImages => Some(&mut self.image),
            Action::FetchVoices => Some(&mut self.voices),
            Action::GenerateAudio => Some(&mut self.audio),
            Action::UploadMedia(_) => Some(&mut self.media),
            Action::CreateVideo => Some(&mut self.video),
            Action::DownloadVideo(_) => Some(&mut self.download),
            Action::GeneratePreviews => Some(&mut self.previews),
            Action::RemoveMedia(_) => None,
        }
    }

    pub fn any(&self) -> bool {
        self.title
            || self.script
            || self.image
            || self.voices
            || self.audio
            || self.media
            || self.video
            || self.download
            || self.previews
    }
}

/// Everything the create-video screen shows and edits.
#[derive(Debug, Clone, Serialize)]
pub struct CreateVideoState {
    // Form
    #[serde(skip_serializing)]
    pub openai_api_key: String,
    #[serde(skip_serializing)]
    pub elevenlabs_api_key: String,
    pub topic: String,
    pub model: String,
    pub script_length: ScriptLength,
    pub image_size: String,
    pub num_images: u32,
    pub voice_id: String,
    pub split_type: SplitType,
    /// Raw seconds-per-media text, only read for custom splits.
    pub duration_per_media: String,
    pub file_name: String,
    pub screen_size: String,

    // Artifacts
    pub title: String,
    pub script: String,
    pub voices: Vec<Voice>,
    pub audio_url: String,
    pub media_urls: Vec<String>,
    pub video_url: String,
    pub saved_video_id: Option<String>,
    pub downloaded_path: Option<String>,

    pub cost: f64,
    pub loading: Loading,
    pub notice: Option<Notice>,
}

impl Default for CreateVideoState {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            elevenlabs_api_key: String::new(),
            topic: String::new(),
            model: DEFAULT_MODEL.to_string(),
            script_length: ScriptLength::default(),
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
            num_images: DEFAULT_NUM_IMAGES,
            voice_id: String::new(),
            split_type: SplitType::Equal,
            duration_per_media: String::new(),
            file_name: String::new(),
            screen_size: DEFAULT_SCREEN_SIZE.to_string(),
            title: String::new(),
            script: String::new(),
            voices: Vec::new(),
            audio_url: String::new(),
            media_urls: Vec::new(),
            video_url: String::new(),
            saved_video_id: None,
            downloaded_path: None,
            cost: 0.0,
            loading: Loading::default(),
            notice: None,
        }
    }
}

/// Prompt sent for the topic's illustration images.
pub fn image_prompt(topic: &str) -> String {
    format!(
        "A cinematic, documentary-style scene representing {}. Scenic, photorealistic, no text, no words, no lettering.",
        topic
    )
}

impl CreateVideoState {
    pub fn script_metrics(&self, words_per_minute: u32) -> ScriptMetrics {
        ScriptMetrics::of(&self.script, words_per_minute)
    }

    /// Name the downloaded file will get, without extension.
    pub fn download_name(&self) -> &str {
        if self.file_name.is_empty() {
            FALLBACK_FILE_NAME
        } else {
            &self.file_name
        }
    }

    fn require_openai(&self) -> Result<(), AppError> {
        if self.openai_api_key.is_empty() {
            return Err(AppError::Validation(
                "Please enter your OpenAI API key.".to_string(),
            ));
        }
        if self.topic.trim().is_empty() {
            return Err(AppError::Validation("Please enter a topic.".to_string()));
        }
        Ok(())
    }

    fn require_elevenlabs(&self) -> Result<(), AppError> {
        if self.elevenlabs_api_key.is_empty() {
            return Err(AppError::Validation(
                "Please enter your Eleven Labs API key.".to_string(),
            ));
        }
        Ok(())
    }

    fn split_config(&self) -> Result<MediaSplitConfig, AppError> {
        match self.split_type {
            SplitType::Equal => Ok(MediaSplitConfig::equal()),
            SplitType::Custom => match self.duration_per_media.trim().parse::<f64>() {
                Ok(seconds) if seconds.is_finite() && seconds > 0.0 => {
                    Ok(MediaSplitConfig::custom(seconds))
                }
                _ => Err(AppError::Validation(
                    "Please enter a valid duration per media in seconds.".to_string(),
                )),
            },
        }
    }

    /// Check the form for `action` and build the single call it maps to.
    /// Nothing is sent and nothing changes when this fails.
    pub fn prepare(&self, action: &Action) -> Result<Call, AppError> {
        match action {
            Action::GenerateTitle => {
                self.require_openai()?;
                Ok(Call::Title(TitleRequest {
                    topic: self.topic.clone(),
                    model: self.model.clone(),
                    user_api_key: self.openai_api_key.clone(),
                }))
            }
            Action::GenerateScript => {
                self.require_openai()?;
                Ok(Call::Script(ScriptRequest {
                    topic: self.topic.clone(),
                    model: self.model.clone(),
                    length: self.script_length.clone(),
                    user_api_key: self.openai_api_key.clone(),
                }))
            }
            Action::GenerateImages => {
                self.require_openai()?;
                Ok(Call::Images(ImageRequest {
                    prompt: image_prompt(&self.topic),
                    image_size: self.image_size.clone(),
                    num_images: self.num_images,
                    user_api_key: self.openai_api_key.clone(),
                }))
            }
            Action::FetchVoices => {
                self.require_elevenlabs()?;
                Ok(Call::Voices(self.elevenlabs_api_key.clone()))
            }
            Action::GenerateAudio => {
                self.require_elevenlabs()?;
                if self.script.trim().is_empty() {
                    return Err(AppError::Validation("Please enter a script.".to_string()));
                }
                if self.voice_id.is_empty() {
                    return Err(AppError::Validation("Please select a voice.".to_string()));
                }
                Ok(Call::Audio(AudioRequest {
                    script: self.script.clone(),
                    voice_id: self.voice_id.clone(),
                    elevenlabs_api_key: self.elevenlabs_api_key.clone(),
                }))
            }
            Action::UploadMedia(paths) => {
                if paths.is_empty() {
                    return Err(AppError::Validation(
                        "Please choose at least one file to upload.".to_string(),
                    ));
                }
                Ok(Call::Upload(paths.clone()))
            }
            Action::RemoveMedia(index) => {
                if *index >= self.media_urls.len() {
                    return Err(AppError::Validation(format!(
                        "No media at position {}.",
                        index
                    )));
                }
                Ok(Call::Local(Outcome::MediaRemoved(*index)))
            }
            Action::CreateVideo => {
                if self.audio_url.is_empty() {
                    return Err(AppError::Validation("Need an audio file.".to_string()));
                }
                if self.media_urls.is_empty() {
                    return Err(AppError::Validation(
                        "Need at least one image or video.".to_string(),
                    ));
                }
                Ok(Call::CreateVideo(CreateVideoRequest {
                    audio_url: self.audio_url.clone(),
                    media_urls: self.media_urls.clone(),
                    media_split_config: self.split_config()?,
                    user_api_key: self.openai_api_key.clone(),
                }))
            }
            Action::DownloadVideo(dest_dir) => {
                let filename = self.video_url.rsplit('/').next().unwrap_or_default();
                if self.video_url.is_empty() || filename.is_empty() {
                    return Err(AppError::Validation(
                        "No video URL to download.".to_string(),
                    ));
                }
                Ok(Call::Download {
                    filename: filename.to_string(),
                    dest: dest_dir.join(format!("{}.mp4", self.download_name())),
                })
            }
            Action::GeneratePreviews => {
                self.require_elevenlabs()?;
                Ok(Call::Previews(self.elevenlabs_api_key.clone()))
            }
        }
    }

    /// Fold a successful outcome into the state.
    pub fn reduce(&mut self, outcome: Outcome) -> Notice {
        match outcome {
            Outcome::TitleGenerated(reply) => {
                self.title = reply.title;
                self.add_cost(reply.cost);
                Notice::success("Title generated successfully!")
            }
            Outcome::ScriptGenerated(reply) => {
                self.script = reply.script;
                self.add_cost(reply.script_cost);
                Notice::success("Script generated successfully!")
            }
            Outcome::ImagesGenerated(reply) => {
                self.media_urls.extend(reply.urls());
                self.add_cost(reply.cost);
                Notice::success("Images generated successfully!")
            }
            Outcome::VoicesListed(voices) => {
                self.voices = voices;
                Notice::success("Voices fetched successfully!")
            }
            Outcome::AudioGenerated(reply) => {
                self.audio_url = reply.audio_file_url;
                self.add_cost(reply.cost);
                Notice::success("Audio generated successfully!")
            }
            Outcome::MediaUploaded(urls) => {
                self.media_urls.extend(urls);
                Notice::success("Media uploaded successfully!")
            }
            Outcome::MediaRemoved(index) => {
                if index < self.media_urls.len() {
                    self.media_urls.remove(index);
                }
                Notice::info("Media removed.")
            }
            Outcome::VideoCreated(url) => {
                self.video_url = url;
                self.saved_video_id = None;
                Notice::success("Video created successfully!")
            }
            Outcome::VideoDownloaded { path, bytes } => {
                log::info!("Saved {} ({} bytes)", path.display(), bytes);
                self.downloaded_path = Some(path.to_string_lossy().to_string());
                Notice::success("Video downloaded successfully!")
            }
            Outcome::PreviewsGenerated(message) => Notice::success(message),
        }
    }

    fn add_cost(&mut self, cost: Option<f64>) {
        if let Some(cost) = cost.filter(|c| c.is_finite()) {
            self.cost += cost;
        }
    }

    /// Metadata record for the video currently on screen.
    pub fn to_record(&self, id: String, created_at: String) -> VideoRecord {
        VideoRecord {
            id,
            title: self.title.clone(),
            topic: self.topic.clone(),
            script: self.script.clone(),
            model: self.model.clone(),
            script_length: self.script_length.clone(),
            video_url: self.video_url.clone(),
            image_url: self.media_urls.first().cloned().unwrap_or_default(),
            created_at,
            scheduled_post: None,
        }
    }
}

/// Everything the video library screen shows.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryState {
    pub videos: Vec<VideoRecord>,
    /// Calendar day new schedules must fall on.
    pub selected_date: NaiveDate,
    pub tiktok_authenticated: bool,
    #[serde(skip_serializing)]
    pub tiktok_access_token: Option<String>,
    pub loading: bool,
    pub notice: Option<Notice>,
}

impl LibraryState {
    pub fn new(selected_date: NaiveDate) -> Self {
        Self {
            videos: Vec::new(),
            selected_date,
            tiktok_authenticated: false,
            tiktok_access_token: None,
            loading: false,
            notice: None,
        }
    }
}
