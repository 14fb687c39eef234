// Orchestrator tests against a scripted backend
// Run with: cargo test --lib studio::tests

use super::*;
use crate::backend::{MediaSplitConfig, ScheduleRequest, SplitType, TikTokStatus};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Backend that replays queued replies per endpoint and records every call.
#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<HashMap<&'static str, VecDeque<Result<Value, AppError>>>>,
    calls: Mutex<Vec<(&'static str, Value)>>,
}

impl ScriptedBackend {
    fn reply(self, endpoint: &'static str, body: Value) -> Self {
        self.push(endpoint, Ok(body));
        self
    }

    fn fail(self, endpoint: &'static str, error: AppError) -> Self {
        self.push(endpoint, Err(error));
        self
    }

    fn push(&self, endpoint: &'static str, reply: Result<Value, AppError>) {
        self.replies
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .push_back(reply);
    }

    fn calls(&self) -> Vec<(&'static str, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn call_names(&self) -> Vec<&'static str> {
        self.calls().into_iter().map(|(name, _)| name).collect()
    }

    fn answer<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: Value,
    ) -> Result<T, AppError> {
        self.calls.lock().unwrap().push((endpoint, request));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(endpoint)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| panic!("no scripted reply for {}", endpoint))?;
        Ok(serde_json::from_value(reply).unwrap())
    }
}

impl Backend for ScriptedBackend {
    async fn generate_title(&self, request: &TitleRequest) -> Result<TitleResponse, AppError> {
        self.answer("generate_title", serde_json::to_value(request).unwrap())
    }

    async fn generate_script(&self, request: &ScriptRequest) -> Result<ScriptResponse, AppError> {
        self.answer("generate_script", serde_json::to_value(request).unwrap())
    }

    async fn generate_images(&self, request: &ImageRequest) -> Result<ImageResponse, AppError> {
        self.answer("generate_image", serde_json::to_value(request).unwrap())
    }

    async fn list_voices(&self, elevenlabs_api_key: &str) -> Result<Vec<Voice>, AppError> {
        let reply: Value = self.answer(
            "list_voices",
            json!({ "elevenlabs_api_key": elevenlabs_api_key }),
        )?;
        Ok(serde_json::from_value(reply["voices"].clone()).unwrap())
    }

    async fn generate_audio(&self, request: &AudioRequest) -> Result<AudioResponse, AppError> {
        self.answer(
            "generate_audio_elevenlabs",
            serde_json::to_value(request).unwrap(),
        )
    }

    async fn upload_media(&self, files: &[PathBuf]) -> Result<Vec<String>, AppError> {
        let reply: Value = self.answer("upload_media", json!({ "files": files }))?;
        Ok(serde_json::from_value(reply["media_urls"].clone()).unwrap())
    }

    async fn create_video(&self, request: &CreateVideoRequest) -> Result<String, AppError> {
        let reply: Value = self.answer("create_video", serde_json::to_value(request).unwrap())?;
        Ok(reply["video_url"].as_str().unwrap_or_default().to_string())
    }

    async fn download_video(&self, filename: &str, dest: &Path) -> Result<u64, AppError> {
        let reply: Value = self.answer(
            "download_video",
            json!({ "filename": filename, "dest": dest }),
        )?;
        let bytes = reply["bytes"].as_str().unwrap_or_default();
        std::fs::write(dest, bytes)?;
        Ok(bytes.len() as u64)
    }

    async fn tiktok_status(&self) -> Result<TikTokStatus, AppError> {
        self.answer("tiktok_status", Value::Null)
    }

    async fn schedule_post(&self, request: &ScheduleRequest) -> Result<(), AppError> {
        let _: Value = self.answer("schedule_post", serde_json::to_value(request).unwrap())?;
        Ok(())
    }

    async fn generate_all_previews(&self, elevenlabs_api_key: &str) -> Result<String, AppError> {
        let reply: Value = self.answer(
            "generate_all_previews",
            json!({ "elevenlabs_api_key": elevenlabs_api_key }),
        )?;
        Ok(reply["message"].as_str().unwrap_or_default().to_string())
    }
}

fn setup_db() -> (Arc<Database>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("studio.db")).unwrap();
    (Arc::new(db), temp_dir)
}

fn words(n: usize) -> String {
    vec!["veni"; n].join(" ")
}

fn studio_with(backend: ScriptedBackend) -> (Studio<ScriptedBackend>, Arc<Database>, TempDir) {
    let (db, temp) = setup_db();
    let mut studio = Studio::new(backend, db.clone());
    studio.edit(|s| {
        s.openai_api_key = "sk-test".to_string();
        s.topic = "Ancient Rome".to_string();
    });
    (studio, db, temp)
}

/// State ready for `CreateVideo`: narration and two media files.
fn ready_to_assemble(studio: &mut Studio<ScriptedBackend>) {
    studio.edit(|s| {
        s.title = "Ancient Rome: Rise & Fall".to_string();
        s.script = words(20);
        s.audio_url = "http://localhost:5000/static/audio.mp3".to_string();
        s.media_urls = vec![
            "http://localhost:5000/static/a.png".to_string(),
            "http://localhost:5000/static/b.png".to_string(),
        ];
    });
}

// =========================================================================
// Title / script / images
// =========================================================================

#[tokio::test]
async fn test_title_success_sets_title_and_cost() {
    let backend = ScriptedBackend::default().reply("generate_title", json!({"title": "X", "cost": 0.01}));
    let (mut studio, _db, _temp) = studio_with(backend);

    let notice = studio.dispatch(Action::GenerateTitle).await;

    assert_eq!(notice, Notice::success("Title generated successfully!"));
    assert_eq!(studio.state().title, "X");
    assert!((studio.state().cost - 0.01).abs() < 1e-9);
    assert!(!studio.state().loading.title);

    let (_, request) = &studio.backend().calls()[0];
    assert_eq!(
        request,
        &json!({"topic": "Ancient Rome", "model": "gpt-3.5-turbo", "user_api_key": "sk-test"})
    );
}

#[tokio::test]
async fn test_title_backend_error_leaves_state_untouched() {
    let backend = ScriptedBackend::default()
        .reply("generate_title", json!({"title": "First", "cost": 0.01}))
        .fail("generate_title", AppError::Backend("bad key".to_string()));
    let (mut studio, _db, _temp) = studio_with(backend);

    studio.dispatch(Action::GenerateTitle).await;
    let notice = studio.dispatch(Action::GenerateTitle).await;

    assert_eq!(notice.message, "bad key");
    assert!(notice.is_error());
    assert_eq!(studio.state().title, "First");
    assert!((studio.state().cost - 0.01).abs() < 1e-9);
    assert_eq!(studio.state().notice.as_ref(), Some(&notice));
}

#[tokio::test]
async fn test_transport_failure_shows_generic_message() {
    let backend = ScriptedBackend::default().fail(
        "generate_script",
        AppError::Transport("connection refused".to_string()),
    );
    let (mut studio, _db, _temp) = studio_with(backend);
    studio.edit(|s| s.script = "keep me".to_string());

    let notice = studio.dispatch(Action::GenerateScript).await;

    assert_eq!(notice, Notice::error("Error generating script."));
    assert_eq!(studio.state().script, "keep me");
    assert!(!studio.state().loading.any());
}

#[tokio::test]
async fn test_script_generation_end_to_end_metrics() {
    let backend = ScriptedBackend::default().reply(
        "generate_script",
        json!({"script": words(450), "script_cost": 0.2}),
    );
    let (mut studio, _db, _temp) = studio_with(backend);

    studio.dispatch(Action::GenerateScript).await;

    let metrics = studio
        .state()
        .script_metrics(crate::metrics::DEFAULT_WORDS_PER_MINUTE);
    assert_eq!(metrics.words, 450);
    assert_eq!(metrics.duration.minutes, 3);
    assert_eq!(metrics.duration.seconds, 0);
    assert_eq!(metrics.tokens, 600);
    assert!((studio.state().cost - 0.2).abs() < 1e-9);

    let (_, request) = &studio.backend().calls()[0];
    assert_eq!(request["length"], "1h");
}

#[tokio::test]
async fn test_images_append_to_media_and_add_cost() {
    let backend = ScriptedBackend::default().reply(
        "generate_image",
        json!({"image_urls": ["i1.png", "i2.png", "i3.png"], "cost": 0.06}),
    );
    let (mut studio, _db, _temp) = studio_with(backend);
    studio.edit(|s| s.media_urls = vec!["upload.mp4".to_string()]);

    studio.dispatch(Action::GenerateImages).await;

    assert_eq!(
        studio.state().media_urls,
        vec!["upload.mp4", "i1.png", "i2.png", "i3.png"]
    );
    assert!((studio.state().cost - 0.06).abs() < 1e-9);

    let (_, request) = &studio.backend().calls()[0];
    assert_eq!(request["num_images"], 3);
    assert_eq!(request["image_size"], "512x512");
    assert!(request["prompt"]
        .as_str()
        .unwrap()
        .contains("representing Ancient Rome"));
}

// =========================================================================
// Validation
// =========================================================================

#[tokio::test]
async fn test_validation_blocks_request() {
    let (db, _temp) = setup_db();
    let mut studio = Studio::new(ScriptedBackend::default(), db);

    let notice = studio.dispatch(Action::GenerateTitle).await;
    assert_eq!(notice, Notice::warning("Please enter your OpenAI API key."));

    studio.edit(|s| {
        s.openai_api_key = "sk-test".to_string();
        s.topic = "   ".to_string();
    });
    let notice = studio.dispatch(Action::GenerateScript).await;
    assert_eq!(notice.message, "Please enter a topic.");

    let notice = studio.dispatch(Action::GenerateAudio).await;
    assert_eq!(notice.message, "Please enter your Eleven Labs API key.");

    let notice = studio.dispatch(Action::CreateVideo).await;
    assert_eq!(notice.message, "Need an audio file.");

    let notice = studio
        .dispatch(Action::DownloadVideo(PathBuf::from(".")))
        .await;
    assert_eq!(notice.message, "No video URL to download.");

    assert!(studio.backend().calls().is_empty());
}

#[tokio::test]
async fn test_audio_requires_script_and_voice() {
    let (db, _temp) = setup_db();
    let mut studio = Studio::new(ScriptedBackend::default(), db);
    studio.edit(|s| s.elevenlabs_api_key = "el-key".to_string());

    let notice = studio.dispatch(Action::GenerateAudio).await;
    assert_eq!(notice.message, "Please enter a script.");

    studio.edit(|s| s.script = words(5));
    let notice = studio.dispatch(Action::GenerateAudio).await;
    assert_eq!(notice.message, "Please select a voice.");

    assert!(studio.backend().calls().is_empty());
}

#[tokio::test]
async fn test_custom_split_requires_positive_duration() {
    let (mut studio, _db, _temp) = studio_with(ScriptedBackend::default());
    ready_to_assemble(&mut studio);

    for bad in ["", "abc", "0", "-3"] {
        studio.edit(|s| {
            s.split_type = SplitType::Custom;
            s.duration_per_media = bad.to_string();
        });
        let notice = studio.dispatch(Action::CreateVideo).await;
        assert_eq!(
            notice.message,
            "Please enter a valid duration per media in seconds."
        );
    }
    assert!(studio.backend().calls().is_empty());
    assert!(!studio.state().loading.video);
}

// =========================================================================
// Voices and audio
// =========================================================================

#[tokio::test]
async fn test_entering_key_fetches_voices_and_selects_first() {
    let backend = ScriptedBackend::default().reply(
        "list_voices",
        json!({"voices": [
            {"voice_id": "v-rachel", "name": "Rachel"},
            {"voice_id": "v-adam", "name": "Adam"}
        ]}),
    );
    let (db, _temp) = setup_db();
    let mut studio = Studio::new(backend, db);

    let notice = studio.set_elevenlabs_key("el-key").await;

    assert_eq!(notice, Some(Notice::success("Voices fetched successfully!")));
    assert_eq!(studio.state().voices.len(), 2);
    assert_eq!(studio.state().voice_id, "v-rachel");
    assert_eq!(
        studio.backend().calls(),
        vec![("list_voices", json!({"elevenlabs_api_key": "el-key"}))]
    );

    // Same key again does not refetch
    assert_eq!(studio.set_elevenlabs_key("el-key").await, None);
    assert_eq!(studio.backend().calls().len(), 1);
}

#[tokio::test]
async fn test_generate_audio_uses_selected_voice() {
    let backend = ScriptedBackend::default().reply(
        "generate_audio_elevenlabs",
        json!({"audio_file_url": "http://localhost:5000/static/audio.mp3"}),
    );
    let (db, _temp) = setup_db();
    let mut studio = Studio::new(backend, db);
    studio.edit(|s| {
        s.elevenlabs_api_key = "el-key".to_string();
        s.script = words(10);
        s.voice_id = "v-adam".to_string();
    });

    studio.dispatch(Action::GenerateAudio).await;

    assert_eq!(
        studio.state().audio_url,
        "http://localhost:5000/static/audio.mp3"
    );
    let (_, request) = &studio.backend().calls()[0];
    assert_eq!(request["voice_id"], "v-adam");
    assert_eq!(request["elevenlabs_api_key"], "el-key");
}

// =========================================================================
// Media
// =========================================================================

#[tokio::test]
async fn test_upload_and_remove_media() {
    let backend = ScriptedBackend::default().reply(
        "upload_media",
        json!({"media_urls": ["u1.mp4", "u2.png"]}),
    );
    let (mut studio, _db, _temp) = studio_with(backend);

    studio
        .dispatch(Action::UploadMedia(vec![
            PathBuf::from("clip.mp4"),
            PathBuf::from("still.png"),
        ]))
        .await;
    assert_eq!(studio.state().media_urls, vec!["u1.mp4", "u2.png"]);

    let notice = studio.dispatch(Action::RemoveMedia(0)).await;
    assert_eq!(notice, Notice::info("Media removed."));
    assert_eq!(studio.state().media_urls, vec!["u2.png"]);

    let notice = studio.dispatch(Action::RemoveMedia(5)).await;
    assert_eq!(notice.severity, Severity::Warning);
    assert_eq!(studio.state().media_urls, vec!["u2.png"]);

    // Removal never reaches the backend
    assert_eq!(studio.backend().call_names(), vec!["upload_media"]);
}

// =========================================================================
// Video assembly, persistence, download
// =========================================================================

#[tokio::test]
async fn test_create_video_saves_record() {
    let backend = ScriptedBackend::default().reply(
        "create_video",
        json!({"video_url": "http://localhost:5000/static/final_123.mp4"}),
    );
    let (mut studio, db, _temp) = studio_with(backend);
    ready_to_assemble(&mut studio);

    let notice = studio.dispatch(Action::CreateVideo).await;
    assert_eq!(notice, Notice::success("Video created successfully!"));

    let state = studio.state();
    assert_eq!(state.video_url, "http://localhost:5000/static/final_123.mp4");
    assert_eq!(state.file_name, "Ancient_Rome_Rise_Fall");

    let videos = db.get_videos().unwrap();
    assert_eq!(videos.len(), 1);
    let saved = &videos[0];
    assert_eq!(Some(&saved.id), state.saved_video_id.as_ref());
    assert_eq!(saved.title, "Ancient Rome: Rise & Fall");
    assert_eq!(saved.topic, "Ancient Rome");
    assert_eq!(saved.image_url, "http://localhost:5000/static/a.png");
    assert!(saved.is_renderable());
    assert!(!saved.is_scheduled());
    assert!(chrono::DateTime::parse_from_rfc3339(&saved.created_at).is_ok());

    let (_, request) = &studio.backend().calls()[0];
    assert_eq!(
        request["media_split_config"],
        serde_json::to_value(MediaSplitConfig::equal()).unwrap()
    );
    assert_eq!(request["media_urls"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_video_reports_failed_save() {
    let backend = ScriptedBackend::default().reply(
        "create_video",
        json!({"video_url": "http://localhost:5000/static/final_123.mp4"}),
    );
    let temp = TempDir::new().unwrap();
    let db = Arc::new(
        Database::new(&temp.path().join("tiny.db"))
            .unwrap()
            .with_quota(64),
    );
    let mut studio = Studio::new(backend, db.clone());
    studio.edit(|s| s.openai_api_key = "sk-test".to_string());
    ready_to_assemble(&mut studio);

    let notice = studio.dispatch(Action::CreateVideo).await;

    assert_eq!(notice.severity, Severity::Warning);
    assert!(notice.message.contains("quota"));
    assert_eq!(
        studio.state().video_url,
        "http://localhost:5000/static/final_123.mp4"
    );
    assert_eq!(studio.state().saved_video_id, None);
    assert!(db.get_videos().unwrap().is_empty());
}

#[tokio::test]
async fn test_download_uses_derived_file_name() {
    let backend = ScriptedBackend::default()
        .reply(
            "create_video",
            json!({"video_url": "http://localhost:5000/static/final_123.mp4"}),
        )
        .reply("download_video", json!({"bytes": "mp4-bytes"}));
    let (mut studio, _db, temp) = studio_with(backend);
    ready_to_assemble(&mut studio);
    studio.dispatch(Action::CreateVideo).await;

    let notice = studio
        .dispatch(Action::DownloadVideo(temp.path().to_path_buf()))
        .await;

    assert_eq!(notice, Notice::success("Video downloaded successfully!"));
    let expected = temp.path().join("Ancient_Rome_Rise_Fall.mp4");
    assert_eq!(std::fs::read_to_string(&expected).unwrap(), "mp4-bytes");
    assert_eq!(
        studio.state().downloaded_path,
        Some(expected.to_string_lossy().to_string())
    );

    let (_, request) = &studio.backend().calls()[1];
    assert_eq!(request["filename"], "final_123.mp4");
}

#[tokio::test]
async fn test_download_falls_back_to_default_name() {
    let backend = ScriptedBackend::default().reply("download_video", json!({"bytes": "x"}));
    let (db, temp) = setup_db();
    let mut studio = Studio::new(backend, db);
    studio.edit(|s| s.video_url = "http://localhost:5000/static/out.mp4".to_string());

    studio
        .dispatch(Action::DownloadVideo(temp.path().to_path_buf()))
        .await;

    assert!(temp.path().join("final_video.mp4").exists());
}

#[tokio::test]
async fn test_generate_previews_message() {
    let backend = ScriptedBackend::default().reply(
        "generate_all_previews",
        json!({"message": "Generated 12 previews."}),
    );
    let (db, _temp) = setup_db();
    let mut studio = Studio::new(backend, db);
    studio.edit(|s| s.elevenlabs_api_key = "el-key".to_string());

    let notice = studio.dispatch(Action::GeneratePreviews).await;
    assert_eq!(notice, Notice::success("Generated 12 previews."));
}

// =========================================================================
// Library
// =========================================================================

fn may_second() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
}

fn seeded_library(backend: ScriptedBackend) -> (Library<ScriptedBackend>, Arc<Database>, TempDir) {
    let (db, temp) = setup_db();
    let state = CreateVideoState {
        title: "Rome".to_string(),
        topic: "Ancient Rome".to_string(),
        video_url: "http://localhost:5000/static/rome.mp4".to_string(),
        ..Default::default()
    };
    for id in ["v1", "v2"] {
        db.store_video(state.to_record(id.to_string(), "2024-05-01T10:00:00.000Z".to_string()))
            .unwrap();
    }
    let library = Library::new(backend, db.clone(), may_second());
    (library, db, temp)
}

async fn connect_tiktok(library: &mut Library<ScriptedBackend>) {
    let notice = library.dispatch(LibraryAction::CheckTikTok).await;
    assert_eq!(notice.severity, Severity::Success);
}

#[tokio::test]
async fn test_refresh_and_delete() {
    let (mut library, db, _temp) = seeded_library(ScriptedBackend::default());

    library.dispatch(LibraryAction::Refresh).await;
    let ids: Vec<_> = library.state().videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["v2", "v1"]);

    let notice = library.dispatch(LibraryAction::Delete("v2".to_string())).await;
    assert_eq!(notice, Notice::info("Video deleted successfully!"));
    assert_eq!(library.state().videos.len(), 1);
    assert_eq!(db.get_videos().unwrap()[0].id, "v1");

    let notice = library.dispatch(LibraryAction::Delete("v2".to_string())).await;
    assert_eq!(notice, Notice::warning("Video not found."));
}

#[tokio::test]
async fn test_delete_updates_listing_without_refresh() {
    let (mut library, db, _temp) = seeded_library(ScriptedBackend::default());
    assert!(library.state().videos.is_empty());

    let notice = library.dispatch(LibraryAction::Delete("v1".to_string())).await;
    assert_eq!(notice, Notice::info("Video deleted successfully!"));
    let ids: Vec<_> = library.state().videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["v2"]);
    assert_eq!(db.get_videos().unwrap().len(), 1);
}

#[tokio::test]
async fn test_schedule_requires_tiktok_auth() {
    let backend = ScriptedBackend::default().reply("tiktok_status", json!({"authenticated": false}));
    let (mut library, _db, _temp) = seeded_library(backend);

    library.dispatch(LibraryAction::CheckTikTok).await;
    let notice = library
        .dispatch(LibraryAction::Schedule {
            id: "v1".to_string(),
            scheduled_time: "2024-05-02T09:30".to_string(),
        })
        .await;

    assert_eq!(notice, Notice::warning("Please authenticate with TikTok first."));
    assert_eq!(library.backend().call_names(), vec!["tiktok_status"]);
}

#[tokio::test]
async fn test_schedule_must_match_selected_date() {
    let backend = ScriptedBackend::default().reply(
        "tiktok_status",
        json!({"authenticated": true, "access_token": "tt-token"}),
    );
    let (mut library, db, _temp) = seeded_library(backend);
    connect_tiktok(&mut library).await;

    let notice = library
        .dispatch(LibraryAction::Schedule {
            id: "v1".to_string(),
            scheduled_time: "2024-05-03T09:30".to_string(),
        })
        .await;
    assert_eq!(notice.message, "Scheduled time must be on the selected date.");

    let notice = library
        .dispatch(LibraryAction::Schedule {
            id: "v1".to_string(),
            scheduled_time: String::new(),
        })
        .await;
    assert_eq!(notice.message, "Please select a date and time.");

    assert!(!db.get_video("v1").unwrap().unwrap().is_scheduled());
    assert_eq!(library.backend().call_names(), vec!["tiktok_status"]);
}

#[tokio::test]
async fn test_schedule_success_updates_record() {
    let backend = ScriptedBackend::default()
        .reply(
            "tiktok_status",
            json!({"authenticated": true, "access_token": "tt-token"}),
        )
        .reply("schedule_post", json!({"message": "ok"}));
    let (mut library, db, _temp) = seeded_library(backend);
    connect_tiktok(&mut library).await;

    let notice = library
        .dispatch(LibraryAction::Schedule {
            id: "v1".to_string(),
            scheduled_time: "2024-05-02T09:30".to_string(),
        })
        .await;

    assert_eq!(notice, Notice::success("Post scheduled on TikTok successfully!"));
    let listed: Vec<_> = library
        .state()
        .videos
        .iter()
        .map(|v| (v.id.as_str(), v.is_scheduled()))
        .collect();
    assert_eq!(listed, vec![("v2", false), ("v1", true)]);
    let v1 = db.get_video("v1").unwrap().unwrap();
    assert_eq!(v1.scheduled_post.as_deref(), Some("2024-05-02T09:30"));
    assert!(!db.get_video("v2").unwrap().unwrap().is_scheduled());

    let (_, request) = &library.backend().calls()[1];
    assert_eq!(
        request,
        &json!({
            "video_id": "v1",
            "scheduled_time": "2024-05-02T09:30",
            "tiktok_access_token": "tt-token"
        })
    );
}

#[tokio::test]
async fn test_schedule_rejected_leaves_record_unscheduled() {
    let backend = ScriptedBackend::default()
        .reply(
            "tiktok_status",
            json!({"authenticated": true, "access_token": "tt-token"}),
        )
        .fail("schedule_post", AppError::Backend("token expired".to_string()));
    let (mut library, db, _temp) = seeded_library(backend);
    connect_tiktok(&mut library).await;

    let notice = library
        .dispatch(LibraryAction::Schedule {
            id: "v1".to_string(),
            scheduled_time: "2024-05-02T09:30".to_string(),
        })
        .await;

    assert_eq!(notice, Notice::error("token expired"));
    assert!(!db.get_video("v1").unwrap().unwrap().is_scheduled());
    assert!(!library.state().loading);
}

#[tokio::test]
async fn test_schedule_unknown_video() {
    let backend = ScriptedBackend::default().reply(
        "tiktok_status",
        json!({"authenticated": true, "access_token": "tt-token"}),
    );
    let (mut library, _db, _temp) = seeded_library(backend);
    connect_tiktok(&mut library).await;

    let notice = library
        .dispatch(LibraryAction::Schedule {
            id: "missing".to_string(),
            scheduled_time: "2024-05-02T09:30".to_string(),
        })
        .await;

    assert!(notice.is_error());
    assert_eq!(library.backend().call_names(), vec!["tiktok_status"]);
}
