use super::state::LibraryState;
use super::Notice;
use crate::backend::{Backend, ScheduleRequest};
use crate::database::{Database, VideoPatch};
use crate::error::AppError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::Instrument;

/// User actions on the video library screen.
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryAction {
    Refresh,
    CheckTikTok,
    Delete(String),
    Schedule { id: String, scheduled_time: String },
}

/// Accepts RFC 3339 or the `YYYY-MM-DDTHH:MM[:SS]` form a datetime input
/// produces. Offsets are kept as written, not converted.
pub fn parse_schedule_time(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
}

/// Orchestrator for the library screen: local list management plus TikTok
/// scheduling.
pub struct Library<B> {
    backend: B,
    db: Arc<Database>,
    state: LibraryState,
}

impl<B: Backend> Library<B> {
    pub fn new(backend: B, db: Arc<Database>, selected_date: NaiveDate) -> Self {
        Self {
            backend,
            db,
            state: LibraryState::new(selected_date),
        }
    }

    pub fn state(&self) -> &LibraryState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.state.selected_date = date;
    }

    pub async fn dispatch(&mut self, action: LibraryAction) -> Notice {
        let notice = match action {
            LibraryAction::Refresh => self.refresh(),
            LibraryAction::CheckTikTok => self.check_tiktok().await,
            LibraryAction::Delete(id) => self.delete(&id),
            LibraryAction::Schedule { id, scheduled_time } => {
                self.schedule(&id, &scheduled_time).await
            }
        };
        self.state.notice = Some(notice.clone());
        notice
    }

    fn refresh(&mut self) -> Notice {
        match self.db.get_videos() {
            Ok(videos) => {
                let count = videos.len();
                self.state.videos = videos;
                if count == 0 {
                    Notice::info("No videos found. Create some videos first!")
                } else {
                    Notice::info(format!("{} video(s)", count))
                }
            }
            Err(e) => {
                log::error!("Failed to load videos: {}", e);
                Notice::error("Error fetching videos.")
            }
        }
    }

    /// Re-read the list after a successful write. The write already landed
    /// in `state.videos`, so a failed read only leaves other clients'
    /// changes unseen.
    fn reload(&mut self) {
        match self.db.get_videos() {
            Ok(videos) => self.state.videos = videos,
            Err(e) => log::warn!("Failed to reload videos: {}", e),
        }
    }

    async fn check_tiktok(&mut self) -> Notice {
        let span = tracing::info_span!("action", name = "tiktok_status");
        match self.backend.tiktok_status().instrument(span).await {
            Ok(status) if status.authenticated && status.access_token.is_some() => {
                self.state.tiktok_authenticated = true;
                self.state.tiktok_access_token = status.access_token;
                Notice::success("TikTok Connected")
            }
            Ok(_) => Notice::info("TikTok is not connected."),
            Err(e) => {
                log::error!("tiktok_status error: {}", e);
                Notice::error("Error checking TikTok status.")
            }
        }
    }

    fn delete(&mut self, id: &str) -> Notice {
        match self.db.delete_video(id) {
            Ok(true) => {
                self.state.videos.retain(|v| v.id != id);
                self.reload();
                Notice::info("Video deleted successfully!")
            }
            Ok(false) => Notice::warning("Video not found."),
            Err(e) => {
                log::error!("Failed to delete video {}: {}", id, e);
                Notice::error(format!("Error deleting video: {}", AppError::from(e)))
            }
        }
    }

    fn check_schedule(&self, id: &str, scheduled_time: &str) -> Result<String, AppError> {
        if scheduled_time.trim().is_empty() {
            return Err(AppError::Validation(
                "Please select a date and time.".to_string(),
            ));
        }
        let token = match (&self.state.tiktok_access_token, self.state.tiktok_authenticated) {
            (Some(token), true) if !token.is_empty() => token.clone(),
            _ => {
                return Err(AppError::Validation(
                    "Please authenticate with TikTok first.".to_string(),
                ))
            }
        };
        let when = parse_schedule_time(scheduled_time).ok_or_else(|| {
            AppError::Validation(format!("Invalid date and time: {}", scheduled_time))
        })?;
        if when.date() != self.state.selected_date {
            return Err(AppError::Validation(
                "Scheduled time must be on the selected date.".to_string(),
            ));
        }
        if self.db.get_video(id)?.is_none() {
            return Err(AppError::NotFound(format!("video {}", id)));
        }
        Ok(token)
    }

    /// The local record only changes once the backend has accepted the post.
    async fn schedule(&mut self, id: &str, scheduled_time: &str) -> Notice {
        let token = match self.check_schedule(id, scheduled_time) {
            Ok(token) => token,
            Err(AppError::Validation(message)) => return Notice::warning(message),
            Err(e) => return Notice::error(e.to_string()),
        };

        let request = ScheduleRequest {
            video_id: id.to_string(),
            scheduled_time: scheduled_time.to_string(),
            tiktok_access_token: token,
        };

        self.state.loading = true;
        let span = tracing::info_span!("action", name = "schedule_post");
        let result = self.backend.schedule_post(&request).instrument(span).await;
        self.state.loading = false;

        match result {
            Ok(()) => match self.db.update_video(id, VideoPatch::schedule(scheduled_time)) {
                Ok(_) => {
                    if let Some(video) = self.state.videos.iter_mut().find(|v| v.id == id) {
                        video.apply(VideoPatch::schedule(scheduled_time));
                    }
                    self.reload();
                    Notice::success("Post scheduled on TikTok successfully!")
                }
                Err(e) => {
                    log::error!("Scheduled {} remotely but failed to save: {}", id, e);
                    Notice::warning(format!(
                        "Post scheduled on TikTok, but saving the schedule failed: {}",
                        AppError::from(e)
                    ))
                }
            },
            Err(AppError::Backend(message)) => {
                log::warn!("schedule_post failed on backend: {}", message);
                Notice::error(message)
            }
            Err(e) => {
                log::error!("schedule_post error: {}", e);
                Notice::error("Error scheduling post.")
            }
        }
    }
}
