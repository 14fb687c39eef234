use serde::{Deserialize, Serialize};

/// Requested script length. Unknown categories survive a load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScriptLength {
    OneMinute,
    TwoMinutes,
    FiveMinutes,
    TenMinutes,
    TwentyMinutes,
    OneHour,
    TwoHours,
    Custom(String),
}

impl Default for ScriptLength {
    fn default() -> Self {
        Self::OneHour
    }
}

impl std::fmt::Display for ScriptLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OneMinute => write!(f, "1m"),
            Self::TwoMinutes => write!(f, "2m"),
            Self::FiveMinutes => write!(f, "5m"),
            Self::TenMinutes => write!(f, "10m"),
            Self::TwentyMinutes => write!(f, "20m"),
            Self::OneHour => write!(f, "1h"),
            Self::TwoHours => write!(f, "2h"),
            Self::Custom(other) => write!(f, "{}", other),
        }
    }
}

impl From<String> for ScriptLength {
    fn from(s: String) -> Self {
        match s.as_str() {
            "1m" => Self::OneMinute,
            "2m" => Self::TwoMinutes,
            "5m" => Self::FiveMinutes,
            "10m" => Self::TenMinutes,
            "20m" => Self::TwentyMinutes,
            "1h" => Self::OneHour,
            "2h" => Self::TwoHours,
            _ => Self::Custom(s),
        }
    }
}

impl From<ScriptLength> for String {
    fn from(length: ScriptLength) -> Self {
        length.to_string()
    }
}

impl std::str::FromStr for ScriptLength {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

/// Metadata of one finished video, as kept in local storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub script_length: ScriptLength,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub image_url: String,
    pub created_at: String,
    #[serde(default)]
    pub scheduled_post: Option<String>,
}

impl VideoRecord {
    pub fn is_scheduled(&self) -> bool {
        self.scheduled_post.is_some()
    }

    /// A record without a video URL has nothing to play yet.
    pub fn is_renderable(&self) -> bool {
        !self.video_url.is_empty()
    }

    /// Merge the fields named in `patch` into this record.
    pub fn apply(&mut self, patch: VideoPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(topic) = patch.topic {
            self.topic = topic;
        }
        if let Some(script) = patch.script {
            self.script = script;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(script_length) = patch.script_length {
            self.script_length = script_length;
        }
        if let Some(video_url) = patch.video_url {
            self.video_url = video_url;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = image_url;
        }
        if let Some(scheduled_post) = patch.scheduled_post {
            self.scheduled_post = scheduled_post;
        }
    }
}

/// Partial update for a [`VideoRecord`]. `None` leaves a field untouched;
/// `scheduled_post: Some(None)` clears the schedule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub topic: Option<String>,
    pub script: Option<String>,
    pub model: Option<String>,
    pub script_length: Option<ScriptLength>,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub scheduled_post: Option<Option<String>>,
}

impl VideoPatch {
    pub fn schedule(at: impl Into<String>) -> Self {
        Self {
            scheduled_post: Some(Some(at.into())),
            ..Default::default()
        }
    }
}
