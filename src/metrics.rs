//! Derived script metrics: word count, spoken duration and token estimates.

use serde::Serialize;

/// Typical narration pace used when nothing else is configured.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 150;

/// Rule of thumb: one token per 0.75 words.
const WORDS_PER_TOKEN: f64 = 0.75;

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScriptDuration {
    pub minutes: u64,
    pub seconds: u64,
}

impl std::fmt::Display for ScriptDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} min {} sec", self.minutes, self.seconds)
    }
}

/// Estimate how long the text takes to read aloud at `words_per_minute`.
///
/// Seconds are rounded to the nearest whole second; a remainder that rounds
/// up to 60 is carried into the minutes.
pub fn estimate_duration(text: &str, words_per_minute: u32) -> ScriptDuration {
    if words_per_minute == 0 {
        return ScriptDuration { minutes: 0, seconds: 0 };
    }

    let total_minutes = word_count(text) as f64 / words_per_minute as f64;
    let mut minutes = total_minutes.floor() as u64;
    let mut seconds = ((total_minutes - total_minutes.floor()) * 60.0).round() as u64;
    if seconds >= 60 {
        minutes += 1;
        seconds -= 60;
    }

    ScriptDuration { minutes, seconds }
}

/// Approximate LLM token count for the text.
pub fn approximate_tokens(text: &str) -> usize {
    (word_count(text) as f64 / WORDS_PER_TOKEN).round() as usize
}

/// Everything the script preview shows next to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScriptMetrics {
    pub words: usize,
    pub duration: ScriptDuration,
    pub tokens: usize,
}

impl ScriptMetrics {
    pub fn of(text: &str, words_per_minute: u32) -> Self {
        Self {
            words: word_count(text),
            duration: estimate_duration(text, words_per_minute),
            tokens: approximate_tokens(text),
        }
    }
}
