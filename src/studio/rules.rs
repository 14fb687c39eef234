//! Derived-state rules, evaluated after every transition of the create screen.

use super::state::CreateVideoState;
use regex::Regex;
use std::sync::OnceLock;

/// Bring derived fields up to date. Each rule only fills in empty fields,
/// so running this repeatedly is harmless.
pub fn apply(state: &mut CreateVideoState) {
    select_first_voice(state);
    derive_file_name(state);
}

/// Voice list is non-empty and nothing is selected: select the first voice.
fn select_first_voice(state: &mut CreateVideoState) {
    if !state.voice_id.is_empty() {
        return;
    }
    if let Some(first) = state.voices.first() {
        log::info!("Auto-selecting voice {} ({})", first.voice_id, first.name);
        state.voice_id = first.voice_id.clone();
    }
}

/// A finished video with a title and no chosen file name is named after
/// the title.
fn derive_file_name(state: &mut CreateVideoState) {
    if !state.video_url.is_empty() && !state.title.is_empty() && state.file_name.is_empty() {
        state.file_name = sanitize_file_name(&state.title);
    }
}

/// Compiled once: rules run after every transition.
fn unsafe_file_chars() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"[^a-zA-Z0-9_\-]+").ok())
        .as_ref()
}

/// Replace every run of characters outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_file_name(title: &str) -> String {
    unsafe_file_chars()
        .map(|re| re.replace_all(title, "_").to_string())
        .unwrap_or_else(|| title.to_string())
}
