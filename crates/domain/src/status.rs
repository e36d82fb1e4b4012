//! Playback classification of raw device status output.
//!
//! The cast transport reports device state as loosely structured text
//! (volume lines, a title, a playback state, an app name). Classifying
//! that text — not issuing the cast itself — is the part that requires
//! care: a dashboard session also reports `State: PLAYING`, so dashboard
//! markers must be checked before media-state lines.

use serde::{Deserialize, Serialize};

/// Substrings (lowercase) that identify a dashboard session beyond the
/// configured per-window markers.
const DASHBOARD_INDICATORS: &[&str] = &["8123", "dashboard", "kiosk", "homeassistant"];

/// What a device is currently showing, as far as its status output tells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Nothing is playing; the device is ready to receive a cast.
    Idle,
    /// One of our dashboards is on screen.
    ShowingDashboard,
    /// Some other media (music, video, an assistant interaction) is active.
    OtherMedia,
}

impl PlaybackState {
    /// Whether a cast would interrupt foreign content.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::OtherMedia)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::ShowingDashboard => f.write_str("showing_dashboard"),
            Self::OtherMedia => f.write_str("other_media"),
        }
    }
}

/// Classify raw status output against a device's dashboard markers.
///
/// Classification order matters:
/// 1. volume-only or explicitly idle output is [`PlaybackState::Idle`]
/// 2. a starting cast or an assistant interaction is busy
/// 3. dashboard markers/indicators win over media-state lines, because a
///    cast dashboard itself reports `State: PLAYING`
/// 4. anything else is foreign content and treated as busy
#[must_use]
pub fn classify_status(raw: &str, markers: &[&str]) -> PlaybackState {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_volume_only(trimmed) {
        return PlaybackState::Idle;
    }
    if trimmed.contains("Idle") || trimmed.contains("Nothing is currently playing") {
        return PlaybackState::Idle;
    }

    let lower = trimmed.to_lowercase();
    if trimmed.contains("Casting: Starting") || lower.contains("assistant") {
        return PlaybackState::OtherMedia;
    }

    if markers.iter().any(|marker| trimmed.contains(marker)) {
        return PlaybackState::ShowingDashboard;
    }
    if DASHBOARD_INDICATORS
        .iter()
        .any(|indicator| lower.contains(indicator))
    {
        return PlaybackState::ShowingDashboard;
    }

    // Everything else — media-state lines, foreign titles, known media
    // apps, or output we cannot recognise — must not be cast over.
    PlaybackState::OtherMedia
}

/// Extract the reported volume percentage from status output, if present.
#[must_use]
pub fn parse_volume(raw: &str) -> Option<u8> {
    for line in raw.lines() {
        if let Some(rest) = line.trim().strip_prefix("Volume:") {
            if let Ok(volume) = rest.trim().parse::<u8>() {
                return Some(volume.min(100));
            }
        }
    }
    None
}

/// Idle devices report nothing but one or two volume lines.
fn is_volume_only(trimmed: &str) -> bool {
    let lines: Vec<&str> = trimmed.lines().collect();
    lines.len() <= 2 && lines.iter().all(|line| line.trim().starts_with("Volume"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKERS: &[&str] = &["Dummy"];

    #[test]
    fn should_classify_volume_only_output_as_idle() {
        let raw = "Volume: 35\nVolume muted: False";
        assert_eq!(classify_status(raw, MARKERS), PlaybackState::Idle);
    }

    #[test]
    fn should_classify_empty_output_as_idle() {
        assert_eq!(classify_status("", MARKERS), PlaybackState::Idle);
        assert_eq!(classify_status("   \n ", MARKERS), PlaybackState::Idle);
    }

    #[test]
    fn should_classify_explicit_idle_as_idle() {
        assert_eq!(
            classify_status("Idle\nVolume: 35", MARKERS),
            PlaybackState::Idle
        );
        assert_eq!(
            classify_status("Nothing is currently playing", MARKERS),
            PlaybackState::Idle
        );
    }

    #[test]
    fn should_classify_marker_title_as_dashboard() {
        let raw = "Title: Dummy\nState: PLAYING\nVolume: 35";
        assert_eq!(classify_status(raw, MARKERS), PlaybackState::ShowingDashboard);
    }

    #[test]
    fn should_classify_custom_marker_as_dashboard() {
        let raw = "Title: Evening Board\nState: PLAYING";
        assert_eq!(
            classify_status(raw, &["Evening Board"]),
            PlaybackState::ShowingDashboard
        );
    }

    #[test]
    fn should_classify_dashboard_indicators_as_dashboard() {
        let raw = "Title: http://hub.local:8123/lovelace/kiosk\nState: PLAYING";
        assert_eq!(classify_status(raw, &[]), PlaybackState::ShowingDashboard);
    }

    #[test]
    fn should_classify_playing_media_as_other_media() {
        let raw = "Title: Some Song\nState: PLAYING\nVolume: 35";
        assert_eq!(classify_status(raw, MARKERS), PlaybackState::OtherMedia);
    }

    #[test]
    fn should_classify_paused_media_as_other_media() {
        let raw = "Title: Paused Movie\nState: PAUSED";
        assert_eq!(classify_status(raw, MARKERS), PlaybackState::OtherMedia);
    }

    #[test]
    fn should_classify_known_media_apps_as_other_media() {
        let raw = "Spotify\nVolume: 20\nVolume muted: False";
        assert_eq!(classify_status(raw, MARKERS), PlaybackState::OtherMedia);
    }

    #[test]
    fn should_classify_starting_cast_as_other_media() {
        let raw = "Casting: Starting";
        assert_eq!(classify_status(raw, MARKERS), PlaybackState::OtherMedia);
    }

    #[test]
    fn should_classify_assistant_interaction_as_other_media() {
        let raw = "Google Assistant\nVolume: 35\nVolume muted: False";
        assert_eq!(classify_status(raw, MARKERS), PlaybackState::OtherMedia);
    }

    #[test]
    fn should_treat_unrecognised_output_as_other_media() {
        let raw = "Something entirely unexpected";
        assert_eq!(classify_status(raw, MARKERS), PlaybackState::OtherMedia);
    }

    #[test]
    fn should_parse_volume_line() {
        assert_eq!(parse_volume("Title: Dummy\nVolume: 35"), Some(35));
        assert_eq!(parse_volume("Volume: 0"), Some(0));
    }

    #[test]
    fn should_clamp_parsed_volume_to_100() {
        // u8 parses up to 255; anything over full volume is clamped.
        assert_eq!(parse_volume("Volume: 250"), Some(100));
    }

    #[test]
    fn should_return_none_when_volume_missing_or_malformed() {
        assert_eq!(parse_volume("Title: Dummy"), None);
        assert_eq!(parse_volume("Volume: loud"), None);
        assert_eq!(parse_volume(""), None);
    }

    #[test]
    fn should_report_busy_only_for_other_media() {
        assert!(PlaybackState::OtherMedia.is_busy());
        assert!(!PlaybackState::Idle.is_busy());
        assert!(!PlaybackState::ShowingDashboard.is_busy());
    }
}
