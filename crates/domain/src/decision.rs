//! Decision — the resolver's verdict for one device on one tick.

use serde::{Deserialize, Serialize};

/// Where a cast decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// The n-th dashboard window (declaration order) matched.
    Window(usize),
    /// An active entity-triggered override superseded the windows.
    Override,
}

/// What should happen on this device right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Nothing should be cast. An already showing dashboard is left alone.
    NoAction,
    /// This dashboard should be on screen.
    CastTo {
        url: String,
        /// Volume (0-100) to apply after a successful cast.
        volume: Option<u8>,
        /// Whether the cast may interrupt other playing media.
        force_cast: bool,
        source: DecisionSource,
    },
}

impl Decision {
    /// The target URL, when the decision is to cast.
    #[must_use]
    pub fn target_url(&self) -> Option<&str> {
        match self {
            Self::NoAction => None,
            Self::CastTo { url, .. } => Some(url),
        }
    }
}
