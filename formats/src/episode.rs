//! Client episodes
//!
//! Every record layout in this crate is keyed by the client release that
//! wrote it. Episodes map one-to-one onto codec [`Version`]s.

use std::fmt;
use std::str::FromStr;

use relic_codec::Version;
use serde::{Deserialize, Serialize};

use crate::error::FormatError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Episode {
    Ep4 = 4,
    #[default]
    Ep5 = 5,
    Ep6 = 6,
    Ep7 = 7,
    Ep8 = 8,
}

impl Episode {
    pub const ALL: [Episode; 5] = [
        Episode::Ep4,
        Episode::Ep5,
        Episode::Ep6,
        Episode::Ep7,
        Episode::Ep8,
    ];

    pub const fn number(self) -> u16 {
        self as u16
    }

    pub const fn version(self) -> Version {
        Version::new(self.number())
    }

    pub fn from_number(number: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.number() == number)
    }
}

impl From<Episode> for Version {
    fn from(episode: Episode) -> Self {
        episode.version()
    }
}

impl TryFrom<Version> for Episode {
    type Error = FormatError;

    fn try_from(version: Version) -> Result<Self, Self::Error> {
        version
            .number()
            .and_then(Episode::from_number)
            .ok_or_else(|| FormatError::UnknownEpisode(version.to_string()))
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ep{}", self.number())
    }
}

/// Accepts `ep5`, `EP5`, `episode5` or a bare `5`
impl FromStr for Episode {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let digits = lower
            .strip_prefix("episode")
            .or_else(|| lower.strip_prefix("ep"))
            .unwrap_or(&lower);
        digits
            .parse::<u16>()
            .ok()
            .and_then(Episode::from_number)
            .ok_or_else(|| FormatError::UnknownEpisode(s.to_string()))
    }
}
