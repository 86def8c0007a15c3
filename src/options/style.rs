use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// Named visual preset applied to an imported object.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    /// Van der Waals spheres.
    #[default]
    Spheres,
    /// Secondary-structure cartoon.
    Cartoon,
    /// Backbone ribbon.
    Ribbon,
    /// Atoms and bonds.
    BallAndStick,
    /// Solvent-accessible surface.
    Surface,
    /// Combined preset 1.
    #[serde(rename = "preset_1")]
    Preset1,
    /// Combined preset 2.
    #[serde(rename = "preset_2")]
    Preset2,
    /// Combined preset 3.
    #[serde(rename = "preset_3")]
    Preset3,
    /// Combined preset 4.
    #[serde(rename = "preset_4")]
    Preset4,
}

impl Style {
    /// Every style, in menu order.
    pub const ALL: [Self; 9] = [
        Self::Spheres,
        Self::Cartoon,
        Self::Ribbon,
        Self::BallAndStick,
        Self::Surface,
        Self::Preset1,
        Self::Preset2,
        Self::Preset3,
        Self::Preset4,
    ];

    /// Identifier used in option files and on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Spheres => "spheres",
            Self::Cartoon => "cartoon",
            Self::Ribbon => "ribbon",
            Self::BallAndStick => "ball_and_stick",
            Self::Surface => "surface",
            Self::Preset1 => "preset_1",
            Self::Preset2 => "preset_2",
            Self::Preset3 => "preset_3",
            Self::Preset4 => "preset_4",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Style {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|style| style.name() == wanted)
            .ok_or_else(|| {
                ImportError::OptionsParse(format!("unknown style `{s}`"))
            })
    }
}
