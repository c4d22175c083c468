//! Element record model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Chemical classification of an element.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Group 1 metals.
    #[serde(rename = "Alkali metal")]
    AlkaliMetal,
    /// Group 2 metals.
    #[serde(rename = "Alkaline earth metal")]
    AlkalineEarthMetal,
    /// d-block metals.
    #[serde(rename = "Transition metal")]
    TransitionMetal,
    /// Metals to the right of the transition block.
    #[serde(rename = "Post-transition metal")]
    PostTransitionMetal,
    /// Metalloids.
    #[serde(rename = "Metalloid")]
    Metalloid,
    /// Reactive non-metals.
    #[serde(rename = "Non-metal")]
    NonMetal,
    /// Group 17.
    #[serde(rename = "Halogen")]
    Halogen,
    /// Group 18.
    #[serde(rename = "Noble gas")]
    NobleGas,
    /// Elements 57-71.
    #[serde(rename = "Lanthanide")]
    Lanthanide,
    /// Elements 89-103.
    #[serde(rename = "Actinide")]
    Actinide,
    /// Not yet characterised.
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Classification {
    /// Every classification, in legend order.
    pub const ALL: [Self; 11] = [
        Self::AlkaliMetal,
        Self::AlkalineEarthMetal,
        Self::TransitionMetal,
        Self::PostTransitionMetal,
        Self::Metalloid,
        Self::NonMetal,
        Self::Halogen,
        Self::NobleGas,
        Self::Lanthanide,
        Self::Actinide,
        Self::Unknown,
    ];

    /// Display form, identical to the data file spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlkaliMetal => "Alkali metal",
            Self::AlkalineEarthMetal => "Alkaline earth metal",
            Self::TransitionMetal => "Transition metal",
            Self::PostTransitionMetal => "Post-transition metal",
            Self::Metalloid => "Metalloid",
            Self::NonMetal => "Non-metal",
            Self::Halogen => "Halogen",
            Self::NobleGas => "Noble gas",
            Self::Lanthanide => "Lanthanide",
            Self::Actinide => "Actinide",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| value.to_string())
    }
}

/// Orbital block.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Block {
    /// s-block.
    S,
    /// p-block.
    P,
    /// d-block.
    D,
    /// f-block.
    F,
}

impl Block {
    /// Single-letter form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S => "s",
            Self::P => "p",
            Self::D => "d",
            Self::F => "f",
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Block {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().trim_end_matches("-block") {
            "s" | "S" => Ok(Self::S),
            "p" | "P" => Ok(Self::P),
            "d" | "D" => Ok(Self::D),
            "f" | "F" => Ok(Self::F),
            _ => Err(value.to_string()),
        }
    }
}

/// The two inner-transition series drawn below the main table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Series {
    /// 57-71.
    Lanthanide,
    /// 89-103.
    Actinide,
}

impl FromStr for Series {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().trim_end_matches('s');
        if wanted.eq_ignore_ascii_case("lanthanide") {
            Ok(Self::Lanthanide)
        } else if wanted.eq_ignore_ascii_case("actinide") {
            Ok(Self::Actinide)
        } else {
            Err(value.to_string())
        }
    }
}

/// One row of periodic-table data.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    /// Unique key, 1-118.
    pub atomic_number: u8,
    /// Chemical symbol.
    pub symbol: String,
    /// English name.
    pub name: String,
    /// Standard atomic weight, kept as written in the data file.
    pub atomic_mass: String,
    /// Ground-state electron configuration.
    pub electron_configuration: String,
    /// IUPAC group; absent for lanthanides and actinides.
    pub group: Option<u8>,
    /// Period 1-7.
    pub period: u8,
    /// Chemical classification.
    pub classification: Classification,
    /// Orbital block.
    pub block: Block,
}

impl ElementRecord {
    /// Which inner-transition series the element belongs to, if any.
    #[must_use]
    pub const fn series(&self) -> Option<Series> {
        match self.classification {
            Classification::Lanthanide => Some(Series::Lanthanide),
            Classification::Actinide => Some(Series::Actinide),
            _ => None,
        }
    }

    /// Group rendered for humans (`N/A` when absent).
    #[must_use]
    pub fn group_label(&self) -> String {
        self.group.map_or_else(|| "N/A".to_string(), |g| g.to_string())
    }
}
