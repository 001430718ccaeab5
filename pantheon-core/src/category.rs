use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One of the six fixed tiers an item is placed into.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Olympian,
    Titan,
    Hero,
    Legend,
    Muse,
    Limbo,
}

impl Category {
    /// Rendering order of the tiers, best first.  `Limbo` is the catch-all.
    pub const ALL: [Category; 6] = [
        Category::Olympian,
        Category::Titan,
        Category::Hero,
        Category::Legend,
        Category::Muse,
        Category::Limbo,
    ];

    /// Tiers that carry a mythological figure.
    pub const TAGGED: [Category; 3] = [Category::Olympian, Category::Titan, Category::Hero];

    pub fn is_taggable(self) -> bool {
        Self::TAGGED.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Olympian => "olympian",
            Category::Titan => "titan",
            Category::Hero => "hero",
            Category::Legend => "legend",
            Category::Muse => "muse",
            Category::Limbo => "limbo",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Olympian => "Olympian",
            Category::Titan => "Titan",
            Category::Hero => "Hero",
            Category::Legend => "Legend",
            Category::Muse => "Muse",
            Category::Limbo => "Limbo",
        }
    }

    /// Single-character code used by the share codec.
    pub fn code(self) -> char {
        match self {
            Category::Olympian => 'o',
            Category::Titan => 't',
            Category::Hero => 'h',
            Category::Legend => 'l',
            Category::Muse => 'm',
            Category::Limbo => 'x',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|cat| cat.code() == code)
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Limbo
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cat| cat.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}
