use std::{fmt, str::FromStr, sync::Arc};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{category::Category, error::Error, figure::FigureId, item_id::ItemId};

/// Placeholder genre for items whose genre has not been looked up yet.
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Placeholder year for items whose release year has not been looked up yet.
pub const UNKNOWN_YEAR: i32 = 0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Game,
    Movie,
    #[serde(rename = "tvshow")]
    TvShow,
}

/// Everything that differs between content kinds, in one table.
pub struct KindSpec {
    pub kind: ContentKind,
    pub label: &'static str,
    /// Discriminator used in storage keys and the share URL `type` parameter.
    pub slug: &'static str,
    pub empty_details: fn() -> Details,
}

static KIND_SPECS: [KindSpec; 3] = [
    KindSpec {
        kind: ContentKind::Game,
        label: "Games",
        slug: "games",
        empty_details: || Details::Game(GameDetails::default()),
    },
    KindSpec {
        kind: ContentKind::Movie,
        label: "Movies",
        slug: "movies",
        empty_details: || Details::Movie(MovieDetails::default()),
    },
    KindSpec {
        kind: ContentKind::TvShow,
        label: "TV Shows",
        slug: "tvshows",
        empty_details: || Details::TvShow(ShowDetails::default()),
    },
];

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Game, ContentKind::Movie, ContentKind::TvShow];

    pub fn spec(self) -> &'static KindSpec {
        match self {
            ContentKind::Game => &KIND_SPECS[0],
            ContentKind::Movie => &KIND_SPECS[1],
            ContentKind::TvShow => &KIND_SPECS[2],
        }
    }

    pub fn slug(self) -> &'static str {
        self.spec().slug
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn empty_details(self) -> Details {
        (self.spec().empty_details)()
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        KIND_SPECS
            .iter()
            .find(|spec| spec.slug == slug)
            .map(|spec| spec.kind)
    }
}

impl Default for ContentKind {
    fn default() -> Self {
        Self::Game
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ContentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = s.to_ascii_lowercase();
        Self::from_slug(&slug)
            .or_else(|| Self::from_slug(&format!("{slug}s")))
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam_app_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playtime_minutes: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowStatus {
    Ongoing,
    Ended,
    Cancelled,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasons: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ShowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Details {
    Game(GameDetails),
    Movie(MovieDetails),
    #[serde(rename = "tvshow")]
    TvShow(ShowDetails),
}

impl Details {
    pub fn kind(&self) -> ContentKind {
        match self {
            Details::Game(_) => ContentKind::Game,
            Details::Movie(_) => ContentKind::Movie,
            Details::TvShow(_) => ContentKind::TvShow,
        }
    }

    /// Short kind-specific summary line, e.g. "dir. Nolan, 148 min".
    pub fn summary(&self) -> Option<String> {
        let parts: Vec<String> = match self {
            Details::Game(game) => game
                .playtime_minutes
                .map(|mins| format!("{}h played", mins / 60))
                .into_iter()
                .collect(),
            Details::Movie(movie) => [
                movie.director.as_ref().map(|d| format!("dir. {d}")),
                movie.runtime_minutes.map(|mins| format!("{mins} min")),
            ]
            .into_iter()
            .flatten()
            .collect(),
            Details::TvShow(show) => [
                show.seasons.map(|n| format!("{n} seasons")),
                show.episodes.map(|n| format!("{n} episodes")),
                show.status.map(|s| format!("{s:?}").to_lowercase()),
            ]
            .into_iter()
            .flatten()
            .collect(),
        };
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: Arc<str>,
    pub year: i32,
    pub category: Category,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<FigureId>,
    #[serde(flatten)]
    pub details: Details,
}

impl Item {
    /// Creates an item of `kind` with a fresh id and empty kind-specific fields.
    pub fn new(
        kind: ContentKind,
        title: impl Into<Arc<str>>,
        year: i32,
        category: Category,
    ) -> Self {
        Self {
            id: ItemId::generate(),
            title: title.into(),
            year,
            category,
            genres: Vec::new(),
            tag: None,
            details: kind.empty_details(),
        }
    }

    pub fn with_genres<S: Into<String>>(mut self, genres: impl IntoIterator<Item = S>) -> Self {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn kind(&self) -> ContentKind {
        self.details.kind()
    }

    pub fn genre_names(&self) -> String {
        self.genres.iter().join(", ")
    }

    pub fn has_unknown_genre(&self) -> bool {
        self.genres.is_empty() || self.genres.iter().all(|g| g == UNKNOWN_GENRE)
    }

    pub fn has_unknown_year(&self) -> bool {
        self.year == UNKNOWN_YEAR
    }
}
