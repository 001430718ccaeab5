use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Reference into the figure registry, as stored on an item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FigureId(pub Arc<str>);

impl FigureId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn figure(&self) -> Option<&'static Figure> {
        Figure::lookup(&self.0)
    }
}

impl From<&str> for FigureId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for FigureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Figure {
    pub id: &'static str,
    pub name: &'static str,
    pub domain: &'static str,
    pub tier: Category,
}

macro_rules! figure {
    ($id:literal, $name:literal, $domain:literal, $tier:ident) => {
        Figure {
            id: $id,
            name: $name,
            domain: $domain,
            tier: Category::$tier,
        }
    };
}

pub static FIGURES: [Figure; 26] = [
    figure!("zeus", "Zeus", "King of the gods", Olympian),
    figure!("hera", "Hera", "Queen of the gods", Olympian),
    figure!("poseidon", "Poseidon", "The sea", Olympian),
    figure!("demeter", "Demeter", "The harvest", Olympian),
    figure!("athena", "Athena", "Wisdom and strategy", Olympian),
    figure!("apollo", "Apollo", "Music and light", Olympian),
    figure!("artemis", "Artemis", "The hunt", Olympian),
    figure!("ares", "Ares", "War", Olympian),
    figure!("aphrodite", "Aphrodite", "Love and beauty", Olympian),
    figure!("hephaestus", "Hephaestus", "The forge", Olympian),
    figure!("hermes", "Hermes", "Travel and trickery", Olympian),
    figure!("dionysus", "Dionysus", "Wine and revelry", Olympian),
    figure!("cronus", "Cronus", "Time", Titan),
    figure!("rhea", "Rhea", "Motherhood", Titan),
    figure!("oceanus", "Oceanus", "The world ocean", Titan),
    figure!("hyperion", "Hyperion", "Heavenly light", Titan),
    figure!("prometheus", "Prometheus", "Forethought and fire", Titan),
    figure!("atlas", "Atlas", "Endurance", Titan),
    figure!("themis", "Themis", "Divine order", Titan),
    figure!("mnemosyne", "Mnemosyne", "Memory", Titan),
    figure!("achilles", "Achilles", "The greatest warrior", Hero),
    figure!("heracles", "Heracles", "Strength", Hero),
    figure!("perseus", "Perseus", "Slayer of Medusa", Hero),
    figure!("odysseus", "Odysseus", "Cunning", Hero),
    figure!("theseus", "Theseus", "Slayer of the Minotaur", Hero),
    figure!("jason", "Jason", "Leader of the Argonauts", Hero),
];

impl Figure {
    pub fn lookup(id: &str) -> Option<&'static Figure> {
        FIGURES.iter().find(|figure| figure.id == id)
    }

    /// Figures bound to `tier`, in registry order.  Empty for untagged tiers.
    pub fn of_tier(tier: Category) -> impl Iterator<Item = &'static Figure> {
        FIGURES.iter().filter(move |figure| figure.tier == tier)
    }

    pub fn figure_id(&self) -> FigureId {
        FigureId::new(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_ids_are_unique() {
        let ids: HashSet<_> = FIGURES.iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), FIGURES.len());
    }

    #[test]
    fn figures_only_live_in_taggable_tiers() {
        for figure in &FIGURES {
            assert!(figure.tier.is_taggable(), "{} is misplaced", figure.id);
        }
        for tier in Category::ALL {
            assert_eq!(tier.is_taggable(), Figure::of_tier(tier).next().is_some());
        }
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(Figure::lookup("achilles").map(|f| f.tier), Some(Category::Hero));
        assert!(Figure::lookup("medusa").is_none());
    }
}
