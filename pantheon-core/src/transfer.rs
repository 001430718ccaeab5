//! JSON export and all-or-nothing import of a collection.

use std::{collections::HashSet, fs, path::Path, sync::Arc};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    category::Category,
    enforce,
    error::Error,
    figure::FigureId,
    item::{ContentKind, Details, Item},
    item_id::ItemId,
};

pub fn export(items: &[Item]) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(items)?)
}

pub fn export_to_file(items: &[Item], path: &Path) -> Result<(), Error> {
    fs::write(path, export(items)?)?;
    log::info!("exported {} items to {:?}", items.len(), path);
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Genres {
    One(String),
    Many(Vec<String>),
}

impl From<Genres> for Vec<String> {
    fn from(genres: Genres) -> Self {
        match genres {
            Genres::One(genre) => genre
                .split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(String::from)
                .collect(),
            Genres::Many(genres) => genres,
        }
    }
}

/// The fields an imported entry must or may carry.  Kind-specific fields are
/// read separately from the same object.
#[derive(Deserialize)]
struct ImportEntry {
    #[serde(default)]
    id: Option<ItemId>,
    title: String,
    year: i32,
    #[serde(default)]
    category: Option<Category>,
    #[serde(default, alias = "genre")]
    genres: Option<Genres>,
    #[serde(default)]
    tag: Option<FigureId>,
    #[serde(default)]
    kind: Option<ContentKind>,
}

/// Parses an exported (or hand-written) JSON array into a collection of
/// `kind`.  Any invalid entry rejects the whole import.
pub fn import(kind: ContentKind, json: &str) -> Result<Vec<Item>, Error> {
    let entries: Vec<Value> = serde_json::from_str(json)
        .map_err(|err| Error::InvalidImport(format!("not a JSON array: {err}")))?;

    let mut seen = HashSet::new();
    entries
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let item = parse_entry(kind, value)
                .map_err(|reason| Error::InvalidImport(format!("entry {index}: {reason}")))?;
            Ok(unique(item, &mut seen))
        })
        .collect()
}

pub fn import_file(kind: ContentKind, path: &Path) -> Result<Vec<Item>, Error> {
    let json = fs::read_to_string(path)?;
    let items = import(kind, &json)?;
    log::info!("imported {} items from {:?}", items.len(), path);
    Ok(items)
}

fn parse_entry(kind: ContentKind, mut value: Value) -> Result<Item, String> {
    let entry = ImportEntry::deserialize(&value).map_err(|err| err.to_string())?;
    if entry.title.trim().is_empty() {
        return Err("empty title".into());
    }
    if let Some(other) = entry.kind.filter(|other| *other != kind) {
        return Err(format!("{} among {}", other.slug(), kind.slug()));
    }

    let object = value.as_object_mut().ok_or("not an object")?;
    object.insert("kind".into(), serde_json::to_value(kind).map_err(|err| err.to_string())?);
    let details = Details::deserialize(&value).map_err(|err| err.to_string())?;

    let item = Item {
        id: entry.id.unwrap_or_else(ItemId::generate),
        title: Arc::from(entry.title.trim()),
        year: entry.year,
        category: entry.category.unwrap_or_default(),
        genres: entry.genres.map(Vec::from).unwrap_or_default(),
        tag: entry.tag,
        details,
    };
    Ok(enforce::sanitize(item))
}

fn unique(mut item: Item, seen: &mut HashSet<ItemId>) -> Item {
    while !seen.insert(item.id.clone()) {
        item.id = ItemId::generate();
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_then_import() {
        let items = vec![
            Item::new(ContentKind::TvShow, "Firefly", 2002, Category::Legend).with_genres(["SF"]),
            Item::new(ContentKind::TvShow, "Lost", 2004, Category::Limbo),
        ];
        let json = export(&items).unwrap();
        assert_eq!(import(ContentKind::TvShow, &json).unwrap(), items);
    }

    #[test]
    fn minimal_entries_get_defaults() {
        let json = r#"[{"title": "Doom", "year": 1993, "genre": "Shooter, Action"}]"#;
        let items = import(ContentKind::Game, json).unwrap();
        assert_eq!(items[0].category, Category::Limbo);
        assert_eq!(items[0].genres, ["Shooter", "Action"]);
        assert_eq!(items[0].kind(), ContentKind::Game);
    }

    #[test]
    fn missing_year_rejects_everything() {
        let json = r#"[
            {"title": "Doom", "year": 1993},
            {"title": "Quake"}
        ]"#;
        let err = import(ContentKind::Game, json).unwrap_err();
        assert!(matches!(err, Error::InvalidImport(ref msg) if msg.starts_with("entry 1")));
    }

    #[test]
    fn rejects_wrong_kind_and_bad_shapes() {
        let movie = r#"[{"title": "Heat", "year": 1995, "kind": "movie"}]"#;
        assert!(import(ContentKind::Game, movie).is_err());
        assert!(import(ContentKind::Game, r#"{"title": "Doom"}"#).is_err());
        assert!(import(ContentKind::Game, r#"[{"title": " ", "year": 1}]"#).is_err());
        let unknown_category = r#"[{"title": "Doom", "year": 1, "category": "gods"}]"#;
        assert!(import(ContentKind::Game, unknown_category).is_err());
        assert!(import(ContentKind::Game, "[").is_err());
    }

    #[test]
    fn keeps_duplicate_tags_but_not_duplicate_ids() {
        let json = r#"[
            {"id": "x", "title": "A", "year": 1, "category": "hero", "tag": "jason"},
            {"id": "x", "title": "B", "year": 2, "category": "hero", "tag": "jason"},
            {"title": "C", "year": 3, "category": "muse", "tag": "jason"}
        ]"#;
        let items = import(ContentKind::Game, json).unwrap();
        assert_ne!(items[0].id, items[1].id);
        assert_eq!(items[0].tag, items[1].tag);
        assert_eq!(items[2].tag, None);
    }

    #[test]
    fn reads_kind_specific_fields() {
        let json = r#"[
            {"title": "Heat", "year": 1995, "director": "Michael Mann", "runtime_minutes": 170}
        ]"#;
        let items = import(ContentKind::Movie, json).unwrap();
        match &items[0].details {
            Details::Movie(movie) => {
                assert_eq!(movie.director.as_deref(), Some("Michael Mann"));
                assert_eq!(movie.runtime_minutes, Some(170));
            }
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.json");
        let items = vec![Item::new(ContentKind::Game, "Doom", 1993, Category::Hero)];
        export_to_file(&items, &path).unwrap();
        assert_eq!(import_file(ContentKind::Game, &path).unwrap(), items);
    }
}
