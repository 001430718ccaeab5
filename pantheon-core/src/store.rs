//! The authoritative collections and the actions that change them.
//!
//! `reduce` is a pure step: it reads the current items and returns a new
//! vector, so earlier snapshots stay valid.  `Library` owns one collection per
//! content kind, dispatches actions and persists the result, except while a
//! shared snapshot is being viewed.  Actions carrying items of another kind
//! are refused before they reach a collection.

use std::{collections::HashMap, sync::Arc};

use crate::{
    category::Category,
    enforce,
    error::Error,
    figure::FigureId,
    item::{ContentKind, Details, Item},
    item_id::ItemId,
    persist::{LoadSource, Persistence},
    position::{self, DropPosition},
    share::SharedLink,
};

/// Shallow field edits; `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemPatch {
    pub title: Option<Arc<str>>,
    pub year: Option<i32>,
    pub category: Option<Category>,
    pub genres: Option<Vec<String>>,
    pub tag: Option<Option<FigureId>>,
    pub details: Option<Details>,
}

/// Background lookup result for an item created with placeholder fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub genres: Option<Vec<String>>,
    pub year: Option<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Set(Vec<Item>),
    /// Appends the item to its category with a freshly generated id.
    Add(Item),
    Update { id: ItemId, patch: ItemPatch },
    Delete(ItemId),
    MoveCategory { id: ItemId, category: Category },
    /// Replaces the whole order, typically with the result of a drop.
    Reorder(Vec<Item>),
    SetTag { id: ItemId, tag: Option<FigureId> },
    /// Fills in fields still holding their placeholder, if the item still exists.
    Enrich { id: ItemId, enrichment: Enrichment },
}

pub fn reduce(items: &[Item], action: Action) -> Vec<Item> {
    match action {
        Action::Set(items) | Action::Reorder(items) => items,
        Action::Add(mut item) => {
            item.id = ItemId::generate();
            let category = item.category;
            let item = enforce::normalize_on_category_change(item, category);
            position::insert_item(items, item, None, DropPosition::After, category)
        }
        Action::Update { id, patch } => map_item(items, &id, |item| apply_patch(item, patch)),
        Action::Delete(id) => items.iter().filter(|it| it.id != id).cloned().collect(),
        Action::MoveCategory { id, category } => {
            if items.iter().any(|it| it.id == id && it.category == category) {
                return items.to_vec();
            }
            let Some(item) = items.iter().find(|it| it.id == id) else {
                log::debug!("move of unknown item {id}");
                return items.to_vec();
            };
            let moved = enforce::normalize_on_category_change(item.clone(), category);
            let rest: Vec<Item> = items.iter().filter(|it| it.id != id).cloned().collect();
            position::insert_item(&rest, moved, None, DropPosition::After, category)
        }
        Action::SetTag { id, tag } => map_item(items, &id, |mut item| {
            item.tag = tag;
            enforce::sanitize(item)
        }),
        Action::Enrich { id, enrichment } => {
            if !items.iter().any(|it| it.id == id) {
                log::debug!("dropping enrichment for removed item {id}");
            }
            map_item(items, &id, |item| apply_enrichment(item, enrichment))
        }
    }
}

/// Items an action would bring into a collection.
fn incoming_items(action: &Action) -> &[Item] {
    match action {
        Action::Set(items) | Action::Reorder(items) => items,
        Action::Add(item) => std::slice::from_ref(item),
        _ => &[],
    }
}

/// Fails if `action` would bring an item that is not of `kind`.
pub fn check_kind(action: &Action, kind: ContentKind) -> Result<(), Error> {
    match incoming_items(action).iter().find(|it| it.kind() != kind) {
        Some(item) => Err(Error::KindMismatch {
            expected: kind,
            found: item.kind(),
        }),
        None => Ok(()),
    }
}

fn map_item(items: &[Item], id: &ItemId, f: impl FnOnce(Item) -> Item) -> Vec<Item> {
    let mut f = Some(f);
    items
        .iter()
        .map(|it| match f.take_if(|_| &it.id == id) {
            Some(f) => f(it.clone()),
            None => it.clone(),
        })
        .collect()
}

fn apply_patch(mut item: Item, patch: ItemPatch) -> Item {
    let ItemPatch {
        title,
        year,
        category,
        genres,
        tag,
        details,
    } = patch;
    if let Some(title) = title {
        item.title = title;
    }
    if let Some(year) = year {
        item.year = year;
    }
    if let Some(genres) = genres {
        item.genres = genres;
    }
    if let Some(tag) = tag {
        item.tag = tag;
    }
    if let Some(details) = details {
        if details.kind() == item.kind() {
            item.details = details;
        } else {
            log::warn!("ignoring {:?} details for a {:?}", details.kind(), item.kind());
        }
    }
    let category = category.unwrap_or(item.category);
    enforce::normalize_on_category_change(item, category)
}

/// Only fields still at their placeholder are filled in; anything edited by
/// hand in the meantime wins.
pub fn apply_enrichment(mut item: Item, enrichment: Enrichment) -> Item {
    if let Some(genres) = enrichment.genres.filter(|g| !g.is_empty()) {
        if item.has_unknown_genre() {
            item.genres = genres;
        }
    }
    if let Some(year) = enrichment.year {
        if item.has_unknown_year() {
            item.year = year;
        }
    }
    item
}

/// A collection opened from a share link.  Not persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct SharedView {
    pub kind: ContentKind,
    pub title: Option<String>,
    pub items: Vec<Item>,
}

pub struct Library {
    persistence: Persistence,
    collections: HashMap<ContentKind, Vec<Item>>,
    current_kind: ContentKind,
    shared: Option<SharedView>,
}

impl Library {
    /// Loads every collection.  A collection coming from the seed is saved
    /// right away, so its generated ids stay the same on the next open.
    pub fn open(mut persistence: Persistence) -> Self {
        let mut collections = HashMap::new();
        for kind in ContentKind::ALL {
            let items = load_or_seed(&mut persistence, kind);
            collections.insert(kind, items);
        }
        Self {
            persistence,
            collections,
            current_kind: ContentKind::default(),
            shared: None,
        }
    }

    pub fn current_kind(&self) -> ContentKind {
        self.shared.as_ref().map_or(self.current_kind, |s| s.kind)
    }

    pub fn set_current_kind(&mut self, kind: ContentKind) {
        self.current_kind = kind;
    }

    /// The visible collection: the shared snapshot if one is open, otherwise
    /// the current kind's collection.
    pub fn items(&self) -> &[Item] {
        match &self.shared {
            Some(shared) => &shared.items,
            None => self.collection(self.current_kind),
        }
    }

    pub fn collection(&self, kind: ContentKind) -> &[Item] {
        self.collections.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.items().iter().find(|it| &it.id == id)
    }

    pub fn shared(&self) -> Option<&SharedView> {
        self.shared.as_ref()
    }

    pub fn is_shared_view(&self) -> bool {
        self.shared.is_some()
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    /// Applies `action` to the visible collection.
    ///
    /// In shared view the result is kept in memory only.  Callers are expected
    /// not to offer mutations there in the first place; this merely keeps a
    /// stray one from reaching storage.
    pub fn dispatch(&mut self, action: Action) -> Result<&[Item], Error> {
        check_kind(&action, self.current_kind())?;
        if let Some(shared) = &mut self.shared {
            log::debug!("shared view, not persisting {}", action_name(&action));
            shared.items = reduce(&shared.items, action);
            return Ok(shared.items.as_slice());
        }

        let kind = self.current_kind;
        let current = self.collections.remove(&kind).unwrap_or_default();
        let next = reduce(&current, action);
        if let Err(err) = self.persistence.save(kind, &next) {
            log::error!("failed to save {}: {}", kind.slug(), err);
        }
        let items = self.collections.entry(kind).or_insert(next);
        Ok(items.as_slice())
    }

    /// Switches into read-only presentation of a shared link.
    pub fn enter_shared(&mut self, link: &SharedLink) -> &SharedView {
        let items = link.items();
        log::info!("opened shared {} with {} items", link.kind.slug(), items.len());
        self.shared.insert(SharedView {
            kind: link.kind,
            title: link.title.clone(),
            items,
        })
    }

    /// Back to the user's own collections, without reloading them.
    pub fn leave_shared(&mut self) -> Option<SharedView> {
        self.shared.take()
    }

    /// Replaces the current kind's collection with the built-in seed.
    pub fn reset(&mut self) -> Result<&[Item], Error> {
        let kind = self.current_kind;
        self.persistence.reset(kind)?;
        let items = load_or_seed(&mut self.persistence, kind);
        self.collections.insert(kind, items);
        Ok(self.collection(kind))
    }
}

fn load_or_seed(persistence: &mut Persistence, kind: ContentKind) -> Vec<Item> {
    let (items, source) = persistence.load(kind);
    match source {
        LoadSource::Primary => {}
        LoadSource::Backup => log::info!("loaded {} from backup", kind.slug()),
        LoadSource::Seed => {
            if let Err(err) = persistence.save(kind, &items) {
                log::error!("failed to save seeded {}: {}", kind.slug(), err);
            }
        }
    }
    items
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::Set(_) => "set",
        Action::Add(_) => "add",
        Action::Update { .. } => "update",
        Action::Delete(_) => "delete",
        Action::MoveCategory { .. } => "move-category",
        Action::Reorder(_) => "reorder",
        Action::SetTag { .. } => "set-tag",
        Action::Enrich { .. } => "enrich",
    }
}
