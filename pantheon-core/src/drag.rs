//! Drag-and-drop sessions for pointer and touch input.
//!
//! A `DragSession` tracks one gesture at a time: what is being dragged, which
//! drop zone is highlighted (at most one) and where the item would land.  A
//! drop resolves the dragged item, normalizes its tag for the destination
//! category and computes the new order; the caller commits the resulting
//! `DropOutcome` through the store.  `TouchDrag` drives the very same session
//! from touch events, so both input modalities end in the same commit.

use crate::{
    category::Category,
    enforce,
    item::{Details, Item},
    item_id::ItemId,
    position::{self, DropPosition, Rect},
    store::Action,
};

/// What is being dragged.
#[derive(Clone, Debug, PartialEq)]
pub enum DragSource {
    /// An item already in the collection.
    Existing(ItemId),
    /// An item from outside the collection, e.g. a Steam library candidate.
    Pending(Box<Item>),
}

/// Something that accepts drops: a whole category, or a single item in it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DropZone {
    Category(Category),
    Item { id: ItemId, category: Category },
}

impl DropZone {
    pub fn category(&self) -> Category {
        match self {
            DropZone::Category(category) | DropZone::Item { category, .. } => *category,
        }
    }

    pub fn for_item(item: &Item) -> Self {
        DropZone::Item {
            id: item.id.clone(),
            category: item.category,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropIndicator {
    pub target: ItemId,
    pub position: DropPosition,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging {
        source: DragSource,
        indicator: Option<DropIndicator>,
    },
}

/// Result of a successful drop, ready to be committed.
#[derive(Clone, Debug, PartialEq)]
pub struct DropOutcome {
    pub items: Vec<Item>,
    /// The dropped item, as it now sits in `items`.
    pub item: ItemId,
    /// Whether the item was new to the collection.
    pub inserted: bool,
}

impl DropOutcome {
    pub fn into_action(self) -> Action {
        Action::Reorder(self.items)
    }

    /// Steam app id to look up, when a freshly inserted game still carries
    /// placeholder genre or year.
    pub fn enrichment_target(&self) -> Option<u32> {
        if !self.inserted {
            return None;
        }
        let item = self.items.iter().find(|it| it.id == self.item)?;
        match &item.details {
            Details::Game(game) if item.has_unknown_genre() || item.has_unknown_year() => {
                game.steam_app_id
            }
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct DragSession {
    phase: DragPhase,
    highlight: Option<DropZone>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    pub fn source(&self) -> Option<&DragSource> {
        match &self.phase {
            DragPhase::Dragging { source, .. } => Some(source),
            DragPhase::Idle => None,
        }
    }

    pub fn indicator(&self) -> Option<&DropIndicator> {
        match &self.phase {
            DragPhase::Dragging { indicator, .. } => indicator.as_ref(),
            DragPhase::Idle => None,
        }
    }

    pub fn highlighted(&self) -> Option<&DropZone> {
        self.highlight.as_ref()
    }

    /// Begins dragging `source`.  A start while another drag is in progress
    /// discards the old one.
    pub fn start(&mut self, source: DragSource) {
        if self.is_dragging() {
            log::debug!("drag started while dragging, resetting");
        }
        self.highlight = None;
        self.phase = DragPhase::Dragging {
            source,
            indicator: None,
        };
    }

    /// The pointer moved over `zone`, whose bounds are `rect`.  Moves the
    /// highlight to `zone` and recomputes the drop indicator.
    pub fn over(&mut self, zone: DropZone, pointer_y: f64, rect: &Rect) -> Option<&DropIndicator> {
        let DragPhase::Dragging { indicator, .. } = &mut self.phase else {
            return None;
        };
        *indicator = match &zone {
            DropZone::Item { id, .. } => Some(DropIndicator {
                target: id.clone(),
                position: DropPosition::from_pointer(pointer_y, rect),
            }),
            DropZone::Category(_) => None,
        };
        if self.highlight.as_ref() != Some(&zone) {
            self.highlight = Some(zone);
        }
        indicator.as_ref()
    }

    /// The pointer left `zone`.  Only clears the highlight if `zone` still
    /// holds it, a late leave must not clear a newer zone.
    pub fn leave(&mut self, zone: &DropZone) {
        if self.highlight.as_ref() == Some(zone) {
            self.highlight = None;
            if let DragPhase::Dragging { indicator, .. } = &mut self.phase {
                *indicator = None;
            }
        }
    }

    /// Drag ended without a drop, or was aborted.  Never touches the collection.
    pub fn cancel(&mut self) {
        self.phase = DragPhase::Idle;
        self.highlight = None;
    }

    /// Drops the dragged item onto `zone` and returns the new order of `items`.
    ///
    /// Dropping on an item uses the current indicator if it points at that item,
    /// otherwise lands after it.  Returns `None` (and goes idle) when nothing is
    /// being dragged, the dragged item no longer exists, or it was dropped onto
    /// itself.
    pub fn drop(&mut self, items: &[Item], zone: &DropZone) -> Option<DropOutcome> {
        let phase = std::mem::take(&mut self.phase);
        self.highlight = None;
        let DragPhase::Dragging { source, indicator } = phase else {
            return None;
        };

        let category = zone.category();
        let (target, position) = match zone {
            DropZone::Item { id, .. } => {
                let position = indicator
                    .filter(|ind| &ind.target == id)
                    .map_or(DropPosition::After, |ind| ind.position);
                (Some(id), position)
            }
            DropZone::Category(_) => (None, DropPosition::After),
        };

        match source {
            DragSource::Existing(id) => {
                if target == Some(&id) {
                    log::debug!("{id} dropped onto itself");
                    return None;
                }
                let Some(item) = items.iter().find(|it| it.id == id) else {
                    log::debug!("dragged item {id} is gone");
                    return None;
                };
                let item = enforce::normalize_on_category_change(item.clone(), category);
                let rest: Vec<Item> = items.iter().filter(|it| it.id != id).cloned().collect();
                log::debug!("moving {id} {position:?} {target:?} in {category:?}");
                Some(DropOutcome {
                    items: position::insert_item(&rest, item, target, position, category),
                    item: id,
                    inserted: false,
                })
            }
            DragSource::Pending(item) => {
                let mut item = enforce::normalize_on_category_change(*item, category);
                if items.iter().any(|it| it.id == item.id) {
                    item.id = ItemId::generate();
                }
                let id = item.id.clone();
                log::debug!("inserting {id} {position:?} {target:?} in {category:?}");
                Some(DropOutcome {
                    items: position::insert_item(items, item, target, position, category),
                    item: id,
                    inserted: true,
                })
            }
        }
    }
}

/// Pixels a touch has to travel before it turns into a drag.
pub const TOUCH_DRAG_THRESHOLD: f64 = 10.0;

#[derive(Debug, Default)]
enum TouchState {
    #[default]
    Idle,
    Pressed {
        source: DragSource,
        origin: (f64, f64),
    },
    Dragging {
        over: Option<DropZone>,
    },
}

/// Touch-gesture front-end for a `DragSession`.
///
/// Touch input has no native drag events: the drop zone under the finger is
/// hit-tested by the caller on every move and passed in.
#[derive(Debug, Default)]
pub struct TouchDrag {
    state: TouchState,
    session: DragSession,
}

impl TouchDrag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, TouchState::Dragging { .. })
    }

    pub fn touch_start(&mut self, source: DragSource, x: f64, y: f64) {
        if !matches!(self.state, TouchState::Idle) {
            log::debug!("touch started mid-gesture, resetting");
            self.session.cancel();
        }
        self.state = TouchState::Pressed {
            source,
            origin: (x, y),
        };
    }

    /// Returns whether the gesture is a drag, i.e. whether the caller should
    /// suppress scrolling.
    pub fn touch_move(&mut self, x: f64, y: f64, hit: Option<(DropZone, Rect)>) -> bool {
        if let TouchState::Pressed { origin, .. } = &self.state {
            let (dx, dy) = (x - origin.0, y - origin.1);
            if dx.hypot(dy) < TOUCH_DRAG_THRESHOLD {
                return false;
            }
            if let TouchState::Pressed { source, .. } = std::mem::take(&mut self.state) {
                self.session.start(source);
                self.state = TouchState::Dragging { over: None };
            }
        }

        let TouchState::Dragging { over } = &mut self.state else {
            return false;
        };
        match hit {
            Some((zone, rect)) => {
                self.session.over(zone.clone(), y, &rect);
                *over = Some(zone);
            }
            None => {
                if let Some(zone) = over.take() {
                    self.session.leave(&zone);
                }
            }
        }
        true
    }

    /// Finishes the gesture, dropping onto the last zone under the finger.
    pub fn touch_end(&mut self, items: &[Item]) -> Option<DropOutcome> {
        match std::mem::take(&mut self.state) {
            TouchState::Dragging { over: Some(zone) } => self.session.drop(items, &zone),
            TouchState::Dragging { over: None } => {
                self.session.cancel();
                None
            }
            TouchState::Pressed { .. } | TouchState::Idle => None,
        }
    }

    pub fn touch_cancel(&mut self) {
        self.state = TouchState::Idle;
        self.session.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        figure::FigureId,
        item::{ContentKind, GameDetails, UNKNOWN_GENRE, UNKNOWN_YEAR},
    };

    fn item(id: &str, category: Category) -> Item {
        let mut item = Item::new(ContentKind::Game, id.to_uppercase(), 2001, category);
        item.id = ItemId::new(id);
        item
    }

    fn collection() -> Vec<Item> {
        vec![
            item("a", Category::Olympian),
            item("b", Category::Olympian),
            item("c", Category::Titan),
        ]
    }

    fn ids_in(items: &[Item], category: Category) -> Vec<&str> {
        position::in_category(items, category)
            .map(|it| it.id.as_str())
            .collect()
    }

    const ROW: Rect = Rect {
        left: 0.0,
        top: 0.0,
        width: 100.0,
        height: 20.0,
    };

    #[test]
    fn pointer_drop_after_target() {
        let items = collection();
        let mut session = DragSession::new();
        session.start(DragSource::Existing(ItemId::new("a")));
        let zone = DropZone::for_item(&items[1]);
        let indicator = session.over(zone.clone(), 15.0, &ROW).cloned();
        assert_eq!(
            indicator,
            Some(DropIndicator {
                target: ItemId::new("b"),
                position: DropPosition::After,
            })
        );

        let outcome = session.drop(&items, &zone).unwrap();
        assert_eq!(ids_in(&outcome.items, Category::Olympian), ["b", "a"]);
        assert_eq!(ids_in(&outcome.items, Category::Titan), ["c"]);
        assert!(!outcome.inserted);
        assert!(!session.is_dragging());
        assert_eq!(session.highlighted(), None);
    }

    #[test]
    fn highlight_moves_between_zones() {
        let items = collection();
        let mut session = DragSession::new();
        session.start(DragSource::Existing(ItemId::new("c")));

        let first = DropZone::for_item(&items[0]);
        let second = DropZone::Category(Category::Hero);
        session.over(first.clone(), 1.0, &ROW);
        assert_eq!(session.highlighted(), Some(&first));
        session.over(second.clone(), 1.0, &ROW);
        assert_eq!(session.highlighted(), Some(&second));
        assert_eq!(session.indicator(), None);

        // A late leave of the first zone does not clear the second.
        session.leave(&first);
        assert_eq!(session.highlighted(), Some(&second));
        session.leave(&second);
        assert_eq!(session.highlighted(), None);
    }

    #[test]
    fn cross_category_drop_clears_invalid_tag() {
        let mut items = collection();
        items[0].tag = Some(FigureId::from("zeus"));
        let mut session = DragSession::new();
        session.start(DragSource::Existing(ItemId::new("a")));
        let outcome = session.drop(&items, &DropZone::Category(Category::Titan)).unwrap();
        let moved = outcome.items.iter().find(|it| it.id.as_str() == "a").unwrap();
        assert_eq!(moved.category, Category::Titan);
        assert_eq!(moved.tag, None);
        assert_eq!(ids_in(&outcome.items, Category::Titan), ["c", "a"]);
    }

    #[test]
    fn cancel_has_no_effect() {
        let mut session = DragSession::new();
        session.start(DragSource::Existing(ItemId::new("a")));
        session.over(DropZone::Category(Category::Muse), 0.0, &ROW);
        session.cancel();
        assert_eq!(session.phase(), &DragPhase::Idle);
        assert_eq!(session.highlighted(), None);
        assert!(session.drop(&collection(), &DropZone::Category(Category::Muse)).is_none());
    }

    #[test]
    fn stray_start_resets() {
        let mut session = DragSession::new();
        session.start(DragSource::Existing(ItemId::new("a")));
        session.over(DropZone::Category(Category::Muse), 0.0, &ROW);
        session.start(DragSource::Existing(ItemId::new("b")));
        assert_eq!(session.highlighted(), None);
        assert_eq!(session.source(), Some(&DragSource::Existing(ItemId::new("b"))));
    }

    #[test]
    fn drop_onto_itself_is_noop() {
        let items = collection();
        let mut session = DragSession::new();
        session.start(DragSource::Existing(ItemId::new("a")));
        assert!(session.drop(&items, &DropZone::for_item(&items[0])).is_none());
        assert!(!session.is_dragging());
    }

    #[test]
    fn pending_item_is_inserted_and_needs_enrichment() {
        let items = collection();
        let mut candidate = Item::new(ContentKind::Game, "Portal", UNKNOWN_YEAR, Category::Limbo)
            .with_genres([UNKNOWN_GENRE]);
        candidate.details = Details::Game(GameDetails {
            steam_app_id: Some(400),
            playtime_minutes: None,
        });

        let mut session = DragSession::new();
        session.start(DragSource::Pending(Box::new(candidate)));
        let zone = DropZone::for_item(&items[0]);
        session.over(zone.clone(), 2.0, &ROW);
        let outcome = session.drop(&items, &zone).unwrap();

        assert!(outcome.inserted);
        assert_eq!(outcome.items.len(), items.len() + 1);
        let olympians = ids_in(&outcome.items, Category::Olympian);
        assert_eq!(olympians[0], outcome.item.as_str());
        assert_eq!(outcome.enrichment_target(), Some(400));
    }

    #[test]
    fn touch_drag_matches_pointer_drag() {
        let items = collection();
        let mut touch = TouchDrag::new();
        touch.touch_start(DragSource::Existing(ItemId::new("a")), 50.0, 5.0);

        // Below the threshold nothing happens yet.
        assert!(!touch.touch_move(52.0, 7.0, None));
        assert!(!touch.session().is_dragging());

        let zone = DropZone::for_item(&items[1]);
        let rect = Rect::new(0.0, 20.0, 100.0, 20.0);
        assert!(touch.touch_move(50.0, 30.0, Some((zone.clone(), rect))));
        assert_eq!(touch.session().highlighted(), Some(&zone));

        let outcome = touch.touch_end(&items).unwrap();
        assert_eq!(ids_in(&outcome.items, Category::Olympian), ["b", "a"]);
        assert!(!touch.is_dragging());
    }

    #[test]
    fn touch_tap_and_release_outside_do_nothing() {
        let items = collection();
        let mut touch = TouchDrag::new();
        touch.touch_start(DragSource::Existing(ItemId::new("a")), 0.0, 0.0);
        assert!(touch.touch_end(&items).is_none());

        touch.touch_start(DragSource::Existing(ItemId::new("a")), 0.0, 0.0);
        let zone = DropZone::Category(Category::Muse);
        touch.touch_move(0.0, 40.0, Some((zone, ROW)));
        touch.touch_move(0.0, 400.0, None);
        assert_eq!(touch.session().highlighted(), None);
        assert!(touch.touch_end(&items).is_none());
        assert!(!touch.session().is_dragging());
    }
}
