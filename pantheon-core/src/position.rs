//! Drop-position classification and order-preserving insertion.
//!
//! The collection is a single flat list; the per-category views are obtained by
//! filtering it.  All functions here only care about the relative order of the
//! items inside each category, so where an item lands in the flat list relative
//! to other categories is irrelevant as long as the per-category order is right.

use crate::{category::Category, item::Item, item_id::ItemId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DropPosition {
    Before,
    After,
}

/// Bounding box of a drop target, in the same coordinate space as the pointer.
/// Vertical coordinates grow downwards.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn mid_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.left + self.width && y >= self.top && y < self.top + self.height
    }
}

impl DropPosition {
    /// Pointer strictly above the target's vertical midpoint drops before it,
    /// anything from the midpoint down drops after it.
    pub fn from_pointer(pointer_y: f64, target: &Rect) -> Self {
        if pointer_y < target.mid_y() {
            DropPosition::Before
        } else {
            DropPosition::After
        }
    }
}

/// Inserts `item` (not yet in `items`) into `category`, next to `target`.
///
/// The item is re-categorized as-is; callers are expected to have normalized
/// its tag for `category` beforehand.  When `target` is absent or not inside
/// `category`, the item goes to the end of that category.
pub fn insert_item(
    items: &[Item],
    mut item: Item,
    target: Option<&ItemId>,
    position: DropPosition,
    category: Category,
) -> Vec<Item> {
    item.category = category;

    let anchor = target.and_then(|target| {
        items
            .iter()
            .position(|it| &it.id == target && it.category == category)
    });
    let index = match (anchor, position) {
        (Some(at), DropPosition::Before) => at,
        (Some(at), DropPosition::After) => at + 1,
        (None, _) => items
            .iter()
            .rposition(|it| it.category == category)
            .map_or(items.len(), |last| last + 1),
    };

    let mut result = Vec::with_capacity(items.len() + 1);
    result.extend_from_slice(&items[..index]);
    result.push(item);
    result.extend_from_slice(&items[index..]);
    result
}

/// Moves the existing item `id` next to `target` inside `category`.
///
/// Returns `None` when `id` is not in the collection.  Moving an item relative
/// to itself keeps its current slot.
pub fn move_item(
    items: &[Item],
    id: &ItemId,
    target: Option<&ItemId>,
    position: DropPosition,
    category: Category,
) -> Option<Vec<Item>> {
    let from = items.iter().position(|it| &it.id == id)?;
    let mut rest = items.to_vec();
    let mut item = rest.remove(from);

    if target == Some(id) {
        item.category = category;
        rest.insert(from, item);
        return Some(rest);
    }
    Some(insert_item(&rest, item, target, position, category))
}

/// Items of `category`, in collection order.
pub fn in_category(items: &[Item], category: Category) -> impl Iterator<Item = &Item> {
    items.iter().filter(move |it| it.category == category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ContentKind;

    fn item(id: &str, category: Category) -> Item {
        let mut item = Item::new(ContentKind::Game, id.to_uppercase(), 2000, category);
        item.id = ItemId::new(id);
        item
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|it| it.id.as_str()).collect()
    }

    fn ids_in(items: &[Item], category: Category) -> Vec<&str> {
        in_category(items, category).map(|it| it.id.as_str()).collect()
    }

    #[test]
    fn midpoint_classification() {
        let rect = Rect::new(0.0, 100.0, 50.0, 40.0);
        assert_eq!(DropPosition::from_pointer(100.0, &rect), DropPosition::Before);
        assert_eq!(DropPosition::from_pointer(119.9, &rect), DropPosition::Before);
        assert_eq!(DropPosition::from_pointer(120.0, &rect), DropPosition::After);
        assert_eq!(DropPosition::from_pointer(140.0, &rect), DropPosition::After);
        assert_eq!(DropPosition::from_pointer(-5.0, &rect), DropPosition::Before);
    }

    #[test]
    fn insert_before_and_after_target() {
        let items = vec![
            item("a", Category::Olympian),
            item("b", Category::Olympian),
            item("c", Category::Titan),
        ];
        let target = ItemId::new("b");

        let before = insert_item(
            &items,
            item("n", Category::Limbo),
            Some(&target),
            DropPosition::Before,
            Category::Olympian,
        );
        assert_eq!(ids_in(&before, Category::Olympian), ["a", "n", "b"]);

        let after = insert_item(
            &items,
            item("n", Category::Limbo),
            Some(&target),
            DropPosition::After,
            Category::Olympian,
        );
        assert_eq!(ids_in(&after, Category::Olympian), ["a", "b", "n"]);
        assert_eq!(ids_in(&after, Category::Titan), ["c"]);
    }

    #[test]
    fn missing_target_appends_to_category_run() {
        let items = vec![
            item("a", Category::Olympian),
            item("c", Category::Titan),
            item("b", Category::Olympian),
            item("d", Category::Muse),
        ];
        let ghost = ItemId::new("ghost");
        let result = insert_item(
            &items,
            item("n", Category::Limbo),
            Some(&ghost),
            DropPosition::Before,
            Category::Olympian,
        );
        assert_eq!(ids(&result), ["a", "c", "b", "n", "d"]);

        // Target exists but lives in another category.
        let other = ItemId::new("c");
        let result = insert_item(
            &items,
            item("n", Category::Limbo),
            Some(&other),
            DropPosition::Before,
            Category::Olympian,
        );
        assert_eq!(ids_in(&result, Category::Olympian), ["a", "b", "n"]);
    }

    #[test]
    fn empty_category_appends_at_end() {
        let items = vec![item("a", Category::Olympian)];
        let result = insert_item(
            &items,
            item("n", Category::Hero),
            None,
            DropPosition::After,
            Category::Hero,
        );
        assert_eq!(ids(&result), ["a", "n"]);
        assert_eq!(result[1].category, Category::Hero);
    }

    #[test]
    fn move_within_category() {
        let items = vec![
            item("a", Category::Olympian),
            item("b", Category::Olympian),
            item("c", Category::Titan),
        ];
        let (a, b) = (ItemId::new("a"), ItemId::new("b"));
        let result =
            move_item(&items, &a, Some(&b), DropPosition::After, Category::Olympian).unwrap();
        assert_eq!(ids_in(&result, Category::Olympian), ["b", "a"]);
        assert_eq!(ids_in(&result, Category::Titan), ["c"]);
        assert_eq!(result.len(), items.len());
    }

    #[test]
    fn move_across_categories() {
        let items = vec![
            item("a", Category::Olympian),
            item("b", Category::Olympian),
            item("c", Category::Titan),
        ];
        let (a, c) = (ItemId::new("a"), ItemId::new("c"));
        let result =
            move_item(&items, &a, Some(&c), DropPosition::Before, Category::Titan).unwrap();
        assert_eq!(ids_in(&result, Category::Olympian), ["b"]);
        assert_eq!(ids_in(&result, Category::Titan), ["a", "c"]);
    }

    #[test]
    fn move_onto_itself_keeps_slot() {
        let items = vec![item("a", Category::Olympian), item("b", Category::Olympian)];
        let a = ItemId::new("a");
        let result =
            move_item(&items, &a, Some(&a), DropPosition::After, Category::Olympian).unwrap();
        assert_eq!(ids(&result), ["a", "b"]);
    }

    #[test]
    fn move_unknown_item() {
        let items = vec![item("a", Category::Olympian)];
        let zzz = ItemId::new("zzz");
        assert!(move_item(&items, &zzz, None, DropPosition::After, Category::Hero).is_none());
    }
}
