//! Keeps an item's figure tag consistent with its category.
//!
//! A tag survives only when the item sits in a taggable tier and the figure
//! belongs to that very tier.  Uniqueness of tags across a collection is only
//! advisory: `used_tags` steers the picker, nothing here rejects duplicates.

use std::collections::HashSet;

use crate::{
    category::Category,
    figure::{Figure, FigureId},
    item::Item,
    item_id::ItemId,
};

/// Puts `item` into `category`, dropping a tag that would not be valid there.
pub fn normalize_on_category_change(mut item: Item, category: Category) -> Item {
    item.category = category;
    item.tag = valid_tag(item.tag.take(), category);
    item
}

/// Drops an invalid tag without changing the category.
pub fn sanitize(item: Item) -> Item {
    let category = item.category;
    normalize_on_category_change(item, category)
}

/// Returns `tag` if it may be held by an item of `category`.
pub fn valid_tag(tag: Option<FigureId>, category: Category) -> Option<FigureId> {
    if !category.is_taggable() {
        return None;
    }
    tag.filter(|tag| match tag.figure() {
        Some(figure) => figure.tier == category,
        None => {
            log::debug!("dropping unknown figure tag {tag}");
            false
        }
    })
}

/// Tags already held by items other than `exclude`.
pub fn used_tags<'a>(items: &'a [Item], exclude: Option<&ItemId>) -> HashSet<&'a FigureId> {
    items
        .iter()
        .filter(|it| Some(&it.id) != exclude)
        .filter_map(|it| it.tag.as_ref())
        .collect()
}

/// A figure offered by the tag picker.
#[derive(Debug, PartialEq, Eq)]
pub struct FigureChoice {
    pub figure: &'static Figure,
    pub taken: bool,
}

/// Figures of `category`'s tier, marking those already used elsewhere.
pub fn available_figures(
    category: Category,
    items: &[Item],
    exclude: Option<&ItemId>,
) -> Vec<FigureChoice> {
    let used = used_tags(items, exclude);
    Figure::of_tier(category)
        .map(|figure| FigureChoice {
            figure,
            taken: used.iter().any(|tag| tag.as_str() == figure.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ContentKind;

    fn tagged(category: Category, tag: &str) -> Item {
        let mut item = Item::new(ContentKind::Game, "Hades", 2020, category);
        item.tag = Some(FigureId::from(tag));
        item
    }

    #[test]
    fn keeps_matching_tag() {
        let item = normalize_on_category_change(tagged(Category::Titan, "atlas"), Category::Titan);
        assert_eq!(item.tag, Some(FigureId::from("atlas")));
    }

    #[test]
    fn clears_tag_on_untaggable_tier() {
        let item = normalize_on_category_change(tagged(Category::Hero, "achilles"), Category::Muse);
        assert_eq!(item.category, Category::Muse);
        assert_eq!(item.tag, None);
    }

    #[test]
    fn clears_tag_on_tier_mismatch() {
        let item =
            normalize_on_category_change(tagged(Category::Hero, "achilles"), Category::Olympian);
        assert_eq!(item.category, Category::Olympian);
        assert_eq!(item.tag, None);
    }

    #[test]
    fn clears_unknown_figure() {
        let item = sanitize(tagged(Category::Hero, "bellerophon"));
        assert_eq!(item.tag, None);
    }

    #[test]
    fn does_not_deduplicate() {
        let items = vec![tagged(Category::Hero, "achilles"), tagged(Category::Hero, "achilles")];
        let normalized: Vec<_> = items.into_iter().map(sanitize).collect();
        assert!(normalized.iter().all(|it| it.tag == Some(FigureId::from("achilles"))));
    }

    #[test]
    fn used_tags_excludes_given_item() {
        let items = vec![tagged(Category::Hero, "achilles"), tagged(Category::Hero, "jason")];
        let used = used_tags(&items, Some(&items[0].id));
        assert_eq!(used.len(), 1);
        assert!(used.contains(&FigureId::from("jason")));

        let choices = available_figures(Category::Hero, &items, Some(&items[0].id));
        let taken: Vec<_> = choices.iter().filter(|c| c.taken).map(|c| c.figure.id).collect();
        assert_eq!(taken, ["jason"]);
        assert!(available_figures(Category::Limbo, &items, None).is_empty());
    }
}
