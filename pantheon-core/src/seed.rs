//! Built-in starter collections, used when nothing (valid) has been saved yet.

use crate::{
    category::Category,
    figure::FigureId,
    item::{ContentKind, Details, Item, ShowStatus},
};

pub fn default_collection(kind: ContentKind) -> Vec<Item> {
    match kind {
        ContentKind::Game => games(),
        ContentKind::Movie => movies(),
        ContentKind::TvShow => shows(),
    }
}

fn tagged(mut item: Item, tag: &str) -> Item {
    item.tag = Some(FigureId::from(tag));
    item
}

fn games() -> Vec<Item> {
    vec![
        tagged(
            Item::new(
                ContentKind::Game,
                "The Legend of Zelda: Breath of the Wild",
                2017,
                Category::Olympian,
            )
            .with_genres(["Adventure"]),
            "zeus",
        ),
        Item::new(ContentKind::Game, "Hollow Knight", 2017, Category::Titan)
            .with_genres(["Metroidvania"]),
        tagged(
            Item::new(ContentKind::Game, "Hades", 2020, Category::Hero)
                .with_genres(["Roguelike", "Action"]),
            "achilles",
        ),
        Item::new(ContentKind::Game, "Stardew Valley", 2016, Category::Muse)
            .with_genres(["Simulation"]),
    ]
}

fn movies() -> Vec<Item> {
    let mut heat =
        Item::new(ContentKind::Movie, "Heat", 1995, Category::Olympian).with_genres(["Crime"]);
    if let Details::Movie(movie) = &mut heat.details {
        movie.director = Some("Michael Mann".into());
        movie.runtime_minutes = Some(170);
    }
    vec![
        tagged(heat, "ares"),
        Item::new(ContentKind::Movie, "Spirited Away", 2001, Category::Titan)
            .with_genres(["Animation", "Fantasy"]),
        Item::new(ContentKind::Movie, "Mad Max: Fury Road", 2015, Category::Hero)
            .with_genres(["Action"]),
    ]
}

fn shows() -> Vec<Item> {
    let mut wire = Item::new(ContentKind::TvShow, "The Wire", 2002, Category::Olympian)
        .with_genres(["Crime", "Drama"]);
    if let Details::TvShow(show) = &mut wire.details {
        show.seasons = Some(5);
        show.episodes = Some(60);
        show.status = Some(ShowStatus::Ended);
    }
    vec![
        tagged(wire, "athena"),
        Item::new(ContentKind::TvShow, "Avatar: The Last Airbender", 2005, Category::Titan)
            .with_genres(["Animation"]),
        Item::new(ContentKind::TvShow, "Firefly", 2002, Category::Legend)
            .with_genres(["Science Fiction"]),
    ]
}
