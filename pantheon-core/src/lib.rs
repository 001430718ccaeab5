#![allow(clippy::new_without_default)]

pub mod category;
pub mod config;
pub mod drag;
pub mod enforce;
pub mod error;
pub mod figure;
pub mod item;
pub mod item_id;
pub mod lookup;
pub mod persist;
pub mod position;
pub mod promise;
pub mod seed;
pub mod share;
pub mod store;
pub mod transfer;
pub mod util;

pub use crate::{
    category::Category,
    error::Error,
    figure::{Figure, FigureId},
    item::{ContentKind, Details, Item},
    item_id::ItemId,
    store::{Action, Library},
};
