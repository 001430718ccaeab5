//! Compact, URL-safe snapshots of a collection.
//!
//! Each item becomes a positional tuple
//! `[id prefix, title, genres, year, category code, tag | null]`, the tuples are
//! written as one JSON array of arrays, compressed with zlib and rendered in
//! unpadded URL-safe base64.  Ids are truncated, so decoding yields shortened
//! ids, re-issued where two of them collide; everything else survives the
//! round trip.
//!
//! Encoding is deterministic and decoding only accepts the exact string the
//! encoder would produce for the decoded tuples.  Bits that zlib itself ignores
//! (header level hints, padding after the last deflate block) are therefore
//! covered as well, and any edit to a payload decodes to nothing.

use std::{collections::HashSet, io::Write, sync::Arc};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use flate2::{write::ZlibEncoder, Compression, Decompress, FlushDecompress, Status};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    category::Category,
    enforce,
    error::Error,
    figure::FigureId,
    item::{ContentKind, Item},
    item_id::ItemId,
};

pub const ID_PREFIX_LEN: usize = 8;

/// Upper bound on the inflated payload, guards against decompression bombs.
const MAX_DECODED_LEN: usize = 4 * 1024 * 1024;

pub const PARAM_SHARED: &str = "shared";
pub const PARAM_TYPE: &str = "type";
pub const PARAM_TITLE: &str = "title";

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct ShareTuple(String, String, Vec<String>, i32, String, Option<String>);

impl ShareTuple {
    fn from_item(item: &Item) -> Self {
        Self(
            item.id.prefix(ID_PREFIX_LEN).to_string(),
            item.title.to_string(),
            item.genres.clone(),
            item.year,
            item.category.code().to_string(),
            item.tag.as_ref().map(|tag| tag.as_str().to_string()),
        )
    }

    fn into_item(self, kind: ContentKind) -> Result<Item, Error> {
        let Self(id, title, genres, year, code, tag) = self;
        let mut chars = code.chars();
        let category = match (chars.next(), chars.next()) {
            (Some(c), None) => Category::from_code(c),
            _ => None,
        }
        .ok_or_else(|| Error::InvalidShare(format!("unmapped category code {code:?}")))?;

        let item = Item {
            id: ItemId::new(id),
            title: Arc::from(title),
            year,
            category,
            genres,
            tag: tag.map(FigureId::new),
            details: kind.empty_details(),
        };
        Ok(enforce::sanitize(item))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShareStats {
    /// Length of the JSON tuple array, in bytes.
    pub raw_len: usize,
    /// Length of the URL-safe payload, in bytes.
    pub compressed_len: usize,
}

impl ShareStats {
    /// Size reduction in percent, negative when the payload grew.
    pub fn reduction_percent(&self) -> f64 {
        if self.raw_len == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_len as f64 / self.raw_len as f64) * 100.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encoded {
    pub payload: String,
    pub stats: ShareStats,
}

pub fn encode(items: &[Item]) -> Result<Encoded, Error> {
    let tuples: Vec<ShareTuple> = items.iter().map(ShareTuple::from_item).collect();
    let (raw_len, payload) = pack(&tuples)?;
    let stats = ShareStats {
        raw_len,
        compressed_len: payload.len(),
    };
    log::debug!(
        "encoded {} items: {} -> {} bytes ({:.1}% smaller)",
        items.len(),
        stats.raw_len,
        stats.compressed_len,
        stats.reduction_percent()
    );
    Ok(Encoded { payload, stats })
}

/// Decodes a payload produced by `encode`.  Malformed payloads decode to an
/// empty collection.
pub fn decode(kind: ContentKind, payload: &str) -> Vec<Item> {
    try_decode(kind, payload).unwrap_or_else(|err| {
        log::warn!("ignoring malformed shared collection: {err}");
        Vec::new()
    })
}

pub fn try_decode(kind: ContentKind, payload: &str) -> Result<Vec<Item>, Error> {
    let compressed = URL_SAFE_NO_PAD
        .decode(payload.trim())
        .map_err(|err| Error::InvalidShare(err.to_string()))?;

    let json = inflate(&compressed)?;
    let tuples: Vec<ShareTuple> = serde_json::from_slice(&json)?;
    let (_, canonical) = pack(&tuples)?;
    if canonical != payload.trim() {
        return Err(Error::InvalidShare("payload is not in canonical form".into()));
    }

    let mut seen = HashSet::new();
    tuples
        .into_iter()
        .map(|tuple| {
            let mut item = tuple.into_item(kind)?;
            while !seen.insert(item.id.clone()) {
                item.id = ItemId::generate();
            }
            Ok(item)
        })
        .collect()
}

/// Serializes, compresses and base64-encodes `tuples`, returning the length
/// of the JSON along with the payload.
fn pack(tuples: &[ShareTuple]) -> Result<(usize, String), Error> {
    let json = serde_json::to_vec(tuples)?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;
    Ok((json.len(), URL_SAFE_NO_PAD.encode(compressed)))
}

/// Inflates a complete zlib stream.  A stream cut short anywhere, including
/// inside the trailing checksum, is an error.
fn inflate(compressed: &[u8]) -> Result<Vec<u8>, Error> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(compressed.len() * 4 + 64);
    loop {
        let consumed = inflater.total_in() as usize;
        let status = inflater
            .decompress_vec(&compressed[consumed..], &mut out, FlushDecompress::Finish)
            .map_err(|err| Error::InvalidShare(err.to_string()))?;
        match status {
            Status::StreamEnd => return Ok(out),
            _ if out.len() < out.capacity() => {
                return Err(Error::InvalidShare("truncated payload".into()));
            }
            _ if out.len() >= MAX_DECODED_LEN => {
                return Err(Error::InvalidShare("payload too large".into()));
            }
            _ => out.reserve(out.capacity()),
        }
    }
}

/// The query parameters of a share URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedLink {
    pub payload: String,
    pub kind: ContentKind,
    pub title: Option<String>,
}

impl SharedLink {
    pub fn new(items: &[Item], kind: ContentKind, title: Option<String>) -> Result<Self, Error> {
        let Encoded { payload, .. } = encode(items)?;
        Ok(Self {
            payload,
            kind,
            title,
        })
    }

    /// Returns `None` for URLs without a `shared` parameter, i.e. normal mode.
    pub fn from_url(url: &Url) -> Option<Self> {
        let mut payload = None;
        let mut kind = None;
        let mut title = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                PARAM_SHARED => payload = Some(value.into_owned()),
                PARAM_TYPE => kind = Some(value.into_owned()),
                PARAM_TITLE => title = Some(value.into_owned()).filter(|t| !t.is_empty()),
                _ => {}
            }
        }
        let kind = match kind.as_deref().map(ContentKind::from_slug) {
            Some(Some(kind)) => kind,
            Some(None) => {
                log::warn!("unknown shared collection type {kind:?}, assuming games");
                ContentKind::Game
            }
            None => ContentKind::Game,
        };
        Some(Self {
            payload: payload?,
            kind,
            title,
        })
    }

    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        {
            let mut query = url.query_pairs_mut();
            query.clear();
            query.append_pair(PARAM_SHARED, &self.payload);
            query.append_pair(PARAM_TYPE, self.kind.slug());
            if let Some(title) = &self.title {
                query.append_pair(PARAM_TITLE, title);
            }
        }
        url
    }

    pub fn items(&self) -> Vec<Item> {
        decode(self.kind, &self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movies() -> Vec<Item> {
        let mut heat = Item::new(ContentKind::Movie, "Heat", 1995, Category::Titan)
            .with_genres(["Crime", "Thriller"]);
        heat.tag = Some(FigureId::from("atlas"));
        vec![
            heat,
            Item::new(ContentKind::Movie, "Alien", 1979, Category::Olympian)
                .with_genres(["Horror"]),
            Item::new(ContentKind::Movie, "Cats", 2019, Category::Limbo),
        ]
    }

    #[test]
    fn round_trip_keeps_everything_but_full_ids() {
        let items = movies();
        let encoded = encode(&items).unwrap();
        let decoded = try_decode(ContentKind::Movie, &encoded.payload).unwrap();
        assert_eq!(decoded.len(), items.len());
        for (a, b) in items.iter().zip(&decoded) {
            assert_eq!(a.title, b.title);
            assert_eq!(a.year, b.year);
            assert_eq!(a.genres, b.genres);
            assert_eq!(a.category, b.category);
            assert_eq!(a.tag, b.tag);
            assert_eq!(b.id.as_str(), a.id.prefix(ID_PREFIX_LEN));
            assert_eq!(b.kind(), ContentKind::Movie);
        }
    }

    #[test]
    fn payload_is_url_safe() {
        let encoded = encode(&movies()).unwrap();
        assert!(encoded
            .payload
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
        assert_eq!(encoded.stats.compressed_len, encoded.payload.len());
    }

    #[test]
    fn empty_collection_round_trips() {
        let encoded = encode(&[]).unwrap();
        assert_eq!(encoded.stats.raw_len, 2);
        assert!(try_decode(ContentKind::Game, &encoded.payload).unwrap().is_empty());
    }

    #[test]
    fn reduction_percent() {
        let stats = ShareStats {
            raw_len: 200,
            compressed_len: 50,
        };
        assert_eq!(stats.reduction_percent(), 75.0);
    }

    #[test]
    fn garbage_decodes_to_empty() {
        assert!(decode(ContentKind::Game, "").is_empty());
        assert!(decode(ContentKind::Game, "not base64 !!").is_empty());
        assert!(decode(ContentKind::Game, "AAAA").is_empty());
        let plain = URL_SAFE_NO_PAD.encode(b"[[\"a\"]]");
        assert!(decode(ContentKind::Game, &plain).is_empty());
    }

    #[test]
    fn truncated_checksum_is_rejected() {
        let encoded = encode(&movies()).unwrap();
        let bytes = URL_SAFE_NO_PAD.decode(&encoded.payload).unwrap();
        let cut = URL_SAFE_NO_PAD.encode(&bytes[..bytes.len() - 2]);
        assert!(try_decode(ContentKind::Movie, &cut).is_err());
    }

    #[test]
    fn unmapped_category_code_fails() {
        let tuple = ShareTuple(
            "abc".into(),
            "Doom".into(),
            vec!["Shooter".into()],
            1993,
            "q".into(),
            None,
        );
        let (_, payload) = pack(&[tuple]).unwrap();
        assert!(try_decode(ContentKind::Game, &payload).is_err());
        assert!(decode(ContentKind::Game, &payload).is_empty());
    }

    #[test]
    fn every_single_character_edit_decodes_to_nothing() {
        let encoded = encode(&movies()).unwrap();
        let alphabet = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
        for at in 0..encoded.payload.len() {
            for &c in alphabet {
                let mut edited = encoded.payload.clone().into_bytes();
                if edited[at] == c {
                    continue;
                }
                edited[at] = c;
                let edited = String::from_utf8(edited).unwrap();
                assert!(decode(ContentKind::Movie, &edited).is_empty(), "{edited}");
            }
        }
    }

    #[test]
    fn recompressed_payload_is_rejected() {
        let items = movies();
        let tuples: Vec<ShareTuple> = items.iter().map(ShareTuple::from_item).collect();
        let json = serde_json::to_vec(&tuples).unwrap();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(&json).unwrap();
        let payload = URL_SAFE_NO_PAD.encode(encoder.finish().unwrap());
        assert_ne!(payload, encode(&items).unwrap().payload);
        assert!(try_decode(ContentKind::Movie, &payload).is_err());
    }

    #[test]
    fn colliding_id_prefixes_are_reissued() {
        let mut first = Item::new(ContentKind::Game, "Doom", 1993, Category::Hero);
        first.id = ItemId::new("game-0001");
        let mut second = Item::new(ContentKind::Game, "Quake", 1996, Category::Hero);
        second.id = ItemId::new("game-0002");

        let encoded = encode(&[first, second]).unwrap();
        let decoded = try_decode(ContentKind::Game, &encoded.payload).unwrap();
        assert_eq!(decoded[0].id.as_str(), "game-000");
        assert_ne!(decoded[0].id, decoded[1].id);
    }

    #[test]
    fn share_url_round_trip() {
        let title = Some("My picks & more".to_string());
        let link = SharedLink::new(&movies(), ContentKind::Movie, title).unwrap();
        let base = Url::parse("https://example.org/pantheon/?stale=1").unwrap();
        let url = link.to_url(&base);
        assert!(!url.as_str().contains("stale"));

        let parsed = SharedLink::from_url(&url).unwrap();
        assert_eq!(parsed, link);
        assert_eq!(parsed.items().len(), 3);
    }

    #[test]
    fn url_without_payload_is_normal_mode() {
        let url = Url::parse("https://example.org/?type=movies").unwrap();
        assert_eq!(SharedLink::from_url(&url), None);
    }
}
