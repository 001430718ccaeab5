use std::{fmt, ops::Deref, sync::Arc};

use serde::{Deserialize, Serialize};

const BASE62_DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BASE62_LEN: usize = 22;

/// Opaque, stable identifier of a catalogued item.
///
/// Freshly created items get a random 128-bit value rendered in base62.  Ids
/// coming from imports or shared links are kept verbatim, whatever their shape.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Arc<str>);

impl ItemId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self::from_u128(rand::random())
    }

    pub fn from_u128(n: u128) -> Self {
        Self(to_base62(n).into())
    }

    /// Returns the first `len` characters of the id, used where a shorter
    /// (lossy) handle is good enough.
    pub fn prefix(&self, len: usize) -> &str {
        match self.0.char_indices().nth(len) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ItemId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("ItemId").field(&&*self.0).finish()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_base62(mut n: u128) -> String {
    let mut data = [0_u8; BASE62_LEN];
    for i in 0..BASE62_LEN {
        data[BASE62_LEN - 1 - i] = BASE62_DIGITS[(n % 62) as usize];
        n /= 62;
    }
    data.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base62_is_fixed_width() {
        assert_eq!(ItemId::from_u128(0).as_str(), "0000000000000000000000");
        assert_eq!(ItemId::from_u128(61).as_str(), "000000000000000000000Z");
        assert_eq!(ItemId::from_u128(u128::MAX).len(), BASE62_LEN);
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(ItemId::generate(), ItemId::generate());
    }

    #[test]
    fn prefix_is_char_aware() {
        let id = ItemId::new("ab\u{e9}cd");
        assert_eq!(id.prefix(3), "ab\u{e9}");
        assert_eq!(id.prefix(99), "ab\u{e9}cd");
    }
}
