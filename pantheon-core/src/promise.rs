use crate::error::Error;

/// A value fetched in the background.  `D` tags the request a deferred value
/// is waiting on, so a reply to an older request can be told apart.
#[derive(Clone, Debug)]
pub enum Promise<T, D = (), E = Error> {
    Empty,
    Deferred(D),
    Resolved(T),
    Rejected(E),
}

impl<T, D, E> Promise<T, D, E> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            Self::Resolved(val) => Some(val),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::Empty;
    }

    pub fn defer(&mut self, def: D) {
        *self = Self::Deferred(def);
    }

    pub fn resolve(&mut self, val: T) {
        *self = Self::Resolved(val);
    }

    /// Settles the promise with `res` only if it is still waiting on `def`.
    /// Returns whether the reply was applied.
    pub fn update(&mut self, (def, res): (D, Result<T, E>)) -> bool
    where
        D: PartialEq,
    {
        if !matches!(self, Self::Deferred(waiting) if *waiting == def) {
            return false;
        }
        *self = match res {
            Ok(val) => Self::Resolved(val),
            Err(err) => Self::Rejected(err),
        };
        true
    }
}

impl<T, D, E> Default for Promise<T, D, E> {
    fn default() -> Self {
        Self::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_to_older_request_is_ignored() {
        let mut promise: Promise<u32, u64, String> = Promise::Empty;
        promise.defer(2);
        assert!(!promise.update((1, Ok(10))));
        assert!(matches!(promise, Promise::Deferred(2)));
        assert!(promise.update((2, Ok(20))));
        assert_eq!(promise.resolved(), Some(&20));
        assert!(!promise.update((2, Ok(30))));
        assert_eq!(promise.resolved(), Some(&20));
    }

    #[test]
    fn failed_reply_rejects() {
        let mut promise: Promise<u32, (), String> = Promise::default();
        assert!(promise.is_empty());
        promise.defer(());
        assert!(promise.update(((), Err("offline".into()))));
        assert!(promise.is_rejected());
    }

    #[test]
    fn reply_after_clear_is_ignored() {
        let mut promise: Promise<u32, u64, String> = Promise::Empty;
        promise.defer(1);
        promise.clear();
        assert!(!promise.update((1, Ok(10))));
        assert!(promise.is_empty());
    }
}
