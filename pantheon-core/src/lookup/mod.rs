//! Best-effort remote lookups: title suggestions, page info and Steam data.
//!
//! Nothing here is allowed to block or break the catalogue.  Failures come
//! back as `Error::NetworkError` for the caller to show inline and are never
//! retried automatically.

pub mod cache;
pub mod steam;
pub mod suggest;
pub mod wiki;

use std::time::{Duration, Instant};

use crate::error::Error;

pub use self::{
    cache::SuggestionCache,
    steam::{SteamClient, SteamGame},
    suggest::Suggester,
    wiki::{PageInfo, WikiClient},
};

/// Anything that can turn a partial title into candidate titles.
pub trait SuggestionSource: Send + Sync + 'static {
    fn suggest(&self, query: &str) -> Result<Vec<String>, Error>;
}

/// Identifies one request issued for a lookup field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

/// Hands out request tokens for a single field.  Only the most recently
/// issued token is current; issuing a new one or invalidating supersedes all
/// earlier requests, whose results must then be dropped.
#[derive(Debug, Default)]
pub struct RequestTracker {
    generation: u64,
    current: Option<RequestToken>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> RequestToken {
        self.generation += 1;
        let token = RequestToken(self.generation);
        self.current = Some(token);
        token
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.current == Some(token)
    }

    /// Marks `token` as settled.  Returns whether it was still current.
    pub fn complete(&mut self, token: RequestToken) -> bool {
        if self.is_current(token) {
            self.current = None;
            true
        } else {
            false
        }
    }
}

/// Trailing-edge debouncer: a value becomes ready once no newer value has been
/// pushed for `delay`.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left until the pending value is ready.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, at)| self.delay.saturating_sub(now.saturating_duration_since(*at)))
    }

    /// Takes the pending value without waiting out the delay.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn take_ready(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.delay => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }
}
