use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender};

use crate::{error::Error, promise::Promise};

use super::{Debouncer, RequestToken, RequestTracker, SuggestionCache, SuggestionSource};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

type Reply = (RequestToken, String, Result<Vec<String>, Error>);

/// Drives title suggestions for one text field: waits for typing to pause,
/// serves repeats from the cache, runs misses on a worker thread and drops any
/// answer that arrives after a newer keystroke or a selection.
pub struct Suggester {
    source: Arc<dyn SuggestionSource>,
    cache: SuggestionCache,
    debouncer: Debouncer<String>,
    tracker: RequestTracker,
    suggestions: Promise<Vec<String>, RequestToken>,
    sender: Sender<Reply>,
    receiver: Receiver<Reply>,
}

impl Suggester {
    pub fn new(
        source: Arc<dyn SuggestionSource>,
        cache: SuggestionCache,
        debounce: Duration,
    ) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            source,
            cache,
            debouncer: Debouncer::new(debounce),
            tracker: RequestTracker::new(),
            suggestions: Promise::Empty,
            sender,
            receiver,
        }
    }

    pub fn suggestions(&self) -> &Promise<Vec<String>, RequestToken> {
        &self.suggestions
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.suggestions, Promise::Deferred(_))
    }

    /// Field text changed.  Anything in flight is now stale.
    pub fn input(&mut self, text: &str, now: Instant) {
        self.tracker.invalidate();
        let query = text.trim();
        if query.is_empty() {
            self.debouncer.clear();
            self.suggestions.clear();
        } else {
            self.debouncer.push(query.to_string(), now);
        }
    }

    /// A suggestion was picked (or the field lost focus): stop listening.
    pub fn select(&mut self) {
        self.tracker.invalidate();
        self.debouncer.clear();
        self.suggestions.clear();
    }

    /// Dispatches a debounced query if one is due and applies any replies that
    /// arrived.  Returns whether the visible suggestions changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = false;
        if let Some(query) = self.debouncer.take_ready(now) {
            self.dispatch(query, now);
            changed = true;
        }
        while let Ok(reply) = self.receiver.try_recv() {
            changed |= self.apply(reply, now);
        }
        changed
    }

    /// Blocks until the current request settles or `timeout` passes.  Any
    /// debounce still pending is skipped.
    pub fn settle(&mut self, timeout: Duration) -> &Promise<Vec<String>, RequestToken> {
        let deadline = Instant::now() + timeout;
        if let Some(query) = self.debouncer.flush() {
            self.dispatch(query, Instant::now());
        }
        while self.is_loading() {
            let Some(left) = deadline.checked_duration_since(Instant::now()) else {
                break;
            };
            match self.receiver.recv_timeout(left) {
                Ok(reply) => {
                    self.apply(reply, Instant::now());
                }
                Err(_) => break,
            }
        }
        &self.suggestions
    }

    fn dispatch(&mut self, query: String, now: Instant) {
        if let Some(hit) = self.cache.get(&query, now) {
            log::debug!("suggestion cache hit for {query:?}");
            self.tracker.invalidate();
            self.suggestions.resolve(hit);
            return;
        }
        let token = self.tracker.next();
        self.suggestions.defer(token);

        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        thread::spawn(move || {
            let result = source.suggest(&query);
            sender.send((token, query, result)).ok();
        });
    }

    fn apply(&mut self, (token, query, result): Reply, now: Instant) -> bool {
        if !self.tracker.complete(token) {
            log::debug!("discarding stale suggestions for {query:?}");
            return false;
        }
        match &result {
            Ok(titles) => self.cache.insert(&query, titles.clone(), now),
            Err(err) => log::warn!("suggestions for {query:?} failed: {err}"),
        }
        self.suggestions.update((token, result))
    }
}
