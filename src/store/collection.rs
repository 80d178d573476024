//! Collection state and its transition function.
//!
//! State changes only through [`CollectionState::reduce`], driven by an
//! [`Action`]. Each fetch is issued under a [`RequestTag`]; a result whose tag
//! is not the latest one issued (or was issued under an older session epoch)
//! is discarded instead of applied.

use std::sync::Mutex;

use crate::client::ApiError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Identifies one outstanding fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag {
    seq: u64,
    epoch: u64,
}

impl RequestTag {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Whether an action changed the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// The action answered a request that has since been superseded.
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action<T> {
    /// A fetch was issued; the tag is minted by the reducer.
    FetchStart,
    FetchSuccess { tag: RequestTag, items: Vec<T> },
    FetchError { tag: RequestTag, message: String },
    /// Drop the items and go idle. In-flight fetches become stale.
    Clear,
    /// The session was replaced. Everything is torn down.
    SessionChanged { epoch: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState<T> {
    /// Items in server order.
    pub items: Vec<T>,
    pub status: LoadStatus,
    pub error: Option<String>,
    seq: u64,
    epoch: u64,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: LoadStatus::Idle,
            error: None,
            seq: 0,
            epoch: 0,
        }
    }
}

impl<T> CollectionState<T> {
    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    /// Tag of the most recently issued fetch.
    pub fn current_tag(&self) -> RequestTag {
        RequestTag {
            seq: self.seq,
            epoch: self.epoch,
        }
    }

    pub fn is_current(&self, tag: RequestTag) -> bool {
        tag == self.current_tag()
    }

    pub fn reduce(&mut self, action: Action<T>) -> Transition {
        match action {
            Action::FetchStart => {
                self.seq += 1;
                self.status = LoadStatus::Loading;
                self.error = None;
                Transition::Applied
            }
            Action::FetchSuccess { tag, items } => {
                if !self.is_current(tag) {
                    return Transition::Discarded;
                }
                self.items = items;
                self.status = LoadStatus::Ready;
                self.error = None;
                Transition::Applied
            }
            Action::FetchError { tag, message } => {
                if !self.is_current(tag) {
                    return Transition::Discarded;
                }
                self.status = LoadStatus::Failed;
                self.error = Some(message);
                Transition::Applied
            }
            Action::Clear => {
                self.seq += 1;
                self.items.clear();
                self.status = LoadStatus::Idle;
                self.error = None;
                Transition::Applied
            }
            Action::SessionChanged { epoch } => {
                self.epoch = epoch;
                self.reduce(Action::Clear)
            }
        }
    }
}

/// A [`CollectionState`] shared between the store methods of one collection.
///
/// The lock is never held across an await: a fetch is begun, the network call
/// runs unlocked, and the result is committed under a fresh lock.
#[derive(Debug)]
pub struct Collection<T> {
    state: Mutex<CollectionState<T>>,
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CollectionState::default()),
        }
    }

    pub fn dispatch(&self, action: Action<T>) -> Transition {
        self.state
            .lock()
            .expect("collection lock poisoned")
            .reduce(action)
    }

    /// Mark a fetch as started under the live session epoch.
    pub fn begin(&self, live_epoch: u64) -> RequestTag {
        let mut state = self.state.lock().expect("collection lock poisoned");
        if state.epoch != live_epoch {
            state.reduce(Action::SessionChanged { epoch: live_epoch });
        }
        state.reduce(Action::FetchStart);
        state.current_tag()
    }

    /// Apply a fetch result, unless the request was superseded or the session
    /// changed while it was in flight.
    pub fn commit(
        &self,
        tag: RequestTag,
        live_epoch: u64,
        result: Result<Vec<T>, ApiError>,
    ) -> Transition {
        let mut state = self.state.lock().expect("collection lock poisoned");
        if state.epoch != live_epoch {
            state.reduce(Action::SessionChanged { epoch: live_epoch });
        }
        match result {
            Ok(items) => state.reduce(Action::FetchSuccess { tag, items }),
            Err(e) => state.reduce(Action::FetchError {
                tag,
                message: e.to_string(),
            }),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&CollectionState<T>) -> R) -> R {
        f(&self.state.lock().expect("collection lock poisoned"))
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Collection<T> {
    pub fn snapshot(&self) -> CollectionState<T> {
        self.with(CollectionState::clone)
    }
}
