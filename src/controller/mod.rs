//! Controller module - Playback session control and library operations
//!
//! `Player` owns the one active sound handle and the request counter. It is
//! organized into submodules by responsibility:
//!
//! - `playback`: play/pause/seek/next/previous and the load sequence
//! - `player_events`: per-load status listener and auto-advance
//! - `library`: queue edits, favorites, downloads, theme and persistence
//!
//! Every accepted play request takes a new token from the counter. Anything
//! that finishes asynchronously compares its token with the counter before
//! touching shared state and does nothing if a newer request exists.

mod library;
mod playback;
mod player_events;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::audio::{AudioEngine, SoundHandle};
use crate::model::{KeyValueStore, Library, PlaybackState, Theme, Track};

#[derive(Clone)]
pub struct Player {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    engine: Arc<dyn AudioEngine>,
    store: Arc<dyn KeyValueStore>,
    state: watch::Sender<PlaybackState>,
    session: Mutex<Session>,
    library: Mutex<Library>,
    theme: Mutex<Theme>,
    rng: Mutex<StdRng>,
}

#[derive(Default)]
struct Session {
    requests: u64,
    active: Option<ActiveSound>,
}

/// The stored handle, the request that produced it and its status listener.
/// The listener is attached once the sound has started.
struct ActiveSound {
    token: u64,
    handle: Arc<dyn SoundHandle>,
    listener: Option<JoinHandle<()>>,
}

impl ActiveSound {
    fn detach(self) -> Arc<dyn SoundHandle> {
        if let Some(listener) = self.listener {
            listener.abort();
        }
        self.handle
    }
}

// Guards never span an await. Poisoned data is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Player {
    pub fn new(engine: Arc<dyn AudioEngine>, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_rng(engine, store, StdRng::from_os_rng())
    }

    /// Deterministic shuffle order, for tests and reproducible sessions.
    pub fn with_rng_seed(
        engine: Arc<dyn AudioEngine>,
        store: Arc<dyn KeyValueStore>,
        seed: u64,
    ) -> Self {
        Self::with_rng(engine, store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(engine: Arc<dyn AudioEngine>, store: Arc<dyn KeyValueStore>, rng: StdRng) -> Self {
        let (state, _) = watch::channel(PlaybackState::default());
        Self {
            inner: Arc::new(Inner {
                engine,
                store,
                state,
                session: Mutex::new(Session::default()),
                library: Mutex::new(Library::default()),
                theme: Mutex::new(Theme::default()),
                rng: Mutex::new(rng),
            }),
        }
    }

    /// Receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.inner.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PlaybackState {
        self.inner.state.borrow().clone()
    }

    /// Detach and release the active sound. Pending loads become stale.
    pub async fn shutdown(&self) {
        let previous = {
            let mut session = lock(&self.inner.session);
            session.requests += 1;
            self.inner.state.send_modify(|state| {
                state.is_playing = false;
                state.is_loading = false;
            });
            session.active.take()
        };

        if let Some(active) = previous {
            let handle = active.detach();
            if let Err(e) = handle.stop().await {
                tracing::debug!(error = %e, "Stop on shutdown failed");
            }
            if let Err(e) = handle.unload().await {
                tracing::debug!(error = %e, "Unload on shutdown failed");
            }
        }
        tracing::info!("Player shut down");
    }

    /// Prefer a downloaded copy of the track when one exists.
    fn with_downloaded_copy(&self, track: Track) -> Track {
        if track.local_uri.is_some() {
            return track;
        }
        let library = lock(&self.inner.library);
        match library.downloaded(&track.id).and_then(|t| t.local_uri.clone()) {
            Some(local) => track.with_local_uri(local),
            None => track,
        }
    }
}

impl Inner {
    fn requests_issued(&self) -> u64 {
        lock(&self.session).requests
    }

    fn is_current(&self, token: u64) -> bool {
        lock(&self.session).requests == token
    }

    /// Apply `update` only if `token` is still the newest request.
    fn update_if_current(&self, token: u64, update: impl FnOnce(&mut PlaybackState)) -> bool {
        let session = lock(&self.session);
        if session.requests != token {
            return false;
        }
        self.state.send_modify(update);
        true
    }

    /// Like `update_if_current`, but also requires the request's sound to be
    /// the stored handle.
    fn update_if_active(&self, token: u64, update: impl FnOnce(&mut PlaybackState)) -> bool {
        let session = lock(&self.session);
        let active = session.active.as_ref().is_some_and(|a| a.token == token);
        if session.requests != token || !active {
            return false;
        }
        self.state.send_modify(update);
        true
    }

    fn active_handle(&self) -> Option<(u64, Arc<dyn SoundHandle>)> {
        lock(&self.session)
            .active
            .as_ref()
            .map(|a| (a.token, a.handle.clone()))
    }
}

/// Stop and unload a sound without making anyone wait for it.
fn release_in_background(handle: Arc<dyn SoundHandle>, stop_first: bool) {
    tokio::spawn(async move {
        if stop_first {
            if let Err(e) = handle.stop().await {
                tracing::debug!(error = %e, "Stopping released sound failed");
            }
        }
        if let Err(e) = handle.unload().await {
            tracing::debug!(error = %e, "Unloading released sound failed");
        }
    });
}
