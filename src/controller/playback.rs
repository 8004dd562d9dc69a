//! Playback control methods

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{self, BoxFuture};

use crate::audio::{LoadOptions, LoadedSound};
use crate::model::{Catalog, RepeatMode, Track, resolve_track};

use super::{ActiveSound, Inner, Player, lock, release_in_background};

impl Player {
    /// Start a new playback session for `track`.
    ///
    /// Before this returns, the new request has superseded every earlier one,
    /// the previous sound is detached, and the state already shows `track`
    /// at position 0 with `is_loading` set. The returned future performs the
    /// load and start; it never fails, errors end up in the log and in state.
    ///
    /// `queue` replaces the current queue when given. Must be called from
    /// within a Tokio runtime.
    pub fn play_track(
        &self,
        track: Track,
        queue: Option<Vec<Track>>,
    ) -> impl Future<Output = ()> + Send + 'static {
        let track = self.with_downloaded_copy(track);

        let (token, session_id, previous) = {
            let mut session = lock(&self.inner.session);
            session.requests += 1;
            let previous = session.active.take().map(ActiveSound::detach);

            let mut session_id = 0;
            self.inner.state.send_modify(|state| {
                if let Some(tracks) = queue {
                    state.queue.set_queue(tracks);
                }
                let index = state.queue.index_of(&track.id).unwrap_or(0);
                state.queue.select(Some(index));
                state.current_track = Some(track.clone());
                state.is_playing = false;
                state.position_secs = 0;
                state.duration_secs = track.duration_secs;
                state.is_loading = true;
                state.session_id += 1;
                session_id = state.session_id;
            });
            (session.requests, session_id, previous)
        };

        tracing::info!(
            track_id = %track.id,
            title = %track.title,
            token,
            session_id,
            "Play requested"
        );

        if let Some(handle) = previous {
            release_in_background(handle, true);
        }

        let inner = self.inner.clone();
        async move { inner.load_and_start(token, track).await }
    }

    /// Fill in a missing stream URL from the catalog, then play.
    ///
    /// If another play request is accepted while the lookup is in flight,
    /// the resolved track is dropped.
    pub async fn resolve_and_play(
        &self,
        catalog: &dyn Catalog,
        track: Track,
        queue: Option<Vec<Track>>,
    ) {
        let issued = self.inner.requests_issued();
        let track = resolve_track(catalog, self.with_downloaded_copy(track)).await;

        if self.inner.requests_issued() != issued {
            tracing::debug!(track_id = %track.id, "Superseded while resolving, not playing");
            return;
        }
        self.play_track(track, queue).await;
    }

    pub async fn pause(&self) {
        let Some((token, handle)) = self.inner.active_handle() else {
            return;
        };
        match handle.pause().await {
            Ok(()) => {
                self.inner.update_if_active(token, |state| state.is_playing = false);
                tracing::info!(token, "Paused");
            }
            Err(e) => tracing::warn!(error = %e, "Pause failed"),
        }
    }

    pub async fn resume(&self) {
        let Some((token, handle)) = self.inner.active_handle() else {
            return;
        };
        match handle.play().await {
            Ok(()) => {
                self.inner.update_if_active(token, |state| state.is_playing = true);
                tracing::info!(token, "Resumed");
            }
            Err(e) => tracing::warn!(error = %e, "Resume failed"),
        }
    }

    /// Seek the active sound. Ignored while a track is loading.
    pub async fn seek_to(&self, seconds: u32) {
        if self.inner.state.borrow().is_loading {
            tracing::debug!(seconds, "Seek ignored while loading");
            return;
        }
        let Some((token, handle)) = self.inner.active_handle() else {
            return;
        };
        match handle.seek(Duration::from_secs(seconds.into())).await {
            Ok(()) => {
                self.inner.update_if_active(token, |state| state.position_secs = seconds);
            }
            Err(e) => tracing::warn!(seconds, error = %e, "Seek failed"),
        }
    }

    /// Move forward in the queue. `auto_ended` marks a natural track end,
    /// which honours repeat-one and stops at the end of a non-repeating queue.
    ///
    /// The target is chosen and the play request issued before this returns;
    /// the future completes when that request has loaded.
    pub fn next(&self, auto_ended: bool) -> BoxFuture<'static, ()> {
        let (queue, shuffle, repeat) = {
            let state = self.inner.state.borrow();
            (state.queue.clone(), state.shuffle, state.repeat)
        };
        let target = {
            let mut rng = lock(&self.inner.rng);
            queue.next_index(shuffle, repeat, auto_ended, &mut *rng)
        };

        match target.and_then(|idx| queue.get(idx).cloned()) {
            Some(track) => self.play_track(track, None).boxed(),
            None => {
                tracing::debug!(auto_ended, "No next track, staying put");
                future::ready(()).boxed()
            }
        }
    }

    pub fn previous(&self) -> BoxFuture<'static, ()> {
        let (queue, shuffle) = {
            let state = self.inner.state.borrow();
            (state.queue.clone(), state.shuffle)
        };
        let target = {
            let mut rng = lock(&self.inner.rng);
            queue.previous_index(shuffle, &mut *rng)
        };

        match target.and_then(|idx| queue.get(idx).cloned()) {
            Some(track) => self.play_track(track, None).boxed(),
            None => future::ready(()).boxed(),
        }
    }

    pub fn toggle_shuffle(&self) -> bool {
        let mut shuffle = false;
        self.inner.state.send_modify(|state| {
            state.shuffle = !state.shuffle;
            shuffle = state.shuffle;
        });
        tracing::info!(shuffle, "Shuffle toggled");
        shuffle
    }

    pub fn toggle_repeat(&self) -> RepeatMode {
        let mut repeat = RepeatMode::None;
        self.inner.state.send_modify(|state| {
            state.repeat = state.repeat.next();
            repeat = state.repeat;
        });
        tracing::info!(repeat = ?repeat, "Repeat mode changed");
        repeat
    }
}

impl Inner {
    async fn load_and_start(self: Arc<Self>, token: u64, track: Track) {
        let uri = track.playback_uri().to_string();
        let options = LoadOptions {
            should_play: false,
            position: Duration::ZERO,
            duration_hint: (track.duration_secs > 0)
                .then(|| Duration::from_secs(track.duration_secs.into())),
        };

        tracing::debug!(token, uri = %uri, "Loading sound");
        match self.engine.load(&uri, options).await {
            Ok(sound) => {
                if let Err(e) = self.start(token, sound).await {
                    self.fail(token, &track, &e);
                }
            }
            Err(e) => self.fail(token, &track, &e),
        }

        self.update_if_current(token, |state| state.is_loading = false);
    }

    /// Store the freshly loaded sound and start it, unless a newer request
    /// arrived during the load, in which case the sound is released unplayed.
    ///
    /// The status listener is attached only after `play` succeeds. Anything
    /// the engine reported before that describes the unstarted sound and is
    /// dropped.
    async fn start(self: &Arc<Self>, token: u64, sound: LoadedSound) -> anyhow::Result<()> {
        let LoadedSound { handle, mut status } = sound;

        {
            let mut session = lock(&self.session);
            if session.requests != token {
                drop(session);
                tracing::debug!(token, "Load finished for a superseded request, releasing");
                drop(status);
                release_in_background(handle, false);
                return Ok(());
            }
            session.active = Some(ActiveSound {
                token,
                handle: handle.clone(),
                listener: None,
            });
        }

        handle.seek(Duration::ZERO).await?;
        if !self.is_current(token) {
            return Ok(());
        }
        handle.play().await?;

        let mut session = lock(&self.session);
        if session.requests != token {
            return Ok(());
        }
        let Some(active) = session.active.as_mut().filter(|active| active.token == token) else {
            return Ok(());
        };

        let mut skipped = 0usize;
        while status.try_recv().is_ok() {
            skipped += 1;
        }
        active.listener = Some(self.spawn_status_listener(token, status));
        self.state.send_modify(|state| {
            state.is_playing = true;
            state.is_loading = false;
        });
        tracing::debug!(token, skipped, "Playback started");
        Ok(())
    }

    fn fail(&self, token: u64, track: &Track, error: &anyhow::Error) {
        tracing::error!(track_id = %track.id, token, error = %error, "Playback failed");
        self.update_if_current(token, |state| {
            state.is_playing = false;
            state.is_loading = false;
        });
    }
}
