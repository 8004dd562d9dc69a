//! Queue edits, favorites, downloads, theme and persistence

use std::io::ErrorKind;

use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::model::{AudioFetcher, DownloadDir, StorageKey, Theme, Track};
use super::{Inner, Player, lock};

impl Player {
    /// Replace the queue with a fresh sequence, keeping the playing track
    /// selected if it is part of it.
    pub async fn set_queue(&self, tracks: Vec<Track>) {
        self.inner.state.send_modify(|state| {
            state.queue.set_queue(tracks);
            let playing = state.current_track.as_ref().map(|t| t.id.as_str());
            let index = playing.and_then(|id| state.queue.index_of(id));
            state.queue.select(index);
        });
        self.persist_state().await;
    }

    /// Append unless already queued. Returns whether the track was added.
    pub async fn add_to_queue(&self, track: Track) -> bool {
        let track_id = track.id.clone();
        let mut added = false;
        self.inner.state.send_modify(|state| {
            added = state.queue.append(track);
        });
        if added {
            tracing::info!(track_id = %track_id, "Added to queue");
            self.persist_state().await;
        }
        added
    }

    pub async fn remove_from_queue(&self, id: &str) -> bool {
        let mut removed = false;
        self.inner.state.send_modify(|state| {
            removed = state.queue.remove(id);
        });
        if removed {
            tracing::info!(track_id = id, "Removed from queue");
            self.persist_state().await;
        }
        removed
    }

    /// Swap in a reordered or edited queue, keeping the selection by id.
    pub async fn update_queue(&self, tracks: Vec<Track>) {
        self.inner.state.send_modify(|state| state.queue.replace(tracks));
        self.persist_state().await;
    }

    /// Returns whether the track is a favorite afterwards. Not persisted
    /// until the next `persist_state`.
    pub fn toggle_favorite(&self, track: &Track) -> bool {
        let favorite = lock(&self.inner.library).toggle_favorite(track);
        tracing::info!(track_id = %track.id, favorite, "Favorite toggled");
        favorite
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        lock(&self.inner.library).is_favorite(id)
    }

    pub fn favorites(&self) -> Vec<Track> {
        lock(&self.inner.library).favorites().to_vec()
    }

    pub fn is_downloaded(&self, id: &str) -> bool {
        lock(&self.inner.library).is_downloaded(id)
    }

    pub fn downloads(&self) -> Vec<Track> {
        lock(&self.inner.library).downloads().to_vec()
    }

    /// The downloaded copy of a track, with its `local_uri` set
    pub fn downloaded_track(&self, id: &str) -> Option<Track> {
        lock(&self.inner.library).downloaded(id).cloned()
    }

    /// Fetch the track's audio into `dir` and record it as downloaded.
    /// Returns whether the track is downloaded afterwards.
    pub async fn download_track(
        &self,
        track: &Track,
        dir: &DownloadDir,
        fetcher: &dyn AudioFetcher,
    ) -> bool {
        if self.is_downloaded(&track.id) {
            return true;
        }
        if track.audio_url.is_empty() {
            tracing::warn!(track_id = %track.id, "No stream URL to download from");
            return false;
        }

        let fetched = async {
            let dest = dir.location_for(track).await?;
            fetcher.fetch_to(&track.audio_url, &dest).await?;
            anyhow::Ok(dest)
        }
        .await;

        let dest = match fetched {
            Ok(dest) => dest,
            Err(e) => {
                tracing::error!(track_id = %track.id, error = %e, "Download failed");
                return false;
            }
        };

        let local = track.with_local_uri(dest.to_string_lossy());
        lock(&self.inner.library).add_download(local);
        tracing::info!(track_id = %track.id, path = %dest.display(), "Track downloaded");
        self.persist_state().await;
        true
    }

    /// Delete the downloaded file and forget it. A missing file, or an
    /// entry that never recorded one, only clears the entry.
    pub async fn remove_download(&self, id: &str) -> bool {
        let Some(entry) = self.downloaded_track(id) else {
            return false;
        };

        if let Some(local) = entry.local_uri.as_deref() {
            match tokio::fs::remove_file(local).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!(track_id = id, path = %local, "Downloaded file already gone");
                }
                Err(e) => {
                    tracing::error!(track_id = id, path = %local, error = %e, "Failed to delete download");
                    return false;
                }
            }
        }

        lock(&self.inner.library).remove_download(id);
        tracing::info!(track_id = id, "Download removed");
        self.persist_state().await;
        true
    }

    pub fn theme(&self) -> Theme {
        *lock(&self.inner.theme)
    }

    pub async fn toggle_theme(&self) -> Theme {
        let theme = {
            let mut theme = lock(&self.inner.theme);
            *theme = theme.toggled();
            *theme
        };
        tracing::info!(theme = theme.as_str(), "Theme toggled");
        if let Err(e) = self
            .inner
            .store
            .set(StorageKey::Theme, theme.as_str().to_string())
            .await
        {
            tracing::error!(error = %e, "Failed to save theme");
        }
        theme
    }

    /// Write favorites, queue and downloads in full. Failures are logged and
    /// in-memory state is left as is.
    pub async fn persist_state(&self) {
        let (favorites, queue, downloads) = {
            let library = lock(&self.inner.library);
            let state = self.inner.state.borrow();
            (
                serde_json::to_string(library.favorites()),
                serde_json::to_string(state.queue.tracks()),
                serde_json::to_string(library.downloads()),
            )
        };

        let (favorites, queue, downloads) = futures::join!(
            self.inner.save(StorageKey::Favorites, favorites),
            self.inner.save(StorageKey::Queue, queue),
            self.inner.save(StorageKey::Downloads, downloads)
        );
        for (key, result) in [
            (StorageKey::Favorites, favorites),
            (StorageKey::Queue, queue),
            (StorageKey::Downloads, downloads),
        ] {
            if let Err(e) = result {
                tracing::error!(key = key.as_str(), error = %e, "Failed to persist state");
            }
        }
    }

    /// Restore favorites, queue, downloads and theme. Missing keys leave the
    /// defaults; unreadable ones are logged and skipped.
    pub async fn load_persisted_state(&self) {
        let (favorites, queue, downloads, theme) = futures::join!(
            self.inner.load_json::<Vec<Track>>(StorageKey::Favorites),
            self.inner.load_json::<Vec<Track>>(StorageKey::Queue),
            self.inner.load_json::<Vec<Track>>(StorageKey::Downloads),
            self.inner.store.get(StorageKey::Theme)
        );

        {
            let mut library = lock(&self.inner.library);
            if let Some(favorites) = favorites {
                library.set_favorites(favorites);
            }
            if let Some(downloads) = downloads {
                library.set_downloads(downloads);
            }
        }
        if let Some(tracks) = queue {
            self.inner.state.send_modify(|state| state.queue.set_queue(tracks));
        }

        match theme {
            Ok(Some(raw)) => match Theme::parse(&raw) {
                Some(theme) => *lock(&self.inner.theme) = theme,
                None => tracing::warn!(value = %raw, "Ignoring unknown theme"),
            },
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "Failed to load theme"),
        }

        let library = lock(&self.inner.library);
        tracing::info!(
            favorites = library.favorites().len(),
            downloads = library.downloads().len(),
            queue = self.inner.state.borrow().queue.len(),
            "Persisted state loaded"
        );
    }
}

impl Inner {
    async fn save(
        &self,
        key: StorageKey,
        value: serde_json::Result<String>,
    ) -> anyhow::Result<()> {
        let value = value.with_context(|| format!("failed to encode {}", key.as_str()))?;
        self.store.set(key, value).await
    }

    async fn load_json<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::error!(key = key.as_str(), error = %e, "Failed to load persisted value");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = key.as_str(), error = %e, "Ignoring unreadable persisted value");
                None
            }
        }
    }
}
