//! Status listener for the active sound

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::model::PlaybackStatus;
use super::{Inner, Player};

impl Inner {
    /// Forward status ticks of the sound loaded for `token` into state.
    /// Spawned once the sound has started playing.
    ///
    /// Ticks are applied only while `token` is the newest request and its
    /// sound is the stored handle. The listener exits on the first tick that
    /// fails that check, or when the stream closes.
    pub(super) fn spawn_status_listener(
        self: &Arc<Self>,
        token: u64,
        mut status: mpsc::UnboundedReceiver<PlaybackStatus>,
    ) -> JoinHandle<()> {
        let inner = Arc::downgrade(self);
        tracing::debug!(token, "Starting status listener");

        tokio::spawn(async move {
            while let Some(tick) = status.recv().await {
                let Some(inner) = inner.upgrade() else {
                    break;
                };

                tracing::trace!(
                    token,
                    position_ms = tick.position_ms,
                    is_playing = tick.is_playing,
                    "Status tick"
                );
                if !inner.update_if_active(token, |state| state.apply_status(&tick)) {
                    tracing::debug!(token, "Status listener superseded, stopping");
                    break;
                }

                if tick.did_just_finish {
                    tracing::info!(token, "Track finished, advancing");
                    let advance = Player { inner }.next(true);
                    tokio::spawn(advance);
                }
            }
            tracing::debug!(token, "Status listener finished");
        })
    }
}
