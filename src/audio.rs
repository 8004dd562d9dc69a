//! Audio engine interface consumed by the player
//!
//! A load produces a handle plus a status stream. The stream belongs to that
//! one load: the player drops it when the sound is superseded, so ticks from
//! an old sound never reach shared state.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::model::PlaybackStatus;

pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub should_play: bool,
    pub position: Duration,
    /// Catalog duration, for engines that cannot probe the stream
    pub duration_hint: Option<Duration>,
}

pub struct LoadedSound {
    pub handle: Arc<dyn SoundHandle>,
    pub status: mpsc::UnboundedReceiver<PlaybackStatus>,
}

#[async_trait]
pub trait AudioEngine: Send + Sync {
    async fn load(&self, uri: &str, options: LoadOptions) -> Result<LoadedSound>;
}

/// One loaded, playable sound
#[async_trait]
pub trait SoundHandle: Send + Sync {
    async fn play(&self) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    async fn seek(&self, position: Duration) -> Result<()>;
    async fn stop(&self) -> Result<()>;
    async fn unload(&self) -> Result<()>;
}

/// Engine that keeps time without producing sound.
///
/// Honors the full handle contract and reports `did_just_finish` once the
/// duration hint has elapsed. Used by the headless shell.
#[derive(Clone, Debug)]
pub struct SilentEngine {
    tick: Duration,
}

impl SilentEngine {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }
}

impl Default for SilentEngine {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_INTERVAL)
    }
}

#[async_trait]
impl AudioEngine for SilentEngine {
    async fn load(&self, uri: &str, options: LoadOptions) -> Result<LoadedSound> {
        if uri.is_empty() {
            return Err(anyhow!("no playable URI"));
        }

        let clock = Arc::new(Mutex::new(Clock {
            offset: options.position,
            playing_since: options.should_play.then(Instant::now),
            duration: options.duration_hint,
            unloaded: false,
        }));
        let (tx, rx) = mpsc::unbounded_channel();

        let ticker_clock = clock.clone();
        let tick = self.tick;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                interval.tick().await;
                let status = {
                    let Ok(mut clock) = ticker_clock.lock() else {
                        break;
                    };
                    if clock.unloaded {
                        break;
                    }
                    clock.status()
                };
                if tx.send(status).is_err() {
                    break;
                }
            }
        });

        tracing::debug!(uri, "Silent sound loaded");
        Ok(LoadedSound {
            handle: Arc::new(SilentSound { clock }),
            status: rx,
        })
    }
}

struct Clock {
    offset: Duration,
    playing_since: Option<Instant>,
    duration: Option<Duration>,
    unloaded: bool,
}

impl Clock {
    fn position(&self) -> Duration {
        let elapsed = self.playing_since.map(|t| t.elapsed()).unwrap_or_default();
        let position = self.offset + elapsed;
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    fn freeze(&mut self) {
        self.offset = self.position();
        self.playing_since = None;
    }

    fn status(&mut self) -> PlaybackStatus {
        let position = self.position();
        let did_just_finish = self.playing_since.is_some()
            && self.duration.is_some_and(|duration| position >= duration);
        if did_just_finish {
            self.freeze();
        }
        PlaybackStatus {
            position_ms: u64::try_from(position.as_millis()).unwrap_or(u64::MAX),
            duration_ms: self
                .duration
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            is_playing: self.playing_since.is_some(),
            did_just_finish,
        }
    }
}

struct SilentSound {
    clock: Arc<Mutex<Clock>>,
}

impl SilentSound {
    fn with_clock(&self, f: impl FnOnce(&mut Clock)) -> Result<()> {
        let mut clock = self
            .clock
            .lock()
            .map_err(|_| anyhow!("sound clock poisoned"))?;
        if clock.unloaded {
            return Err(anyhow!("sound already unloaded"));
        }
        f(&mut clock);
        Ok(())
    }
}

#[async_trait]
impl SoundHandle for SilentSound {
    async fn play(&self) -> Result<()> {
        self.with_clock(|clock| {
            if clock.playing_since.is_none() {
                clock.playing_since = Some(Instant::now());
            }
        })
    }

    async fn pause(&self) -> Result<()> {
        self.with_clock(Clock::freeze)
    }

    async fn seek(&self, position: Duration) -> Result<()> {
        self.with_clock(|clock| {
            clock.offset = position;
            if clock.playing_since.is_some() {
                clock.playing_since = Some(Instant::now());
            }
        })
    }

    async fn stop(&self) -> Result<()> {
        self.with_clock(|clock| {
            clock.offset = Duration::ZERO;
            clock.playing_since = None;
        })
    }

    async fn unload(&self) -> Result<()> {
        self.with_clock(|clock| clock.unloaded = true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn silent_sound_finishes_after_duration_hint() {
        let engine = SilentEngine::new(Duration::from_millis(100));
        let mut sound = engine
            .load(
                "file:///tmp/a.mp3",
                LoadOptions {
                    duration_hint: Some(Duration::from_millis(350)),
                    ..LoadOptions::default()
                },
            )
            .await
            .expect("load");
        sound.handle.play().await.expect("play");

        let mut finished = None;
        while let Some(status) = sound.status.recv().await {
            if status.did_just_finish {
                finished = Some(status);
                break;
            }
        }
        let finished = finished.expect("finish tick");
        assert_eq!(finished.position_ms, 350);
        assert!(!finished.is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn unloaded_sound_rejects_commands_and_closes_stream() {
        let engine = SilentEngine::new(Duration::from_millis(50));
        let mut sound = engine
            .load("file:///tmp/a.mp3", LoadOptions::default())
            .await
            .expect("load");
        sound.handle.unload().await.expect("unload");

        assert!(sound.handle.play().await.is_err());
        while sound.status.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn empty_uri_fails_to_load() {
        let engine = SilentEngine::default();
        assert!(engine.load("", LoadOptions::default()).await.is_err());
    }
}
