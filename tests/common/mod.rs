//! Scripted collaborators shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use mume::audio::{AudioEngine, LoadOptions, LoadedSound, SoundHandle};
use mume::model::{
    AlbumDetail, ArtistDetail, ArtistQuery, ArtistSort, AudioFetcher, Catalog, PlaybackStatus,
    PlaylistDetail, SearchAlbum, SearchArtist, SearchPlaylist, SearchResults, Track,
};

pub fn track(id: &str, duration_secs: u32) -> Track {
    Track {
        id: id.to_string(),
        title: format!("Song {id}"),
        artist: "Tester".to_string(),
        image_url: String::new(),
        audio_url: stream_url(id),
        local_uri: None,
        duration_secs,
        lyrics: None,
    }
}

pub fn stream_url(id: &str) -> String {
    format!("https://cdn.test/{id}.mp3")
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Play,
    Pause,
    Seek(Duration),
    Stop,
    Unload,
}

struct SoundRecord {
    uri: String,
    calls: Vec<Call>,
    status: mpsc::UnboundedSender<PlaybackStatus>,
    unloaded: bool,
}

#[derive(Default)]
struct EngineState {
    gates: HashMap<String, Arc<Notify>>,
    failing: HashSet<String>,
    on_load: HashMap<String, PlaybackStatus>,
    requested: Vec<String>,
    sounds: Vec<SoundRecord>,
}

/// Engine whose loads can be held back per URI and whose sounds record
/// every command they receive. Sounds are numbered in load-completion order.
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the next load of `uri` until the returned gate is notified.
    pub fn gate(&self, uri: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state
            .lock()
            .unwrap()
            .gates
            .insert(uri.to_string(), gate.clone());
        gate
    }

    /// Queue `status` on the stream of the next sound loaded from `uri`,
    /// before anyone has started it.
    pub fn report_on_load(&self, uri: &str, status: PlaybackStatus) {
        self.state
            .lock()
            .unwrap()
            .on_load
            .insert(uri.to_string(), status);
    }

    pub fn fail(&self, uri: &str) {
        self.state.lock().unwrap().failing.insert(uri.to_string());
    }

    /// URIs in the order loads were requested
    pub fn load_requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requested.clone()
    }

    pub fn sounds_for(&self, uri: &str) -> Vec<usize> {
        let state = self.state.lock().unwrap();
        state
            .sounds
            .iter()
            .enumerate()
            .filter(|(_, s)| s.uri == uri)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn sound_count(&self) -> usize {
        self.state.lock().unwrap().sounds.len()
    }

    pub fn calls(&self, sound: usize) -> Vec<Call> {
        self.state.lock().unwrap().sounds[sound].calls.clone()
    }

    pub fn was_played(&self, sound: usize) -> bool {
        self.calls(sound).contains(&Call::Play)
    }

    pub fn is_unloaded(&self, sound: usize) -> bool {
        self.state.lock().unwrap().sounds[sound].unloaded
    }

    /// Deliver a status tick from `sound`. False if nobody is listening.
    pub fn tick(&self, sound: usize, status: PlaybackStatus) -> bool {
        let state = self.state.lock().unwrap();
        let record = &state.sounds[sound];
        !record.unloaded && record.status.send(status).is_ok()
    }

    pub fn tick_at(&self, sound: usize, position_secs: u64, duration_secs: u64) -> bool {
        self.tick(
            sound,
            PlaybackStatus {
                position_ms: position_secs * 1000,
                duration_ms: Some(duration_secs * 1000),
                is_playing: true,
                did_just_finish: false,
            },
        )
    }

    /// Report natural end of track from `sound`.
    pub fn finish(&self, sound: usize, duration_secs: u64) -> bool {
        self.tick(
            sound,
            PlaybackStatus {
                position_ms: duration_secs * 1000,
                duration_ms: Some(duration_secs * 1000),
                is_playing: false,
                did_just_finish: true,
            },
        )
    }
}

#[async_trait]
impl AudioEngine for FakeEngine {
    async fn load(&self, uri: &str, _options: LoadOptions) -> Result<LoadedSound> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.requested.push(uri.to_string());
            state.gates.remove(uri)
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock().unwrap();
        if state.failing.contains(uri) {
            bail!("cannot decode {uri}");
        }
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(status) = state.on_load.remove(uri) {
            let _ = tx.send(status);
        }
        let id = state.sounds.len();
        state.sounds.push(SoundRecord {
            uri: uri.to_string(),
            calls: Vec::new(),
            status: tx,
            unloaded: false,
        });
        Ok(LoadedSound {
            handle: Arc::new(FakeSound {
                id,
                state: self.state.clone(),
            }),
            status: rx,
        })
    }
}

struct FakeSound {
    id: usize,
    state: Arc<Mutex<EngineState>>,
}

impl FakeSound {
    fn record(&self, call: Call) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let sound = &mut state.sounds[self.id];
        if sound.unloaded {
            return Err(anyhow!("sound {} already unloaded", self.id));
        }
        if call == Call::Unload {
            sound.unloaded = true;
        }
        sound.calls.push(call);
        Ok(())
    }
}

#[async_trait]
impl SoundHandle for FakeSound {
    async fn play(&self) -> Result<()> {
        self.record(Call::Play)
    }

    async fn pause(&self) -> Result<()> {
        self.record(Call::Pause)
    }

    async fn seek(&self, position: Duration) -> Result<()> {
        self.record(Call::Seek(position))
    }

    async fn stop(&self) -> Result<()> {
        self.record(Call::Stop)
    }

    async fn unload(&self) -> Result<()> {
        self.record(Call::Unload)
    }
}

/// Catalog that only answers track detail lookups, optionally held back.
#[derive(Default)]
pub struct FakeCatalog {
    details: Mutex<HashMap<String, Track>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeCatalog {
    pub fn with_details(tracks: Vec<Track>) -> Self {
        let catalog = Self::default();
        *catalog.details.lock().unwrap() =
            tracks.into_iter().map(|t| (t.id.clone(), t)).collect();
        catalog
    }

    pub fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn search_all(&self, _query: &str) -> SearchResults {
        SearchResults::default()
    }

    async fn search_songs(&self, _query: &str, _page: u32, _limit: u32) -> Vec<Track> {
        Vec::new()
    }

    async fn search_albums(&self, _query: &str, _page: u32, _limit: u32) -> Vec<SearchAlbum> {
        Vec::new()
    }

    async fn search_artists(&self, _query: &str, _page: u32, _limit: u32) -> Vec<SearchArtist> {
        Vec::new()
    }

    async fn search_playlists(&self, _query: &str, _page: u32, _limit: u32) -> Vec<SearchPlaylist> {
        Vec::new()
    }

    async fn fetch_track_details(&self, id: &str, _include_lyrics: bool) -> Option<Track> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.details.lock().unwrap().get(id).cloned()
    }

    async fn fetch_songs_by_ids(&self, _ids: &[String]) -> Vec<Track> {
        Vec::new()
    }

    async fn fetch_song_suggestions(&self, _id: &str, _limit: u32) -> Vec<Track> {
        Vec::new()
    }

    async fn fetch_album_details(&self, _id: &str) -> Option<AlbumDetail> {
        None
    }

    async fn fetch_playlist_details(
        &self,
        _id: &str,
        _page: u32,
        _limit: u32,
    ) -> Option<PlaylistDetail> {
        None
    }

    async fn fetch_artist_details(&self, _id: &str, _query: &ArtistQuery) -> Option<ArtistDetail> {
        None
    }

    async fn fetch_artist_songs(&self, _id: &str, _page: u32, _sort: ArtistSort) -> Vec<Track> {
        Vec::new()
    }

    async fn fetch_artist_albums(
        &self,
        _id: &str,
        _page: u32,
        _sort: ArtistSort,
    ) -> Vec<SearchAlbum> {
        Vec::new()
    }

    async fn fetch_track_by_link(&self, _link: &str) -> Option<Track> {
        None
    }

    async fn fetch_album_by_link(&self, _link: &str) -> Option<AlbumDetail> {
        None
    }

    async fn fetch_playlist_by_link(
        &self,
        _link: &str,
        _page: u32,
        _limit: u32,
    ) -> Option<PlaylistDetail> {
        None
    }

    async fn fetch_artist_by_link(&self, _link: &str, _query: &ArtistQuery) -> Option<ArtistDetail> {
        None
    }
}

/// Writes a few fixed bytes instead of downloading.
#[derive(Default)]
pub struct FakeFetcher {
    pub fail: bool,
}

#[async_trait]
impl AudioFetcher for FakeFetcher {
    async fn fetch_to(&self, url: &str, dest: &Path) -> Result<()> {
        if self.fail {
            bail!("connection reset fetching {url}");
        }
        tokio::fs::write(dest, b"ID3fake").await?;
        Ok(())
    }
}
