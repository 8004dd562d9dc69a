//! Model module - Player state and data types
//!
//! - `types`: Track and the small enums shared everywhere
//! - `queue`: Play queue and next/previous navigation rules
//! - `playback`: Observable player state and engine status ticks
//! - `content`: Catalog records (albums, artists, playlists)
//! - `library`: Favorites and downloaded tracks
//! - `storage`: Key-value persistence gateway
//! - `downloads`: Download locations and byte fetching
//! - `catalog_client`: Catalog API client

mod types;
mod queue;
mod playback;
mod content;
mod library;
mod storage;
mod downloads;
mod catalog_client;

pub use types::{RepeatMode, Theme, Track};

pub use queue::Queue;

pub use playback::{PlaybackState, PlaybackStatus};

pub use content::{
    AlbumDetail, ArtistDetail, ArtistQuery, ArtistSort, PlaylistDetail, SearchAlbum, SearchArtist,
    SearchPlaylist, SearchResults, SortBy, SortOrder,
};

pub use library::Library;

pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageKey};

pub use downloads::{AudioFetcher, DownloadDir, HttpFetcher};

pub use catalog_client::{Catalog, DEFAULT_API_URL, DEFAULT_PAGE_SIZE, HttpCatalog, resolve_track};
