//! Catalog records returned by search and detail lookups

use super::types::Track;

/// An album from search results
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchAlbum {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub image_url: String,
    pub year: String,
    pub song_count: u32,
}

/// An artist from search results
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchArtist {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub role: String,
}

/// A playlist from search results
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchPlaylist {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub song_count: u32,
    pub language: String,
}

/// Combined search results
#[derive(Clone, Debug, Default)]
pub struct SearchResults {
    pub songs: Vec<Track>,
    pub albums: Vec<SearchAlbum>,
    pub artists: Vec<SearchArtist>,
    pub playlists: Vec<SearchPlaylist>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
            && self.albums.is_empty()
            && self.artists.is_empty()
            && self.playlists.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlbumDetail {
    pub album: SearchAlbum,
    pub tracks: Vec<Track>,
}

#[derive(Clone, Debug, Default)]
pub struct PlaylistDetail {
    pub playlist: SearchPlaylist,
    pub tracks: Vec<Track>,
}

#[derive(Clone, Debug, Default)]
pub struct ArtistDetail {
    pub artist: SearchArtist,
    pub bio: Option<String>,
    pub follower_count: u64,
    pub is_verified: bool,
    pub top_songs: Vec<Track>,
    pub top_albums: Vec<SearchAlbum>,
    pub singles: Vec<Track>,
}

/// Ordering for an artist's songs and albums
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Popularity,
    Latest,
    Alphabetical,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Popularity => "popularity",
            SortBy::Latest => "latest",
            SortBy::Alphabetical => "alphabetical",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Most popular first unless asked otherwise
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArtistSort {
    pub by: SortBy,
    pub order: SortOrder,
}

/// Optional knobs for an artist detail lookup. Unset fields are left to the
/// server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArtistQuery {
    pub page: Option<u32>,
    pub song_count: Option<u32>,
    pub album_count: Option<u32>,
    pub sort: Option<ArtistSort>,
}
