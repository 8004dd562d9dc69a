//! Favorites and downloaded tracks, kept in memory and saved in full

use super::types::Track;

/// Favorites (display order preserved) and the downloaded-track map.
///
/// Downloaded entries carry their `local_uri`; lookups are by track id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Library {
    favorites: Vec<Track>,
    downloads: Vec<Track>,
}

impl Library {
    pub fn new(favorites: Vec<Track>, downloads: Vec<Track>) -> Self {
        Self {
            favorites,
            downloads,
        }
    }

    pub fn favorites(&self) -> &[Track] {
        &self.favorites
    }

    pub fn downloads(&self) -> &[Track] {
        &self.downloads
    }

    pub fn set_favorites(&mut self, favorites: Vec<Track>) {
        self.favorites = favorites;
    }

    pub fn set_downloads(&mut self, downloads: Vec<Track>) {
        self.downloads = downloads;
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.iter().any(|t| t.id == id)
    }

    /// Add or remove by id. Returns whether the track is a favorite afterwards.
    /// Re-adding puts the track at the end.
    pub fn toggle_favorite(&mut self, track: &Track) -> bool {
        if self.is_favorite(&track.id) {
            self.favorites.retain(|t| t.id != track.id);
            false
        } else {
            self.favorites.push(track.clone());
            true
        }
    }

    pub fn is_downloaded(&self, id: &str) -> bool {
        self.downloaded(id).is_some()
    }

    pub fn downloaded(&self, id: &str) -> Option<&Track> {
        self.downloads.iter().find(|t| t.id == id)
    }

    pub fn add_download(&mut self, track: Track) -> bool {
        if self.is_downloaded(&track.id) {
            return false;
        }
        self.downloads.push(track);
        true
    }

    pub fn remove_download(&mut self, id: &str) -> Option<Track> {
        let idx = self.downloads.iter().position(|t| t.id == id)?;
        Some(self.downloads.remove(idx))
    }
}
