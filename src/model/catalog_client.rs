//! Catalog API client: search, detail lookups and lazy track resolution
//!
//! Every public lookup swallows transport and shape errors at this boundary:
//! failures are logged and come back as an empty list or `None`, which callers
//! treat as "no results".

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;

use super::content::{
    AlbumDetail, ArtistDetail, ArtistQuery, ArtistSort, PlaylistDetail, SearchAlbum, SearchArtist,
    SearchPlaylist, SearchResults,
};
use super::types::Track;

pub const DEFAULT_API_URL: &str = "https://jiosaavn-api-murex.vercel.app/api";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Read side of the music catalog
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn search_all(&self, query: &str) -> SearchResults;
    async fn search_songs(&self, query: &str, page: u32, limit: u32) -> Vec<Track>;
    async fn search_albums(&self, query: &str, page: u32, limit: u32) -> Vec<SearchAlbum>;
    async fn search_artists(&self, query: &str, page: u32, limit: u32) -> Vec<SearchArtist>;
    async fn search_playlists(&self, query: &str, page: u32, limit: u32) -> Vec<SearchPlaylist>;
    async fn fetch_track_details(&self, id: &str, include_lyrics: bool) -> Option<Track>;
    async fn fetch_songs_by_ids(&self, ids: &[String]) -> Vec<Track>;
    async fn fetch_song_suggestions(&self, id: &str, limit: u32) -> Vec<Track>;
    async fn fetch_album_details(&self, id: &str) -> Option<AlbumDetail>;
    async fn fetch_playlist_details(&self, id: &str, page: u32, limit: u32)
    -> Option<PlaylistDetail>;
    async fn fetch_artist_details(&self, id: &str, query: &ArtistQuery) -> Option<ArtistDetail>;
    async fn fetch_artist_songs(&self, id: &str, page: u32, sort: ArtistSort) -> Vec<Track>;
    async fn fetch_artist_albums(&self, id: &str, page: u32, sort: ArtistSort)
    -> Vec<SearchAlbum>;
    async fn fetch_track_by_link(&self, link: &str) -> Option<Track>;
    async fn fetch_album_by_link(&self, link: &str) -> Option<AlbumDetail>;
    async fn fetch_playlist_by_link(&self, link: &str, page: u32, limit: u32)
    -> Option<PlaylistDetail>;
    async fn fetch_artist_by_link(&self, link: &str, query: &ArtistQuery) -> Option<ArtistDetail>;
}

/// Fill in a missing stream URL from the track's detail record.
///
/// Tracks that already have something to play are returned untouched, as is
/// the original track when the lookup finds nothing.
pub async fn resolve_track(catalog: &dyn Catalog, track: Track) -> Track {
    if !track.needs_resolution() {
        return track;
    }

    tracing::debug!(track_id = %track.id, "Resolving stream URL");
    match catalog.fetch_track_details(&track.id, false).await {
        Some(details) if !details.audio_url.is_empty() => Track {
            audio_url: details.audio_url,
            duration_secs: if track.duration_secs == 0 {
                details.duration_secs
            } else {
                track.duration_secs
            },
            ..track
        },
        _ => {
            tracing::warn!(track_id = %track.id, "No stream URL found for track");
            track
        }
    }
}

/// JSON-over-HTTP catalog client
#[derive(Clone)]
pub struct HttpCatalog {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, path);
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.with_context(|| format!("invalid URL {raw}"))
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = self.url(path, params)?;
        crate::log_api_request!(path, url = %url);

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {status} from {url}"));
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        if !is_json {
            return Err(anyhow!("non-JSON response from {url}"));
        }

        Ok(response.json::<Value>().await?)
    }

    /// Detail endpoints accept both `/kind/{id}` and `/kind?id=`; some
    /// deployments only answer the second.
    async fn get_detail(&self, kind: &str, id: &str, params: &[(&str, String)]) -> Result<Value> {
        let by_path = self.get_json(&format!("/{kind}/{id}"), params).await;
        match by_path {
            Ok(body) if reports_success(&body) => Ok(body),
            other => {
                if let Err(e) = &other {
                    tracing::debug!(kind, id, error = %e, "Path lookup failed, retrying by query");
                }
                let mut fallback = params.to_vec();
                fallback.push(("id", id.to_string()));
                self.get_json(&format!("/{kind}"), &fallback).await
            }
        }
    }

    async fn search_results(
        &self,
        kind: &str,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Value>> {
        let body = self
            .get_json(
                &format!("/search/{kind}"),
                &[
                    ("query", query.to_string()),
                    ("page", page.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(array_at(&body["data"]["results"]))
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn search_all(&self, query: &str) -> SearchResults {
        let result = self.get_json("/search", &[("query", query.to_string())]).await;
        crate::log_api_result!("search_all", result);

        let Ok(body) = result else {
            return SearchResults::default();
        };
        let data = &body["data"];
        SearchResults {
            songs: array_at(&data["songs"]["results"]).iter().map(map_track).collect(),
            albums: array_at(&data["albums"]["results"]).iter().map(map_album).collect(),
            artists: array_at(&data["artists"]["results"]).iter().map(map_artist).collect(),
            playlists: array_at(&data["playlists"]["results"])
                .iter()
                .map(map_playlist)
                .collect(),
        }
    }

    async fn search_songs(&self, query: &str, page: u32, limit: u32) -> Vec<Track> {
        let result = self.search_results("songs", query, page, limit).await;
        crate::log_api_result!("search_songs", result);
        result.map(|items| items.iter().map(map_track).collect()).unwrap_or_default()
    }

    async fn search_albums(&self, query: &str, page: u32, limit: u32) -> Vec<SearchAlbum> {
        let result = self.search_results("albums", query, page, limit).await;
        crate::log_api_result!("search_albums", result);
        result.map(|items| items.iter().map(map_album).collect()).unwrap_or_default()
    }

    async fn search_artists(&self, query: &str, page: u32, limit: u32) -> Vec<SearchArtist> {
        let result = self.search_results("artists", query, page, limit).await;
        crate::log_api_result!("search_artists", result);
        result.map(|items| items.iter().map(map_artist).collect()).unwrap_or_default()
    }

    async fn search_playlists(&self, query: &str, page: u32, limit: u32) -> Vec<SearchPlaylist> {
        let result = self.search_results("playlists", query, page, limit).await;
        crate::log_api_result!("search_playlists", result);
        result.map(|items| items.iter().map(map_playlist).collect()).unwrap_or_default()
    }

    async fn fetch_track_details(&self, id: &str, include_lyrics: bool) -> Option<Track> {
        let params: Vec<(&str, String)> = if include_lyrics {
            vec![("lyrics", "true".to_string())]
        } else {
            Vec::new()
        };
        let result = self.get_detail("songs", id, &params).await;
        crate::log_api_result!("fetch_track_details", result);
        result.ok().and_then(|body| array_at(&body["data"]).first().map(map_track))
    }

    async fn fetch_songs_by_ids(&self, ids: &[String]) -> Vec<Track> {
        if ids.is_empty() {
            return Vec::new();
        }
        let result = self.get_json("/songs", &[("ids", ids.join(","))]).await;
        crate::log_api_result!("fetch_songs_by_ids", result);
        result
            .map(|body| array_at(&body["data"]).iter().map(map_track).collect())
            .unwrap_or_default()
    }

    async fn fetch_song_suggestions(&self, id: &str, limit: u32) -> Vec<Track> {
        let result = self
            .get_json(&format!("/songs/{id}/suggestions"), &[("limit", limit.to_string())])
            .await;
        crate::log_api_result!("fetch_song_suggestions", result);
        result
            .map(|body| array_at(&body["data"]).iter().map(map_track).collect())
            .unwrap_or_default()
    }

    async fn fetch_album_details(&self, id: &str) -> Option<AlbumDetail> {
        let result = self.get_detail("albums", id, &[]).await;
        crate::log_api_result!("fetch_album_details", result);
        let body = result.ok()?;
        let data = body.get("data").filter(|d| d.is_object())?;
        Some(AlbumDetail {
            album: map_album(data),
            tracks: array_at(&data["songs"]).iter().map(map_track).collect(),
        })
    }

    async fn fetch_playlist_details(
        &self,
        id: &str,
        page: u32,
        limit: u32,
    ) -> Option<PlaylistDetail> {
        let params = [("page", page.to_string()), ("limit", limit.to_string())];
        let result = self.get_detail("playlists", id, &params).await;
        crate::log_api_result!("fetch_playlist_details", result);
        let body = result.ok()?;
        let data = body.get("data").filter(|d| d.is_object())?;
        Some(PlaylistDetail {
            playlist: map_playlist(data),
            tracks: array_at(&data["songs"]).iter().map(map_track).collect(),
        })
    }

    async fn fetch_artist_details(&self, id: &str, query: &ArtistQuery) -> Option<ArtistDetail> {
        let result = self.get_detail("artists", id, &artist_params(query)).await;
        crate::log_api_result!("fetch_artist_details", result);
        let body = result.ok()?;
        let data = body.get("data").filter(|d| d.is_object())?;
        Some(map_artist_detail(data))
    }

    async fn fetch_artist_songs(&self, id: &str, page: u32, sort: ArtistSort) -> Vec<Track> {
        let result = self
            .get_json(&format!("/artists/{id}/songs"), &sort_params(page, sort))
            .await;
        crate::log_api_result!("fetch_artist_songs", result);
        result
            .map(|body| listed(&body["data"], "songs").iter().map(map_track).collect())
            .unwrap_or_default()
    }

    async fn fetch_artist_albums(
        &self,
        id: &str,
        page: u32,
        sort: ArtistSort,
    ) -> Vec<SearchAlbum> {
        let result = self
            .get_json(&format!("/artists/{id}/albums"), &sort_params(page, sort))
            .await;
        crate::log_api_result!("fetch_artist_albums", result);
        result
            .map(|body| listed(&body["data"], "albums").iter().map(map_album).collect())
            .unwrap_or_default()
    }

    async fn fetch_track_by_link(&self, link: &str) -> Option<Track> {
        let result = self.get_json("/songs", &[("link", link.to_string())]).await;
        crate::log_api_result!("fetch_track_by_link", result);
        result.ok().and_then(|body| array_at(&body["data"]).first().map(map_track))
    }

    async fn fetch_album_by_link(&self, link: &str) -> Option<AlbumDetail> {
        let result = self.get_json("/albums", &[("link", link.to_string())]).await;
        crate::log_api_result!("fetch_album_by_link", result);
        let body = result.ok()?;
        let data = body.get("data").filter(|d| d.is_object())?;
        Some(AlbumDetail {
            album: map_album(data),
            tracks: array_at(&data["songs"]).iter().map(map_track).collect(),
        })
    }

    async fn fetch_playlist_by_link(
        &self,
        link: &str,
        page: u32,
        limit: u32,
    ) -> Option<PlaylistDetail> {
        let params = [
            ("link", link.to_string()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ];
        let result = self.get_json("/playlists", &params).await;
        crate::log_api_result!("fetch_playlist_by_link", result);
        let body = result.ok()?;
        let data = body.get("data").filter(|d| d.is_object())?;
        Some(PlaylistDetail {
            playlist: map_playlist(data),
            tracks: array_at(&data["songs"]).iter().map(map_track).collect(),
        })
    }

    async fn fetch_artist_by_link(&self, link: &str, query: &ArtistQuery) -> Option<ArtistDetail> {
        let mut params = vec![("link", link.to_string())];
        params.extend(artist_params(query));
        let result = self.get_json("/artists", &params).await;
        crate::log_api_result!("fetch_artist_by_link", result);
        let body = result.ok()?;
        let data = body.get("data").filter(|d| d.is_object())?;
        Some(map_artist_detail(data))
    }
}

/// Only an explicit `"success": true` counts; anything else gets the
/// query-style retry.
fn reports_success(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool) == Some(true)
}

fn sort_params(page: u32, sort: ArtistSort) -> Vec<(&'static str, String)> {
    vec![
        ("page", page.to_string()),
        ("sortBy", sort.by.as_str().to_string()),
        ("sortOrder", sort.order.as_str().to_string()),
    ]
}

fn artist_params(query: &ArtistQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(page) = query.page {
        params.push(("page", page.to_string()));
    }
    if let Some(count) = query.song_count {
        params.push(("songCount", count.to_string()));
    }
    if let Some(count) = query.album_count {
        params.push(("albumCount", count.to_string()));
    }
    if let Some(sort) = query.sort {
        params.push(("sortBy", sort.by.as_str().to_string()));
        params.push(("sortOrder", sort.order.as_str().to_string()));
    }
    params
}

// Artist listings put items under their own key on some deployments and under
// `results` on others.
fn listed(data: &Value, key: &str) -> Vec<Value> {
    let items = array_at(&data[key]);
    if items.is_empty() {
        array_at(&data["results"])
    } else {
        items
    }
}

fn array_at(value: &Value) -> Vec<Value> {
    value.as_array().cloned().unwrap_or_default()
}

fn str_at<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

// Counts and durations arrive as numbers or as numeric strings.
fn number_at(value: &Value, key: &str) -> u64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

// Quality lists are ordered lowest first; prefer the given slots, then any.
fn pick_quality(value: &Value, preferred: &[usize]) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => preferred
            .iter()
            .filter_map(|idx| items.get(*idx))
            .chain(items.iter().rev())
            .find_map(|item| str_at(item, &["url", "link"]))
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

fn image_of(value: &Value) -> String {
    pick_quality(&value["image"], &[2, 1])
}

fn primary_artists(value: &Value) -> Option<String> {
    let names: Vec<&str> = value["artists"]["primary"]
        .as_array()?
        .iter()
        .filter_map(|a| a["name"].as_str())
        .collect();
    (!names.is_empty()).then(|| names.join(", "))
}

fn map_track(song: &Value) -> Track {
    let artist = primary_artists(song)
        .or_else(|| str_at(song, &["primaryArtists", "artist", "singers"]).map(str::to_string))
        .unwrap_or_else(|| "Unknown Artist".to_string());

    Track {
        id: str_at(song, &["id"]).unwrap_or_default().to_string(),
        title: str_at(song, &["name", "title"])
            .unwrap_or("Unknown Title")
            .to_string(),
        artist,
        image_url: image_of(song),
        audio_url: pick_quality(&song["downloadUrl"], &[4, 3]),
        local_uri: None,
        duration_secs: u32::try_from(number_at(song, "duration")).unwrap_or(0),
        lyrics: song["lyrics"]["lyrics"].as_str().map(str::to_string),
    }
}

fn map_album(album: &Value) -> SearchAlbum {
    SearchAlbum {
        id: str_at(album, &["id"]).unwrap_or_default().to_string(),
        name: str_at(album, &["name", "title"]).unwrap_or_default().to_string(),
        artist: primary_artists(album)
            .or_else(|| str_at(album, &["artist", "primaryArtists"]).map(str::to_string))
            .unwrap_or_else(|| "Unknown Artist".to_string()),
        image_url: image_of(album),
        year: match album.get("year") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        },
        song_count: u32::try_from(number_at(album, "songCount")).unwrap_or(0),
    }
}

fn map_artist(artist: &Value) -> SearchArtist {
    SearchArtist {
        id: str_at(artist, &["id"]).unwrap_or_default().to_string(),
        name: str_at(artist, &["name", "title"]).unwrap_or_default().to_string(),
        image_url: image_of(artist),
        role: str_at(artist, &["role"]).unwrap_or_default().to_string(),
    }
}

fn map_playlist(playlist: &Value) -> SearchPlaylist {
    SearchPlaylist {
        id: str_at(playlist, &["id"]).unwrap_or_default().to_string(),
        name: str_at(playlist, &["name", "title"]).unwrap_or_default().to_string(),
        image_url: image_of(playlist),
        song_count: u32::try_from(number_at(playlist, "songCount")).unwrap_or(0),
        language: str_at(playlist, &["language"]).unwrap_or_default().to_string(),
    }
}

fn map_artist_detail(artist: &Value) -> ArtistDetail {
    ArtistDetail {
        artist: map_artist(artist),
        bio: artist["bio"][0]["text"].as_str().map(str::to_string),
        follower_count: number_at(artist, "followerCount"),
        is_verified: artist["isVerified"].as_bool().unwrap_or(false),
        top_songs: array_at(&artist["topSongs"]).iter().map(map_track).collect(),
        top_albums: array_at(&artist["topAlbums"]).iter().map(map_album).collect(),
        singles: array_at(&artist["singles"]).iter().map(map_track).collect(),
    }
}
