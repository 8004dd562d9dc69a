//! Playback session control for a streaming music player.
//!
//! [`Player`] sequences loads on an [`audio::AudioEngine`], keeps the queue
//! and publishes [`model::PlaybackState`] through a watch channel. Catalog
//! lookups and persistence are pluggable through the traits in [`model`].

pub mod audio;
pub mod config;
pub mod controller;
pub mod logging;
pub mod model;

pub use controller::Player;
