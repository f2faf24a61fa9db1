//! Lifecycle callbacks
//!
//! A substituted executor implements any subset of these methods and inherits
//! the base traversal; the engine guarantees call order and exactly-once
//! semantics per entity.

use crate::report::ImageOutcome;
use albumfetch_base::{AlbumDetail, ImageInfo, PhotoDetail};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait DownloadCallback: Send + Sync {
    async fn before_album(&self, _album: &Arc<dyn AlbumDetail>) {}

    async fn after_album(&self, _album: &Arc<dyn AlbumDetail>) {}

    async fn before_photo(&self, _photo: &Arc<dyn PhotoDetail>) {}

    /// Fires after every image task of the photo reached a terminal state.
    async fn after_photo(&self, _photo: &Arc<dyn PhotoDetail>) {}

    async fn before_image(&self, _image: &ImageInfo) {}

    async fn after_image(&self, _image: &ImageInfo, _outcome: &ImageOutcome) {}
}

/// Default executor callbacks: all no-ops.
pub struct NoopCallback;

#[async_trait]
impl DownloadCallback for NoopCallback {}
