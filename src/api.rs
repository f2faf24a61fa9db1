//! High-level entry points
//!
//! Thin wrappers that wire registry, options and collaborators together and
//! translate every failure through the currently-registered error adapter, so
//! callers only ever observe the substituted error type.

use crate::{
    topic, AlbumDetail, BoxedError, Client, DownloadReport, ExtensionRegistry, Options,
    PhotoDetail, Storage, Transport,
};
use std::sync::Arc;

/// Build the registered client, reporting a failed construction under the
/// `plugin.error` topic before adapting it.
fn build_client(
    registry: &ExtensionRegistry,
    options: &Options,
    transport: Arc<dyn Transport>,
) -> Result<Box<dyn Client>, BoxedError> {
    registry.build_client_with(options, transport).map_err(|e| {
        registry.emit(topic::PLUGIN_ERROR, &format!("client construction failed: {}", e));
        registry.adapt(e)
    })
}

/// Download a whole album: resolve the hierarchy through the registered
/// client implementation and save every image through `storage`.
pub async fn download_album(
    registry: &ExtensionRegistry,
    options: &Options,
    transport: Arc<dyn Transport>,
    storage: Arc<dyn Storage>,
    album_id: &str,
) -> Result<DownloadReport, BoxedError> {
    let client = build_client(registry, options, transport)?;
    let downloader = registry.build_downloader(options, Arc::from(client), storage);
    downloader.run(album_id).await.map_err(|e| registry.adapt(e))
}

/// Resolve a single album through the registered client implementation.
pub async fn fetch_album(
    registry: &ExtensionRegistry,
    options: &Options,
    transport: Arc<dyn Transport>,
    album_id: &str,
) -> Result<Arc<dyn AlbumDetail>, BoxedError> {
    let client = build_client(registry, options, transport)?;
    client
        .fetch_album(album_id)
        .await
        .map_err(|e| registry.adapt(e))
}

/// Resolve a single photo through the registered client implementation.
pub async fn fetch_photo(
    registry: &ExtensionRegistry,
    options: &Options,
    transport: Arc<dyn Transport>,
    photo_id: &str,
) -> Result<Arc<dyn PhotoDetail>, BoxedError> {
    let client = build_client(registry, options, transport)?;
    client
        .fetch_photo(photo_id)
        .await
        .map_err(|e| registry.adapt(e))
}
