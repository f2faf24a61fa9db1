//! Client abstraction: the swappable remote-access seam
//!
//! A `Client` resolves albums, photos and image payloads by id. Concrete
//! variants are registered by name in the extension registry's
//! client-implementation map (`"html"` and `"api"` ship as built-ins; the key
//! space is open) and are constructed through a `ClientFactory` with a
//! context snapshotted from the registry at construction time.

pub mod api;
pub mod html;
pub mod transport;

use std::collections::BTreeMap;
use std::sync::Arc;

use albumfetch_base::{
    AlbumDetail, EntityFactories, ImageInfo, PhotoDetail, Result,
};
use async_trait::async_trait;
use bytes::Bytes;

pub use api::{api_client_factory, ApiClient};
pub use html::{html_client_factory, HtmlClient};
pub use transport::{HttpTransport, MemoryTransport, Transport};

/// Built-in client-implementation keys.
pub const HTML_IMPL: &str = "html";
pub const API_IMPL: &str = "api";

/// Everything a client factory needs, resolved at construction time.
#[derive(Clone)]
pub struct ClientContext {
    /// Entity factories active in the registry when the client was built.
    pub factories: EntityFactories,
    pub transport: Arc<dyn Transport>,
    /// Base locator the client derives entity locators from.
    pub base_locator: String,
    /// Implementation-specific options (free-form, from the options object).
    pub extras: BTreeMap<String, String>,
}

/// Polymorphic remote-access interface.
#[async_trait]
pub trait Client: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_album(&self, id: &str) -> Result<Arc<dyn AlbumDetail>>;

    async fn fetch_photo(&self, id: &str) -> Result<Arc<dyn PhotoDetail>>;

    async fn fetch_image_data(&self, image: &ImageInfo) -> Result<Bytes>;
}

impl std::fmt::Debug for dyn Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Client").field(&self.name()).finish()
    }
}

/// Constructor stored in the registry's client-implementation map.
pub type ClientFactory = Arc<dyn Fn(ClientContext) -> Box<dyn Client> + Send + Sync>;
