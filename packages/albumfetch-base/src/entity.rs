//! Entity model for the album → photo → image hierarchy
//!
//! The engine never names a concrete entity struct directly: everything flows
//! through the `*Detail` traits and is instantiated via the factory aliases,
//! so a substituted entity type is the one every component observes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Base data of an album (top-level collection).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Photo ids in declared order; order is significant for traversal.
    #[serde(default, rename = "photos")]
    pub photo_ids: Vec<String>,
    /// Any additional payload fields the client surfaced.
    #[serde(default, flatten)]
    pub extras: BTreeMap<String, Value>,
}

/// Base data of a photo (mid-level collection).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Owning album id, kept for path construction and lookups only.
    #[serde(default)]
    pub album_id: Option<String>,
    /// Images in declared order.
    #[serde(default)]
    pub images: Vec<ImageInfo>,
    #[serde(default, flatten)]
    pub extras: BTreeMap<String, Value>,
}

/// Base data of a single downloadable image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub id: String,
    /// Position within the owning photo; assigned when the photo resolves.
    #[serde(default)]
    pub index: usize,
    /// Remote source locator, handed to the transport as-is.
    pub src: String,
    /// Optional descramble/decode parameter carried through to consumers.
    #[serde(default)]
    pub scramble: Option<String>,
    #[serde(default, flatten)]
    pub extras: BTreeMap<String, Value>,
}

fn extra_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read surface of an album, open for extension.
///
/// Implementations may add derived attributes by overriding `attr`, but must
/// not change the meaning of `id`, `title` or the photo id list.
pub trait AlbumDetail: Send + Sync {
    fn info(&self) -> &AlbumInfo;

    fn id(&self) -> &str {
        &self.info().id
    }

    fn title(&self) -> &str {
        &self.info().title
    }

    fn photo_ids(&self) -> &[String] {
        &self.info().photo_ids
    }

    /// Resolve a named attribute, fixed fields first, then extras.
    fn attr(&self, name: &str) -> Option<String> {
        let info = self.info();
        match name {
            "id" => Some(info.id.clone()),
            "title" => Some(info.title.clone()),
            _ => info.extras.get(name).map(extra_to_string),
        }
    }
}

impl std::fmt::Debug for dyn AlbumDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AlbumDetail").field(self.info()).finish()
    }
}

/// Read surface of a photo, open for extension.
pub trait PhotoDetail: Send + Sync {
    fn info(&self) -> &PhotoInfo;

    fn id(&self) -> &str {
        &self.info().id
    }

    fn title(&self) -> &str {
        &self.info().title
    }

    fn album_id(&self) -> Option<&str> {
        self.info().album_id.as_deref()
    }

    fn images(&self) -> &[ImageInfo] {
        &self.info().images
    }

    fn attr(&self, name: &str) -> Option<String> {
        let info = self.info();
        match name {
            "id" => Some(info.id.clone()),
            "title" => Some(info.title.clone()),
            _ => info.extras.get(name).map(extra_to_string),
        }
    }
}

/// Read surface of an image, open for extension.
pub trait ImageDetail: Send + Sync {
    fn info(&self) -> &ImageInfo;

    fn id(&self) -> &str {
        &self.info().id
    }

    fn index(&self) -> usize {
        self.info().index
    }

    fn src(&self) -> &str {
        &self.info().src
    }

    fn attr(&self, name: &str) -> Option<String> {
        let info = self.info();
        match name {
            "id" => Some(info.id.clone()),
            "src" => Some(info.src.clone()),
            "index" => Some(info.index.to_string()),
            _ => info.extras.get(name).map(extra_to_string),
        }
    }
}

/// Built-in album type.
#[derive(Debug, Clone)]
pub struct Album(pub AlbumInfo);

impl AlbumDetail for Album {
    fn info(&self) -> &AlbumInfo {
        &self.0
    }
}

/// Built-in photo type.
#[derive(Debug, Clone)]
pub struct Photo(pub PhotoInfo);

impl PhotoDetail for Photo {
    fn info(&self) -> &PhotoInfo {
        &self.0
    }
}

/// Built-in image type.
#[derive(Debug, Clone)]
pub struct Image(pub ImageInfo);

impl ImageDetail for Image {
    fn info(&self) -> &ImageInfo {
        &self.0
    }
}

pub type AlbumFactory = Arc<dyn Fn(AlbumInfo) -> Arc<dyn AlbumDetail> + Send + Sync>;
pub type PhotoFactory = Arc<dyn Fn(PhotoInfo) -> Arc<dyn PhotoDetail> + Send + Sync>;
pub type ImageFactory = Arc<dyn Fn(ImageInfo) -> Arc<dyn ImageDetail> + Send + Sync>;

/// Snapshot of the entity factories active at client construction time.
#[derive(Clone)]
pub struct EntityFactories {
    pub album: AlbumFactory,
    pub photo: PhotoFactory,
    pub image: ImageFactory,
}

impl EntityFactories {
    pub fn defaults() -> Self {
        Self {
            album: Arc::new(|info| Arc::new(Album(info))),
            photo: Arc::new(|info| Arc::new(Photo(info))),
            image: Arc::new(|info| Arc::new(Image(info))),
        }
    }
}

impl Default for EntityFactories {
    fn default() -> Self {
        Self::defaults()
    }
}
