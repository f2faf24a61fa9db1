//! HTML-scraping client variant
//!
//! Fetches `<base>/album/<id>.html` and `<base>/photo/<id>.html` and extracts
//! the hierarchy with regexes over a generic page shape: an `h1` carrying the
//! title, `data-photo-id`/`data-album-id` attributes for the id lists, and
//! `img` tags with `data-image-id`, `src` and optional `data-scramble`.

use crate::{Client, ClientContext, ClientFactory};
use albumfetch_base::{
    AlbumDetail, AlbumInfo, EngineError, ErrorKind, ImageInfo, PhotoDetail, PhotoInfo, Result,
    Scope,
};
use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static ALBUM_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<h1[^>]*class="album-title"[^>]*>([^<]*)</h1>"#).unwrap());
static PHOTO_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<h1[^>]*class="photo-title"[^>]*>([^<]*)</h1>"#).unwrap());
static PHOTO_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r#"data-photo-id="([^"]+)""#).unwrap());
static ALBUM_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r#"data-album-id="([^"]+)""#).unwrap());
static IMG_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<img[^>]*>").unwrap());
static IMAGE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r#"data-image-id="([^"]+)""#).unwrap());
static IMAGE_SRC: Lazy<Regex> = Lazy::new(|| Regex::new(r#"src="([^"]+)""#).unwrap());
static IMAGE_SCRAMBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"data-scramble="([^"]+)""#).unwrap());

pub struct HtmlClient {
    ctx: ClientContext,
}

impl HtmlClient {
    pub fn new(ctx: ClientContext) -> Self {
        Self { ctx }
    }

    fn album_locator(&self, id: &str) -> String {
        format!("{}/album/{}.html", self.ctx.base_locator, id)
    }

    fn photo_locator(&self, id: &str) -> String {
        format!("{}/photo/{}.html", self.ctx.base_locator, id)
    }

    fn parse_album(&self, id: &str, page: &str) -> Result<AlbumInfo> {
        let title = ALBUM_TITLE
            .captures(page)
            .map(|c| c[1].trim().to_string())
            .ok_or_else(|| {
                EngineError::transport(format!("album page for {} has no album-title", id))
                    .with_scope(Scope::Album(id.to_string()))
            })?;
        let photo_ids = PHOTO_ID
            .captures_iter(page)
            .map(|c| c[1].to_string())
            .collect();
        Ok(AlbumInfo {
            id: id.to_string(),
            title,
            photo_ids,
            ..Default::default()
        })
    }

    fn parse_photo(&self, id: &str, page: &str) -> Result<PhotoInfo> {
        let title = PHOTO_TITLE
            .captures(page)
            .map(|c| c[1].trim().to_string())
            .ok_or_else(|| {
                EngineError::transport(format!("photo page for {} has no photo-title", id))
                    .with_scope(Scope::Photo(id.to_string()))
            })?;
        let album_id = ALBUM_ID.captures(page).map(|c| c[1].to_string());
        let mut images = Vec::new();
        for tag in IMG_TAG.find_iter(page) {
            let tag = tag.as_str();
            let image_id = match IMAGE_ID.captures(tag) {
                Some(c) => c[1].to_string(),
                None => continue,
            };
            let src = IMAGE_SRC.captures(tag).map(|c| c[1].to_string()).ok_or_else(|| {
                EngineError::transport(format!("image {} on photo {} has no src", image_id, id))
                    .with_scope(Scope::Photo(id.to_string()))
            })?;
            images.push(ImageInfo {
                id: image_id,
                index: images.len(),
                src,
                scramble: IMAGE_SCRAMBLE.captures(tag).map(|c| c[1].to_string()),
                ..Default::default()
            });
        }
        Ok(PhotoInfo {
            id: id.to_string(),
            title,
            album_id,
            images,
            ..Default::default()
        })
    }
}

fn attribute(err: EngineError, entity: &str, id: &str, scope: Scope) -> EngineError {
    if err.kind == ErrorKind::NotFound {
        EngineError::not_found(format!("{} {} not found: {}", entity, id, err.message))
            .with_scope(scope)
    } else {
        err.with_scope(scope)
    }
}

#[async_trait]
impl Client for HtmlClient {
    fn name(&self) -> &str {
        crate::HTML_IMPL
    }

    async fn fetch_album(&self, id: &str) -> Result<Arc<dyn AlbumDetail>> {
        let locator = self.album_locator(id);
        let body = self
            .ctx
            .transport
            .get(&locator)
            .await
            .map_err(|e| attribute(e, "album", id, Scope::Album(id.to_string())))?;
        let info = self.parse_album(id, &String::from_utf8_lossy(&body))?;
        Ok((self.ctx.factories.album)(info))
    }

    async fn fetch_photo(&self, id: &str) -> Result<Arc<dyn PhotoDetail>> {
        let locator = self.photo_locator(id);
        let body = self
            .ctx
            .transport
            .get(&locator)
            .await
            .map_err(|e| attribute(e, "photo", id, Scope::Photo(id.to_string())))?;
        let info = self.parse_photo(id, &String::from_utf8_lossy(&body))?;
        Ok((self.ctx.factories.photo)(info))
    }

    async fn fetch_image_data(&self, image: &ImageInfo) -> Result<Bytes> {
        self.ctx.transport.get(&image.src).await.map_err(|e| {
            attribute(
                e,
                "image",
                &image.id,
                Scope::Image {
                    id: image.id.clone(),
                    index: image.index,
                },
            )
        })
    }
}

pub fn html_client_factory() -> ClientFactory {
    Arc::new(|ctx| Box::new(HtmlClient::new(ctx)))
}
