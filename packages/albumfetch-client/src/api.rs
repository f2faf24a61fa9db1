//! API-based client variant
//!
//! Fetches JSON payloads from `<base>/albums/<id>` and `<base>/photos/<id>`.
//! Album payload: `{"id", "title", "photos": [..], ..extras}`. Photo payload:
//! `{"id", "title", "album_id", "images": [{"id", "src", "scramble"?}, ..]}`.

use crate::{Client, ClientContext, ClientFactory};
use albumfetch_base::{
    AlbumDetail, AlbumInfo, EngineError, ErrorKind, ImageInfo, PhotoDetail, PhotoInfo, Result,
    Scope,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

pub struct ApiClient {
    ctx: ClientContext,
}

impl ApiClient {
    pub fn new(ctx: ClientContext) -> Self {
        Self { ctx }
    }

    fn album_locator(&self, id: &str) -> String {
        format!("{}/albums/{}", self.ctx.base_locator, id)
    }

    fn photo_locator(&self, id: &str) -> String {
        format!("{}/photos/{}", self.ctx.base_locator, id)
    }
}

/// Rewrite a transport-level miss so the error names the entity, not the
/// locator, and carries the right scope.
fn attribute(err: EngineError, entity: &str, id: &str, scope: Scope) -> EngineError {
    if err.kind == ErrorKind::NotFound {
        EngineError::not_found(format!("{} {} not found: {}", entity, id, err.message))
            .with_scope(scope)
    } else {
        err.with_scope(scope)
    }
}

#[async_trait]
impl Client for ApiClient {
    fn name(&self) -> &str {
        crate::API_IMPL
    }

    async fn fetch_album(&self, id: &str) -> Result<Arc<dyn AlbumDetail>> {
        let locator = self.album_locator(id);
        let body = self
            .ctx
            .transport
            .get(&locator)
            .await
            .map_err(|e| attribute(e, "album", id, Scope::Album(id.to_string())))?;
        let info: AlbumInfo = serde_json::from_slice(&body).map_err(|e| {
            EngineError::transport(format!("malformed album payload for {}: {}", id, e))
                .with_scope(Scope::Album(id.to_string()))
        })?;
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
        let mut info: PhotoInfo = serde_json::from_slice(&body).map_err(|e| {
            EngineError::transport(format!("malformed photo payload for {}: {}", id, e))
                .with_scope(Scope::Photo(id.to_string()))
        })?;
        for (index, image) in info.images.iter_mut().enumerate() {
            image.index = index;
        }
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

pub fn api_client_factory() -> ClientFactory {
    Arc::new(|ctx| Box::new(ApiClient::new(ctx)))
}
