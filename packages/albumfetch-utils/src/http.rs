use bytes::{Bytes, BytesMut};
use http_body_util::{BodyExt, Empty};
use hyper::{StatusCode, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use once_cell::sync::Lazy;
use rustls::ClientConfig;
use rustls_platform_verifier::BuilderVerifierExt;
use std::{collections::HashMap, fmt};

#[derive(Debug)]
pub struct ResponseData {
    pub status: u16,
    pub body: Option<Bytes>,
}

impl fmt::Display for ResponseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Response status: {}, body: {}",
            self.status,
            self.body.as_ref().map_or_else(
                || "".to_string(),
                |body| String::from_utf8_lossy(body).to_string(),
            )
        )
    }
}

static PROVIDER: Lazy<std::sync::Arc<rustls::crypto::CryptoProvider>> =
    Lazy::new(|| std::sync::Arc::new(rustls::crypto::ring::default_provider()));

struct TlsConfigError {
    error: Box<dyn std::error::Error + Send + Sync>,
}

impl fmt::Display for TlsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TlsConfigError: {}", self.error)
    }
}

impl fmt::Debug for TlsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TlsConfigError: {:?}", self.error)
    }
}

impl std::error::Error for TlsConfigError {}

fn connector() -> Result<hyper_rustls::HttpsConnector<HttpConnector>, TlsConfigError> {
    let provider = PROVIDER.clone();
    let tls: ClientConfig = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| TlsConfigError { error: Box::new(e) })?
        .with_platform_verifier()
        .map_err(|e| TlsConfigError { error: Box::new(e) })?
        .with_no_client_auth();
    Ok(hyper_rustls::HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build())
}

/// GET a locator, returning status and full body. One connector handles both
/// `http` and `https` schemes.
pub async fn get(
    url: Uri,
    header_map: &HashMap<String, String>,
) -> Result<ResponseData, Box<dyn std::error::Error + Send + Sync>> {
    request(url, header_map, false).await
}

/// HEAD a locator, returning status only.
pub async fn head(
    url: Uri,
    header_map: &HashMap<String, String>,
) -> Result<ResponseData, Box<dyn std::error::Error + Send + Sync>> {
    request(url, header_map, true).await
}

async fn request(
    url: Uri,
    header_map: &HashMap<String, String>,
    only_status: bool,
) -> Result<ResponseData, Box<dyn std::error::Error + Send + Sync>> {
    let https = connector()?;
    let client = Client::builder(TokioExecutor::new()).build(https);

    let method = if only_status { "HEAD" } else { "GET" };
    let mut req = hyper::Request::builder().method(method).uri(url.clone());
    for (key, value) in header_map {
        req = req.header(key, value);
    }
    let req = req.body(Empty::<Bytes>::new())?;

    let mut res = client.request(req).await?;
    let status = res.status();
    if only_status {
        return Ok(ResponseData {
            status: status.as_u16(),
            body: None,
        });
    }
    let mut body = BytesMut::new();
    while let Some(next) = res.frame().await {
        let frame = next?;
        if let Some(chunk) = frame.data_ref() {
            body.extend_from_slice(chunk);
        }
    }
    Ok(ResponseData {
        status: status.as_u16(),
        body: Some(body.freeze()),
    })
}

pub fn http_status_is_ok(status: u16) -> bool {
    if let Ok(status) = StatusCode::from_u16(status) {
        !(status.is_client_error() || status.is_server_error())
    } else {
        false
    }
}
