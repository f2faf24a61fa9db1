//! albumfetch: pluggable download orchestration for hierarchical remote
//! content (albums containing photos containing images).
//!
//! Every seam is substitutable through [`ExtensionRegistry`]: the client used
//! to resolve the hierarchy, the entity types flowing through the run, the
//! executor's lifecycle callbacks, the raised error representation and the
//! diagnostic sink. See the `api` module for the high-level entry points.

pub mod api;

pub use albumfetch_base::{
    silent_sink, topic, tracing_sink, Album, AlbumDetail, AlbumInfo, BoxedError, DebugSink,
    EngineError, EntityFactories, ErrorAdapter, ErrorKind, Image, ImageDetail, ImageInfo, Photo,
    PhotoDetail, PhotoInfo, Scope,
};
pub use albumfetch_client::{
    api_client_factory, html_client_factory, ApiClient, Client, ClientContext, ClientFactory,
    HtmlClient, HttpTransport, MemoryTransport, Transport, API_IMPL, HTML_IMPL,
};
pub use albumfetch_config::{DirRule, FailPolicy, Options};
pub use albumfetch_downloader::{
    DownloadCallback, DownloadReport, Downloader, FsStorage, ImageOutcome, ImageState,
    MemoryStorage, NoopCallback, Storage,
};
pub use albumfetch_registry::{CallbackFactory, ExtensionRegistry, OptionsLoader};
