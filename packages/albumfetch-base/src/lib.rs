pub mod entity;
pub mod error;
pub mod sink;

// Re-export common types
pub use entity::{
    Album, AlbumDetail, AlbumFactory, AlbumInfo, EntityFactories, Image, ImageDetail,
    ImageFactory, ImageInfo, Photo, PhotoDetail, PhotoFactory, PhotoInfo,
};
pub use error::{default_adapter, BoxedError, EngineError, ErrorAdapter, ErrorKind, Result, Scope};
pub use sink::{silent_sink, topic, tracing_sink, DebugSink};
