//! Extension-point registry
//!
//! One mutable table of currently-active implementations for every seam of
//! the engine: executor callbacks (`downloader-class`), options loading
//! (`option-class`), the open client-implementation map, the three entity
//! factories (`album-class`/`photo-class`/`image-class`), the error adapter
//! (`exception-class`) and the diagnostic sink (`debug-sink-function`).
//!
//! `set` replaces unconditionally; builders re-read current state at
//! construction time, never a cached snapshot from before the last `set`.
//! Substitute before a run starts: mutating while a run is active is
//! caller responsibility and not synchronized beyond the slot table lock.
//! Prefer a per-test `ExtensionRegistry::new()` over the process-wide
//! `global()` when isolation matters.

use albumfetch_base::{
    default_adapter, tracing_sink, AlbumFactory, BoxedError, DebugSink, EngineError,
    EntityFactories, ErrorAdapter, ImageFactory, PhotoFactory, Result,
};
use albumfetch_client::{
    api_client_factory, html_client_factory, Client, ClientContext, ClientFactory, HttpTransport,
    Transport, API_IMPL, HTML_IMPL,
};
use albumfetch_config::Options;
use albumfetch_downloader::{DownloadCallback, Downloader, NoopCallback, Storage};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// Constructor for the callback set riding along with a run
/// (the `downloader-class` extension point).
pub type CallbackFactory = Arc<dyn Fn() -> Arc<dyn DownloadCallback> + Send + Sync>;

/// Constructor for options from raw configuration
/// (the `option-class` extension point).
pub type OptionsLoader = Arc<dyn Fn(&serde_json::Value) -> Result<Options> + Send + Sync>;

struct Slots {
    downloader: CallbackFactory,
    options_loader: OptionsLoader,
    client_impls: HashMap<String, ClientFactory>,
    album: AlbumFactory,
    photo: PhotoFactory,
    image: ImageFactory,
    adapter: ErrorAdapter,
    sink: DebugSink,
}

impl Default for Slots {
    fn default() -> Self {
        let factories = EntityFactories::defaults();
        let mut client_impls: HashMap<String, ClientFactory> = HashMap::new();
        client_impls.insert(HTML_IMPL.to_string(), html_client_factory());
        client_impls.insert(API_IMPL.to_string(), api_client_factory());
        Self {
            downloader: Arc::new(|| Arc::new(NoopCallback)),
            options_loader: Arc::new(|value| {
                serde_json::from_value(value.clone())
                    .map_err(|e| EngineError::configuration(format!("malformed options: {}", e)))
            }),
            client_impls,
            album: factories.album,
            photo: factories.photo,
            image: factories.image,
            adapter: default_adapter(),
            sink: tracing_sink(),
        }
    }
}

pub struct ExtensionRegistry {
    slots: RwLock<Slots>,
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionRegistry {
    /// A registry pre-seeded with every built-in default.
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Slots::default()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static ExtensionRegistry {
        static REGISTRY: OnceLock<ExtensionRegistry> = OnceLock::new();
        REGISTRY.get_or_init(ExtensionRegistry::new)
    }

    // downloader-class

    pub fn set_downloader(&self, factory: CallbackFactory) {
        self.slots.write().unwrap().downloader = factory;
    }

    pub fn downloader(&self) -> CallbackFactory {
        self.slots.read().unwrap().downloader.clone()
    }

    // option-class

    pub fn set_options_loader(&self, loader: OptionsLoader) {
        self.slots.write().unwrap().options_loader = loader;
    }

    pub fn load_options(&self, value: &serde_json::Value) -> Result<Options> {
        let loader = self.slots.read().unwrap().options_loader.clone();
        loader(value)
    }

    // client-implementation map (open key space)

    pub fn register_client_impl(&self, name: impl Into<String>, factory: ClientFactory) {
        self.slots
            .write()
            .unwrap()
            .client_impls
            .insert(name.into(), factory);
    }

    pub fn client_impl(&self, name: &str) -> Option<ClientFactory> {
        self.slots.read().unwrap().client_impls.get(name).cloned()
    }

    // album-class / photo-class / image-class

    pub fn set_album_factory(&self, factory: AlbumFactory) {
        self.slots.write().unwrap().album = factory;
    }

    pub fn set_photo_factory(&self, factory: PhotoFactory) {
        self.slots.write().unwrap().photo = factory;
    }

    pub fn set_image_factory(&self, factory: ImageFactory) {
        self.slots.write().unwrap().image = factory;
    }

    /// Snapshot of the entity factories active right now.
    pub fn entity_factories(&self) -> EntityFactories {
        let slots = self.slots.read().unwrap();
        EntityFactories {
            album: slots.album.clone(),
            photo: slots.photo.clone(),
            image: slots.image.clone(),
        }
    }

    // exception-class

    pub fn set_error_adapter(&self, adapter: ErrorAdapter) {
        self.slots.write().unwrap().adapter = adapter;
    }

    /// Translate an engine error into the currently-registered external
    /// representation. Every public boundary goes through this.
    pub fn adapt(&self, err: EngineError) -> BoxedError {
        let adapter = self.slots.read().unwrap().adapter.clone();
        adapter(err)
    }

    // debug-sink-function

    pub fn set_debug_sink(&self, sink: DebugSink) {
        self.slots.write().unwrap().sink = sink;
    }

    pub fn debug_sink(&self) -> DebugSink {
        self.slots.read().unwrap().sink.clone()
    }

    pub fn emit(&self, topic: &str, msg: &str) {
        (self.debug_sink())(topic, msg);
    }

    /// Build the client named by `options.client_impl` against the default
    /// HTTP transport.
    pub fn build_client(&self, options: &Options) -> Result<Box<dyn Client>> {
        self.build_client_with(options, Arc::new(HttpTransport::new()))
    }

    /// Build the client named by `options.client_impl` against a supplied
    /// transport. Factories and entity classes are resolved from the registry
    /// at this moment, not earlier.
    pub fn build_client_with(
        &self,
        options: &Options,
        transport: Arc<dyn Transport>,
    ) -> Result<Box<dyn Client>> {
        let factory = self.client_impl(&options.client_impl).ok_or_else(|| {
            EngineError::configuration(format!(
                "client.impl `{}` is not registered",
                options.client_impl
            ))
        })?;
        Ok(factory(ClientContext {
            factories: self.entity_factories(),
            transport,
            base_locator: options.base_locator.clone(),
            extras: options.client_extras.clone(),
        }))
    }

    /// Assemble a download executor from the currently-registered callback
    /// set, sink and the given collaborators.
    pub fn build_downloader(
        &self,
        options: &Options,
        client: Arc<dyn Client>,
        storage: Arc<dyn Storage>,
    ) -> Downloader {
        let callback = (self.downloader())();
        Downloader::new(client, storage, callback, self.debug_sink(), options.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use albumfetch_base::{
        Album, AlbumDetail, AlbumInfo, ErrorKind, ImageInfo, PhotoDetail, Result as EngineResult,
    };
    use albumfetch_client::MemoryTransport;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    struct MyClient;

    #[async_trait]
    impl Client for MyClient {
        fn name(&self) -> &str {
            "my-client"
        }

        async fn fetch_album(&self, id: &str) -> EngineResult<Arc<dyn AlbumDetail>> {
            Ok(Arc::new(Album(AlbumInfo {
                id: id.to_string(),
                ..Default::default()
            })))
        }

        async fn fetch_photo(&self, id: &str) -> EngineResult<Arc<dyn PhotoDetail>> {
            Err(EngineError::not_found(format!("photo {} not found", id)))
        }

        async fn fetch_image_data(&self, _image: &ImageInfo) -> EngineResult<Bytes> {
            Ok(Bytes::new())
        }
    }

    #[test]
    fn test_builtin_defaults_are_seeded() {
        let registry = ExtensionRegistry::new();
        assert!(registry.client_impl("html").is_some());
        assert!(registry.client_impl("api").is_some());
        assert!(registry.client_impl("my-client").is_none());
    }

    #[test]
    fn test_client_map_round_trip_with_custom_key() {
        let registry = ExtensionRegistry::new();
        registry.register_client_impl("my-client", Arc::new(|_| Box::new(MyClient)));

        let options = Options::new().with_client_impl("my-client");
        let client = registry
            .build_client_with(&options, Arc::new(MemoryTransport::new()))
            .unwrap();
        assert_eq!(client.name(), "my-client");
    }

    #[test]
    fn test_last_writer_wins_for_client_key() {
        let registry = ExtensionRegistry::new();
        registry.register_client_impl("api", Arc::new(|_| Box::new(MyClient)));

        let options = Options::new().with_client_impl("api");
        let client = registry
            .build_client_with(&options, Arc::new(MemoryTransport::new()))
            .unwrap();
        assert_eq!(client.name(), "my-client");
    }

    #[test]
    fn test_unregistered_key_fails_configuration_naming_key() {
        let registry = ExtensionRegistry::new();
        let options = Options::new().with_client_impl("nope");
        let err = registry
            .build_client_with(&options, Arc::new(MemoryTransport::new()))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.contains("nope"));
    }

    #[test]
    fn test_entity_factory_resolved_at_construction_time() {
        struct MyAlbum(AlbumInfo);

        impl AlbumDetail for MyAlbum {
            fn info(&self) -> &AlbumInfo {
                &self.0
            }

            fn attr(&self, name: &str) -> Option<String> {
                (name == "custom").then(|| format!("custom_{}", self.title()))
            }
        }

        let registry = ExtensionRegistry::new();
        let before = registry.entity_factories();
        registry.set_album_factory(Arc::new(|info| Arc::new(MyAlbum(info))));
        let after = registry.entity_factories();

        let info = AlbumInfo {
            id: "1".into(),
            title: "T".into(),
            ..Default::default()
        };
        // The earlier snapshot keeps the default class; the fresh one sees
        // the substitution.
        assert_eq!((before.album)(info.clone()).attr("custom"), None);
        assert_eq!(
            (after.album)(info).attr("custom").as_deref(),
            Some("custom_T")
        );
    }

    #[test]
    fn test_error_adapter_substitution() {
        #[derive(Debug)]
        struct MyError(String);

        impl std::fmt::Display for MyError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::error::Error for MyError {}

        let registry = ExtensionRegistry::new();
        let default_boxed = registry.adapt(EngineError::not_found("album 999999 not found"));
        assert!(default_boxed.downcast_ref::<EngineError>().is_some());

        registry.set_error_adapter(Arc::new(|err| Box::new(MyError(err.to_string()))));
        let boxed = registry.adapt(EngineError::not_found("album 999999 not found"));
        assert!(boxed.downcast_ref::<MyError>().is_some());
        assert!(boxed.to_string().contains("999999"));
    }

    #[test]
    fn test_debug_sink_substitution_takes_effect_immediately() {
        let registry = ExtensionRegistry::new();
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_in = seen.clone();
        registry.set_debug_sink(Arc::new(move |topic, msg| {
            seen_in.lock().unwrap().push(format!("{}|{}", topic, msg));
        }));

        registry.emit("plugin.error", "boom");
        assert_eq!(seen.lock().unwrap().as_slice(), ["plugin.error|boom"]);
    }

    #[test]
    fn test_options_loader_round_trip_and_substitution() {
        let registry = ExtensionRegistry::new();
        let options = registry
            .load_options(&serde_json::json!({"client_impl": "html", "workers": 2}))
            .unwrap();
        assert_eq!(options.client_impl, "html");
        assert_eq!(options.workers, 2);

        let err = registry
            .load_options(&serde_json::json!({"workers": "not a number"}))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);

        // A substituted loader can post-process whatever it parses.
        registry.set_options_loader(Arc::new(|value| {
            let mut options: Options = serde_json::from_value(value.clone())
                .map_err(|e| EngineError::configuration(e.to_string()))?;
            options.client_impl = "html".to_string();
            Ok(options)
        }));
        let forced = registry
            .load_options(&serde_json::json!({"client_impl": "api"}))
            .unwrap();
        assert_eq!(forced.client_impl, "html");
    }

    #[test]
    fn test_downloader_slot_round_trip() {
        let registry = ExtensionRegistry::new();
        struct Marker;

        #[async_trait]
        impl DownloadCallback for Marker {}

        let factory: CallbackFactory = Arc::new(|| Arc::new(Marker));
        registry.set_downloader(factory);
        // Resolving twice yields independent instances from the current slot.
        let a = (registry.downloader())();
        let b = (registry.downloader())();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_global_registry_is_one_instance() {
        let a = ExtensionRegistry::global() as *const _;
        let b = ExtensionRegistry::global() as *const _;
        assert_eq!(a, b);
    }
}
