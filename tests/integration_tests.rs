// Integration tests for the albumfetch workspace: each test builds its own
// ExtensionRegistry so substitutions stay isolated.

use albumfetch::api;
use albumfetch::{
    AlbumDetail, AlbumInfo, Client, DownloadCallback, EngineError, ExtensionRegistry, FailPolicy,
    ImageInfo, MemoryStorage, MemoryTransport, Options, PhotoDetail, DirRule,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::sync::{Arc, Mutex};

fn seeded_transport() -> Arc<MemoryTransport> {
    Arc::new(
        MemoryTransport::new()
            .insert(
                "mem://s/albums/42",
                r#"{"id":"42","title":"Holiday","photos":["p1"]}"#,
            )
            .insert(
                "mem://s/photos/p1",
                r#"{"id":"p1","title":"Beach","album_id":"42","images":[
                    {"id":"i1","src":"mem://s/img/i1.jpg"},
                    {"id":"i2","src":"mem://s/img/i2.jpg"}
                ]}"#,
            )
            .insert("mem://s/img/i1.jpg", "one")
            .insert("mem://s/img/i2.jpg", "two"),
    )
}

fn options() -> Options {
    Options::new()
        .with_base_locator("mem://s")
        .with_dir_rule(DirRule::new("out", "Bd_Aid_Pid"))
        .with_backoff_base_ms(1)
        .with_retries(2)
}

#[tokio::test]
async fn test_download_album_end_to_end() {
    let registry = ExtensionRegistry::new();
    let storage = Arc::new(MemoryStorage::new());

    let report = api::download_album(
        &registry,
        &options(),
        seeded_transport(),
        storage.clone(),
        "42",
    )
    .await
    .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.completed_count(), 2);
    assert!(storage.contains(Path::new("out/42/p1/00000.jpg")));
    assert!(storage.contains(Path::new("out/42/p1/00001.jpg")));
}

#[tokio::test]
async fn test_html_client_end_to_end() {
    let registry = ExtensionRegistry::new();
    let storage = Arc::new(MemoryStorage::new());
    let transport = Arc::new(
        MemoryTransport::new()
            .insert(
                "mem://s/album/42.html",
                r#"<h1 class="album-title">Holiday</h1><a data-photo-id="p1"></a>"#,
            )
            .insert(
                "mem://s/photo/p1.html",
                r#"<h1 class="photo-title">Beach</h1><img data-image-id="i1" src="mem://s/img/i1.jpg">"#,
            )
            .insert("mem://s/img/i1.jpg", "one"),
    );

    let report = api::download_album(
        &registry,
        &options().with_client_impl("html"),
        transport,
        storage.clone(),
        "42",
    )
    .await
    .unwrap();

    assert_eq!(report.completed_count(), 1);
    assert!(storage.contains(Path::new("out/42/p1/00000.jpg")));
}

// Registering a custom client implementation under a caller-chosen key and
// selecting it through `client_impl` constructs exactly that client.
#[tokio::test]
async fn test_custom_client_implementation_key() {
    struct MyClient;

    #[async_trait]
    impl Client for MyClient {
        fn name(&self) -> &str {
            "my-client"
        }

        async fn fetch_album(&self, id: &str) -> albumfetch_base::Result<Arc<dyn AlbumDetail>> {
            Ok(Arc::new(albumfetch::Album(AlbumInfo {
                id: id.to_string(),
                title: "from my client".into(),
                ..Default::default()
            })))
        }

        async fn fetch_photo(&self, id: &str) -> albumfetch_base::Result<Arc<dyn PhotoDetail>> {
            Err(EngineError::not_found(format!("photo {} not found", id)))
        }

        async fn fetch_image_data(&self, _image: &ImageInfo) -> albumfetch_base::Result<Bytes> {
            Ok(Bytes::new())
        }
    }

    let registry = ExtensionRegistry::new();
    registry.register_client_impl("my-client", Arc::new(|_| Box::new(MyClient)));

    let album = api::fetch_album(
        &registry,
        &options().with_client_impl("my-client"),
        Arc::new(MemoryTransport::new()),
        "7",
    )
    .await
    .unwrap();
    assert_eq!(album.title(), "from my client");
}

// Substituting the album class exposes a derived attribute on every album of
// the run, usable from the directory rule, without touching base fields.
#[tokio::test]
async fn test_entity_substitution_drives_dir_rule() {
    struct MyAlbum(AlbumInfo);

    impl AlbumDetail for MyAlbum {
        fn info(&self) -> &AlbumInfo {
            &self.0
        }

        fn attr(&self, name: &str) -> Option<String> {
            if name == "custom" {
                return Some(format!("custom_{}", self.title()));
            }
            match name {
                "id" => Some(self.info().id.clone()),
                "title" => Some(self.info().title.clone()),
                _ => None,
            }
        }
    }

    let registry = ExtensionRegistry::new();
    registry.set_album_factory(Arc::new(|info| Arc::new(MyAlbum(info))));
    let storage = Arc::new(MemoryStorage::new());

    let report = api::download_album(
        &registry,
        &options().with_dir_rule(DirRule::new("out", "Bd_Acustom_Pid")),
        seeded_transport(),
        storage.clone(),
        "42",
    )
    .await
    .unwrap();

    assert!(report.is_complete());
    assert!(storage.contains(Path::new("out/custom_Holiday/p1/00000.jpg")));
}

// Substituting the error adapter changes the concrete type raised on every
// failure path, with no site still producing the default.
#[tokio::test]
async fn test_error_substitution_applies_to_all_raise_sites() {
    #[derive(Debug)]
    struct MyError(String);

    impl std::fmt::Display for MyError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl std::error::Error for MyError {}

    let registry = ExtensionRegistry::new();
    registry.set_error_adapter(Arc::new(|err| Box::new(MyError(err.to_string()))));

    // Not-found path.
    let err = api::fetch_album(
        &registry,
        &options(),
        Arc::new(MemoryTransport::new()),
        "999999",
    )
    .await
    .unwrap_err();
    assert!(err.downcast_ref::<MyError>().is_some());
    assert!(err.to_string().contains("999999"));

    // Configuration path.
    let err = api::fetch_album(
        &registry,
        &options().with_client_impl("unregistered"),
        Arc::new(MemoryTransport::new()),
        "1",
    )
    .await
    .unwrap_err();
    assert!(err.downcast_ref::<MyError>().is_some());

    // Retry-exhaustion path under the abort policy.
    let transport = Arc::new(
        MemoryTransport::new()
            .insert(
                "mem://s/albums/42",
                r#"{"id":"42","title":"T","photos":["p1"]}"#,
            )
            .insert(
                "mem://s/photos/p1",
                r#"{"id":"p1","title":"P","images":[{"id":"i1","src":"mem://s/img/i1.jpg"}]}"#,
            )
            .failing("mem://s/img/i1.jpg"),
    );
    let err = api::download_album(
        &registry,
        &options().with_fail_policy(FailPolicy::Abort),
        transport,
        Arc::new(MemoryStorage::new()),
        "42",
    )
    .await
    .unwrap_err();
    assert!(err.downcast_ref::<MyError>().is_some());
}

// A substituted executor callback set rides along with the run resolved from
// the downloader-class slot.
#[tokio::test]
async fn test_downloader_substitution_receives_callbacks() {
    struct Counting {
        albums: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl DownloadCallback for Counting {
        async fn after_album(&self, album: &Arc<dyn AlbumDetail>) {
            self.albums.lock().unwrap().push(album.id().to_string());
        }
    }

    let registry = ExtensionRegistry::new();
    let albums: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let albums_in = albums.clone();
    registry.set_downloader(Arc::new(move || {
        Arc::new(Counting {
            albums: albums_in.clone(),
        })
    }));

    api::download_album(
        &registry,
        &options(),
        seeded_transport(),
        Arc::new(MemoryStorage::new()),
        "42",
    )
    .await
    .unwrap();

    assert_eq!(albums.lock().unwrap().as_slice(), ["42"]);
}

// Failures during the run surface through the substituted diagnostic sink
// under the req.error topic.
#[tokio::test]
async fn test_sink_substitution_observes_req_error() {
    let registry = ExtensionRegistry::new();
    let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_in = seen.clone();
    registry.set_debug_sink(Arc::new(move |topic, msg| {
        seen_in.lock().unwrap().push((topic.into(), msg.into()));
    }));

    let transport = Arc::new(
        MemoryTransport::new()
            .insert(
                "mem://s/albums/42",
                r#"{"id":"42","title":"T","photos":["p1"]}"#,
            )
            .insert(
                "mem://s/photos/p1",
                r#"{"id":"p1","title":"P","images":[{"id":"i1","src":"mem://s/img/i1.jpg"}]}"#,
            )
            .failing("mem://s/img/i1.jpg"),
    );

    let report = api::download_album(
        &registry,
        &options(),
        transport,
        Arc::new(MemoryStorage::new()),
        "42",
    )
    .await
    .unwrap();
    assert_eq!(report.skipped_count(), 1);

    let seen = seen.lock().unwrap();
    assert!(seen
        .iter()
        .any(|(topic, msg)| topic == "req.error" && msg.contains("i1")));
    assert!(seen.iter().any(|(topic, _)| topic == "album.after"));
}

// A client implementation that cannot be constructed surfaces through the
// sink under the plugin.error topic before the error reaches the caller.
#[tokio::test]
async fn test_failed_client_construction_emits_plugin_error() {
    let registry = ExtensionRegistry::new();
    let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_in = seen.clone();
    registry.set_debug_sink(Arc::new(move |topic, msg| {
        seen_in.lock().unwrap().push((topic.into(), msg.into()));
    }));

    let err = api::fetch_album(
        &registry,
        &options().with_client_impl("nope"),
        Arc::new(MemoryTransport::new()),
        "1",
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("nope"));

    let seen = seen.lock().unwrap();
    assert!(seen
        .iter()
        .any(|(topic, msg)| topic == "plugin.error" && msg.contains("nope")));
}
