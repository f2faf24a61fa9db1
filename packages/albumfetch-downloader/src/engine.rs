//! The traversal engine.

use crate::callback::DownloadCallback;
use crate::report::{DownloadReport, ImageOutcome, ImageState};
use crate::storage::Storage;
use albumfetch_base::{
    topic, AlbumDetail, DebugSink, EngineError, ImageInfo, PhotoDetail, Result, Scope,
};
use albumfetch_client::Client;
use albumfetch_config::{FailPolicy, Options};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Derive the on-disk filename for an image: zero-padded index plus the
/// source extension when it looks like one.
fn image_filename(image: &ImageInfo) -> String {
    let ext = image
        .src
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or("jpg");
    format!("{:05}.{}", image.index, ext)
}

/// One image download: bounded by the photo's worker pool, retried with
/// exponential backoff, terminal state reported through `after_image`.
struct ImageJob {
    client: Arc<dyn Client>,
    storage: Arc<dyn Storage>,
    callback: Arc<dyn DownloadCallback>,
    sink: DebugSink,
    semaphore: Arc<Semaphore>,
    photo_cancel: CancellationToken,
    policy: FailPolicy,
    retries: usize,
    backoff_base_ms: u64,
    photo_id: String,
    image: ImageInfo,
    path: PathBuf,
}

impl ImageJob {
    fn skipped(&self, attempts: usize, error: impl Into<String>) -> ImageOutcome {
        ImageOutcome {
            photo_id: self.photo_id.clone(),
            image_id: self.image.id.clone(),
            index: self.image.index,
            path: None,
            state: ImageState::Skipped,
            attempts,
            error: Some(error.into()),
        }
    }

    async fn fetch_and_save(&self) -> Result<ImageState> {
        let bytes = self.client.fetch_image_data(&self.image).await?;
        let written = self.storage.write_if_absent(&self.path, bytes).await?;
        Ok(if written {
            ImageState::Saved
        } else {
            ImageState::AlreadyPresent
        })
    }

    async fn run(self) -> (ImageOutcome, Option<EngineError>) {
        let Ok(_permit) = self.semaphore.clone().acquire_owned().await else {
            return (self.skipped(0, "worker pool closed"), None);
        };
        if self.photo_cancel.is_cancelled() {
            return (self.skipped(0, "cancelled"), None);
        }

        (self.sink)(
            topic::IMAGE_BEFORE,
            &format!("image {} (photo {})", self.image.id, self.photo_id),
        );
        self.callback.before_image(&self.image).await;

        let mut attempts = 0;
        let mut delay = Duration::from_millis(self.backoff_base_ms.max(1));
        let (outcome, terminal) = loop {
            attempts += 1;
            match self.fetch_and_save().await {
                Ok(state) => {
                    break (
                        ImageOutcome {
                            photo_id: self.photo_id.clone(),
                            image_id: self.image.id.clone(),
                            index: self.image.index,
                            path: Some(self.path.clone()),
                            state,
                            attempts,
                            error: None,
                        },
                        None,
                    );
                }
                Err(err) => {
                    (self.sink)(
                        topic::REQ_ERROR,
                        &format!(
                            "image {} attempt {}/{} failed: {}",
                            self.image.id, attempts, self.retries, err
                        ),
                    );
                    if attempts >= self.retries {
                        let failure = EngineError::retry_exhausted(format!(
                            "image {} failed after {} attempts: {}",
                            self.image.id, attempts, err.message
                        ))
                        .with_scope(Scope::Image {
                            id: self.image.id.clone(),
                            index: self.image.index,
                        });
                        let outcome = self.skipped(attempts, failure.to_string());
                        break match self.policy {
                            FailPolicy::Abort => {
                                self.photo_cancel.cancel();
                                (outcome, Some(failure))
                            }
                            FailPolicy::SkipImage => (outcome, None),
                            FailPolicy::SkipPhoto => {
                                self.photo_cancel.cancel();
                                (outcome, None)
                            }
                        };
                    }
                    if self.photo_cancel.is_cancelled() {
                        break (self.skipped(attempts, "cancelled during retry"), None);
                    }
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(5));
                }
            }
        };

        self.callback.after_image(&self.image, &outcome).await;
        (self.sink)(
            topic::IMAGE_AFTER,
            &format!("image {}: {:?}", self.image.id, outcome.state),
        );
        (outcome, terminal)
    }
}

/// The download executor.
///
/// Photos are processed sequentially in declared order; images of one photo
/// concurrently, bounded by `options.workers`. The registry resolves which
/// `DownloadCallback` rides along (`downloader-class` extension point).
pub struct Downloader {
    client: Arc<dyn Client>,
    storage: Arc<dyn Storage>,
    callback: Arc<dyn DownloadCallback>,
    sink: DebugSink,
    options: Options,
    cancel: CancellationToken,
}

impl Downloader {
    pub fn new(
        client: Arc<dyn Client>,
        storage: Arc<dyn Storage>,
        callback: Arc<dyn DownloadCallback>,
        sink: DebugSink,
        options: Options,
    ) -> Self {
        Self {
            client,
            storage,
            callback,
            sink,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Drive the run from an externally held token.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Download a whole album.
    pub async fn run(&self, album_id: &str) -> Result<DownloadReport> {
        let album = self.client.fetch_album(album_id).await?;
        (self.sink)(
            topic::ALBUM_BEFORE,
            &format!("album {} ({} photos)", album.id(), album.photo_ids().len()),
        );
        self.callback.before_album(&album).await;

        let mut report = DownloadReport::new(album.id());
        for photo_id in album.photo_ids() {
            if self.cancel.is_cancelled() {
                return self.cancelled(&report);
            }
            match self.client.fetch_photo(photo_id).await {
                Ok(photo) => {
                    (self.sink)(
                        topic::PHOTO_BEFORE,
                        &format!("photo {} ({} images)", photo.id(), photo.images().len()),
                    );
                    self.callback.before_photo(&photo).await;
                    let result = self.process_photo(&album, &photo, &mut report).await;
                    (self.sink)(topic::PHOTO_AFTER, &format!("photo {}", photo.id()));
                    self.callback.after_photo(&photo).await;
                    result?;
                }
                Err(err) => {
                    (self.sink)(
                        topic::REQ_ERROR,
                        &format!("photo {} failed to resolve: {}", photo_id, err),
                    );
                    match self.options.fail_policy {
                        FailPolicy::Abort => return Err(err),
                        FailPolicy::SkipImage | FailPolicy::SkipPhoto => {
                            report.skipped_photos.push(photo_id.clone());
                        }
                    }
                }
            }
        }
        if self.cancel.is_cancelled() {
            return self.cancelled(&report);
        }

        self.callback.after_album(&album).await;
        (self.sink)(
            topic::ALBUM_AFTER,
            &format!("album {}: {} images saved", album.id(), report.completed_count()),
        );
        Ok(report)
    }

    fn cancelled(&self, report: &DownloadReport) -> Result<DownloadReport> {
        (self.sink)(
            topic::RUN_CANCEL,
            &format!(
                "run cancelled with {} images saved, {} skipped",
                report.completed_count(),
                report.skipped_count()
            ),
        );
        Err(EngineError::cancelled(format!(
            "run cancelled; {} images saved before cancellation",
            report.completed_count()
        ))
        .with_scope(Scope::Run))
    }

    /// Fan the photo's images out over the worker pool and join them all
    /// before returning; `after_photo` fires right after this returns.
    async fn process_photo(
        &self,
        album: &Arc<dyn AlbumDetail>,
        photo: &Arc<dyn PhotoDetail>,
        report: &mut DownloadReport,
    ) -> Result<()> {
        let dir = self
            .options
            .dir_rule
            .resolve(album.as_ref(), photo.as_ref())?;
        let semaphore = Arc::new(Semaphore::new(self.options.workers));
        let photo_cancel = self.cancel.child_token();
        let images = photo.images().to_vec();

        let mut join_set = JoinSet::new();
        for image in &images {
            if photo_cancel.is_cancelled() {
                break;
            }
            let job = ImageJob {
                client: self.client.clone(),
                storage: self.storage.clone(),
                callback: self.callback.clone(),
                sink: self.sink.clone(),
                semaphore: semaphore.clone(),
                photo_cancel: photo_cancel.clone(),
                policy: self.options.fail_policy,
                retries: self.options.retries,
                backoff_base_ms: self.options.backoff_base_ms,
                photo_id: photo.id().to_string(),
                image: image.clone(),
                path: dir.join(image_filename(image)),
            };
            join_set.spawn(job.run());
        }

        let grace = Duration::from_millis(self.options.grace_period_ms);
        let mut outcomes: Vec<ImageOutcome> = Vec::new();
        let mut terminal: Option<EngineError> = None;
        loop {
            let next = if self.cancel.is_cancelled() {
                match tokio::time::timeout(grace, join_set.join_next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        // Grace period over: abandon what is still in flight.
                        join_set.abort_all();
                        while join_set.join_next().await.is_some() {}
                        None
                    }
                }
            } else {
                join_set.join_next().await
            };
            let Some(joined) = next else { break };
            if let Ok((outcome, failure)) = joined {
                if let Some(failure) = failure {
                    terminal.get_or_insert(failure);
                }
                outcomes.push(outcome);
            }
        }

        // Images never spawned or abandoned mid-flight still get a terminal
        // record.
        for image in &images {
            if !outcomes.iter().any(|o| o.index == image.index) {
                outcomes.push(ImageOutcome {
                    photo_id: photo.id().to_string(),
                    image_id: image.id.clone(),
                    index: image.index,
                    path: None,
                    state: ImageState::Skipped,
                    attempts: 0,
                    error: Some("not attempted".into()),
                });
            }
        }
        outcomes.sort_by_key(|o| o.index);
        report.outcomes.extend(outcomes);

        match terminal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
