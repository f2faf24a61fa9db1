//! Download executor
//!
//! Drives the album → photo → image traversal: photos strictly in declared
//! order, images of one photo fanned out over a bounded worker pool, lifecycle
//! callbacks fired exactly once per entity with `after_photo` as the join
//! point over that photo's image tasks.

mod callback;
mod engine;
mod report;
mod storage;

pub use callback::{DownloadCallback, NoopCallback};
pub use engine::Downloader;
pub use report::{DownloadReport, ImageOutcome, ImageState};
pub use storage::{FsStorage, MemoryStorage, Storage};
