//! Run report: terminal state of every image plus policy-skipped photos.

use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageState {
    Saved,
    /// Storage already had the file; write-if-absent semantics.
    AlreadyPresent,
    /// Failed past the retry bound, cancelled, or never attempted.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageOutcome {
    pub photo_id: String,
    pub image_id: String,
    pub index: usize,
    pub path: Option<PathBuf>,
    pub state: ImageState,
    pub attempts: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadReport {
    pub album_id: String,
    pub outcomes: Vec<ImageOutcome>,
    /// Photos skipped whole because their resolution failed.
    pub skipped_photos: Vec<String>,
}

impl DownloadReport {
    pub fn new(album_id: impl Into<String>) -> Self {
        Self {
            album_id: album_id.into(),
            ..Default::default()
        }
    }

    /// Images that reached storage (freshly saved or already there).
    pub fn completed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.state, ImageState::Saved | ImageState::AlreadyPresent))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == ImageState::Skipped)
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.skipped_count() == 0 && self.skipped_photos.is_empty()
    }
}
