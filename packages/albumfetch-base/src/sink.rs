//! Diagnostic sink
//!
//! Every component reports through a single `(topic, message)` function held
//! in the registry. Substituting it redirects, filters or silences all engine
//! diagnostics at once; nothing in the engine prints directly.

use std::sync::Arc;

/// Substitutable diagnostic function. Each call is one atomic message; safe
/// to call from any task.
pub type DebugSink = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Fixed topics emitted by the engine.
pub mod topic {
    pub const ALBUM_BEFORE: &str = "album.before";
    pub const ALBUM_AFTER: &str = "album.after";
    pub const PHOTO_BEFORE: &str = "photo.before";
    pub const PHOTO_AFTER: &str = "photo.after";
    pub const IMAGE_BEFORE: &str = "image.before";
    pub const IMAGE_AFTER: &str = "image.after";
    pub const REQ_ERROR: &str = "req.error";
    pub const PLUGIN_ERROR: &str = "plugin.error";
    pub const RUN_CANCEL: &str = "run.cancel";
}

/// Default sink: forward to `tracing`, error-ish topics at warn level.
pub fn tracing_sink() -> DebugSink {
    Arc::new(|topic, msg| {
        if topic.ends_with(".error") || topic == self::topic::RUN_CANCEL {
            tracing::warn!(topic, "{msg}");
        } else {
            tracing::debug!(topic, "{msg}");
        }
    })
}

/// Sink that drops everything.
pub fn silent_sink() -> DebugSink {
    Arc::new(|_, _| {})
}
