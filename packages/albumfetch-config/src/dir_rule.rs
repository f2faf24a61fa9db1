//! Directory-rule path templates
//!
//! A rule is an underscore-separated template resolved against the current
//! album and photo: `Bd` is the base directory, `A<field>` an album
//! attribute, `P<field>` a photo attribute. `Bd_Atitle_Ptitle` therefore
//! yields `<base>/<album title>/<photo title>`. Derived attributes added by
//! substituted entity types (e.g. `Acustom`) resolve the same way.

use albumfetch_base::{AlbumDetail, EngineError, PhotoDetail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirRule {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    #[serde(default = "default_rule")]
    pub rule: String,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_rule() -> String {
    "Bd_Atitle_Ptitle".to_string()
}

impl Default for DirRule {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            rule: default_rule(),
        }
    }
}

/// Keep attribute values path-safe.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            _ => c,
        })
        .collect()
}

impl DirRule {
    pub fn new(base_dir: impl Into<PathBuf>, rule: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            rule: rule.into(),
        }
    }

    /// Resolve the rule into the directory for one photo's images.
    pub fn resolve(&self, album: &dyn AlbumDetail, photo: &dyn PhotoDetail) -> Result<PathBuf> {
        let mut path = PathBuf::new();
        for segment in self.rule.split('_') {
            if segment == "Bd" {
                path.push(&self.base_dir);
                continue;
            }
            let Some(field) = segment.strip_prefix('A').filter(|f| !f.is_empty()) else {
                let Some(field) = segment.strip_prefix('P').filter(|f| !f.is_empty()) else {
                    return Err(EngineError::configuration(format!(
                        "dir_rule segment `{}` is not Bd, A<field> or P<field>",
                        segment
                    )));
                };
                let value = photo.attr(field).ok_or_else(|| {
                    EngineError::configuration(format!(
                        "photo {} has no attribute `{}` (dir_rule segment `{}`)",
                        photo.id(),
                        field,
                        segment
                    ))
                })?;
                path.push(sanitize(&value));
                continue;
            };
            let value = album.attr(field).ok_or_else(|| {
                EngineError::configuration(format!(
                    "album {} has no attribute `{}` (dir_rule segment `{}`)",
                    album.id(),
                    field,
                    segment
                ))
            })?;
            path.push(sanitize(&value));
        }
        Ok(path)
    }
}
