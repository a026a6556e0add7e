//! On-disk record of checks, written only when tracking is enabled.
//!
//! Layout under the archive root:
//!
//! ```text
//! reference_posture.jpg
//! 20240501_090000/
//!     comparison.jpg
//!     analysis.json
//! ```

use std::path::{Path, PathBuf};

use badbits_core::alerts::AlertResult;
use badbits_core::error::{BadbitsError, Result};
use badbits_core::formatting::archive_stamp;
use chrono::{DateTime, Local};
use image::{ImageFormat, RgbImage};
use serde::Serialize;

pub const REFERENCE_FILE: &str = "reference_posture.jpg";
pub const COMPARISON_FILE: &str = "comparison.jpg";
pub const ANALYSIS_FILE: &str = "analysis.json";

#[derive(Serialize)]
struct AnalysisRecord<'a> {
    timestamp: DateTime<Local>,
    alerts: &'a [AlertResult],
}

#[derive(Debug, Clone)]
pub struct AnalysisArchive {
    root: PathBuf,
}

impl AnalysisArchive {
    /// Use `root` as the archive directory, creating it if needed.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save_reference(&self, reference: &RgbImage) -> Result<PathBuf> {
        let path = self.root.join(REFERENCE_FILE);
        save_jpeg(reference, &path)?;
        Ok(path)
    }

    /// Write the composite and the batch into a directory named after
    /// `checked_at`. Returns that directory.
    pub fn save(
        &self,
        composite: &RgbImage,
        alerts: &[AlertResult],
        checked_at: DateTime<Local>,
    ) -> Result<PathBuf> {
        let dir = self.root.join(archive_stamp(checked_at));
        std::fs::create_dir_all(&dir)?;

        save_jpeg(composite, &dir.join(COMPARISON_FILE))?;

        let record = AnalysisRecord {
            timestamp: checked_at,
            alerts,
        };
        let json = serde_json::to_string_pretty(&record)?;
        std::fs::write(dir.join(ANALYSIS_FILE), json)?;

        Ok(dir)
    }
}

fn save_jpeg(img: &RgbImage, path: &Path) -> Result<()> {
    img.save_with_format(path, ImageFormat::Jpeg)
        .map_err(|e| BadbitsError::Image(format!("failed to write {}: {e}", path.display())))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
