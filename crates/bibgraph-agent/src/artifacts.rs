//! Per-run report and log file locations.
//!
//! Everything for a run lives under `<folder_for_logs>/YYYY/MM/DD/`, with file
//! names prefixed by the `YYYY_MM_DD` date stamp.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArtifacts {
    pub folder: PathBuf,
    pub disambiguation: PathBuf,
    pub output: PathBuf,
    pub uploads: PathBuf,
    pub skips: PathBuf,
    pub rdf: PathBuf,
}

impl RunArtifacts {
    pub fn for_date(root: &Path, date: NaiveDate) -> Self {
        let folder = root
            .join(date.format("%Y").to_string())
            .join(date.format("%m").to_string())
            .join(date.format("%d").to_string());
        let stamp = date.format("%Y_%m_%d").to_string();
        let file = |suffix: &str| folder.join(format!("{stamp}{suffix}"));

        Self {
            disambiguation: file("_pm_disambiguation.txt"),
            output: file("_pm_output_file.txt"),
            uploads: file("_pm_upload_log.txt"),
            skips: file("_pm_skips.txt"),
            rdf: file("_upload.rdf"),
            folder,
        }
    }

    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.folder)
    }
}
