use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use log::info;

/// Control is only exercised while this file exists, so a carer can pause the
/// program by deleting it and resume by recreating it.
pub struct EnableFile {
    path: PathBuf,
    last_enabled: bool,
}

impl EnableFile {
    /// Creates the file so that we start enabled.
    pub fn create(path: PathBuf) -> std::io::Result<Self> {
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, last_enabled: true })
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    /// Whether the file is present, logging whenever that changes.
    pub fn check(&mut self) -> bool {
        let enabled = self.path.is_file();
        if enabled != self.last_enabled {
            self.last_enabled = enabled;
            if enabled {
                info!("Un-idling - file {:?} is present.", self.path);
            } else {
                info!("Idling - file {:?} is missing.", self.path);
            }
        }
        enabled
    }
}
