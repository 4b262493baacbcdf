//! # Ledger
//!
//! Flat file database.
//!
//! Core purpose is to store and look up project like counts, keyed by the project name as displayed
//! on the site.
//!
//! ## Requirements
//!
//! - Survive restarts
//! - Tiny dataset, one entry per portfolio project
//! - Human readable on disk
//! - No lost increments under concurrent likes
//!
//! ## Implementation
//!
//! - One JSON object: project name -> **u64** likes, pretty printed with sorted keys
//! - Loaded once on startup, then the in-memory copy is authoritative
//! - Every increment holds the lock across the write, so increments are totally ordered
//! - Writes land in a sibling `.tmp` file and are renamed over the ledger
//! - Missing file means empty ledger, and so does a corrupt one (logged, then overwritten on the next like)
use std::{
    collections::BTreeMap,
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::{fs, sync::Mutex};
use tracing::{debug, info, warn};

use crate::error::AppError;

pub type Counts = BTreeMap<String, u64>;

pub struct Ledger {
    path: PathBuf,
    counts: Mutex<Counts>,
}

impl Ledger {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let counts = load_counts(&path).await;

        info!(
            "Loaded {} project(s) from {}",
            counts.len(),
            path.display()
        );

        Self {
            path,
            counts: Mutex::new(counts),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn counts(&self) -> Counts {
        self.counts.lock().await.clone()
    }

    /// Adds one like to `project` and returns its new count.
    ///
    /// The in-memory count is only kept if the ledger file was rewritten.
    pub async fn like(&self, project: &str) -> Result<u64, AppError> {
        let mut counts = self.counts.lock().await;

        let previous = counts.get(project).copied();
        let likes = previous.unwrap_or(0).saturating_add(1);
        counts.insert(project.to_string(), likes);

        if let Err(e) = write_counts(&self.path, &counts).await {
            match previous {
                Some(old) => counts.insert(project.to_string(), old),
                None => counts.remove(project),
            };

            return Err(e);
        }

        debug!("{project} now has {likes} like(s)");

        Ok(likes)
    }
}

pub async fn load_counts(path: &Path) -> Counts {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("{} not found, starting with an empty ledger", path.display());
            return Counts::new();
        }
        Err(e) => {
            warn!("Failed to read {}: {e}, treating as empty", path.display());
            return Counts::new();
        }
    };

    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!("Malformed ledger {}: {e}, treating as empty", path.display());
        Counts::new()
    })
}

pub async fn write_counts(path: &Path, counts: &Counts) -> Result<(), AppError> {
    let body = serde_json::to_string_pretty(counts)?;
    let tmp = tmp_path(path);

    fs::write(&tmp, body).await?;
    fs::rename(&tmp, path).await?;

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");

    PathBuf::from(tmp)
}
