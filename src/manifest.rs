// ==============================================================================
// manifest.rs - Run Manifest
// ==============================================================================
// Description: JSON-lines trail of every record outcome in a batch run
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================
// One line per event, appended to <output root>/manifest.jsonl:
//   {"run_id":"...","timestamp":"...","event":"written","bucket":"NO_NOT",
//    "input_file":"...","input_sha256":"...","output_file":"...","detail":null}
// ==============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::output::Bucket;

pub const MANIFEST_FILE_NAME: &str = "manifest.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestEventType {
    Written,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEvent {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: ManifestEventType,
    pub bucket: Option<String>,
    pub input_file: String,
    pub input_sha256: Option<String>,
    pub output_file: Option<String>,
    pub detail: Option<String>,
}

/// Per-run outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestCounts {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Append-only manifest for one batch run
pub struct RunManifest {
    run_id: Uuid,
    path: PathBuf,
    writer: BufWriter<File>,
    counts: ManifestCounts,
}

impl RunManifest {
    /// Open `<output_root>/manifest.jsonl` for appending
    pub fn create(output_root: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_root)
            .with_context(|| format!("Failed to create output root {:?}", output_root))?;

        let path = output_root.join(MANIFEST_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open manifest {:?}", path))?;

        let run_id = Uuid::new_v4();
        debug!("Run {} manifest: {:?}", run_id, path);

        Ok(Self {
            run_id,
            path,
            writer: BufWriter::new(file),
            counts: ManifestCounts::default(),
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn counts(&self) -> ManifestCounts {
        self.counts
    }

    /// A record was transformed (or copied) into `output`
    pub fn written(&mut self, bucket: Bucket, input: &Path, output: &Path) -> Result<()> {
        self.counts.written += 1;
        let event = self.event(ManifestEventType::Written, Some(bucket), input, Some(output), None);
        self.append(&event)
    }

    /// A record was deliberately not written
    pub fn skipped(&mut self, bucket: Option<Bucket>, input: &Path, reason: &str) -> Result<()> {
        self.counts.skipped += 1;
        let event = self.event(ManifestEventType::Skipped, bucket, input, None, Some(reason.to_string()));
        self.append(&event)
    }

    /// A record could not be read, transformed or written
    pub fn failed(&mut self, bucket: Option<Bucket>, input: &Path, error: &anyhow::Error) -> Result<()> {
        self.counts.failed += 1;
        let event = self.event(
            ManifestEventType::Failed,
            bucket,
            input,
            None,
            Some(format!("{:#}", error)),
        );
        self.append(&event)
    }

    /// Flush buffered lines and return the final counts
    pub fn finish(mut self) -> Result<ManifestCounts> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush manifest {:?}", self.path))?;
        Ok(self.counts)
    }

    fn event(
        &self,
        event: ManifestEventType,
        bucket: Option<Bucket>,
        input: &Path,
        output: Option<&Path>,
        detail: Option<String>,
    ) -> ManifestEvent {
        // An unreadable input still gets a manifest line
        let input_sha256 = match sha256_file(input) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!("Could not hash {:?}: {:#}", input, e);
                None
            }
        };

        ManifestEvent {
            run_id: self.run_id,
            timestamp: Utc::now(),
            event,
            bucket: bucket.map(|b| b.dir_name().to_string()),
            input_file: input.display().to_string(),
            input_sha256,
            output_file: output.map(|p| p.display().to_string()),
            detail,
        }
    }

    fn append(&mut self, event: &ManifestEvent) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event).context("Failed to serialize manifest event")?;
        self.writer
            .write_all(b"\n")
            .with_context(|| format!("Failed to append to manifest {:?}", self.path))?;
        Ok(())
    }
}

/// Hex-encoded SHA-256 of a file's contents
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
