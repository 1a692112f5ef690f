//! Scalar summaries for a training run.

use crate::config::Config;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Event log file inside a run directory.
pub const EVENTS_FILE: &str = "events.jsonl";

/// Config snapshot inside a run directory.
pub const CONFIG_FILE: &str = "config.json";

/// One scalar event, written as a JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarEvent {
    /// Training step.
    pub step: usize,
    /// Metric name.
    pub tag: String,
    /// Metric value.
    pub value: f32,
    /// Seconds since the Unix epoch.
    pub wall_time: f64,
}

/// Appends scalar events to `events.jsonl` in a run directory.
pub struct SummaryWriter {
    dir: PathBuf,
    events: BufWriter<File>,
}

impl SummaryWriter {
    /// Opens (or creates) the event log in `dir`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(EVENTS_FILE))?;
        Ok(Self {
            dir,
            events: BufWriter::new(file),
        })
    }

    /// Run directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Buffers one scalar event.
    pub fn add_scalar(&mut self, tag: &str, value: f32, step: usize) -> Result<()> {
        let event = ScalarEvent {
            step,
            tag: tag.to_string(),
            value,
            wall_time: unix_time().as_secs_f64(),
        };
        serde_json::to_writer(&mut self.events, &event)?;
        self.events.write_all(b"\n")?;
        Ok(())
    }

    /// Flushes buffered events to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.events.flush()?;
        Ok(())
    }

    /// Writes `config` as pretty JSON next to the event log.
    pub fn write_config(&self, config: &Config) -> Result<PathBuf> {
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(config)?)?;
        Ok(path)
    }
}

/// Creates a fresh run directory `<base>/run-<unix-secs>`.
///
/// A numeric suffix is appended when a run started within the same second.
pub fn new_log_dir<P: AsRef<Path>>(base: P) -> Result<PathBuf> {
    let base = base.as_ref();
    fs::create_dir_all(base)?;
    let stamp = unix_time().as_secs();

    let mut dir = base.join(format!("run-{stamp}"));
    let mut n = 1;
    while dir.exists() {
        dir = base.join(format!("run-{stamp}-{n}"));
        n += 1;
    }
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Reads every event from a run directory.
pub fn read_events<P: AsRef<Path>>(dir: P) -> Result<Vec<ScalarEvent>> {
    let text = fs::read_to_string(dir.as_ref().join(EVENTS_FILE))?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

fn unix_time() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
}
