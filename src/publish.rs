//! Rendering of readings and atomic replacement of the per-sensor JSON snapshot.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::{Error, Measurement, Result, SensorIdentity};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn timestamp(time: &DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Key of the sensor's record in the JSON snapshot, e.g. `SENSOR0176`.
pub fn record_key(identity: &SensorIdentity) -> String {
    format!("SENSOR{:04X}", identity.record_id())
}

/// One-line human readable summary, pressure in millibar.
pub fn render_summary(identity: &SensorIdentity, m: &Measurement) -> String {
    format!(
        "tm: {}; ch:{:02}; ad:{:02X}; {:+.2}C; {:.2}%; {:.1}mb",
        timestamp(&m.timestamp),
        identity.channel,
        identity.address,
        m.temperature,
        m.humidity,
        m.pressure / 100.0
    )
}

/// Snapshot file body, pressure in millibar.
pub fn render_json(identity: &SensorIdentity, m: &Measurement) -> String {
    format!(
        "{{\"{}\": {{\"timestamp\": \"{}\", \
         \"temperature\": {:.5}, \"humidity\": {:.5}, \"pressure\": {:.5}}}}}\n",
        record_key(identity),
        timestamp(&m.timestamp),
        m.temperature,
        m.humidity,
        m.pressure / 100.0
    )
}

/// Path the snapshot is staged at before it's renamed over `path`.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".new");
    PathBuf::from(name)
}

/// Replaces `path` with `contents` so that readers see either the old or the new file, never
/// a partial one.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let staging = staging_path(path);
    let file = File::create(&staging).map_err(|source| Error::Publish {
        path: staging.clone(),
        source,
    })?;

    finish(file, &staging, path, contents).map_err(|source| {
        let _ = fs::remove_file(&staging);
        Error::Publish {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn finish(mut file: File, staging: &Path, path: &Path, contents: &str) -> io::Result<()> {
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::rename(staging, path)
}
