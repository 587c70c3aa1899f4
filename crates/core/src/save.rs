//! Station state files on disk.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    codec,
    error::{Result, StationError},
    station::Station,
};

/// Directory under the user's data directory used for state files.
pub const DEFAULT_STATE_DIR: &str = "gasolinera/datos";

/// File extension of station state files.
pub const STATE_EXTENSION: &str = "gas";

/// Write `station` to `path`, replacing whatever was there.
pub fn save_to_path(station: &Station, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let write_failure = |source| StationError::WriteFailure {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_failure)?;
    }
    fs::write(path, codec::encode(station)).map_err(write_failure)?;
    info!(path = %path.display(), pumps = station.pump_count(), "Station saved");
    Ok(())
}

/// Read and decode the station stored at `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Station> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            StationError::SourceNotFound(path.to_path_buf())
        } else {
            StationError::ReadFailure {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let station = codec::decode(&content)?;
    info!(path = %path.display(), pumps = station.pump_count(), "Station loaded");
    Ok(station)
}

/// A state file known to a [`StateStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StateEntry {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// File stem shown to the user.
    pub name: String,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Directory of station state files.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    /// Create a store rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_STATE_DIR)
    }

    /// Directory the store reads and writes.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All state files, most recently modified first.
    pub fn entries(&self) -> Result<Vec<StateEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let read_failure = |source| StationError::ReadFailure {
            path: self.root.clone(),
            source,
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(read_failure)? {
            let entry = entry.map_err(read_failure)?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(STATE_EXTENSION) {
                continue;
            }
            let modified = match entry.metadata().and_then(|meta| meta.modified()) {
                Ok(modified) => modified,
                Err(err) => {
                    warn!("Failed to stat {:?}: {err}", path);
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            entries.push(StateEntry {
                path,
                name,
                updated_at: DateTime::<Utc>::from(modified),
            });
        }

        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.name.cmp(&b.name)));
        Ok(entries)
    }

    /// Path a state called `name` is stored under.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{}.{STATE_EXTENSION}", sanitize_component(name)))
    }

    /// Whether saving under `name` would overwrite an existing file.
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Write `station` under `name` and return the resulting entry.
    pub fn save(&self, name: &str, station: &Station) -> Result<StateEntry> {
        let path = self.path_for(name);
        save_to_path(station, &path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(StateEntry {
            path,
            name,
            updated_at: Utc::now(),
        })
    }

    /// Load the station stored in `entry`.
    pub fn load(&self, entry: &StateEntry) -> Result<Station> {
        load_from_path(&entry.path)
    }

    /// Load the station stored under `name`.
    pub fn load_named(&self, name: &str) -> Result<Station> {
        load_from_path(self.path_for(name))
    }
}

fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.trim().chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "gasolinera".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Attendant, FuelType},
        selector::RoundRobinSelector,
    };
    use tempfile::tempdir;

    fn sample_station() -> Station {
        Station::new(
            2,
            [
                FuelType::new("corriente", 14500, 100.0),
                FuelType::new("extra", 21090, 50.0),
            ],
            ["Alice", "Bob"],
            &mut RoundRobinSelector::default(),
        )
        .expect("valid station")
    }

    #[test]
    fn save_and_load_round_trip() -> Result<()> {
        let dir = tempdir().expect("tempdir");
        let store = StateStore::new(dir.path().join("datos"));
        assert!(store.entries()?.is_empty());

        let mut station = sample_station();
        station.sell_by_volume("extra", 12.5, 1)?;
        let entry = store.save("Turno Noche!", &station)?;
        assert!(entry.path.exists());
        assert_eq!(entry.name, "TurnoNoche");
        assert!(store.exists("Turno Noche!"));

        let entries = store.entries()?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "TurnoNoche");

        let loaded = store.load(&entries[0])?;
        assert_eq!(loaded.fuel_type("extra").map(FuelType::available), Some(37.5));
        assert_eq!(loaded.dispensed(1, "extra"), Some(12.5));
        assert_eq!(
            loaded.attendant("Bob").map(Attendant::earnings),
            Some(263_625)
        );
        Ok(())
    }

    #[test]
    fn saving_overwrites_the_whole_file() -> Result<()> {
        let dir = tempdir().expect("tempdir");
        let store = StateStore::new(dir.path());
        let mut station = sample_station();
        store.save("turno", &station)?;
        station.sell_by_volume("corriente", 100.0, 0)?;
        store.save("turno", &station)?;

        let loaded = store.load_named("turno")?;
        assert_eq!(loaded.fuel_type("corriente").map(FuelType::available), Some(0.0));
        assert_eq!(store.entries()?.len(), 1);
        Ok(())
    }

    #[test]
    fn entries_ignore_other_files() -> Result<()> {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("notes.txt"), "hola").expect("write fixture");
        let store = StateStore::new(dir.path());
        store.save("a", &sample_station())?;
        let names: Vec<_> = store.entries()?.into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["a"]);
        Ok(())
    }

    #[test]
    fn missing_file_is_source_not_found() {
        let dir = tempdir().expect("tempdir");
        let err = load_from_path(dir.path().join("nada.gas")).unwrap_err();
        assert!(matches!(err, StationError::SourceNotFound(_)));
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("roto.gas");
        fs::write(&path, "tipo:corriente:barato:1.0\n").expect("write fixture");
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, StationError::MalformedState { line: 1, .. }));
    }

    #[test]
    fn unwritable_target_is_write_failure() {
        let dir = tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").expect("write fixture");
        // A regular file cannot act as a directory.
        let err = save_to_path(&sample_station(), blocker.join("state.gas")).unwrap_err();
        assert!(matches!(err, StationError::WriteFailure { .. }));
    }

    #[test]
    fn sanitize_creates_safe_filenames() {
        assert_eq!(sanitize_component("Hello World!* 18??"), "HelloWorld18");
        assert_eq!(sanitize_component("../.."), "gasolinera");
    }
}
