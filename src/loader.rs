use std::path::{Path, PathBuf};

use rayon::prelude::*;
use simd_json::OwnedValue;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{FileError, LoadError};
use crate::sources::{HistorySource, SourceRegistry};

/// Matching history files of one format, in read order.
pub struct Discovery<'a> {
    pub source: &'a dyn HistorySource,
    pub files: Vec<PathBuf>,
}

/// The raw records of one successfully parsed file.
#[derive(Debug)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub records: Vec<OwnedValue>,
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub files: Vec<LoadedFile>,
    pub skipped: Vec<FileError>,
}

impl LoadOutcome {
    pub fn record_count(&self) -> usize {
        self.files.iter().map(|f| f.records.len()).sum()
    }
}

/// Find the history files in `dir`, using the first registered format that
/// has any.
pub fn discover<'a>(dir: &Path, registry: &'a SourceRegistry) -> Result<Discovery<'a>, LoadError> {
    info!(dir = %dir.display(), "scanning for streaming history files");

    let file_names = list_file_names(dir)?;

    for source in registry.sources() {
        let mut files: Vec<PathBuf> = file_names
            .iter()
            .filter(|name| source.matches(name))
            .map(|name| dir.join(name))
            .collect();

        if files.is_empty() {
            continue;
        }

        sort_by_sequence(&mut files);
        info!(
            source = source.display_name(),
            count = files.len(),
            "found history files"
        );
        return Ok(Discovery { source, files });
    }

    warn!(dir = %dir.display(), "no streaming history files found");
    Err(LoadError::NoMatchingFiles {
        dir: dir.to_path_buf(),
        patterns: registry.patterns(),
    })
}

fn list_file_names(dir: &Path) -> Result<Vec<String>, LoadError> {
    if let Err(source) = std::fs::read_dir(dir) {
        return Err(LoadError::UnreadableDirectory {
            dir: dir.to_path_buf(),
            source,
        });
    }

    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping directory entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => names.push(name.to_string()),
            None => warn!(
                file = %entry.path().display(),
                "skipping file with a non-UTF-8 name"
            ),
        }
    }
    Ok(names)
}

/// Sequence number at the end of a history file name:
/// `Streaming_History_Audio_2014-2016_3.json` -> 3.
pub fn sequence_number(path: &Path) -> Option<u64> {
    path.file_stem()?
        .to_str()?
        .rsplit('_')
        .next()?
        .parse()
        .ok()
}

/// Order files by their sequence number; unnumbered files go last, by name.
pub fn sort_by_sequence(files: &mut [PathBuf]) {
    files.sort_by(|a, b| {
        let key_a = sequence_number(a);
        let key_b = sequence_number(b);
        key_a
            .is_none()
            .cmp(&key_b.is_none())
            .then(key_a.cmp(&key_b))
            .then_with(|| a.file_name().cmp(&b.file_name()))
    });
}

/// Parse one history file as a JSON array of records.
pub fn read_history_file(path: &Path) -> Result<Vec<OwnedValue>, FileError> {
    let mut content = std::fs::read(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    simd_json::from_slice::<Vec<OwnedValue>>(&mut content).map_err(|e| FileError::MalformedJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read every discovered file. Files are parsed in parallel; the outcome
/// keeps discovery order. Unreadable or malformed files are skipped.
pub fn load(discovery: &Discovery<'_>) -> LoadOutcome {
    let parsed: Vec<(PathBuf, Result<Vec<OwnedValue>, FileError>)> = discovery
        .files
        .par_iter()
        .map(|path| (path.clone(), read_history_file(path)))
        .collect();

    let mut outcome = LoadOutcome::default();
    for (path, result) in parsed {
        match result {
            Ok(records) => {
                info!(file = %path.display(), records = records.len(), "read history file");
                outcome.files.push(LoadedFile { path, records });
            }
            Err(e) => {
                warn!("skipping history file: {e}");
                outcome.skipped.push(e);
            }
        }
    }

    info!(
        records = outcome.record_count(),
        files = outcome.files.len(),
        skipped = outcome.skipped.len(),
        "finished loading history files"
    );
    outcome
}
