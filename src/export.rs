use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::ExportError;
use crate::report::to_json;
use crate::types::AnalysisResult;

const EXPORT_STEM: &str = "analysis_results";

/// Default export location: `~/Documents/Playtrail`, or `~/Playtrail` when
/// there is no documents directory.
pub fn default_export_dir() -> Option<PathBuf> {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("Playtrail"))
}

/// Write `result` as pretty JSON. An existing directory gets a new
/// timestamp-named file; anything else is used as the file path. Returns the
/// path that was written.
pub fn export(result: &AnalysisResult, destination: &Path) -> Result<PathBuf, ExportError> {
    let json = to_json(result, true)?;

    let (path, file) = if destination.is_dir() {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        create_unique_export_file(destination, &stamp).map_err(|source| {
            ExportError::Write {
                path: destination.to_path_buf(),
                source,
            }
        })?
    } else {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ExportError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = File::create(destination).map_err(|source| ExportError::Write {
            path: destination.to_path_buf(),
            source,
        })?;
        (destination.to_path_buf(), file)
    };

    if let Err(source) = write_file(file, json.as_bytes()) {
        let _ = fs::remove_file(&path);
        return Err(ExportError::Write { path, source });
    }

    info!(path = %path.display(), "exported analysis results");
    Ok(path)
}

/// Export into a directory, creating it first.
pub fn export_to_dir(result: &AnalysisResult, dir: &Path) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    export(result, dir)
}

/// `analysis_results_<stamp>.json` for attempt 0, `..._<stamp>_<n>.json` after.
pub fn export_file_name(stamp: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{EXPORT_STEM}_{stamp}.json")
    } else {
        format!("{EXPORT_STEM}_{stamp}_{attempt}.json")
    }
}

/// Atomically claim the first free export name in `dir`. Existing files are
/// never opened.
pub fn create_unique_export_file(dir: &Path, stamp: &str) -> io::Result<(PathBuf, File)> {
    let mut attempt = 0u32;
    loop {
        let path = dir.join(export_file_name(stamp, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < u32::MAX => {
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn write_file(file: File, bytes: &[u8]) -> io::Result<()> {
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.write_all(b"\n")?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisOptions, LoadSummary, summarize};
    use chrono_tz::Tz;
    use tempfile::TempDir;

    fn empty_result() -> AnalysisResult {
        summarize(
            &[],
            &AnalysisOptions {
                top_n: 10,
                timezone: Tz::UTC,
            },
            LoadSummary {
                source: "Extended Streaming History".to_string(),
                ..LoadSummary::default()
            },
        )
    }

    #[test]
    fn export_to_file_path_creates_parents() {
        let dir = TempDir::new().expect("tempdir");
        let target = dir.path().join("nested").join("out.json");

        let written = export(&empty_result(), &target).expect("export");
        assert_eq!(written, target);

        let mut bytes = fs::read(&target).expect("read back");
        let parsed: AnalysisResult = simd_json::from_slice(&mut bytes).expect("parse");
        assert_eq!(parsed, empty_result());
    }

    #[test]
    fn export_to_directory_never_overwrites() {
        let dir = TempDir::new().expect("tempdir");

        let first = export(&empty_result(), dir.path()).expect("first export");
        let second = export(&empty_result(), dir.path()).expect("second export");

        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("analysis_results_") && name.ends_with(".json"));
    }

    #[test]
    fn export_names_skip_taken_files() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(export_file_name("20240101_000000", 0)), "{}").expect("write");
        fs::write(dir.path().join(export_file_name("20240101_000000", 1)), "{}").expect("write");

        let (path, _file) =
            create_unique_export_file(dir.path(), "20240101_000000").expect("create");
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "analysis_results_20240101_000000_2.json"
        );
        // Claimed files are left untouched.
        assert_eq!(
            fs::read_to_string(dir.path().join("analysis_results_20240101_000000.json")).unwrap(),
            "{}"
        );
    }

    #[test]
    fn concurrent_exports_get_distinct_files() {
        let dir = TempDir::new().expect("tempdir");
        let result = empty_result();

        let paths: Vec<PathBuf> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| export(&result, dir.path()).expect("export")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let unique: std::collections::HashSet<&PathBuf> = paths.iter().collect();
        assert_eq!(unique.len(), paths.len());
        for path in &paths {
            let mut bytes = fs::read(path).expect("read back");
            let parsed: AnalysisResult = simd_json::from_slice(&mut bytes).expect("parse");
            assert_eq!(parsed, result);
        }
    }

    #[test]
    fn export_reports_unwritable_destination() {
        let dir = TempDir::new().expect("tempdir");
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").expect("write");

        // A regular file can't be used as a parent directory.
        let err = export(&empty_result(), &blocker.join("out.json")).unwrap_err();
        assert!(matches!(err, ExportError::CreateDir { .. }));
    }
}
