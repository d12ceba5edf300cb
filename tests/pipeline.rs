use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use chrono_tz::Tz;
use playtrail::analysis::{AnalysisOptions, analyze_with};
use playtrail::export::export;
use playtrail::report::render_text;
use playtrail::sources::SourceRegistry;
use playtrail::types::{AnalysisResult, Streak};
use playtrail::utils::NumberFormatOptions;
use playtrail::{LoadError, analyze};
use tempfile::TempDir;

fn utc_options() -> AnalysisOptions {
    AnalysisOptions {
        top_n: 10,
        timezone: Tz::UTC,
    }
}

fn record(ts: &str, track: &str, artist: &str, album: Option<&str>, ms: i64) -> String {
    let album = album
        .map(|a| format!("\"{a}\""))
        .unwrap_or_else(|| "null".to_string());
    format!(
        r#"{{"ts": "{ts}", "platform": "android", "ms_played": {ms},
            "master_metadata_track_name": "{track}",
            "master_metadata_album_artist_name": "{artist}",
            "master_metadata_album_album_name": {album},
            "spotify_track_uri": "spotify:track:{track}", "skipped": false}}"#
    )
}

fn write_history(dir: &Path, name: &str, records: &[String]) {
    fs::write(dir.join(name), format!("[{}]", records.join(",\n"))).expect("write history");
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn scenario_dir() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    write_history(
        dir.path(),
        "Streaming_History_Audio_2024_0.json",
        &[
            record("2024-01-01T20:00:00Z", "Run", "Joji", Some("Nectar"), 400_000),
            record("2024-01-01T20:30:00Z", "Run", "Joji", Some("Nectar"), 200_000),
        ],
    );
    write_history(
        dir.path(),
        "Streaming_History_Audio_2024_1.json",
        &[record(
            "2024-01-02T09:00:00Z",
            "Blinding Lights",
            "The Weeknd",
            Some("After Hours"),
            350_000,
        )],
    );
    dir
}

fn run(dir: &Path) -> AnalysisResult {
    analyze_with(dir, &utc_options(), &SourceRegistry::default()).expect("analysis")
}

#[test]
fn three_event_scenario() {
    let dir = scenario_dir();
    let result = run(dir.path());

    assert_eq!(result.files_loaded, 2);
    assert_eq!(result.total_records, 3);
    assert_eq!(result.rejected_records, 0);
    assert_eq!(result.top_artists[0].name, "Joji");
    assert_eq!(result.top_artists[0].total_ms, 600_000);
    assert_eq!(result.most_active_hour.map(|h| h.hour), Some(20));
    assert_eq!(
        result.longest_streak,
        Some(Streak {
            days: 2,
            start: date(2024, 1, 1),
            end: date(2024, 1, 2),
        })
    );
    assert_eq!(result.unique_tracks, 2);
    assert!((result.total_minutes - 15.83).abs() < 1e-9);
    assert_eq!(result.most_played_day.map(|d| d.date), Some(date(2024, 1, 1)));
    assert_eq!(result.most_active_weekdays.len(), 1);
    assert_eq!(result.most_active_weekdays[0].name, "Monday");
}

#[test]
fn zero_matching_files_is_an_error_not_a_crash() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("YourLibrary.json"), "{}").expect("write");

    let err = analyze(dir.path()).unwrap_err();
    assert!(matches!(err, LoadError::NoMatchingFiles { .. }));
}

#[test]
fn negative_duration_is_rejected_and_reported() {
    let dir = TempDir::new().expect("tempdir");
    write_history(
        dir.path(),
        "Streaming_History_Audio_2024_0.json",
        &[
            record("2024-01-01T20:00:00Z", "Run", "Joji", Some("Nectar"), 400_000),
            record("2024-01-01T21:00:00Z", "Run", "Joji", Some("Nectar"), -1),
            record("2024-01-02T09:00:00Z", "Blinding Lights", "The Weeknd", None, 350_000),
        ],
    );

    let result = run(dir.path());
    assert_eq!(result.rejected_records, 1);
    assert_eq!(result.total_plays, 2);
    assert_eq!(result.total_ms, 750_000);
    assert_eq!(result.top_artists[0].total_ms, 400_000);
    assert_eq!(result.top_albums[1].name, "Unknown Album");

    let text = render_text(&result, &NumberFormatOptions::default());
    assert!(text.contains("Rejected Records: 1 of 3"), "{text}");
}

#[test]
fn malformed_file_is_skipped_and_listed() {
    let dir = scenario_dir();
    fs::write(
        dir.path().join("Streaming_History_Audio_2024_2.json"),
        "[{\"ts\": ",
    )
    .expect("write");

    let result = run(dir.path());
    assert_eq!(result.files_loaded, 2);
    assert_eq!(result.skipped_files.len(), 1);
    assert!(result.skipped_files[0].path.ends_with("Streaming_History_Audio_2024_2.json"));
    assert_eq!(result.total_ms, 950_000);
}

#[test]
fn account_export_is_analyzed_when_no_extended_files() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("StreamingHistory_music_0.json"),
        r#"[
            {"endTime": "2024-01-05 18:10", "artistName": "Joji", "trackName": "Run", "msPlayed": 120000},
            {"endTime": "2024-01-06 18:10", "artistName": "Joji", "trackName": "Run", "msPlayed": 60000}
        ]"#,
    )
    .expect("write");

    let result = run(dir.path());
    assert_eq!(result.source, "Account Data Streaming History");
    assert_eq!(result.total_ms, 180_000);
    assert_eq!(result.longest_streak.map(|s| s.days), Some(2));
    assert_eq!(result.top_albums[0].name, "Unknown Album");
}

#[test]
fn top_n_limits_rankings() {
    let dir = scenario_dir();
    let options = AnalysisOptions {
        top_n: 1,
        timezone: Tz::UTC,
    };
    let result = analyze_with(dir.path(), &options, &SourceRegistry::default()).expect("analysis");
    assert_eq!(result.top_artists.len(), 1);
    assert_eq!(result.top_tracks.len(), 1);
    assert_eq!(result.unique_tracks, 2);
}

#[test]
fn exported_file_reparses_to_the_same_result() {
    let dir = scenario_dir();
    let result = run(dir.path());

    let out = TempDir::new().expect("tempdir");
    let path = export(&result, out.path()).expect("export");

    let mut bytes = fs::read(&path).expect("read export");
    let parsed: AnalysisResult = simd_json::from_slice(&mut bytes).expect("parse export");
    assert_eq!(parsed, result);
}

#[test]
fn extreme_epoch_timestamp_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("Streaming_History_Audio_2024_0.json"),
        r#"[
            {"ts": -9223372036854775808, "ms_played": 1000,
             "master_metadata_track_name": "Run", "master_metadata_album_artist_name": "Joji"},
            {"ts": "2024-01-01T20:00:00Z", "ms_played": 2000,
             "master_metadata_track_name": "Run", "master_metadata_album_artist_name": "Joji"}
        ]"#,
    )
    .expect("write");

    let result = run(dir.path());
    assert_eq!(result.rejected_records, 1);
    assert_eq!(result.total_plays, 1);
    assert_eq!(result.total_ms, 2000);
}

#[test]
fn huge_durations_keep_totals_consistent() {
    let dir = TempDir::new().expect("tempdir");
    write_history(
        dir.path(),
        "Streaming_History_Audio_2024_0.json",
        &[
            r#"{"ts": "2024-01-01T20:00:00Z", "ms_played": 10000000000000000000,
                "master_metadata_track_name": "Run", "master_metadata_album_artist_name": "Joji"}"#
                .to_string(),
            r#"{"ts": "2024-01-01T20:30:00Z", "ms_played": 10000000000000000000,
                "master_metadata_track_name": "Run", "master_metadata_album_artist_name": "Joji"}"#
                .to_string(),
        ],
    );

    let result = run(dir.path());
    assert_eq!(result.rejected_records, 0);
    assert_eq!(result.total_ms, u64::MAX);
    assert_eq!(result.top_artists[0].total_ms, u64::MAX);
    assert_eq!(result.hourly_ms[20], u64::MAX);
    assert_eq!(result.weekday_ms[0], u64::MAX);
    assert_eq!(result.most_played_day.map(|d| d.total_ms), Some(u64::MAX));
}
