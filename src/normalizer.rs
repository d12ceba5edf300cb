use chrono::{DateTime, NaiveDateTime, Utc};
use simd_json::OwnedValue;
use simd_json::prelude::*;
use tracing::{debug, warn};

use crate::error::Rejection;
use crate::loader::LoadedFile;
use crate::sources::FieldMap;
use crate::types::{PlayEvent, UNKNOWN_ALBUM};

/// Integer epochs at or above this magnitude are milliseconds, below it seconds.
const EPOCH_MILLIS_THRESHOLD: u64 = 100_000_000_000;

const NAIVE_TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Events accepted from a set of loaded files plus the number of records
/// turned away.
#[derive(Debug, Default)]
pub struct Normalized {
    pub events: Vec<PlayEvent>,
    pub rejected: usize,
}

/// Turn one raw record into a play event, or say why it can't be one.
pub fn normalize_record(record: &OwnedValue, fields: &FieldMap) -> Result<PlayEvent, Rejection> {
    if !matches!(record, OwnedValue::Object(_)) {
        return Err(Rejection::NotAnObject);
    }

    let timestamp = field(record, fields.timestamp)
        .ok_or(Rejection::MissingField(fields.timestamp))
        .and_then(parse_timestamp)?;
    let ms_played = field(record, fields.ms_played)
        .ok_or(Rejection::MissingField(fields.ms_played))
        .and_then(parse_duration)?;
    let artist = text_field(record, fields.artist).ok_or(Rejection::MissingField(fields.artist))?;
    let track = text_field(record, fields.track).ok_or(Rejection::MissingField(fields.track))?;
    let album = fields
        .album
        .and_then(|key| text_field(record, key))
        .unwrap_or_else(|| UNKNOWN_ALBUM.to_string());

    Ok(PlayEvent {
        timestamp,
        artist,
        track,
        album,
        ms_played,
    })
}

/// Normalize every record of every file, in file order.
pub fn normalize_files(files: &[LoadedFile], fields: &FieldMap) -> Normalized {
    let mut normalized = Normalized::default();

    for file in files {
        let mut rejected_here = 0usize;
        for (index, record) in file.records.iter().enumerate() {
            match normalize_record(record, fields) {
                Ok(event) => normalized.events.push(event),
                Err(reason) => {
                    debug!(file = %file.path.display(), index, %reason, "rejected record");
                    rejected_here += 1;
                }
            }
        }

        if rejected_here > 0 {
            warn!(
                file = %file.path.display(),
                rejected = rejected_here,
                "records rejected while normalizing"
            );
        }
        normalized.rejected += rejected_here;
    }

    normalized
}

/// Missing and `null` are treated alike.
fn field<'a>(record: &'a OwnedValue, key: &str) -> Option<&'a OwnedValue> {
    record.get(key).filter(|v| !v.is_null())
}

fn text_field(record: &OwnedValue, key: &str) -> Option<String> {
    field(record, key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn parse_timestamp(value: &OwnedValue) -> Result<DateTime<Utc>, Rejection> {
    let parsed = if let Some(text) = value.as_str() {
        parse_timestamp_str(text)
    } else if let Some(n) = value.as_i64() {
        from_epoch(n)
    } else {
        None
    };

    parsed.ok_or_else(|| {
        Rejection::InvalidTimestamp(
            value
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| simd_json::to_string(value).unwrap_or_default()),
        )
    })
}

pub fn parse_timestamp_str(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn from_epoch(n: i64) -> Option<DateTime<Utc>> {
    if n.unsigned_abs() >= EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(n)
    } else {
        DateTime::from_timestamp(n, 0)
    }
}

pub fn parse_duration(value: &OwnedValue) -> Result<u64, Rejection> {
    if let Some(n) = value.as_i64() {
        return u64::try_from(n).map_err(|_| Rejection::NegativeDuration(n));
    }
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    if let Some(f) = value.as_f64() {
        if !f.is_finite() || f.fract() != 0.0 {
            return Err(Rejection::InvalidDuration);
        }
        if f < 0.0 {
            return Err(Rejection::NegativeDuration(f as i64));
        }
        return Ok(f as u64);
    }
    Err(Rejection::InvalidDuration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{AccountHistory, ExtendedHistory, HistorySource};
    use chrono::TimeZone;

    fn value(json: &str) -> OwnedValue {
        let mut bytes = json.as_bytes().to_vec();
        simd_json::from_slice(&mut bytes).expect("valid json")
    }

    fn extended() -> FieldMap {
        ExtendedHistory.field_map()
    }

    #[test]
    fn normalizes_extended_record() {
        let record = value(
            r#"{
                "ts": "2024-01-01T20:00:00Z",
                "ms_played": 400000,
                "master_metadata_track_name": "Run",
                "master_metadata_album_artist_name": "Joji",
                "master_metadata_album_album_name": "Nectar",
                "spotify_track_uri": "spotify:track:xyz"
            }"#,
        );

        let event = normalize_record(&record, &extended()).expect("accepted");
        assert_eq!(event.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap());
        assert_eq!(event.artist, "Joji");
        assert_eq!(event.track, "Run");
        assert_eq!(event.album, "Nectar");
        assert_eq!(event.ms_played, 400_000);
    }

    #[test]
    fn normalizes_account_record_without_album() {
        let record = value(
            r#"{"endTime": "2023-06-30 23:59", "artistName": "Joji", "trackName": "Glimpse of Us", "msPlayed": 233000}"#,
        );

        let event = normalize_record(&record, &AccountHistory.field_map()).expect("accepted");
        assert_eq!(event.timestamp, Utc.with_ymd_and_hms(2023, 6, 30, 23, 59, 0).unwrap());
        assert_eq!(event.album, UNKNOWN_ALBUM);
    }

    #[test]
    fn null_album_becomes_sentinel() {
        let record = value(
            r#"{"ts": "2024-01-01T20:00:00Z", "ms_played": 1, "master_metadata_track_name": "Run",
                "master_metadata_album_artist_name": "Joji", "master_metadata_album_album_name": null}"#,
        );
        let event = normalize_record(&record, &extended()).expect("accepted");
        assert_eq!(event.album, UNKNOWN_ALBUM);
    }

    #[test]
    fn rejects_negative_duration() {
        let record = value(
            r#"{"ts": "2024-01-01T20:00:00Z", "ms_played": -5, "master_metadata_track_name": "Run",
                "master_metadata_album_artist_name": "Joji"}"#,
        );
        assert_eq!(
            normalize_record(&record, &extended()),
            Err(Rejection::NegativeDuration(-5))
        );
    }

    #[test]
    fn rejects_non_numeric_duration() {
        let record = value(
            r#"{"ts": "2024-01-01T20:00:00Z", "ms_played": "lots", "master_metadata_track_name": "Run",
                "master_metadata_album_artist_name": "Joji"}"#,
        );
        assert_eq!(
            normalize_record(&record, &extended()),
            Err(Rejection::InvalidDuration)
        );
    }

    #[test]
    fn rejects_missing_or_bad_timestamp() {
        let missing = value(
            r#"{"ms_played": 5, "master_metadata_track_name": "Run", "master_metadata_album_artist_name": "Joji"}"#,
        );
        assert_eq!(
            normalize_record(&missing, &extended()),
            Err(Rejection::MissingField("ts"))
        );

        let garbage = value(
            r#"{"ts": "yesterday", "ms_played": 5, "master_metadata_track_name": "Run",
                "master_metadata_album_artist_name": "Joji"}"#,
        );
        assert_eq!(
            normalize_record(&garbage, &extended()),
            Err(Rejection::InvalidTimestamp("yesterday".to_string()))
        );
    }

    #[test]
    fn rejects_podcast_records_without_track_metadata() {
        let record = value(
            r#"{"ts": "2024-01-01T20:00:00Z", "ms_played": 5000, "master_metadata_track_name": null,
                "master_metadata_album_artist_name": null, "episode_name": "Ep. 1"}"#,
        );
        assert_eq!(
            normalize_record(&record, &extended()),
            Err(Rejection::MissingField("master_metadata_album_artist_name"))
        );
    }

    #[test]
    fn rejects_non_objects() {
        assert_eq!(
            normalize_record(&value("[1, 2]"), &extended()),
            Err(Rejection::NotAnObject)
        );
    }

    #[test]
    fn epoch_timestamps_in_seconds_and_millis() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(
            parse_timestamp(&OwnedValue::from(1_704_139_200i64)),
            Ok(expected)
        );
        assert_eq!(
            parse_timestamp(&OwnedValue::from(1_704_139_200_000i64)),
            Ok(expected)
        );
    }

    #[test]
    fn out_of_range_epochs_are_rejected() {
        for n in [i64::MIN, i64::MAX] {
            assert!(matches!(
                parse_timestamp(&OwnedValue::from(n)),
                Err(Rejection::InvalidTimestamp(_))
            ));
        }

        let record = value(
            r#"{
                "ts": -9223372036854775808,
                "ms_played": 1000,
                "master_metadata_track_name": "Run",
                "master_metadata_album_artist_name": "Joji"
            }"#,
        );
        assert!(matches!(
            normalize_record(&record, &extended()),
            Err(Rejection::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn offset_timestamps_are_converted_to_utc() {
        assert_eq!(
            parse_timestamp_str("2024-01-01T21:00:00+01:00"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap())
        );
    }

    #[test]
    fn whole_float_durations_are_accepted() {
        assert_eq!(parse_duration(&OwnedValue::from(1500.0f64)), Ok(1500));
        assert_eq!(
            parse_duration(&OwnedValue::from(1500.5f64)),
            Err(Rejection::InvalidDuration)
        );
    }
}
