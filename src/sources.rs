/// JSON keys a history format uses for the fields of a play event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
    pub timestamp: &'static str,
    pub artist: &'static str,
    pub track: &'static str,
    /// `None` for formats that never record the album.
    pub album: Option<&'static str>,
    pub ms_played: &'static str,
}

/// An export format of streaming history files.
pub trait HistorySource: Send + Sync {
    /// Get the display name for this format
    fn display_name(&self) -> &'static str;

    /// File name prefix of the history files, matched case-sensitively
    fn file_prefix(&self) -> &'static str;

    fn file_suffix(&self) -> &'static str {
        ".json"
    }

    /// Field names used inside each record
    fn field_map(&self) -> FieldMap;

    /// Check whether a file name belongs to this format
    fn matches(&self, file_name: &str) -> bool {
        let prefix = self.file_prefix();
        let suffix = self.file_suffix();
        file_name.len() >= prefix.len() + suffix.len()
            && file_name.starts_with(prefix)
            && file_name.ends_with(suffix)
    }

    /// Human readable file pattern, e.g. `Streaming_History_Audio_*.json`
    fn pattern(&self) -> String {
        format!("{}*{}", self.file_prefix(), self.file_suffix())
    }
}

/// "Extended streaming history" export: one file per year range, ISO
/// timestamps, album metadata.
pub struct ExtendedHistory;

impl HistorySource for ExtendedHistory {
    fn display_name(&self) -> &'static str {
        "Extended Streaming History"
    }

    fn file_prefix(&self) -> &'static str {
        "Streaming_History_Audio_"
    }

    fn field_map(&self) -> FieldMap {
        FieldMap {
            timestamp: "ts",
            artist: "master_metadata_album_artist_name",
            track: "master_metadata_track_name",
            album: Some("master_metadata_album_album_name"),
            ms_played: "ms_played",
        }
    }
}

/// The shorter "account data" export covering the last year.
pub struct AccountHistory;

impl HistorySource for AccountHistory {
    fn display_name(&self) -> &'static str {
        "Account Data Streaming History"
    }

    fn file_prefix(&self) -> &'static str {
        "StreamingHistory_music_"
    }

    fn field_map(&self) -> FieldMap {
        FieldMap {
            timestamp: "endTime",
            artist: "artistName",
            track: "trackName",
            album: None,
            ms_played: "msPlayed",
        }
    }
}

/// Registry of known history formats, in detection priority order.
pub struct SourceRegistry {
    sources: Vec<Box<dyn HistorySource>>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(ExtendedHistory);
        registry.register(AccountHistory);
        registry
    }
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: HistorySource + 'static>(&mut self, source: S) {
        self.sources.push(Box::new(source));
    }

    pub fn sources(&self) -> impl Iterator<Item = &dyn HistorySource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    pub fn get_by_display_name(&self, display_name: &str) -> Option<&dyn HistorySource> {
        self.sources()
            .find(|s| s.display_name().eq_ignore_ascii_case(display_name))
    }

    /// All file patterns, joined for error messages
    pub fn patterns(&self) -> String {
        self.sources()
            .map(|s| s.pattern())
            .collect::<Vec<_>>()
            .join(" or ")
    }
}
