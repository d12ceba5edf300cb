use std::path::Path;

use chrono_tz::Tz;
use tracing::info;

use crate::aggregator::aggregate;
use crate::error::LoadError;
use crate::loader;
use crate::milestones;
use crate::normalizer::normalize_files;
use crate::sources::SourceRegistry;
use crate::types::{AnalysisResult, DayBucket, PlayEvent, SkippedFile, TimePeriod};
use crate::utils::local_timezone;

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Length of the artist, track and album rankings
    pub top_n: usize,
    /// Timezone used for hour, weekday and calendar-day buckets
    pub timezone: Tz,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            timezone: local_timezone(),
        }
    }
}

/// What happened while loading, carried into the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub source: String,
    pub files_loaded: usize,
    pub skipped_files: Vec<SkippedFile>,
    pub total_records: usize,
    pub rejected_records: usize,
}

/// Analyze the history files in `dir` with default options.
pub fn analyze(dir: &Path) -> Result<AnalysisResult, LoadError> {
    analyze_with(dir, &AnalysisOptions::default(), &SourceRegistry::default())
}

pub fn analyze_with(
    dir: &Path,
    options: &AnalysisOptions,
    registry: &SourceRegistry,
) -> Result<AnalysisResult, LoadError> {
    let discovery = loader::discover(dir, registry)?;
    let outcome = loader::load(&discovery);
    let normalized = normalize_files(&outcome.files, &discovery.source.field_map());

    let summary = LoadSummary {
        source: discovery.source.display_name().to_string(),
        files_loaded: outcome.files.len(),
        skipped_files: outcome
            .skipped
            .iter()
            .map(|e| SkippedFile {
                path: e.path().display().to_string(),
                reason: e.to_string(),
            })
            .collect(),
        total_records: outcome.record_count(),
        rejected_records: normalized.rejected,
    };

    info!(
        events = normalized.events.len(),
        rejected = normalized.rejected,
        "normalized play events"
    );

    Ok(summarize(&normalized.events, options, summary))
}

/// Aggregate events and derive every ranking and milestone.
pub fn summarize(events: &[PlayEvent], options: &AnalysisOptions, load: LoadSummary) -> AnalysisResult {
    let agg = aggregate(events, options.timezone);
    let active_days = milestones::active_dates(&agg.daily_ms).len();
    let most_active_hour = milestones::most_active_hour(&agg.hourly_ms);

    AnalysisResult {
        source: load.source,
        timezone: options.timezone.name().to_string(),

        files_loaded: load.files_loaded,
        skipped_files: load.skipped_files,
        total_records: load.total_records,
        rejected_records: load.rejected_records,
        total_plays: agg.plays,

        total_ms: agg.total_ms,
        total_minutes: milestones::total_minutes(agg.total_ms),
        active_days,
        average_daily_minutes: milestones::average_daily_minutes(agg.total_ms, active_days),
        unique_tracks: agg.tracks.len(),

        top_artists: milestones::top_k(&agg.artists, options.top_n),
        top_tracks: milestones::top_k(&agg.tracks, options.top_n),
        top_albums: milestones::top_k(&agg.albums, options.top_n),

        hourly_ms: agg.hourly_ms,
        weekday_ms: agg.weekday_ms,
        daily: agg
            .daily_ms
            .iter()
            .map(|(&date, &total_ms)| DayBucket { date, total_ms })
            .collect(),

        most_active_hour,
        time_period: most_active_hour.map(|h| TimePeriod::from_hour(h.hour)),
        most_active_weekdays: milestones::most_active_weekdays(&agg.weekday_ms),
        longest_streak: milestones::longest_streak(&agg.daily_ms),
        most_played_day: milestones::most_played_day(&agg.daily_ms),
    }
}
