use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use chrono::{Datelike, NaiveDate, Timelike};
use chrono_tz::Tz;

use crate::types::{EntityTotal, PlayEvent};

/// Insert-or-update table that remembers first-encounter order.
#[derive(Debug, Clone)]
struct EntityTable<K> {
    index: HashMap<K, usize>,
    entries: Vec<EntityTotal>,
}

impl<K: Hash + Eq> EntityTable<K> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn add(
        &mut self,
        key: K,
        make: impl FnOnce() -> (String, Option<String>),
        ms: u64,
        seq: usize,
    ) {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                let (name, artist) = make();
                self.entries.push(EntityTotal {
                    name,
                    artist,
                    total_ms: 0,
                    plays: 0,
                    first_seen: seq,
                });
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[slot];
        entry.total_ms = entry.total_ms.saturating_add(ms);
        entry.plays += 1;
    }
}

/// Owned accumulator for a single analysis run. Events are folded in one at
/// a time; `finish` hands back the immutable totals.
#[derive(Debug, Clone)]
pub struct Accumulator {
    tz: Tz,
    seq: usize,
    artists: EntityTable<String>,
    tracks: EntityTable<(String, String)>,
    albums: EntityTable<String>,
    hourly_ms: [u64; 24],
    weekday_ms: [u64; 7],
    daily_ms: BTreeMap<NaiveDate, u64>,
    total_ms: u64,
}

/// Per-entity and per-bucket totals. Entity lists are in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregates {
    pub artists: Vec<EntityTotal>,
    pub tracks: Vec<EntityTotal>,
    pub albums: Vec<EntityTotal>,
    pub hourly_ms: [u64; 24],
    pub weekday_ms: [u64; 7],
    pub daily_ms: BTreeMap<NaiveDate, u64>,
    pub total_ms: u64,
    pub plays: u64,
}

impl Accumulator {
    /// Hours, weekdays and dates are taken in `tz`.
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            seq: 0,
            artists: EntityTable::new(),
            tracks: EntityTable::new(),
            albums: EntityTable::new(),
            hourly_ms: [0; 24],
            weekday_ms: [0; 7],
            daily_ms: BTreeMap::new(),
            total_ms: 0,
        }
    }

    pub fn add(&mut self, event: &PlayEvent) {
        let ms = event.ms_played;
        let seq = self.seq;
        self.seq += 1;

        self.artists
            .add(event.artist.clone(), || (event.artist.clone(), None), ms, seq);
        self.tracks.add(
            (event.track.clone(), event.artist.clone()),
            || (event.track.clone(), Some(event.artist.clone())),
            ms,
            seq,
        );
        self.albums
            .add(event.album.clone(), || (event.album.clone(), None), ms, seq);

        let local = event.timestamp.with_timezone(&self.tz);
        let hour = &mut self.hourly_ms[local.hour() as usize];
        *hour = hour.saturating_add(ms);
        let weekday = &mut self.weekday_ms[local.weekday().num_days_from_monday() as usize];
        *weekday = weekday.saturating_add(ms);
        let day = self.daily_ms.entry(local.date_naive()).or_insert(0);
        *day = day.saturating_add(ms);
        self.total_ms = self.total_ms.saturating_add(ms);
    }

    pub fn finish(self) -> Aggregates {
        Aggregates {
            artists: self.artists.entries,
            tracks: self.tracks.entries,
            albums: self.albums.entries,
            hourly_ms: self.hourly_ms,
            weekday_ms: self.weekday_ms,
            daily_ms: self.daily_ms,
            total_ms: self.total_ms,
            plays: self.seq as u64,
        }
    }
}

/// Fold a whole event sequence.
pub fn aggregate(events: &[PlayEvent], tz: Tz) -> Aggregates {
    let mut acc = Accumulator::new(tz);
    for event in events {
        acc.add(event);
    }
    acc.finish()
}
