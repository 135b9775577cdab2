use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::model::parse_date_strict;
use crate::config::AnalyzerConfig;
use crate::error::DataError;

/// Raw header of the game-date column in shotdetail files.
pub const GAME_DATE_HEADER: &str = "GAME_DATE";

/// Share of sampled dates that must fall inside the season window for a
/// mapping to be considered correct.
const VERIFY_THRESHOLD: f64 = 0.8;

// ---------------------------------------------------------------------------
// DataType – the family a raw file belongs to
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    ShotDetail,
    NbaStats,
    DataNba,
    PbpStats,
    Matchups,
}

impl DataType {
    pub const ALL: [DataType; 5] = [
        DataType::ShotDetail,
        DataType::NbaStats,
        DataType::DataNba,
        DataType::PbpStats,
        DataType::Matchups,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::ShotDetail => "shotdetail",
            DataType::NbaStats => "nbastats",
            DataType::DataNba => "datanba",
            DataType::PbpStats => "pbpstats",
            DataType::Matchups => "matchups",
        }
    }

    pub fn from_token(token: &str) -> Option<DataType> {
        DataType::ALL.into_iter().find(|t| t.as_str() == token)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Season – "YYYY-YY", keyed by the year it starts in
// ---------------------------------------------------------------------------

/// An NBA season, identified by the calendar year its October tip-off falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Season {
    pub start_year: i32,
}

impl Season {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    /// Season whose label ends in `end_year` (`2023` → `2022-23`).
    pub fn ending_in(end_year: i32) -> Self {
        Self::new(end_year - 1)
    }

    /// Season a game date belongs to: October onwards opens a new season.
    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= 10 {
            Self::new(date.year())
        } else {
            Self::new(date.year() - 1)
        }
    }

    /// Expected span of the season: Oct 1 to Jun 30 of the following year.
    pub fn window(self) -> DateRange {
        DateRange {
            first: NaiveDate::from_ymd_opt(self.start_year, 10, 1).unwrap_or(NaiveDate::MIN),
            last: NaiveDate::from_ymd_opt(self.start_year + 1, 6, 30).unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn label(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.start_year, (self.start_year + 1).rem_euclid(100))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid season label '{0}', expected YYYY-YY")]
pub struct SeasonParseError(String);

impl FromStr for Season {
    type Err = SeasonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || SeasonParseError(s.to_string());
        let (start, end) = s.trim().split_once('-').ok_or_else(err)?;
        let start_year: i32 = start.parse().map_err(|_| err())?;
        let end_suffix: i32 = end.parse().map_err(|_| err())?;
        if end.len() != 2 || end_suffix != (start_year + 1).rem_euclid(100) {
            return Err(err());
        }
        Ok(Season::new(start_year))
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.to_string()
    }
}

impl TryFrom<String> for Season {
    type Error = SeasonParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// File records
// ---------------------------------------------------------------------------

/// Inclusive span of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    pub fn contains_range(&self, other: &DateRange) -> bool {
        self.contains(other.first) && self.contains(other.last)
    }
}

/// Slot of a file inside a season: data type plus regular/playoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileRole {
    pub data_type: DataType,
    pub playoff: bool,
}

impl FileRole {
    pub fn new(data_type: DataType, playoff: bool) -> Self {
        Self { data_type, playoff }
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.data_type, if self.playoff { "po" } else { "reg" })
    }
}

/// Pieces of a `{data_type}[_po]_{year}.csv` file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedFileName {
    pub data_type: DataType,
    pub playoff: bool,
    pub year: i32,
}

/// Parse a raw file name. `None` for anything that is not a recognised,
/// numerically-dated CSV.
pub fn parse_filename(filename: &str) -> Option<ParsedFileName> {
    let stem = filename.strip_suffix(".csv")?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 2 {
        return None;
    }
    let year_token = parts[parts.len() - 1];
    if year_token.is_empty() || !year_token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let data_type = DataType::from_token(parts[0])?;
    Some(ParsedFileName {
        data_type,
        playoff: parts.contains(&"po"),
        year: year_token.parse().ok()?,
    })
}

/// One discovered CSV artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFileRecord {
    pub filename: String,
    pub path: PathBuf,
    pub data_type: DataType,
    pub is_playoff: bool,
    /// Season read from the file's own dates; only set for shotdetail files.
    pub detected_season: Option<Season>,
    /// Dates spanned by the sampled rows that produced `detected_season`.
    pub sample_range: Option<DateRange>,
}

impl RawFileRecord {
    pub fn role(&self) -> FileRole {
        FileRole::new(self.data_type, self.is_playoff)
    }

    /// Whether the sampled dates lie inside the detected season's window.
    /// `None` for records that were not content-inspected.
    pub fn fits_season_window(&self) -> Option<bool> {
        let season = self.detected_season?;
        let range = self.sample_range?;
        Some(season.window().contains_range(&range))
    }
}

// ---------------------------------------------------------------------------
// Content inspection
// ---------------------------------------------------------------------------

/// Read up to `sample_rows` game dates from a shotdetail file and derive its
/// season from the earliest one.
///
/// Any failure (unreadable file, missing column, no parseable dates) yields
/// `None`; the file is then left out of the index.
pub fn detect_season(path: &Path, sample_rows: usize) -> Option<(Season, DateRange)> {
    let dates = match sample_game_dates(path, sample_rows) {
        Ok(Some(dates)) => dates,
        Ok(None) => {
            log::warn!("{}: no {GAME_DATE_HEADER} column", path.display());
            return None;
        }
        Err(e) => {
            log::warn!("Error detecting season: {e}");
            return None;
        }
    };

    let first = dates.iter().min().copied()?;
    let last = dates.iter().max().copied()?;
    let range = DateRange { first, last };
    let season = Season::containing(first);

    if !season.window().contains_range(&range) {
        log::warn!(
            "{}: date range {first} to {last} doesn't fit expected season {season}; keeping it as a partial season",
            path.display()
        );
    }
    Some((season, range))
}

/// Parsed dates from the first `sample_rows` rows. `Ok(None)` when the file
/// has no game-date column; unparseable values are dropped.
fn sample_game_dates(path: &Path, sample_rows: usize) -> Result<Option<Vec<NaiveDate>>, DataError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::csv(path, e))?;
    let headers = reader.headers().map_err(|e| DataError::csv(path, e))?.clone();
    let Some(date_idx) = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(GAME_DATE_HEADER))
    else {
        return Ok(None);
    };

    let mut dates = Vec::new();
    for result in reader.records().take(sample_rows) {
        let record = result.map_err(|e| DataError::csv(path, e))?;
        if let Some(date) = record.get(date_idx).and_then(parse_date_strict) {
            dates.push(date);
        }
    }
    Ok(Some(dates))
}

/// Outcome of re-checking a season's regular shotdetail file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonVerification {
    pub season: Season,
    pub filename: String,
    pub sampled: DateRange,
    pub expected: DateRange,
    pub in_window: usize,
    pub total: usize,
}

impl SeasonVerification {
    pub fn match_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.in_window as f64 / self.total as f64
        }
    }

    pub fn looks_correct(&self) -> bool {
        self.match_ratio() > VERIFY_THRESHOLD
    }
}

// ---------------------------------------------------------------------------
// SeasonIndex
// ---------------------------------------------------------------------------

/// Season → file role → file. Built once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SeasonIndex {
    data_dir: Option<PathBuf>,
    seasons: BTreeMap<Season, BTreeMap<FileRole, RawFileRecord>>,
}

impl SeasonIndex {
    /// Index with no files, used when the data directory is unavailable.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve the data directory from `config` and scan it.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        match config.resolve_data_dir() {
            Some(dir) => Self::scan(&dir, config.season_sample_rows),
            None => Self::empty(),
        }
    }

    /// Scan `dir` for CSV files and build the index.
    ///
    /// Shotdetail files are dated by their content; every other type takes
    /// its season from the file-name year, read as the season's end year.
    pub fn scan(dir: &Path, sample_rows: usize) -> Self {
        let mut index = SeasonIndex {
            data_dir: Some(dir.to_path_buf()),
            seasons: BTreeMap::new(),
        };

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("Data directory not readable: {}: {e}", dir.display());
                index.data_dir = None;
                return index;
            }
        };

        let mut csv_files: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name.ends_with(".csv"))
            .collect();
        csv_files.sort();
        log::info!("Processing {} CSV files in {}", csv_files.len(), dir.display());

        let parsed: Vec<(String, ParsedFileName)> = csv_files
            .into_iter()
            .filter_map(|name| match parse_filename(&name) {
                Some(p) => Some((name, p)),
                None => {
                    log::debug!("Skipping {name}: not a {{type}}[_po]_{{year}}.csv file");
                    None
                }
            })
            .collect();

        for (filename, p) in parsed.iter().filter(|(_, p)| p.data_type == DataType::ShotDetail) {
            let path = dir.join(filename);
            let Some((season, range)) = detect_season(&path, sample_rows) else {
                log::warn!("Excluding {filename}: season could not be detected");
                continue;
            };
            log::info!("{filename} -> {season}");
            index.insert_detected(
                season,
                RawFileRecord {
                    filename: filename.clone(),
                    path,
                    data_type: p.data_type,
                    is_playoff: p.playoff,
                    detected_season: Some(season),
                    sample_range: Some(range),
                },
            );
        }

        for (filename, p) in parsed.iter().filter(|(_, p)| p.data_type != DataType::ShotDetail) {
            index.insert_from_filename(
                Season::ending_in(p.year),
                RawFileRecord {
                    filename: filename.clone(),
                    path: dir.join(filename),
                    data_type: p.data_type,
                    is_playoff: p.playoff,
                    detected_season: None,
                    sample_range: None,
                },
            );
        }

        log::info!("Metadata built for {} seasons", index.seasons.len());
        for (season, roles) in &index.seasons {
            let shots = roles
                .get(&FileRole::new(DataType::ShotDetail, false))
                .map_or("Not found", |r| r.filename.as_str());
            log::debug!("  {season}: {shots}");
        }
        index
    }

    /// Record a content-dated file. Replaces filename-derived entries for the
    /// same slot, never another content-dated one.
    pub fn insert_detected(&mut self, season: Season, record: RawFileRecord) {
        let slot = self.seasons.entry(season).or_default();
        match slot.get(&record.role()) {
            Some(existing) if existing.detected_season.is_some() => {
                log::warn!(
                    "{season} {}: keeping {}, ignoring {}",
                    record.role(),
                    existing.filename,
                    record.filename
                );
            }
            _ => {
                slot.insert(record.role(), record);
            }
        }
    }

    /// Record a filename-dated file unless the slot is already taken.
    pub fn insert_from_filename(&mut self, season: Season, record: RawFileRecord) {
        self.seasons
            .entry(season)
            .or_default()
            .entry(record.role())
            .or_insert(record);
    }

    /// Directory the index was built from, if it could be read.
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    /// All known seasons, most recent first.
    pub fn available_seasons(&self) -> Vec<Season> {
        self.seasons.keys().rev().copied().collect()
    }

    pub fn get(&self, season: Season, role: FileRole) -> Option<&RawFileRecord> {
        self.seasons.get(&season)?.get(&role)
    }

    pub fn file_path(&self, season: Season, data_type: DataType, playoff: bool) -> Option<&Path> {
        self.get(season, FileRole::new(data_type, playoff))
            .map(|r| r.path.as_path())
    }

    /// Every file recorded for a season.
    pub fn files(&self, season: Season) -> impl Iterator<Item = &RawFileRecord> {
        self.seasons.get(&season).into_iter().flat_map(|m| m.values())
    }

    /// Whether a regular-season file of each data type exists.
    pub fn availability(&self, season: Season) -> BTreeMap<DataType, bool> {
        DataType::ALL
            .into_iter()
            .map(|t| (t, self.file_path(season, t, false).is_some()))
            .collect()
    }

    /// Re-sample the regular shotdetail file and count how many dates fall in
    /// the season window. `Ok(None)` when there is nothing to check.
    pub fn verify_season(
        &self,
        season: Season,
        sample_rows: usize,
    ) -> Result<Option<SeasonVerification>, DataError> {
        let Some(record) = self.get(season, FileRole::new(DataType::ShotDetail, false)) else {
            log::warn!("No shotdetail file found for {season}");
            return Ok(None);
        };
        let Some(dates) = sample_game_dates(&record.path, sample_rows)? else {
            return Ok(None);
        };
        let (Some(first), Some(last)) = (dates.iter().min().copied(), dates.iter().max().copied()) else {
            return Ok(None);
        };

        let expected = season.window();
        let verification = SeasonVerification {
            season,
            filename: record.filename.clone(),
            sampled: DateRange { first, last },
            expected,
            in_window: dates.iter().filter(|d| expected.contains(**d)).count(),
            total: dates.len(),
        };
        log::info!(
            "Verification for {season}: {}/{} dates in window ({:.1}%)",
            verification.in_window,
            verification.total,
            verification.match_ratio() * 100.0
        );
        Ok(Some(verification))
    }
}
