use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use super::model::{parse_date_strict, CellValue, ShotFrame, ShotRecord};
use super::season::{DataType, Season, SeasonIndex};
use crate::error::DataError;

/// Raw header holding the shooter's name.
pub const PLAYER_NAME_HEADER: &str = "PLAYER_NAME";

/// Value written to `season_type` for rows from the regular-season file.
pub const REGULAR_SEASON: &str = "Regular";
/// Value written to `season_type` for rows from the playoff file.
pub const PLAYOFFS: &str = "Playoffs";

/// Rows buffered per chunk when no configuration is supplied.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Streams one player's shots out of the season files an index points at.
#[derive(Debug, Clone, Copy)]
pub struct ShotLoader<'a> {
    index: &'a SeasonIndex,
    chunk_size: usize,
}

impl<'a> ShotLoader<'a> {
    pub fn new(index: &'a SeasonIndex, chunk_size: usize) -> Self {
        Self {
            index,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Load every shot `player_name` took in `season`, regular season first.
    ///
    /// An empty frame means nothing was found: unknown season, no shotdetail
    /// file, or no matching rows. Read failures on an existing file propagate.
    pub fn load(
        &self,
        season: Season,
        player_name: &str,
        include_playoffs: bool,
    ) -> Result<ShotFrame, DataError> {
        log::info!("Loading shots for {player_name} in {season}");
        let mut parts = Vec::new();

        match self.index.file_path(season, DataType::ShotDetail, false) {
            Some(path) => {
                let mut reg = load_player_from_file(path, player_name, self.chunk_size)?;
                if !reg.is_empty() {
                    log::info!("Regular season: {} shots from {}", reg.len(), path.display());
                    reg.fill_column("season_type", CellValue::String(REGULAR_SEASON.into()));
                    parts.push(reg);
                }
            }
            None => log::warn!("No regular season file found for {season}"),
        }

        if include_playoffs {
            match self.index.file_path(season, DataType::ShotDetail, true) {
                Some(path) => {
                    let mut po = load_player_from_file(path, player_name, self.chunk_size)?;
                    if !po.is_empty() {
                        log::info!("Playoffs: {} shots from {}", po.len(), path.display());
                        po.fill_column("season_type", CellValue::String(PLAYOFFS.into()));
                        parts.push(po);
                    }
                }
                None => log::debug!("No playoff file found for {season}"),
            }
        }

        if parts.is_empty() {
            log::info!("No shots found for {player_name} in {season}");
            return Ok(ShotFrame::default());
        }

        let frame = normalize(ShotFrame::concat(parts));
        if let Some((first, last)) = frame.date_range("game_date") {
            log::info!("Total loaded: {} shots, {first} to {last}", frame.len());
        }
        Ok(frame)
    }

    /// [`ShotLoader::load`] keyed by a `YYYY-YY` label. A malformed label is a
    /// lookup miss, not an error.
    pub fn load_label(
        &self,
        season_label: &str,
        player_name: &str,
        include_playoffs: bool,
    ) -> Result<ShotFrame, DataError> {
        match season_label.parse::<Season>() {
            Ok(season) => self.load(season, player_name, include_playoffs),
            Err(e) => {
                log::warn!("{e}");
                Ok(ShotFrame::default())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Chunked CSV reading
// ---------------------------------------------------------------------------

/// Rows of `player_name` from one file, in file order, raw column names.
pub fn load_player_from_file(
    path: &Path,
    player_name: &str,
    chunk_size: usize,
) -> Result<ShotFrame, DataError> {
    let reader = csv::Reader::from_path(path).map_err(|e| DataError::csv(path, e))?;
    read_rows(reader, Some(player_name), chunk_size).map_err(|e| DataError::csv(path, e))
}

/// Read a whole CSV into a frame without any row selection.
pub fn frame_from_reader<R: Read>(rdr: R) -> Result<ShotFrame, csv::Error> {
    read_rows(csv::Reader::from_reader(rdr), None, DEFAULT_CHUNK_SIZE)
}

/// Stream `reader` in chunks of `chunk_size` records, keeping the rows whose
/// player-name column equals `player` exactly (all rows when `None`).
fn read_rows<R: Read>(
    mut reader: csv::Reader<R>,
    player: Option<&str>,
    chunk_size: usize,
) -> Result<ShotFrame, csv::Error> {
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let player_idx = match player {
        Some(_) => match headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(PLAYER_NAME_HEADER))
        {
            Some(idx) => Some(idx),
            None => {
                log::warn!("No {PLAYER_NAME_HEADER} column; no rows can match");
                return Ok(ShotFrame::default());
            }
        },
        None => None,
    };

    let mut rows = Vec::new();
    let mut chunk: Vec<StringRecord> = Vec::with_capacity(chunk_size.min(DEFAULT_CHUNK_SIZE));
    let mut records = reader.into_records();
    loop {
        chunk.clear();
        for result in records.by_ref().take(chunk_size) {
            chunk.push(result?);
        }
        if chunk.is_empty() {
            break;
        }
        let matching = chunk.iter().filter(|rec| match (player_idx, player) {
            (Some(idx), Some(name)) => rec.get(idx) == Some(name),
            _ => true,
        });
        rows.extend(matching.map(|rec| record_to_row(&headers, rec)));
    }

    Ok(ShotFrame::new(headers, rows))
}

fn record_to_row(headers: &[String], record: &StringRecord) -> ShotRecord {
    ShotRecord {
        columns: headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), CellValue::guess(v)))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Normalisation
// ---------------------------------------------------------------------------

/// Lower-case column names, rename `loc_x`/`loc_y` to `x`/`y` and turn
/// `game_date` into real dates.
///
/// Dates are read as `YYYYMMDD`; if any value fails, the whole column is
/// re-read free-form. If that fails too the column is left as loaded.
pub fn normalize(mut frame: ShotFrame) -> ShotFrame {
    frame.lowercase_columns();
    frame.rename_column("loc_x", "x");
    frame.rename_column("loc_y", "y");

    if frame.has_column("game_date") {
        let strict = parse_date_column(&frame, |v| match v {
            CellValue::Date(d) => Some(*d),
            CellValue::Integer(i) => parse_date_strict(&i.to_string()),
            CellValue::String(s) => parse_date_strict(s),
            _ => None,
        });
        let parsed = strict.or_else(|| {
            log::debug!("game_date is not uniformly YYYYMMDD, trying free-form parsing");
            parse_date_column(&frame, CellValue::as_date)
        });
        match parsed {
            Some(values) => frame.set_column("game_date", values),
            None => log::warn!("Could not parse game_date column"),
        }
    }
    frame
}

fn parse_date_column<F>(frame: &ShotFrame, parse: F) -> Option<Vec<CellValue>>
where
    F: Fn(&CellValue) -> Option<chrono::NaiveDate>,
{
    frame
        .rows
        .iter()
        .map(|row| match row.columns.get("game_date") {
            None | Some(CellValue::Null) => Some(CellValue::Null),
            Some(v) => parse(v).map(CellValue::Date),
        })
        .collect()
}
