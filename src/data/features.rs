//! Per-shot context columns derived from a player's loaded shots.
//!
//! `game_num` and `rest_days` are computed from the schedule. The three
//! `estimated_*` columns are seeded simulations standing in for data the raw
//! files do not carry (score, playing time, team form); they are
//! reproducible but are not historical fact.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use super::model::{CellValue, ShotFrame, ShotRecord};

pub const GAME_NUM: &str = "game_num";
pub const REST_DAYS: &str = "rest_days";
pub const ESTIMATED_MARGIN: &str = "estimated_margin";
pub const ESTIMATED_MINUTES: &str = "estimated_minutes";
pub const ESTIMATED_STREAK: &str = "estimated_streak";

/// Derived columns that are simulated rather than computed from the data.
pub const HEURISTIC_COLUMNS: [&str; 3] = [ESTIMATED_MARGIN, ESTIMATED_MINUTES, ESTIMATED_STREAK];

const MARGIN_STD: f64 = 8.0;
const LATE_GAME_MARGIN_SCALE: f64 = 0.7;
const STREAK_CONTINUE_P: f64 = 0.55;
const STREAK_WIN_P: f64 = 0.6;
const STREAK_CAP: i64 = 8;
const FALLBACK_STREAKS: [i64; 7] = [-3, -2, -1, 0, 1, 2, 3];
const FALLBACK_STREAK_WEIGHTS: [f64; 7] = [0.1, 0.15, 0.2, 0.3, 0.2, 0.15, 0.1];

// ---------------------------------------------------------------------------
// Random source
// ---------------------------------------------------------------------------

/// Hands out generators for the simulated features.
///
/// Every stochastic feature asks for a fresh generator, so each one starts
/// from the same state no matter which features ran before it.
pub trait RngFactory {
    type Rng: RngCore;

    fn fresh(&self) -> Self::Rng;
}

/// ChaCha8 seeded with a fixed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededRng {
    pub seed: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl RngFactory for SeededRng {
    type Rng = ChaCha8Rng;

    fn fresh(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Adds the five derived columns to a player's shot frame.
#[derive(Debug, Clone)]
pub struct FeaturePipeline<F = SeededRng> {
    rng: F,
}

impl FeaturePipeline<SeededRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(SeededRng::new(seed))
    }
}

impl<F: RngFactory> FeaturePipeline<F> {
    pub fn new(rng: F) -> Self {
        Self { rng }
    }

    /// Recompute every derived column for `frame`.
    ///
    /// Each feature degrades on its own when its inputs are missing; nothing
    /// here fails the whole run.
    pub fn enrich(&self, frame: &mut ShotFrame) {
        if frame.is_empty() {
            return;
        }
        // Stale values from an earlier shot set must not survive.
        for col in [GAME_NUM, REST_DAYS] {
            frame.remove_column(col);
        }

        match schedule(frame) {
            Some(schedule) => {
                add_game_numbers(frame, &schedule);
                add_rest_days(frame, &schedule);
            }
            None => log::warn!("No game_date column; game_num and rest_days not derived"),
        }
        add_margin_estimate(frame, &mut self.rng.fresh());
        add_minutes_estimate(frame, &mut self.rng.fresh());
        add_streak_estimate(frame, &mut self.rng.fresh());
    }
}

// ---------------------------------------------------------------------------
// Schedule-based features
// ---------------------------------------------------------------------------

/// Distinct games in chronological order, keyed by the value rows are
/// matched on: the game id when present, otherwise the date itself.
struct Schedule {
    key_column: &'static str,
    games: Vec<(CellValue, Option<NaiveDate>)>,
}

fn schedule(frame: &ShotFrame) -> Option<Schedule> {
    if !frame.has_column("game_date") {
        return None;
    }

    if frame.has_column("game_id") {
        let mut first_date: BTreeMap<CellValue, Option<NaiveDate>> = BTreeMap::new();
        for row in &frame.rows {
            if let Some(id) = row.get("game_id") {
                first_date
                    .entry(id.clone())
                    .or_insert_with(|| row.get_date("game_date"));
            }
        }
        let mut games: Vec<(CellValue, Option<NaiveDate>)> = first_date.into_iter().collect();
        // Undated games go last; same-day games by id.
        games.sort_by(|(id_a, d_a), (id_b, d_b)| match (d_a, d_b) {
            (Some(a), Some(b)) => a.cmp(b).then_with(|| id_a.cmp(id_b)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => id_a.cmp(id_b),
        });
        Some(Schedule {
            key_column: "game_id",
            games,
        })
    } else {
        let mut dates: Vec<NaiveDate> = frame
            .rows
            .iter()
            .filter_map(|r| r.get_date("game_date"))
            .collect();
        dates.sort_unstable();
        dates.dedup();
        Some(Schedule {
            key_column: "game_date",
            games: dates
                .into_iter()
                .map(|d| (CellValue::Date(d), Some(d)))
                .collect(),
        })
    }
}

impl Schedule {
    fn key_of(&self, row: &ShotRecord) -> Option<CellValue> {
        match self.key_column {
            "game_date" => row.get_date("game_date").map(CellValue::Date),
            col => row.get(col).cloned(),
        }
    }

    /// Write one value per game onto every shot of that game.
    fn broadcast(&self, frame: &mut ShotFrame, column: &str, per_game: HashMap<CellValue, CellValue>) {
        let values = frame
            .rows
            .iter()
            .map(|row| {
                self.key_of(row)
                    .and_then(|k| per_game.get(&k).cloned())
                    .unwrap_or(CellValue::Null)
            })
            .collect();
        frame.set_column(column, values);
    }
}

fn add_game_numbers(frame: &mut ShotFrame, schedule: &Schedule) {
    let per_game = schedule
        .games
        .iter()
        .enumerate()
        .map(|(i, (key, _))| (key.clone(), CellValue::Integer(i as i64 + 1)))
        .collect();
    schedule.broadcast(frame, GAME_NUM, per_game);
}

/// Rest before each game, computed once per game: idle days since the
/// previous dated game, zero for the first.
fn add_rest_days(frame: &mut ShotFrame, schedule: &Schedule) {
    let mut per_game = HashMap::with_capacity(schedule.games.len());
    let mut previous: Option<NaiveDate> = None;
    for (key, date) in &schedule.games {
        let rest = match (date, previous) {
            (Some(d), Some(prev)) => CellValue::Integer(((*d - prev).num_days() - 1).max(0)),
            (Some(_), None) => CellValue::Integer(0),
            (None, _) => CellValue::Null,
        };
        if date.is_some() {
            previous = *date;
        }
        per_game.insert(key.clone(), rest);
    }
    schedule.broadcast(frame, REST_DAYS, per_game);
}

// ---------------------------------------------------------------------------
// Simulated features
// ---------------------------------------------------------------------------

/// Seeded score differential: one N(0, 8) draw per game, shrunk by 0.7 from
/// the fourth period on.
fn add_margin_estimate<R: Rng + ?Sized>(frame: &mut ShotFrame, rng: &mut R) {
    if !frame.has_column("period") {
        log::warn!("No period column; {ESTIMATED_MARGIN} defaults to 0");
        frame.fill_column(ESTIMATED_MARGIN, CellValue::Float(0.0));
        return;
    }

    let by_game_id = frame.has_column("game_id");
    let keys: Vec<Option<CellValue>> = frame
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            if by_game_id {
                row.get("game_id").cloned()
            } else {
                Some(CellValue::Integer(i as i64))
            }
        })
        .collect();

    let mut base: HashMap<CellValue, f64> = HashMap::new();
    for key in keys.iter().flatten() {
        if !base.contains_key(key) {
            let z: f64 = StandardNormal.sample(rng);
            base.insert(key.clone(), z * MARGIN_STD);
        }
    }

    let values = frame
        .rows
        .iter()
        .zip(&keys)
        .map(|(row, key)| {
            let margin = key.as_ref().and_then(|k| base.get(k)).copied().unwrap_or(0.0);
            let period = row.get_f64("period").unwrap_or(1.0);
            let scale = if period <= 3.0 { 1.0 } else { LATE_GAME_MARGIN_SCALE };
            CellValue::Float(margin * scale)
        })
        .collect();
    frame.set_column(ESTIMATED_MARGIN, values);
}

/// Playing-time proxy from game clock position.
fn add_minutes_estimate<R: Rng + ?Sized>(frame: &mut ShotFrame, rng: &mut R) {
    let has_period = frame.has_column("period");
    let has_clock = frame.has_column("minutes_remaining");

    let values = frame
        .rows
        .iter()
        .map(|row| {
            let minutes = if has_period && has_clock {
                let period = row.get_f64("period").unwrap_or(1.0);
                let remaining = row.get_f64("minutes_remaining").unwrap_or(6.0);
                (((period - 1.0) * 12.0 + (12.0 - remaining)) * 0.75).clamp(0.0, 48.0)
            } else if has_period {
                (row.get_f64("period").unwrap_or(1.0) * 9.0).clamp(0.0, 45.0)
            } else {
                let z: f64 = StandardNormal.sample(rng);
                (25.0 + 5.0 * z).clamp(10.0, 45.0)
            };
            CellValue::Float(minutes)
        })
        .collect();

    if !has_period {
        log::warn!("No period column; {ESTIMATED_MINUTES} drawn around 25");
    }
    frame.set_column(ESTIMATED_MINUTES, values);
}

/// Seeded win/loss streak walk over games in id order.
fn add_streak_estimate<R: Rng + ?Sized>(frame: &mut ShotFrame, rng: &mut R) {
    if !frame.has_column("game_id") {
        log::warn!("No game_id column; {ESTIMATED_STREAK} drawn per shot");
        let values = match WeightedIndex::new(FALLBACK_STREAK_WEIGHTS) {
            Ok(dist) => (0..frame.len())
                .map(|_| CellValue::Integer(FALLBACK_STREAKS[dist.sample(rng)]))
                .collect(),
            Err(e) => {
                log::warn!("Streak weights rejected ({e}); defaulting to 0");
                vec![CellValue::Integer(0); frame.len()]
            }
        };
        frame.set_column(ESTIMATED_STREAK, values);
        return;
    }

    let mut ids = frame.unique_values("game_id");
    ids.sort();

    let mut streaks: HashMap<CellValue, i64> = HashMap::with_capacity(ids.len());
    let mut current: i64 = 0;
    for id in ids {
        current = next_streak(current, rng);
        streaks.insert(id, current);
    }

    let values = frame
        .rows
        .iter()
        .map(|row| {
            let streak = row.get("game_id").and_then(|id| streaks.get(id)).copied();
            CellValue::Integer(streak.unwrap_or(0))
        })
        .collect();
    frame.set_column(ESTIMATED_STREAK, values);
}

/// One step of the streak walk: usually extend the current run, otherwise
/// start or extend a run with a 60/40 lean toward wins.
fn next_streak<R: Rng + ?Sized>(current: i64, rng: &mut R) -> i64 {
    let next = if rng.gen::<f64>() < STREAK_CONTINUE_P && current != 0 {
        current + current.signum()
    } else if rng.gen::<f64>() < STREAK_WIN_P {
        if current <= 0 {
            1
        } else {
            current + 1
        }
    } else if current >= 0 {
        -1
    } else {
        current - 1
    };
    next.clamp(-STREAK_CAP, STREAK_CAP)
}
