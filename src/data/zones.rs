use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::ShotFrame;

/// Zone-classification columns, most specific first.
pub const ZONE_COLUMNS: [&str; 5] = [
    "shot_zone_basic",
    "shot_zone_area",
    "shot_zone_range",
    "action_type",
    "shot_type",
];

/// Zone value excluded from every summary.
pub const BACKCOURT: &str = "Backcourt";

const MADE_FLAG: &str = "shot_made_flag";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneStats {
    pub attempted: u32,
    pub made: u32,
    /// `made / attempted * 100`, one decimal place; 0 with no attempts.
    pub percentage: f64,
}

impl ZoneStats {
    fn record(&mut self, made: bool) {
        self.attempted += 1;
        self.made += u32::from(made);
    }

    fn finish(mut self) -> Self {
        self.percentage = percentage(self.made, self.attempted);
        self
    }
}

/// Zone breakdown together with the column it was grouped by.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneReport {
    pub column: Option<String>,
    pub zones: BTreeMap<String, ZoneStats>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotTotals {
    pub total_attempted: u32,
    pub total_made: u32,
    pub overall_percentage: f64,
}

impl ShotTotals {
    pub fn from_zones(zones: &BTreeMap<String, ZoneStats>) -> Self {
        let (total_attempted, total_made) = zones
            .values()
            .fold((0, 0), |(a, m), z| (a + z.attempted, m + z.made));
        Self {
            total_attempted,
            total_made,
            overall_percentage: percentage(total_made, total_attempted),
        }
    }
}

fn percentage(made: u32, attempted: u32) -> f64 {
    if attempted == 0 {
        return 0.0;
    }
    // One decimal, exact halves to even.
    let pct = f64::from(made) / f64::from(attempted) * 100.0;
    (pct * 10.0).round_ties_even() / 10.0
}

/// First column of [`ZONE_COLUMNS`] present with more than one distinct value.
pub fn find_zone_column(frame: &ShotFrame) -> Option<&'static str> {
    ZONE_COLUMNS.into_iter().find(|col| {
        frame.has_column(col) && {
            let distinct = frame.unique_values(col).len();
            log::debug!("{col}: {distinct} distinct zones");
            distinct > 1
        }
    })
}

/// Per-zone attempts, makes and percentage. Empty when the frame is empty
/// or carries no usable zone column.
pub fn calculate_zones(frame: &ShotFrame) -> BTreeMap<String, ZoneStats> {
    zone_report(frame).zones
}

pub fn zone_report(frame: &ShotFrame) -> ZoneReport {
    if frame.is_empty() {
        return ZoneReport::default();
    }
    let Some(column) = find_zone_column(frame) else {
        log::info!("No zone column found in {} shots", frame.len());
        return ZoneReport::default();
    };

    let mut zones: BTreeMap<String, ZoneStats> = BTreeMap::new();
    let mut backcourt = 0usize;
    for row in &frame.rows {
        let Some(zone) = row.get(column) else { continue };
        let zone = zone.to_string();
        if zone == BACKCOURT {
            backcourt += 1;
            continue;
        }
        // Shots without a result flag are not attempts.
        let Some(flag) = row.get_f64(MADE_FLAG) else { continue };
        zones.entry(zone).or_default().record(flag != 0.0);
    }
    if backcourt > 0 {
        log::debug!("Dropped {backcourt} backcourt shots");
    }

    let zones: BTreeMap<String, ZoneStats> = zones
        .into_iter()
        .map(|(name, stats)| (name, stats.finish()))
        .collect();
    log::info!("{} zones from '{column}'", zones.len());
    ZoneReport {
        column: Some(column.to_string()),
        zones,
    }
}
