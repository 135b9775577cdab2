use std::sync::Arc;

use crate::config::AnalyzerConfig;
use crate::data::features::FeaturePipeline;
use crate::data::filter::{FilterEngine, FilterSpec};
use crate::data::loader::ShotLoader;
use crate::data::model::ShotFrame;
use crate::data::roster::{resolve_roster, RosterLookup, RosterProvider};
use crate::data::season::{Season, SeasonIndex, SeasonVerification};
use crate::data::teams;
use crate::data::zones::{zone_report, ShotTotals, ZoneReport};
use crate::error::DataError;

// ---------------------------------------------------------------------------
// Analysis session
// ---------------------------------------------------------------------------

/// The player currently being analysed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub season: Season,
    pub team: String,
    pub player: String,
}

/// One analyst's working state, independent of any presentation layer.
///
/// The season index is shared; everything else is owned by the session.
pub struct AnalysisSession {
    config: AnalyzerConfig,
    index: Arc<SeasonIndex>,
    pipeline: FeaturePipeline,
    engine: FilterEngine,

    /// Player whose shots are loaded (None until one is selected).
    pub selection: Option<Selection>,

    /// Enriched shots for the selection, before filtering.
    shots: ShotFrame,

    /// Current filter selections.
    filters: FilterSpec,

    /// Shots passing the current filters (cached).
    filtered: ShotFrame,

    /// Last load failure, for display.
    pub status_message: Option<String>,
}

impl AnalysisSession {
    /// Scan the configured data directory and start an empty session.
    pub fn open(config: AnalyzerConfig) -> Self {
        let index = Arc::new(SeasonIndex::from_config(&config));
        log::info!("Session opened with {} seasons", index.available_seasons().len());
        Self::with_index(config, index)
    }

    /// Start a session over an index that other sessions may also use.
    pub fn with_index(config: AnalyzerConfig, index: Arc<SeasonIndex>) -> Self {
        Self {
            pipeline: FeaturePipeline::seeded(config.seed),
            engine: FilterEngine::new(config.seed),
            config,
            index,
            selection: None,
            shots: ShotFrame::default(),
            filters: FilterSpec::default_all(),
            filtered: ShotFrame::default(),
            status_message: None,
        }
    }

    pub fn index(&self) -> &Arc<SeasonIndex> {
        &self.index
    }

    /// Seasons with at least one file, newest first.
    pub fn seasons(&self) -> Vec<Season> {
        self.index.available_seasons()
    }

    pub fn teams(&self) -> Vec<&'static str> {
        teams::teams_for_season()
    }

    /// Re-check a season's regular shotdetail file against its date window.
    pub fn verify_season(&self, season: Season) -> Result<Option<SeasonVerification>, DataError> {
        self.index.verify_season(season, self.config.verify_sample_rows)
    }

    pub fn roster<P: RosterProvider + ?Sized>(
        &self,
        provider: &P,
        season: Season,
        team: &str,
    ) -> Result<RosterLookup, DataError> {
        resolve_roster(provider, &self.index, season, team)
    }

    /// Load and enrich a player's shots, resetting all filters.
    ///
    /// On a read failure the previous selection stays in place.
    pub fn select_player(
        &mut self,
        season: Season,
        team: &str,
        player: &str,
    ) -> Result<usize, DataError> {
        let loader = ShotLoader::new(&self.index, self.config.chunk_size);
        let mut shots = match loader.load(season, player, self.config.include_playoffs) {
            Ok(shots) => shots,
            Err(e) => {
                log::error!("Failed to load {player}: {e}");
                self.status_message = Some(e.to_string());
                return Err(e);
            }
        };
        self.pipeline.enrich(&mut shots);

        self.selection = Some(Selection {
            season,
            team: team.to_string(),
            player: player.to_string(),
        });
        self.shots = shots;
        self.filters = FilterSpec::default_all();
        self.status_message = None;
        self.refilter();
        Ok(self.shots.len())
    }

    /// Change one filter and recompute the filtered shots.
    pub fn set_filter(&mut self, dimension: &str, value: &str) {
        self.filters.set(dimension, value);
        self.refilter();
    }

    pub fn reset_filters(&mut self) {
        self.filters = FilterSpec::default_all();
        self.refilter();
    }

    /// Recompute `filtered` after a filter change.
    pub fn refilter(&mut self) {
        self.filtered = match &self.selection {
            Some(sel) => self
                .engine
                .apply_all(&self.shots, &sel.player, &sel.team, &self.filters),
            None => ShotFrame::default(),
        };
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn shots(&self) -> &ShotFrame {
        &self.shots
    }

    pub fn filtered(&self) -> &ShotFrame {
        &self.filtered
    }

    pub fn zones(&self) -> ZoneReport {
        zone_report(&self.filtered)
    }

    pub fn totals(&self) -> ShotTotals {
        ShotTotals::from_zones(&self.zones().zones)
    }

    /// e.g. `"12/30 shots (40.0%) | 2 filters active"`.
    pub fn status_line(&self) -> String {
        let total = self.filtered.len();
        let made = self
            .filtered
            .rows
            .iter()
            .filter(|r| r.get_f64("shot_made_flag").is_some_and(|f| f != 0.0))
            .count();
        let pct = if total == 0 {
            0.0
        } else {
            made as f64 / total as f64 * 100.0
        };
        format!(
            "{made}/{total} shots ({pct:.1}%) | {} filters active",
            self.filters.active_count()
        )
    }
}
