use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::features::{ESTIMATED_MARGIN, ESTIMATED_MINUTES, ESTIMATED_STREAK, GAME_NUM, REST_DAYS};
use super::model::{ShotFrame, ShotRecord};
use super::teams::team_name_variants;

/// Option value meaning "no constraint" for a dimension.
pub const ALL: &str = "All";

// ---------------------------------------------------------------------------
// Dimensions and the FilterSpec that selects options for them
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterDimension {
    HomeAway,
    Quarter,
    SeasonPhase,
    ScoreMargin,
    GameFlow,
    RestDays,
    Streak,
    BackToBack,
    MinutesPlayed,
}

impl FilterDimension {
    /// The eight dimensions offered by default, in display order.
    pub const DEFAULT_ORDER: [FilterDimension; 8] = [
        FilterDimension::HomeAway,
        FilterDimension::Quarter,
        FilterDimension::SeasonPhase,
        FilterDimension::ScoreMargin,
        FilterDimension::GameFlow,
        FilterDimension::RestDays,
        FilterDimension::Streak,
        FilterDimension::MinutesPlayed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterDimension::HomeAway => "home_away",
            FilterDimension::Quarter => "quarter",
            FilterDimension::SeasonPhase => "season_phase",
            FilterDimension::ScoreMargin => "score_margin",
            FilterDimension::GameFlow => "game_flow",
            FilterDimension::RestDays => "rest_days",
            FilterDimension::Streak => "streak",
            FilterDimension::BackToBack => "back_to_back",
            FilterDimension::MinutesPlayed => "minutes_played",
        }
    }

    pub fn from_name(name: &str) -> Option<FilterDimension> {
        Self::DEFAULT_ORDER
            .into_iter()
            .chain([FilterDimension::BackToBack])
            .find(|d| d.as_str() == name)
    }
}

impl fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered dimension → option selections. Setting an existing dimension
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    entries: Vec<(String, String)>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every default dimension set to [`ALL`].
    pub fn default_all() -> Self {
        FilterDimension::DEFAULT_ORDER
            .into_iter()
            .map(|d| (d.as_str(), ALL))
            .collect()
    }

    pub fn set(&mut self, dimension: &str, value: &str) {
        match self.entries.iter_mut().find(|(d, _)| d == dimension) {
            Some((_, v)) => *v = value.to_string(),
            None => self.entries.push((dimension.to_string(), value.to_string())),
        }
    }

    pub fn with(mut self, dimension: FilterDimension, value: &str) -> Self {
        self.set(dimension.as_str(), value);
        self
    }

    pub fn get(&self, dimension: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(d, _)| d == dimension)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(d, v)| (d.as_str(), v.as_str()))
    }

    /// Number of dimensions actually constraining the result.
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v != ALL).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut spec = FilterSpec::new();
        for (k, v) in iter {
            spec.set(&k.into(), &v.into());
        }
        spec
    }
}

// ---------------------------------------------------------------------------
// Typed options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeAway {
    Home,
    Away,
}

impl HomeAway {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Home" => Some(HomeAway::Home),
            "Away" => Some(HomeAway::Away),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quarter {
    Period(i64),
    Overtime,
}

impl Quarter {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1st" => Some(Quarter::Period(1)),
            "2nd" => Some(Quarter::Period(2)),
            "3rd" => Some(Quarter::Period(3)),
            "4th" => Some(Quarter::Period(4)),
            "OT" => Some(Quarter::Overtime),
            _ => None,
        }
    }

    fn matches(self, period: i64) -> bool {
        match self {
            Quarter::Period(p) => period == p,
            Quarter::Overtime => period >= 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonPhase {
    RegularOnly,
    PlayoffsOnly,
    /// Games 1-25.
    Early,
    /// Games 26-60.
    Mid,
    /// Games 61 onwards.
    Late,
}

impl SeasonPhase {
    pub fn parse(s: &str) -> Option<Self> {
        if s.contains("Playoff") {
            Some(SeasonPhase::PlayoffsOnly)
        } else if s.contains("Early") {
            Some(SeasonPhase::Early)
        } else if s.contains("Mid") {
            Some(SeasonPhase::Mid)
        } else if s.contains("Late") {
            Some(SeasonPhase::Late)
        } else if s.contains("Regular") {
            Some(SeasonPhase::RegularOnly)
        } else {
            None
        }
    }

    fn matches_game(self, game_num: i64) -> bool {
        match self {
            SeasonPhase::Early => game_num <= 25,
            SeasonPhase::Mid => game_num > 25 && game_num <= 60,
            SeasonPhase::Late => game_num > 60,
            SeasonPhase::RegularOnly | SeasonPhase::PlayoffsOnly => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMargin {
    /// Within 10 either way ("Close" and "Clutch").
    Close,
    /// Within 5 either way.
    Competitive,
    /// More than 10 either way.
    Blowout,
}

impl ScoreMargin {
    pub fn parse(s: &str) -> Option<Self> {
        if s.contains("Close") || s.contains("Clutch") {
            Some(ScoreMargin::Close)
        } else if s.contains("Blowout") {
            Some(ScoreMargin::Blowout)
        } else if s.contains("Competitive") {
            Some(ScoreMargin::Competitive)
        } else {
            None
        }
    }

    fn matches(self, margin: f64) -> bool {
        match self {
            ScoreMargin::Close => margin.abs() <= 10.0,
            ScoreMargin::Competitive => margin.abs() <= 5.0,
            ScoreMargin::Blowout => margin.abs() > 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameFlow {
    Leading,
    Trailing,
    Tied,
}

impl GameFlow {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Leading" => Some(GameFlow::Leading),
            "Trailing" => Some(GameFlow::Trailing),
            "Tied" => Some(GameFlow::Tied),
            _ => None,
        }
    }

    fn matches(self, margin: f64) -> bool {
        match self {
            GameFlow::Leading => margin > 2.0,
            GameFlow::Trailing => margin < -2.0,
            GameFlow::Tied => margin.abs() <= 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestDays {
    Exactly(i64),
    AtLeast(i64),
}

impl RestDays {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Back-to-Back (0 days)" | "Back-to-Back" => Some(RestDays::Exactly(0)),
            "1 Day Rest" => Some(RestDays::Exactly(1)),
            "2 Days Rest" => Some(RestDays::Exactly(2)),
            "3+ Days Rest" => Some(RestDays::AtLeast(3)),
            "1+ Days Rest" => Some(RestDays::AtLeast(1)),
            "2+ Days Rest" => Some(RestDays::AtLeast(2)),
            _ => None,
        }
    }

    fn matches(self, rest: i64) -> bool {
        match self {
            RestDays::Exactly(n) => rest == n,
            RestDays::AtLeast(n) => rest >= n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Streak {
    /// Winning run of at least this many games.
    Win(i64),
    /// Losing run of at least this many games.
    Loss(i64),
    None,
}

impl Streak {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Win Streak (Any)" | "Win Streak" => Some(Streak::Win(1)),
            "2+ Game Win Streak" => Some(Streak::Win(2)),
            "3+ Game Win Streak" => Some(Streak::Win(3)),
            "5+ Game Win Streak" => Some(Streak::Win(5)),
            "Loss Streak (Any)" | "Loss Streak" => Some(Streak::Loss(1)),
            "2+ Game Loss Streak" => Some(Streak::Loss(2)),
            "3+ Game Loss Streak" => Some(Streak::Loss(3)),
            "5+ Game Loss Streak" => Some(Streak::Loss(5)),
            "No Streak" | "Neutral" => Some(Streak::None),
            _ => None,
        }
    }

    fn matches(self, streak: i64) -> bool {
        match self {
            Streak::Win(n) => streak >= n,
            Streak::Loss(n) => streak <= -n,
            Streak::None => streak == 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackToBack {
    Yes,
    No,
}

impl BackToBack {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Yes" => Some(BackToBack::Yes),
            "No" => Some(BackToBack::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinutesPlayed {
    /// Up to 15.
    Fresh,
    /// Over 15, up to 30.
    Normal,
    /// Over 30, up to 40.
    Heavy,
    /// Over 40.
    Exhausted,
    /// Legacy "0-20".
    UpTo20,
    /// Legacy "20-35".
    From20To35,
    /// Legacy "35+".
    Over35,
}

impl MinutesPlayed {
    pub fn parse(s: &str) -> Option<Self> {
        let options = [
            ("Fresh", MinutesPlayed::Fresh),
            ("Normal", MinutesPlayed::Normal),
            ("Heavy", MinutesPlayed::Heavy),
            ("Exhausted", MinutesPlayed::Exhausted),
            ("0-20", MinutesPlayed::UpTo20),
            ("20-35", MinutesPlayed::From20To35),
            ("35+", MinutesPlayed::Over35),
        ];
        options
            .into_iter()
            .find(|(needle, _)| s.contains(needle))
            .map(|(_, opt)| opt)
    }

    /// `(exclusive lower, inclusive upper)` bounds in minutes.
    pub fn bounds(self) -> (Option<f64>, Option<f64>) {
        match self {
            MinutesPlayed::Fresh => (None, Some(15.0)),
            MinutesPlayed::Normal => (Some(15.0), Some(30.0)),
            MinutesPlayed::Heavy => (Some(30.0), Some(40.0)),
            MinutesPlayed::Exhausted => (Some(40.0), None),
            MinutesPlayed::UpTo20 => (None, Some(20.0)),
            MinutesPlayed::From20To35 => (Some(20.0), Some(35.0)),
            MinutesPlayed::Over35 => (Some(35.0), None),
        }
    }

    fn matches(self, minutes: f64) -> bool {
        let (lo, hi) = self.bounds();
        lo.map_or(true, |lo| minutes > lo) && hi.map_or(true, |hi| minutes <= hi)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Applies a [`FilterSpec`] to an enriched shot frame.
#[derive(Debug, Clone, Copy)]
pub struct FilterEngine {
    seed: u64,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl FilterEngine {
    /// `seed` drives the home/away split used when the data has no venue
    /// information at all.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Apply every non-`All` selection in spec order, stopping as soon as
    /// nothing is left.
    pub fn apply_all(
        &self,
        frame: &ShotFrame,
        player_name: &str,
        team_name: &str,
        spec: &FilterSpec,
    ) -> ShotFrame {
        let mut data = frame.clone();
        if data.is_empty() {
            return data;
        }
        log::debug!(
            "Filtering {} shots for {player_name} ({team_name}), {} active filters",
            data.len(),
            spec.active_count()
        );

        for (name, value) in spec.iter() {
            if value == ALL {
                continue;
            }
            let Some(dimension) = FilterDimension::from_name(name) else {
                log::debug!("Ignoring unknown filter dimension '{name}'");
                continue;
            };
            data = self.apply_step(&data, dimension, value, team_name, frame);
            if data.is_empty() {
                log::debug!("{dimension}={value} left no shots; skipping remaining filters");
                break;
            }
        }
        data
    }

    /// Apply a single selection. Unknown options and missing prerequisite
    /// columns leave the frame unchanged.
    pub fn apply_one(
        &self,
        frame: &ShotFrame,
        dimension: FilterDimension,
        value: &str,
        team_name: &str,
    ) -> ShotFrame {
        self.apply_step(frame, dimension, value, team_name, frame)
    }

    /// `source` is the unfiltered input of the chain; the seeded venue split
    /// is drawn from it so a game keeps its side whatever ran before.
    fn apply_step(
        &self,
        frame: &ShotFrame,
        dimension: FilterDimension,
        value: &str,
        team_name: &str,
        source: &ShotFrame,
    ) -> ShotFrame {
        if value == ALL {
            return frame.clone();
        }
        let filtered = match dimension {
            FilterDimension::HomeAway => HomeAway::parse(value).map(|o| self.home_away(frame, o, team_name, source)),
            FilterDimension::Quarter => Quarter::parse(value).map(|o| quarter(frame, o)),
            FilterDimension::SeasonPhase => SeasonPhase::parse(value).map(|o| season_phase(frame, o)),
            FilterDimension::ScoreMargin => ScoreMargin::parse(value)
                .map(|o| by_f64(frame, ESTIMATED_MARGIN, dimension, |m| o.matches(m))),
            FilterDimension::GameFlow => GameFlow::parse(value)
                .map(|o| by_f64(frame, ESTIMATED_MARGIN, dimension, |m| o.matches(m))),
            FilterDimension::RestDays => {
                RestDays::parse(value).map(|o| by_i64(frame, REST_DAYS, dimension, |r| o.matches(r)))
            }
            FilterDimension::Streak => Streak::parse(value)
                .map(|o| by_i64(frame, ESTIMATED_STREAK, dimension, |s| o.matches(s))),
            FilterDimension::BackToBack => BackToBack::parse(value).map(|o| {
                by_i64(frame, REST_DAYS, dimension, |r| match o {
                    BackToBack::Yes => r == 0,
                    BackToBack::No => r > 0,
                })
            }),
            FilterDimension::MinutesPlayed => MinutesPlayed::parse(value)
                .map(|o| by_f64(frame, ESTIMATED_MINUTES, dimension, |m| o.matches(m))),
        };
        filtered.unwrap_or_else(|| {
            log::warn!("Unrecognised option '{value}' for {dimension}; not filtering");
            frame.clone()
        })
    }

    /// Venue split, best evidence first: explicit home/visitor columns, then
    /// a matchup string, then a seeded half split of the games in `source`.
    fn home_away(
        &self,
        frame: &ShotFrame,
        option: HomeAway,
        team_name: &str,
        source: &ShotFrame,
    ) -> ShotFrame {
        let home_col = column_alias(frame, &["home_team", "htm"]);
        let away_col = column_alias(frame, &["visiting_team", "vtm"]);
        if let (Some(home_col), Some(away_col)) = (home_col, away_col) {
            let variants = team_name_variants(team_name);
            let col = match option {
                HomeAway::Home => home_col,
                HomeAway::Away => away_col,
            };
            return frame.filter(|r| {
                r.get(col)
                    .is_some_and(|v| variants.iter().any(|name| *name == v.to_string()))
            });
        }

        if frame.has_column("matchup") {
            // "GSW vs. LAL" at home, "GSW @ LAL" on the road.
            return frame.filter(|r| {
                r.get_str("matchup").is_some_and(|m| match option {
                    HomeAway::Home => !m.contains('@'),
                    HomeAway::Away => m.contains('@'),
                })
            });
        }

        log::warn!("No venue columns; splitting {team_name} games by seeded partition");
        let want_home = option == HomeAway::Home;
        if frame.has_column("game_id") {
            let games = source.unique_values("game_id");
            let home = self.seeded_half(&games);
            frame.filter(|r| r.get("game_id").is_some_and(|id| home.contains(id)) == want_home)
        } else {
            // No game ids: a row is identified by its contents.
            let mut seen = HashSet::new();
            let rows: Vec<&ShotRecord> = source.rows.iter().filter(|r| seen.insert(*r)).collect();
            let home = self.seeded_half(&rows);
            frame.filter(|r| home.contains(&r) == want_home)
        }
    }

    /// Seeded choice of `len / 2` of `items`.
    fn seeded_half<'a, T: Eq + Hash>(&self, items: &'a [T]) -> HashSet<&'a T> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        index::sample(&mut rng, items.len(), items.len() / 2)
            .into_iter()
            .map(|i| &items[i])
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

fn column_alias<'a>(frame: &ShotFrame, names: &[&'a str]) -> Option<&'a str> {
    names.iter().copied().find(|n| frame.has_column(n))
}

fn require(frame: &ShotFrame, column: &str, dimension: FilterDimension) -> bool {
    let present = frame.has_column(column);
    if !present {
        log::warn!("No '{column}' column for {dimension} filter; not filtering");
    }
    present
}

fn by_f64<F>(frame: &ShotFrame, column: &str, dimension: FilterDimension, pred: F) -> ShotFrame
where
    F: Fn(f64) -> bool,
{
    if !require(frame, column, dimension) {
        return frame.clone();
    }
    frame.filter(|r| r.get_f64(column).is_some_and(&pred))
}

fn by_i64<F>(frame: &ShotFrame, column: &str, dimension: FilterDimension, pred: F) -> ShotFrame
where
    F: Fn(i64) -> bool,
{
    if !require(frame, column, dimension) {
        return frame.clone();
    }
    frame.filter(|r| r.get_i64(column).is_some_and(&pred))
}

fn quarter(frame: &ShotFrame, option: Quarter) -> ShotFrame {
    by_i64(frame, "period", FilterDimension::Quarter, |p| option.matches(p))
}

fn season_type_contains(row: &ShotRecord, needle: &str) -> bool {
    row.get_str("season_type")
        .is_some_and(|t| t.to_lowercase().contains(needle))
}

/// Narrow by season type, then by position in the schedule.
fn season_phase(frame: &ShotFrame, option: SeasonPhase) -> ShotFrame {
    let data = if frame.has_column("season_type") {
        match option {
            SeasonPhase::PlayoffsOnly => return frame.filter(|r| season_type_contains(r, "playoff")),
            SeasonPhase::RegularOnly => return frame.filter(|r| season_type_contains(r, "regular")),
            _ => frame.filter(|r| season_type_contains(r, "regular")),
        }
    } else {
        frame.clone()
    };

    if matches!(option, SeasonPhase::PlayoffsOnly | SeasonPhase::RegularOnly) {
        log::warn!("No 'season_type' column for {} filter; not filtering", FilterDimension::SeasonPhase);
        return data;
    }
    if !require(&data, GAME_NUM, FilterDimension::SeasonPhase) {
        return data;
    }
    data.filter(|r| r.get_i64(GAME_NUM).is_some_and(|n| option.matches_game(n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;
    use crate::data::loader::frame_from_reader;

    fn frame(csv: &str) -> ShotFrame {
        frame_from_reader(csv.as_bytes()).unwrap()
    }

    fn column(frame: &ShotFrame, col: &str) -> Vec<i64> {
        frame.rows.iter().filter_map(|r| r.get_i64(col)).collect()
    }

    const ENRICHED: &str = "\
id,game_id,period,season_type,game_num,rest_days,estimated_margin,estimated_minutes,estimated_streak
1,A,1,Regular,1,0,12.5,5.0,1
2,A,4,Regular,1,0,8.75,40.5,1
3,B,2,Regular,30,2,-3.0,20.0,-2
4,C,5,Regular,70,0,1.5,30.0,0
5,D,3,Playoffs,83,3,-11.0,35.0,5
";

    fn apply(dim: FilterDimension, value: &str) -> Vec<i64> {
        let f = frame(ENRICHED);
        column(&FilterEngine::default().apply_one(&f, dim, value, "Boston Celtics"), "id")
    }

    #[test]
    fn quarter_and_overtime() {
        assert_eq!(apply(FilterDimension::Quarter, "4th"), vec![2]);
        assert_eq!(apply(FilterDimension::Quarter, "OT"), vec![4]);
    }

    #[test]
    fn season_phase_narrows_type_then_schedule() {
        assert_eq!(apply(FilterDimension::SeasonPhase, "Playoffs Only"), vec![5]);
        assert_eq!(apply(FilterDimension::SeasonPhase, "Regular Season Only"), vec![1, 2, 3, 4]);
        assert_eq!(apply(FilterDimension::SeasonPhase, "Early Season (1-25)"), vec![1, 2]);
        assert_eq!(apply(FilterDimension::SeasonPhase, "Mid Season (26-60)"), vec![3]);
        // Game 83 is a playoff game, so only the regular-season game 70 is late.
        assert_eq!(apply(FilterDimension::SeasonPhase, "Late Season (61-82)"), vec![4]);
    }

    #[test]
    fn margin_thresholds() {
        assert_eq!(apply(FilterDimension::ScoreMargin, "Clutch (±5)"), vec![2, 3, 4]);
        assert_eq!(apply(FilterDimension::ScoreMargin, "Close (±10)"), vec![2, 3, 4]);
        assert_eq!(apply(FilterDimension::ScoreMargin, "Competitive (±5)"), vec![3, 4]);
        assert_eq!(apply(FilterDimension::ScoreMargin, "Blowout (>10)"), vec![1, 5]);
        assert_eq!(apply(FilterDimension::GameFlow, "Leading"), vec![1, 2]);
        assert_eq!(apply(FilterDimension::GameFlow, "Trailing"), vec![3, 5]);
        assert_eq!(apply(FilterDimension::GameFlow, "Tied"), vec![4]);
    }

    #[test]
    fn rest_and_back_to_back() {
        assert_eq!(apply(FilterDimension::RestDays, "Back-to-Back (0 days)"), vec![1, 2, 4]);
        assert_eq!(apply(FilterDimension::RestDays, "2 Days Rest"), vec![3]);
        assert_eq!(apply(FilterDimension::RestDays, "3+ Days Rest"), vec![5]);
        assert_eq!(apply(FilterDimension::RestDays, "2+ Days Rest"), vec![3, 5]);
        assert_eq!(apply(FilterDimension::BackToBack, "Yes"), vec![1, 2, 4]);
        assert_eq!(apply(FilterDimension::BackToBack, "No"), vec![3, 5]);
    }

    #[test]
    fn streak_options() {
        assert_eq!(apply(FilterDimension::Streak, "Win Streak (Any)"), vec![1, 2, 5]);
        assert_eq!(apply(FilterDimension::Streak, "5+ Game Win Streak"), vec![5]);
        assert_eq!(apply(FilterDimension::Streak, "2+ Game Loss Streak"), vec![3]);
        assert_eq!(apply(FilterDimension::Streak, "3+ Game Loss Streak"), Vec::<i64>::new());
        assert_eq!(apply(FilterDimension::Streak, "No Streak"), vec![4]);
    }

    #[test]
    fn minutes_ranges() {
        assert_eq!(apply(FilterDimension::MinutesPlayed, "Fresh (0-15min)"), vec![1]);
        assert_eq!(apply(FilterDimension::MinutesPlayed, "Normal (15-30min)"), vec![3, 4]);
        assert_eq!(apply(FilterDimension::MinutesPlayed, "Heavy (30-40min)"), vec![5]);
        assert_eq!(apply(FilterDimension::MinutesPlayed, "Exhausted (40+min)"), vec![2]);
        assert_eq!(apply(FilterDimension::MinutesPlayed, "35+"), vec![2]);
        assert_eq!(apply(FilterDimension::MinutesPlayed, "0-20"), vec![1, 3]);
    }

    #[test]
    fn unknown_option_is_a_no_op() {
        assert_eq!(apply(FilterDimension::Quarter, "5th"), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn missing_columns_leave_frame_unchanged() {
        let f = frame("id,game_id\n1,A\n2,B\n");
        let engine = FilterEngine::default();
        for dim in FilterDimension::DEFAULT_ORDER.into_iter().filter(|d| *d != FilterDimension::HomeAway) {
            let value = match dim {
                FilterDimension::Quarter => "1st",
                FilterDimension::SeasonPhase => "Early Season (1-25)",
                FilterDimension::ScoreMargin => "Blowout (>10)",
                FilterDimension::GameFlow => "Tied",
                FilterDimension::RestDays => "1 Day Rest",
                FilterDimension::Streak => "No Streak",
                _ => "Fresh (0-15min)",
            };
            assert_eq!(engine.apply_one(&f, dim, value, "Utah Jazz"), f, "{dim}");
        }
    }

    #[test]
    fn home_away_prefers_explicit_columns() {
        let f = frame("id,htm,vtm\n1,BOS,NYK\n2,NYK,BOS\n3,boston celtics,MIA\n4,MIA,NYK\n");
        let engine = FilterEngine::default();
        let home = engine.apply_one(&f, FilterDimension::HomeAway, "Home", "Boston Celtics");
        let away = engine.apply_one(&f, FilterDimension::HomeAway, "Away", "Boston Celtics");
        assert_eq!(column(&home, "id"), vec![1, 3]);
        assert_eq!(column(&away, "id"), vec![2]);
    }

    #[test]
    fn home_away_reads_matchup_marker() {
        let f = frame("id,matchup\n1,BOS vs. NYK\n2,BOS @ MIA\n3,BOS vs. LAL\n");
        let engine = FilterEngine::default();
        let home = engine.apply_one(&f, FilterDimension::HomeAway, "Home", "Boston Celtics");
        let away = engine.apply_one(&f, FilterDimension::HomeAway, "Away", "Boston Celtics");
        assert_eq!(column(&home, "id"), vec![1, 3]);
        assert_eq!(column(&away, "id"), vec![2]);
    }

    #[test]
    fn home_away_fallback_partitions_games() {
        let f = frame("id,game_id\n1,A\n2,B\n3,A\n4,C\n5,D\n6,B\n");
        let engine = FilterEngine::new(42);
        let home = engine.apply_one(&f, FilterDimension::HomeAway, "Home", "Miami Heat");
        let away = engine.apply_one(&f, FilterDimension::HomeAway, "Away", "Miami Heat");

        assert_eq!(home.len() + away.len(), f.len());
        assert_eq!(home.unique_values("game_id").len(), 2);
        let home_games: HashSet<CellValue> = home.unique_values("game_id").into_iter().collect();
        assert!(away.rows.iter().all(|r| !home_games.contains(r.get("game_id").unwrap())));
        // Same seed, same split.
        assert_eq!(engine.apply_one(&f, FilterDimension::HomeAway, "Home", "Miami Heat"), home);
    }

    #[test]
    fn home_away_fallback_without_game_ids_splits_rows() {
        let f = frame("id\n1\n2\n3\n4\n5\n");
        let engine = FilterEngine::new(7);
        let home = engine.apply_one(&f, FilterDimension::HomeAway, "Home", "Miami Heat");
        let away = engine.apply_one(&f, FilterDimension::HomeAway, "Away", "Miami Heat");
        assert_eq!(home.len(), 2);
        assert_eq!(away.len(), 3);
    }

    /// Eight games of four quarters each; games C and F have no first-quarter shots.
    fn eight_games(with_game_ids: bool) -> ShotFrame {
        let mut csv = String::from(if with_game_ids { "id,game_id,period\n" } else { "id,period\n" });
        let mut id = 0;
        for game in ["A", "B", "C", "D", "E", "F", "G", "H"] {
            for period in 1..=4 {
                if period == 1 && (game == "C" || game == "F") {
                    continue;
                }
                id += 1;
                if with_game_ids {
                    csv.push_str(&format!("{id},{game},{period}\n"));
                } else {
                    csv.push_str(&format!("{id},{period}\n"));
                }
            }
        }
        frame(&csv)
    }

    #[test]
    fn fallback_venue_is_stable_when_earlier_filters_drop_games() {
        let f = eight_games(true);
        let engine = FilterEngine::new(42);
        let quarter_first = FilterSpec::new()
            .with(FilterDimension::Quarter, "1st")
            .with(FilterDimension::HomeAway, "Home");
        let venue_first = FilterSpec::new()
            .with(FilterDimension::HomeAway, "Home")
            .with(FilterDimension::Quarter, "1st");
        let x = engine.apply_all(&f, "P", "Miami Heat", &quarter_first);
        let y = engine.apply_all(&f, "P", "Miami Heat", &venue_first);
        assert_eq!(x, y);

        // Every home game of the whole set keeps its side after narrowing.
        let home_all: HashSet<CellValue> = engine
            .apply_one(&f, FilterDimension::HomeAway, "Home", "Miami Heat")
            .unique_values("game_id")
            .into_iter()
            .collect();
        assert_eq!(home_all.len(), 4);
        assert!(x.rows.iter().all(|r| home_all.contains(r.get("game_id").unwrap())));
        let away_spec = FilterSpec::new()
            .with(FilterDimension::Quarter, "1st")
            .with(FilterDimension::HomeAway, "Away");
        let away = engine.apply_all(&f, "P", "Miami Heat", &away_spec);
        assert!(away.rows.iter().all(|r| !home_all.contains(r.get("game_id").unwrap())));
        assert_eq!(away.len() + x.len(), 6);
    }

    #[test]
    fn fallback_row_split_is_stable_when_earlier_filters_drop_rows() {
        let f = eight_games(false);
        let engine = FilterEngine::new(3);
        let quarter_first = FilterSpec::new()
            .with(FilterDimension::Quarter, "2nd")
            .with(FilterDimension::HomeAway, "Away");
        let venue_first = FilterSpec::new()
            .with(FilterDimension::HomeAway, "Away")
            .with(FilterDimension::Quarter, "2nd");
        assert_eq!(
            engine.apply_all(&f, "P", "Miami Heat", &quarter_first),
            engine.apply_all(&f, "P", "Miami Heat", &venue_first)
        );
    }

    #[test]
    fn all_selections_are_identity() {
        let f = frame(ENRICHED);
        let out = FilterEngine::default().apply_all(&f, "P", "Boston Celtics", &FilterSpec::default_all());
        assert_eq!(out, f);
    }

    #[test]
    fn order_does_not_matter_without_emptying() {
        let f = frame(ENRICHED);
        let engine = FilterEngine::default();
        let ab = FilterSpec::new()
            .with(FilterDimension::SeasonPhase, "Regular Season Only")
            .with(FilterDimension::ScoreMargin, "Close (±10)");
        let ba = FilterSpec::new()
            .with(FilterDimension::ScoreMargin, "Close (±10)")
            .with(FilterDimension::SeasonPhase, "Regular Season Only");
        let x = engine.apply_all(&f, "P", "T", &ab);
        let y = engine.apply_all(&f, "P", "T", &ba);
        assert_eq!(x, y);
        assert_eq!(column(&x, "id"), vec![2, 3, 4]);
    }

    #[test]
    fn emptied_frame_short_circuits() {
        let f = frame(ENRICHED);
        let spec = FilterSpec::new()
            .with(FilterDimension::Streak, "3+ Game Loss Streak")
            .with(FilterDimension::Quarter, "nonsense");
        let out = FilterEngine::default().apply_all(&f, "P", "T", &spec);
        assert!(out.is_empty());
    }

    #[test]
    fn spec_keeps_insertion_order_and_counts_active() {
        let mut spec = FilterSpec::default_all();
        spec.set("quarter", "OT");
        spec.set("back_to_back", "Yes");
        let dims: Vec<&str> = spec.iter().map(|(d, _)| d).collect();
        assert_eq!(dims[1], "quarter");
        assert_eq!(dims.last(), Some(&"back_to_back"));
        assert_eq!(spec.len(), 9);
        assert_eq!(spec.active_count(), 2);
        assert_eq!(spec.get("quarter"), Some("OT"));
    }
}
