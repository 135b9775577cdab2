use std::fs;
use std::path::Path;
use std::sync::Arc;

use rusty_court::data::filter::ALL;
use rusty_court::data::roster::{resolve_roster, NoRosterProvider, RosterLookup};
use rusty_court::data::zones::calculate_zones;
use rusty_court::{
    AnalysisSession, AnalyzerConfig, DataError, DataType, FeaturePipeline, FilterDimension,
    FilterEngine, FilterSpec, Season, SeasonIndex, ShotLoader,
};
use tempfile::TempDir;

const HEADER: &str =
    "GAME_ID,GAME_DATE,PLAYER_NAME,TEAM_NAME,PERIOD,MINUTES_REMAINING,LOC_X,LOC_Y,SHOT_MADE_FLAG,SHOT_ZONE_BASIC\n";

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

/// Ten shots over two games three days apart, plus another player's shots.
fn two_game_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let mut body = String::from(HEADER);
    let zones = ["Restricted Area", "Mid-Range", "Above the Break 3"];
    for i in 0..4 {
        body.push_str(&format!(
            "22200001,20221020,Test Player,Boston Celtics,{},{},10,20,{},{}\n",
            i % 4 + 1,
            11 - i,
            i % 2,
            zones[i % 3]
        ));
    }
    for i in 0..6 {
        body.push_str(&format!(
            "22200002,20221023,Test Player,Boston Celtics,{},{},-30,150,{},{}\n",
            i % 4 + 1,
            i,
            (i + 1) % 2,
            zones[i % 3]
        ));
    }
    body.push_str("22200001,20221020,Other Player,Boston Celtics,1,5,0,0,1,Restricted Area\n");
    write(dir.path(), "shotdetail_2023.csv", &body);
    write(dir.path(), "nbastats_2023.csv", "PLAYER_NAME,GP\nTest Player,2\n");
    dir
}

fn config_for(dir: &Path) -> AnalyzerConfig {
    AnalyzerConfig::with_data_dir(dir)
}

#[test]
fn rest_day_filter_selects_second_game() {
    let dir = two_game_fixture();
    let index = SeasonIndex::scan(dir.path(), 1000);
    let season = Season::new(2022);
    assert_eq!(index.available_seasons(), vec![season]);

    let mut shots = ShotLoader::new(&index, 3).load(season, "Test Player", true).unwrap();
    assert_eq!(shots.len(), 10);
    FeaturePipeline::seeded(42).enrich(&mut shots);

    let first: Vec<i64> = shots.rows[..4].iter().filter_map(|r| r.get_i64("rest_days")).collect();
    assert_eq!(first, vec![0; 4]);

    let spec = FilterSpec::default_all().with(FilterDimension::RestDays, "2 Days Rest");
    let out = FilterEngine::new(42).apply_all(&shots, "Test Player", "Boston Celtics", &spec);
    assert_eq!(out.len(), 6);
    assert!(out.rows.iter().all(|r| r.get_i64("game_id") == Some(22200002)));
    assert!(out.rows.iter().all(|r| r.get_i64("game_num") == Some(2)));
}

#[test]
fn unknown_player_is_empty_through_the_whole_chain() {
    let dir = two_game_fixture();
    let index = SeasonIndex::scan(dir.path(), 1000);
    let shots = ShotLoader::new(&index, 10_000)
        .load(Season::new(2022), "X", true)
        .unwrap();
    assert!(shots.is_empty());

    let engine = FilterEngine::default();
    for spec in [
        FilterSpec::default_all(),
        FilterSpec::new().with(FilterDimension::Quarter, "1st"),
        FilterSpec::new()
            .with(FilterDimension::HomeAway, "Home")
            .with(FilterDimension::Streak, "No Streak"),
    ] {
        assert!(engine.apply_all(&shots, "X", "Boston Celtics", &spec).is_empty());
    }
    assert!(calculate_zones(&shots).is_empty());
}

#[test]
fn non_shotdetail_files_take_the_file_year_as_season_end() {
    let dir = two_game_fixture();
    let index = SeasonIndex::scan(dir.path(), 1000);
    let avail = index.availability(Season::new(2022));
    assert!(avail[&DataType::ShotDetail]);
    assert!(avail[&DataType::NbaStats]);
    assert!(!avail[&DataType::Matchups]);
}

#[test]
fn filters_are_identity_and_order_free() {
    let dir = two_game_fixture();
    let index = SeasonIndex::scan(dir.path(), 1000);
    let mut shots = ShotLoader::new(&index, 10_000)
        .load(Season::new(2022), "Test Player", false)
        .unwrap();
    FeaturePipeline::seeded(7).enrich(&mut shots);
    let engine = FilterEngine::new(7);

    let unchanged = engine.apply_all(&shots, "Test Player", "Boston Celtics", &FilterSpec::default_all());
    assert_eq!(unchanged, shots);

    let ab = FilterSpec::new()
        .with(FilterDimension::Quarter, "1st")
        .with(FilterDimension::HomeAway, "Home");
    let ba = FilterSpec::new()
        .with(FilterDimension::HomeAway, "Home")
        .with(FilterDimension::Quarter, "1st");
    assert_eq!(
        engine.apply_all(&shots, "Test Player", "Boston Celtics", &ab),
        engine.apply_all(&shots, "Test Player", "Boston Celtics", &ba)
    );
}

#[test]
fn zone_invariants_hold() {
    let dir = two_game_fixture();
    let index = SeasonIndex::scan(dir.path(), 1000);
    let shots = ShotLoader::new(&index, 10_000)
        .load(Season::new(2022), "Test Player", true)
        .unwrap();
    let zones = calculate_zones(&shots);
    assert_eq!(zones.len(), 3);
    assert_eq!(zones.values().map(|z| z.attempted).sum::<u32>(), 10);
    for stats in zones.values() {
        assert!(stats.made <= stats.attempted);
        assert!((0.0..=100.0).contains(&stats.percentage));
    }
}

#[test]
fn playoff_rows_are_tagged_and_follow_regular_rows() {
    let dir = two_game_fixture();
    let mut body = String::from(HEADER);
    body.push_str("42200001,20230420,Test Player,Boston Celtics,2,3,0,10,1,Restricted Area\n");
    write(dir.path(), "shotdetail_po_2023.csv", &body);

    let index = SeasonIndex::scan(dir.path(), 1000);
    let loader = ShotLoader::new(&index, 10_000);
    let shots = loader.load(Season::new(2022), "Test Player", true).unwrap();
    assert_eq!(shots.len(), 11);
    assert_eq!(shots.rows[10].get_str("season_type"), Some("Playoffs"));
    assert_eq!(shots.rows[0].get_str("season_type"), Some("Regular"));

    let regular_only = loader.load(Season::new(2022), "Test Player", false).unwrap();
    assert_eq!(regular_only.len(), 10);
}

#[test]
fn corrupt_rows_surface_as_csv_errors_with_the_path() {
    let dir = TempDir::new().unwrap();
    let body = format!(
        "{HEADER}1,20221020,P,Boston Celtics,1,5,0,0,1,Paint\n2,20221021,P,oops\n"
    );
    write(dir.path(), "shotdetail_2023.csv", &body);

    let index = SeasonIndex::scan(dir.path(), 1);
    let err = ShotLoader::new(&index, 10_000)
        .load(Season::new(2022), "P", true)
        .unwrap_err();
    assert!(matches!(err, DataError::Csv { .. }));
    assert!(err.path().ends_with("shotdetail_2023.csv"));
}

#[test]
fn roster_falls_back_to_shot_data() {
    let dir = two_game_fixture();
    let index = SeasonIndex::scan(dir.path(), 1000);
    let lookup = resolve_roster(&NoRosterProvider, &index, Season::new(2022), "Boston Celtics").unwrap();
    assert_eq!(
        lookup,
        RosterLookup::Found(vec!["Other Player".to_string(), "Test Player".to_string()])
    );
    let none = resolve_roster(&NoRosterProvider, &index, Season::new(2022), "Utah Jazz").unwrap();
    assert_eq!(none, RosterLookup::Unavailable);
}

#[test]
fn sessions_share_one_index() {
    let dir = two_game_fixture();
    let mut first = AnalysisSession::open(config_for(dir.path()));
    let mut second = AnalysisSession::with_index(config_for(dir.path()), Arc::clone(first.index()));
    assert_eq!(first.seasons(), vec![Season::new(2022)]);
    let check = first.verify_season(Season::new(2022)).unwrap().unwrap();
    assert!(check.looks_correct());
    assert_eq!(check.total, 11);

    let n = first
        .select_player(Season::new(2022), "Boston Celtics", "Test Player")
        .unwrap();
    assert_eq!(n, 10);
    second
        .select_player(Season::new(2022), "Boston Celtics", "Other Player")
        .unwrap();
    assert_eq!(second.filtered().len(), 1);

    // Five of the ten shots were made.
    assert_eq!(first.status_line(), "5/10 shots (50.0%) | 0 filters active");

    first.set_filter("rest_days", "2 Days Rest");
    assert_eq!(first.filtered().len(), 6);
    assert_eq!(first.filters().active_count(), 1);
    assert!(first.zones().column.is_some());

    first.set_filter("rest_days", ALL);
    assert_eq!(first.filtered().len(), 10);
    first.set_filter("quarter", "OT");
    assert!(first.filtered().is_empty());
    first.reset_filters();
    assert_eq!(first.filtered().len(), 10);
    assert_eq!(second.filtered().len(), 1);
}
