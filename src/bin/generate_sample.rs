use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

const SEED: u64 = 42;

/// (player, team full name, team abbreviation, shots per game)
const PLAYERS: [(&str, &str, &str, u32); 4] = [
    ("Stephen Curry", "Golden State Warriors", "GSW", 20),
    ("Klay Thompson", "Golden State Warriors", "GSW", 16),
    ("Jayson Tatum", "Boston Celtics", "BOS", 19),
    ("Jaylen Brown", "Boston Celtics", "BOS", 17),
];

const OPPONENTS: [&str; 6] = ["LAL", "PHX", "MIA", "DEN", "MIL", "NYK"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct ShotRow<'a> {
    game_id: u64,
    game_date: String,
    player_name: &'a str,
    team_name: &'a str,
    period: u32,
    minutes_remaining: u32,
    loc_x: i32,
    loc_y: i32,
    shot_made_flag: u8,
    shot_zone_basic: &'static str,
    shot_type: &'static str,
    htm: &'a str,
    vtm: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct StatsRow<'a> {
    player_name: &'a str,
    team_abbreviation: &'a str,
    gp: u32,
    fga: u32,
    fgm: u32,
}

struct Game {
    id: u64,
    date: NaiveDate,
    home: bool,
    opponent: &'static str,
}

/// Game dates for one team: `count` games from `start`, 1-3 days apart.
fn schedule(rng: &mut ChaCha8Rng, first_id: u64, start: NaiveDate, count: u64) -> Vec<Game> {
    let mut date = start;
    (0..count)
        .map(|i| {
            let game = Game {
                id: first_id + i,
                date,
                home: rng.gen_bool(0.5),
                opponent: OPPONENTS[rng.gen_range(0..OPPONENTS.len())],
            };
            date += Duration::days(rng.gen_range(1..=3));
            game
        })
        .collect()
}

/// Zone name, shot type and make probability for a court location (tenths of
/// a foot from the basket).
fn classify(x: i32, y: i32) -> (&'static str, &'static str, f64) {
    let feet = f64::from(x).hypot(f64::from(y)) / 10.0;
    if y > 470 {
        ("Backcourt", "3PT Field Goal", 0.02)
    } else if x.abs() > 220 && y < 92 {
        if x < 0 {
            ("Left Corner 3", "3PT Field Goal", 0.39)
        } else {
            ("Right Corner 3", "3PT Field Goal", 0.39)
        }
    } else if feet > 23.75 {
        ("Above the Break 3", "3PT Field Goal", 0.36)
    } else if feet > 14.0 {
        ("Mid-Range", "2PT Field Goal", 0.42)
    } else if feet > 4.0 {
        ("In The Paint (Non-RA)", "2PT Field Goal", 0.45)
    } else {
        ("Restricted Area", "2PT Field Goal", 0.64)
    }
}

fn write_shots(path: &Path, games_by_team: &[(&str, Vec<Game>)], rng: &mut ChaCha8Rng) -> Result<Vec<(usize, u32, u32)>> {
    let spread_x = Normal::<f64>::new(0.0, 120.0)?;
    let spread_y = Normal::<f64>::new(110.0, 90.0)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    // (player index, attempts, makes)
    let mut totals = Vec::new();
    for (p, &(player, team, abbr, per_game)) in PLAYERS.iter().enumerate() {
        let Some((_, games)) = games_by_team.iter().find(|(t, _)| *t == abbr) else {
            continue;
        };
        let (mut fga, mut fgm) = (0, 0);
        for game in games {
            let (htm, vtm) = if game.home { (abbr, game.opponent) } else { (game.opponent, abbr) };
            let shots = rng.gen_range(per_game.saturating_sub(5)..=per_game + 5);
            for _ in 0..shots {
                let loc_x = (spread_x.sample(rng) as i32).clamp(-250, 250);
                let loc_y = (spread_y.sample(rng).abs() as i32).clamp(-40, 480);
                let (zone, shot_type, p_make) = classify(loc_x, loc_y);
                let made = rng.gen_bool(p_make);
                fga += 1;
                fgm += u32::from(made);
                writer.serialize(ShotRow {
                    game_id: game.id,
                    game_date: game.date.format("%Y%m%d").to_string(),
                    player_name: player,
                    team_name: team,
                    period: rng.gen_range(1..=4),
                    minutes_remaining: rng.gen_range(0..12),
                    loc_x,
                    loc_y,
                    shot_made_flag: u8::from(made),
                    shot_zone_basic: zone,
                    shot_type,
                    htm,
                    vtm,
                })?;
            }
        }
        totals.push((p, fga, fgm));
    }
    writer.flush()?;
    Ok(totals)
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("nba_data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let regular_start = NaiveDate::from_ymd_opt(2022, 10, 18).context("bad regular season start")?;
    let playoff_start = NaiveDate::from_ymd_opt(2023, 4, 16).context("bad playoff start")?;

    let regular = vec![
        ("GSW", schedule(&mut rng, 22200001, regular_start, 12)),
        ("BOS", schedule(&mut rng, 22200101, regular_start, 12)),
    ];
    let playoffs = vec![
        ("GSW", schedule(&mut rng, 42200001, playoff_start, 6)),
        ("BOS", schedule(&mut rng, 42200101, playoff_start, 6)),
    ];

    let reg_path = out_dir.join("shotdetail_2023.csv");
    let totals = write_shots(&reg_path, &regular, &mut rng)?;
    log::info!("Wrote {}", reg_path.display());

    let po_path = out_dir.join("shotdetail_po_2023.csv");
    write_shots(&po_path, &playoffs, &mut rng)?;
    log::info!("Wrote {}", po_path.display());

    let stats_path = out_dir.join("nbastats_2023.csv");
    let mut writer = csv::Writer::from_path(&stats_path)
        .with_context(|| format!("Failed to create {}", stats_path.display()))?;
    for (p, fga, fgm) in totals {
        let (player, _, abbr, _) = PLAYERS[p];
        writer.serialize(StatsRow {
            player_name: player,
            team_abbreviation: abbr,
            gp: 12,
            fga,
            fgm,
        })?;
    }
    writer.flush()?;

    println!(
        "Wrote sample season 2022-23 for {} players to {}",
        PLAYERS.len(),
        out_dir.display()
    );
    Ok(())
}
