//! Player lists for a team and season.
//!
//! An external [`RosterProvider`] is asked first; when it has nothing, the
//! roster is rebuilt from the names appearing in the season's shot data.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::loader::PLAYER_NAME_HEADER;
use super::season::{DataType, Season, SeasonIndex};
use super::teams;
use crate::error::DataError;

/// Raw header holding the shooter's team.
pub const TEAM_NAME_HEADER: &str = "TEAM_NAME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterLookup {
    Found(Vec<String>),
    Unavailable,
}

impl RosterLookup {
    fn from_names(names: Vec<String>) -> Self {
        if names.is_empty() {
            RosterLookup::Unavailable
        } else {
            RosterLookup::Found(names)
        }
    }

    pub fn players(&self) -> &[String] {
        match self {
            RosterLookup::Found(names) => names,
            RosterLookup::Unavailable => &[],
        }
    }
}

/// Source of authoritative rosters, e.g. a remote stats service.
pub trait RosterProvider {
    fn roster(&self, team_abbreviation: &str, season: Season) -> RosterLookup;
}

/// Provider that never knows anything; forces the shot-data fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRosterProvider;

impl RosterProvider for NoRosterProvider {
    fn roster(&self, _team_abbreviation: &str, _season: Season) -> RosterLookup {
        RosterLookup::Unavailable
    }
}

/// Ask `provider` first, then fall back to the shot data.
pub fn resolve_roster<P: RosterProvider + ?Sized>(
    provider: &P,
    index: &SeasonIndex,
    season: Season,
    team_full_name: &str,
) -> Result<RosterLookup, DataError> {
    let Some(team) = teams::by_full_name(team_full_name) else {
        log::warn!("Unknown team '{team_full_name}'");
        return Ok(RosterLookup::Unavailable);
    };

    if let RosterLookup::Found(names) = provider.roster(team.abbreviation, season) {
        if !names.is_empty() {
            log::info!("Roster for {team_full_name} {season}: {} players from provider", names.len());
            return Ok(RosterLookup::Found(names));
        }
    }

    log::info!("Falling back to shot data for the {team_full_name} {season} roster");
    roster_from_shot_data(index, season, team_full_name).map(RosterLookup::from_names)
}

/// Distinct player names seen for a team in the season's regular-season shot
/// file. Empty when the season or file is unknown.
pub fn roster_from_shot_data(
    index: &SeasonIndex,
    season: Season,
    team_full_name: &str,
) -> Result<Vec<String>, DataError> {
    let Some(path) = index.file_path(season, DataType::ShotDetail, false) else {
        log::warn!("No regular season shot file for {season}");
        return Ok(Vec::new());
    };
    let players_by_team = players_by_team(path)?;
    Ok(match_team(&players_by_team, team_full_name))
}

fn players_by_team(path: &Path) -> Result<BTreeMap<String, BTreeSet<String>>, DataError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::csv(path, e))?;
    let headers = reader.headers().map_err(|e| DataError::csv(path, e))?.clone();
    let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
    let (Some(team_idx), Some(player_idx)) = (find(TEAM_NAME_HEADER), find(PLAYER_NAME_HEADER)) else {
        log::warn!("{} lacks team or player columns", path.display());
        return Ok(BTreeMap::new());
    };

    let mut by_team: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for result in reader.records() {
        let record = result.map_err(|e| DataError::csv(path, e))?;
        let (Some(team), Some(player)) = (record.get(team_idx), record.get(player_idx)) else {
            continue;
        };
        let player = player.trim();
        if player.is_empty() {
            continue;
        }
        by_team
            .entry(team.to_string())
            .or_default()
            .insert(player.to_string());
    }
    Ok(by_team)
}

/// Exact team-name match first, then case-insensitive containment of the
/// full name, its space-stripped form and its abbreviation, in that order.
fn match_team(by_team: &BTreeMap<String, BTreeSet<String>>, team_full_name: &str) -> Vec<String> {
    if let Some(players) = by_team.get(team_full_name) {
        return players.iter().cloned().collect();
    }

    let variants = [
        team_full_name.to_string(),
        team_full_name.replace(' ', ""),
        teams::abbreviation_for(team_full_name).to_string(),
    ];
    for variant in variants {
        let needle = variant.to_lowercase();
        let hits: BTreeSet<&String> = by_team
            .iter()
            .filter(|(team, _)| team.to_lowercase().contains(&needle))
            .flat_map(|(_, players)| players)
            .collect();
        if !hits.is_empty() {
            log::debug!("Matched roster for {team_full_name} via '{variant}'");
            return hits.into_iter().cloned().collect();
        }
    }
    Vec::new()
}
