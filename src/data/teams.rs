//! League teams and the name variants used to match them in raw data.

/// A franchise as it appears in the league's static team list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team {
    pub id: u32,
    pub abbreviation: &'static str,
    pub full_name: &'static str,
}

pub static TEAMS: [Team; 30] = [
    Team { id: 1610612737, abbreviation: "ATL", full_name: "Atlanta Hawks" },
    Team { id: 1610612738, abbreviation: "BOS", full_name: "Boston Celtics" },
    Team { id: 1610612751, abbreviation: "BKN", full_name: "Brooklyn Nets" },
    Team { id: 1610612766, abbreviation: "CHA", full_name: "Charlotte Hornets" },
    Team { id: 1610612741, abbreviation: "CHI", full_name: "Chicago Bulls" },
    Team { id: 1610612739, abbreviation: "CLE", full_name: "Cleveland Cavaliers" },
    Team { id: 1610612742, abbreviation: "DAL", full_name: "Dallas Mavericks" },
    Team { id: 1610612743, abbreviation: "DEN", full_name: "Denver Nuggets" },
    Team { id: 1610612765, abbreviation: "DET", full_name: "Detroit Pistons" },
    Team { id: 1610612744, abbreviation: "GSW", full_name: "Golden State Warriors" },
    Team { id: 1610612745, abbreviation: "HOU", full_name: "Houston Rockets" },
    Team { id: 1610612754, abbreviation: "IND", full_name: "Indiana Pacers" },
    Team { id: 1610612746, abbreviation: "LAC", full_name: "LA Clippers" },
    Team { id: 1610612747, abbreviation: "LAL", full_name: "Los Angeles Lakers" },
    Team { id: 1610612763, abbreviation: "MEM", full_name: "Memphis Grizzlies" },
    Team { id: 1610612748, abbreviation: "MIA", full_name: "Miami Heat" },
    Team { id: 1610612749, abbreviation: "MIL", full_name: "Milwaukee Bucks" },
    Team { id: 1610612750, abbreviation: "MIN", full_name: "Minnesota Timberwolves" },
    Team { id: 1610612740, abbreviation: "NOP", full_name: "New Orleans Pelicans" },
    Team { id: 1610612752, abbreviation: "NYK", full_name: "New York Knicks" },
    Team { id: 1610612760, abbreviation: "OKC", full_name: "Oklahoma City Thunder" },
    Team { id: 1610612753, abbreviation: "ORL", full_name: "Orlando Magic" },
    Team { id: 1610612755, abbreviation: "PHI", full_name: "Philadelphia 76ers" },
    Team { id: 1610612756, abbreviation: "PHX", full_name: "Phoenix Suns" },
    Team { id: 1610612757, abbreviation: "POR", full_name: "Portland Trail Blazers" },
    Team { id: 1610612758, abbreviation: "SAC", full_name: "Sacramento Kings" },
    Team { id: 1610612759, abbreviation: "SAS", full_name: "San Antonio Spurs" },
    Team { id: 1610612761, abbreviation: "TOR", full_name: "Toronto Raptors" },
    Team { id: 1610612762, abbreviation: "UTA", full_name: "Utah Jazz" },
    Team { id: 1610612764, abbreviation: "WAS", full_name: "Washington Wizards" },
];

pub fn by_abbreviation(abbreviation: &str) -> Option<&'static Team> {
    TEAMS.iter().find(|t| t.abbreviation == abbreviation)
}

pub fn by_full_name(full_name: &str) -> Option<&'static Team> {
    TEAMS.iter().find(|t| t.full_name == full_name)
}

/// Full name for an abbreviation; unknown abbreviations pass through.
pub fn full_name_for(abbreviation: &str) -> &str {
    by_abbreviation(abbreviation).map_or(abbreviation, |t| t.full_name)
}

/// Abbreviation for a full name; unknown names pass through.
pub fn abbreviation_for(full_name: &str) -> &str {
    by_full_name(full_name).map_or(full_name, |t| t.abbreviation)
}

/// Team full names offered for a season, alphabetical. The static list does
/// not vary by season.
pub fn teams_for_season() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = TEAMS.iter().map(|t| t.full_name).collect();
    names.sort_unstable();
    names
}

/// Every spelling a team may appear under in raw data: the name itself, its
/// abbreviation, upper-case, lower-case and space-stripped forms. Duplicates
/// are dropped, first occurrence wins.
pub fn team_name_variants(full_name: &str) -> Vec<String> {
    let mut candidates = vec![full_name.to_string()];
    if let Some(team) = by_full_name(full_name) {
        candidates.push(team.abbreviation.to_string());
    }
    candidates.push(full_name.to_uppercase());
    candidates.push(full_name.to_lowercase());
    candidates.push(full_name.replace(' ', ""));

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for c in candidates {
        if !variants.contains(&c) {
            variants.push(c);
        }
    }
    variants
}
