/// Data layer: season index, per-player loading, derived features, filters
/// and zone summaries.
///
/// Architecture:
/// ```text
///   data_dir/*.csv
///        │
///        ▼
///   ┌──────────┐
///   │  season   │  scan + date sampling → SeasonIndex
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  stream one player's rows → ShotFrame
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ features  │  game_num, rest_days, seeded estimates
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSpec → filtered ShotFrame
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  zones    │  per-zone attempts / makes
///   └──────────┘
/// ```
///
/// `teams` and `roster` sit beside the pipeline and feed team names and
/// player lists into it.

pub mod features;
pub mod filter;
pub mod loader;
pub mod model;
pub mod roster;
pub mod season;
pub mod teams;
pub mod zones;
