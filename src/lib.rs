pub mod config;
pub mod data;
pub mod error;
pub mod state;

pub use config::AnalyzerConfig;
pub use data::features::FeaturePipeline;
pub use data::filter::{FilterDimension, FilterEngine, FilterSpec};
pub use data::loader::ShotLoader;
pub use data::model::{CellValue, ShotFrame, ShotRecord};
pub use data::season::{DataType, Season, SeasonIndex};
pub use data::zones::{ShotTotals, ZoneReport, ZoneStats};
pub use error::DataError;
pub use state::AnalysisSession;
