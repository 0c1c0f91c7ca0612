//! AgriBot: Urea Reduction Advisor
//!
//! Turns a chat message such as "Plan for Rice in Ludhiana" into a
//! fertilizer recommendation: how much Urea can be left out because the
//! district's soil already holds more nitrogen than the crop needs.
//!
//! Module layout:
//! - `data/`: CSV reference tables loaded with Polars
//! - `utils/`: Name normalization, range parsing, column validation
//! - `extract/`: Crop, district and state mentions in free text
//! - `recommend/`: Excess nitrogen and Urea arithmetic
//! - `explanation/`: Warning cards and markdown/JSON rendering
//! - `session/`: Per-conversation tables, uploads, reset and memory

pub mod utils;
pub mod error;
pub mod config;
pub mod data;
pub mod extract;
pub mod recommend;
pub mod explanation;
pub mod session;

// Re-export commonly used types
pub use config::{Config, OutputFormat};
pub use data::{CropRequirement, CropTable, DistrictSoil, DistrictTable, TableSet};
pub use data::{load_crop_table, load_district_table};
pub use error::{ConfigError, DataFormatError, TableKind};
pub use explanation::{JsonFormatter, MarkdownFormatter};
pub use extract::{extract, ExtractedQuery};
pub use recommend::{recommend, IncompleteQuery, Recommendation};
pub use session::{Reply, Session, TableStatus};
pub use utils::NitrogenRange;
