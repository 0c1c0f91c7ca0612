pub mod types;
pub mod nitrogen;
pub mod formatters;

pub use types::{Severity, WarningCard};
pub use nitrogen::check_soil_nitrogen_excess;
pub use formatters::{JsonFormatter, MarkdownFormatter};
