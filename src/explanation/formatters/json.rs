use crate::recommend::Recommendation;
use crate::session::Reply;
use serde_json;

/// JSON formatter for recommendations and replies
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format recommendation as pretty-printed JSON
    pub fn format(rec: &Recommendation) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(rec)
    }

    /// Format recommendation as compact JSON (no whitespace)
    pub fn format_compact(rec: &Recommendation) -> Result<String, serde_json::Error> {
        serde_json::to_string(rec)
    }

    /// Format any session reply as compact JSON, one object per line
    pub fn format_reply(reply: &Reply) -> Result<String, serde_json::Error> {
        serde_json::to_string(reply)
    }
}
