use serde::{Deserialize, Serialize};

/// Warning card attached to a recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningCard {
    pub warning_type: String, // "soil_nitrogen_excess"
    pub severity: Severity,
    pub icon: String, // "ℹ️", "⚠️", "🚨" from Severity::icon
    pub message: String,
    pub detail: String,
    pub advice: String,
}

/// Severity level for warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Derive severity from excess nitrogen as a fraction of the requirement
    pub fn from_excess_ratio(ratio: f64) -> Self {
        match ratio {
            r if r >= 1.0 => Severity::High,
            r if r >= 0.5 => Severity::Medium,
            _ => Severity::Low,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Low => "ℹ️",
            Severity::Medium => "⚠️",
            Severity::High => "🚨",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_excess_ratio() {
        assert_eq!(Severity::from_excess_ratio(1.23), Severity::High);
        assert_eq!(Severity::from_excess_ratio(1.0), Severity::High);
        assert_eq!(Severity::from_excess_ratio(0.5), Severity::Medium);
        assert_eq!(Severity::from_excess_ratio(0.1), Severity::Low);
    }

    #[test]
    fn test_severity_icons() {
        assert_eq!(Severity::Low.icon(), "ℹ️");
        assert_eq!(Severity::Medium.icon(), "⚠️");
        assert_eq!(Severity::High.icon(), "🚨");
    }
}
