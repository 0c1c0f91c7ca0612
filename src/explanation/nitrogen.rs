use crate::explanation::types::{Severity, WarningCard};
use crate::recommend::Recommendation;

/// Check whether soil nitrogen exceeds the crop requirement
///
/// Returns a warning when there is excess nitrogen; severity grows with the
/// excess relative to the requirement midpoint.
pub fn check_soil_nitrogen_excess(rec: &Recommendation) -> Option<WarningCard> {
    if !rec.has_excess() {
        return None;
    }

    let ratio = if rec.required_n_midpoint > 0.0 {
        rec.excess_n / rec.required_n_midpoint
    } else {
        f64::INFINITY
    };
    let severity = Severity::from_excess_ratio(ratio);

    Some(WarningCard {
        warning_type: "soil_nitrogen_excess".to_string(),
        severity,
        icon: severity.icon().to_string(),
        message: format!(
            "Soil in {} already exceeds the {} requirement by {:.1} kg/ha",
            rec.district, rec.crop, rec.excess_n
        ),
        detail: "Applying the full Urea dose on top of existing soil nitrogen wastes fertilizer and raises leaching losses".to_string(),
        advice: format!("Cut Urea by up to {:.2} kg/ha", rec.recommended_urea_kg_ha),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CropRequirement, DistrictSoil};
    use crate::recommend::recommend_for;
    use crate::utils::NitrogenRange;

    fn rec(min: f64, max: f64, soil: f64) -> Recommendation {
        let crop = CropRequirement {
            name: "Rice".to_string(),
            key: "rice".to_string(),
            nitrogen: NitrogenRange::new(min, max).unwrap(),
            full_urea_dose: None,
        };
        let district = DistrictSoil {
            name: "Ludhiana".to_string(),
            key: "ludhiana".to_string(),
            state: "Punjab".to_string(),
            state_key: "punjab".to_string(),
            avg_soil_nitrogen: soil,
        };
        recommend_for(&crop, &district)
    }

    #[test]
    fn test_large_excess_is_high() {
        let w = check_soil_nitrogen_excess(&rec(100.0, 120.0, 245.0)).unwrap();
        assert_eq!(w.warning_type, "soil_nitrogen_excess");
        assert_eq!(w.severity, Severity::High);
        assert!(w.message.contains("135.0 kg/ha"));
        assert!(w.advice.contains("293.48"));
    }

    #[test]
    fn test_moderate_excess() {
        let w = check_soil_nitrogen_excess(&rec(100.0, 100.0, 160.0)).unwrap();
        assert_eq!(w.severity, Severity::Medium);

        let w = check_soil_nitrogen_excess(&rec(100.0, 100.0, 110.0)).unwrap();
        assert_eq!(w.severity, Severity::Low);
    }

    #[test]
    fn test_zero_requirement_with_soil_nitrogen() {
        let w = check_soil_nitrogen_excess(&rec(0.0, 0.0, 20.0)).unwrap();
        assert_eq!(w.severity, Severity::High);
    }

    #[test]
    fn test_no_excess_no_warning() {
        assert!(check_soil_nitrogen_excess(&rec(120.0, 150.0, 50.0)).is_none());
    }
}
