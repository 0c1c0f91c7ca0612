//! Urea Reduction Recommendation
//!
//! Soil nitrogen above the crop's requirement is nitrogen the farmer does
//! not need to apply. Urea is 46% nitrogen by mass, so each kg/ha of excess
//! nitrogen corresponds to 1/0.46 kg/ha of Urea that can be left out.
//!
//! ```text
//! required  = (min + max) / 2
//! excess    = max(0, soil - required)
//! reducible = round(excess / 0.46, 2)
//! ```

use crate::data::{CropRequirement, DistrictSoil};
use crate::extract::ExtractedQuery;
use crate::utils::NitrogenRange;
use serde::Serialize;
use thiserror::Error;

/// Mass fraction of nitrogen in Urea
pub const UREA_NITROGEN_FRACTION: f64 = 0.46;

/// Decimal places kept for Urea figures
pub const UREA_DECIMALS: i32 = 2;

/// Computed advice for one crop in one district
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub crop: String,
    pub district: String,
    pub state: String,
    pub required_range: NitrogenRange,
    pub required_n_midpoint: f64,
    pub soil_n: f64,
    /// Soil nitrogen beyond the requirement, never negative
    pub excess_n: f64,
    /// Urea (kg/ha) whose nitrogen equals the excess
    pub recommended_urea_kg_ha: f64,
    /// Reference Urea dose for the crop, when known
    pub full_urea_dose: Option<f64>,
    /// Reference dose minus the reducible amount, floored at zero
    pub adjusted_urea_dose: Option<f64>,
    pub explanation_text: String,
}

impl Recommendation {
    pub fn has_excess(&self) -> bool {
        self.excess_n > 0.0
    }

    /// "Ludhiana, Punjab", or just the district when the state is blank
    pub fn location(&self) -> String {
        if self.state.is_empty() {
            self.district.clone()
        } else {
            format!("{}, {}", self.district, self.state)
        }
    }
}

/// Control signal: the message did not identify both a crop and a district
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("incomplete query: missing {}", describe_missing(.missing_crop, .missing_district))]
pub struct IncompleteQuery {
    pub missing_crop: bool,
    pub missing_district: bool,
    /// District name that matched in several states
    pub ambiguous_district: Option<String>,
    /// Candidate states for `ambiguous_district`
    pub ambiguous_states: Vec<String>,
}

fn describe_missing(crop: &bool, district: &bool) -> &'static str {
    match (*crop, *district) {
        (true, true) => "crop and district",
        (true, false) => "crop",
        (false, true) => "district",
        (false, false) => "nothing",
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Turn extracted entities into a recommendation
///
/// # Errors
/// `IncompleteQuery` naming whichever of crop and district is unmatched.
pub fn recommend(query: &ExtractedQuery<'_>) -> Result<Recommendation, IncompleteQuery> {
    match (query.matched_crop, query.matched_district) {
        (Some(crop), Some(district)) => Ok(recommend_for(crop, district)),
        (crop, district) => Err(IncompleteQuery {
            missing_crop: crop.is_none(),
            missing_district: district.is_none(),
            ambiguous_district: query.ambiguous_district.clone(),
            ambiguous_states: query.ambiguous_states.clone(),
        }),
    }
}

/// Compute the recommendation for a resolved crop and district
pub fn recommend_for(crop: &CropRequirement, district: &DistrictSoil) -> Recommendation {
    let required_n_midpoint = crop.nitrogen.midpoint();
    let soil_n = district.avg_soil_nitrogen;
    let excess_n = (soil_n - required_n_midpoint).max(0.0);
    let recommended_urea_kg_ha = round_to(excess_n / UREA_NITROGEN_FRACTION, UREA_DECIMALS);

    let adjusted_urea_dose = crop
        .full_urea_dose
        .map(|full| round_to((full - recommended_urea_kg_ha).max(0.0), UREA_DECIMALS));

    let mut rec = Recommendation {
        crop: crop.name.clone(),
        district: district.name.clone(),
        state: district.state.clone(),
        required_range: crop.nitrogen,
        required_n_midpoint,
        soil_n,
        excess_n,
        recommended_urea_kg_ha,
        full_urea_dose: crop.full_urea_dose,
        adjusted_urea_dose,
        explanation_text: String::new(),
    };
    rec.explanation_text = explain(&rec);
    rec
}

/// Deterministic plain-text summary
fn explain(rec: &Recommendation) -> String {
    let mut text = format!(
        "{} in {}: the crop needs {} kg/ha of nitrogen (midpoint {:.1} kg/ha) and the soil already holds {:.1} kg/ha. ",
        rec.crop,
        rec.location(),
        rec.required_range,
        rec.required_n_midpoint,
        rec.soil_n
    );

    if rec.has_excess() {
        text.push_str(&format!(
            "Excess nitrogen is {:.1} kg/ha, so Urea application can be reduced by {:.2} kg/ha (Urea is 46% nitrogen).",
            rec.excess_n, rec.recommended_urea_kg_ha
        ));
        if let (Some(full), Some(adjusted)) = (rec.full_urea_dose, rec.adjusted_urea_dose) {
            text.push_str(&format!(
                " The reference dose of {:.2} kg/ha becomes {:.2} kg/ha.",
                full, adjusted
            ));
        }
    } else {
        text.push_str(
            "Excess nitrogen is 0.0 kg/ha: soil nitrogen does not exceed the requirement, so no Urea reduction is possible and the full recommended dose applies",
        );
        match rec.full_urea_dose {
            Some(full) => text.push_str(&format!(" ({:.2} kg/ha of Urea).", full)),
            None => text.push('.'),
        }
    }

    text
}
