//! Entity Extraction from Free-Text Messages
//!
//! Maps a chat message to a (crop, district) pair by searching the message
//! for every known name. Matching is token-aligned substring search over
//! normalized text: "rice" matches "Rice in Ludhiana" but not "price".
//!
//! Selection rules per category:
//! 1. Longest matching name wins ("pearl millet" beats "millet")
//! 2. Ties go to the earliest position in the message
//!
//! State names only disambiguate districts that exist in several states.
//! Every state named in the message is considered, in message order.

use crate::data::{CropRequirement, CropTable, DistrictSoil, DistrictTable};
use crate::utils::{find_token, normalize_key};
use std::cmp::Reverse;

/// Entities found in one message
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedQuery<'a> {
    pub raw_text: String,
    pub matched_crop: Option<&'a CropRequirement>,
    pub matched_district: Option<&'a DistrictSoil>,
    /// Normalized key of the best-matching state named in the message
    pub matched_state: Option<String>,
    /// Normalized keys of every state named in the message, in message order
    pub mentioned_states: Vec<String>,
    /// District name found in several states with no state to pick one
    pub ambiguous_district: Option<String>,
    /// States sharing `ambiguous_district`, in table order
    pub ambiguous_states: Vec<String>,
}

impl<'a> ExtractedQuery<'a> {
    /// Query with nothing matched
    pub fn empty(raw_text: &str) -> Self {
        Self {
            raw_text: raw_text.to_string(),
            matched_crop: None,
            matched_district: None,
            matched_state: None,
            mentioned_states: Vec::new(),
            ambiguous_district: None,
            ambiguous_states: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.matched_crop.is_some() && self.matched_district.is_some()
    }
}

/// Pick the longest key found in `text`, earliest position on ties
fn best_match<'k>(text: &str, keys: impl Iterator<Item = &'k str>) -> Option<&'k str> {
    keys.filter_map(|key| find_token(text, key).map(|pos| (key, pos)))
        .max_by_key(|&(key, pos)| (key.chars().count(), Reverse(pos)))
        .map(|(key, _)| key)
}

/// Every key found in `text`, ordered by first position
fn all_matches<'k>(text: &str, keys: impl Iterator<Item = &'k str>) -> Vec<&'k str> {
    let mut found: Vec<(usize, &str)> = keys
        .filter_map(|key| find_token(text, key).map(|pos| (pos, key)))
        .collect();
    found.sort_by_key(|&(pos, key)| (pos, Reverse(key.len())));
    found.into_iter().map(|(_, key)| key).collect()
}

/// Choose among districts sharing one name
///
/// The first mentioned state holding a candidate wins. Returns the
/// resolved district, or the candidate state names when the message gave
/// no usable state.
fn resolve_district<'a>(
    districts: &'a DistrictTable,
    key: &str,
    states: &[String],
) -> (Option<&'a DistrictSoil>, Vec<String>) {
    let candidates = districts.entries_named(key);

    if let [only] = candidates.as_slice() {
        return (Some(*only), Vec::new());
    }

    let hit = states
        .iter()
        .find_map(|state| candidates.iter().find(|d| &d.state_key == state));
    if let Some(hit) = hit {
        return (Some(*hit), Vec::new());
    }

    (None, candidates.iter().map(|d| d.state.clone()).collect())
}

/// Extract crop, district and state mentions from a message
///
/// Never fails; unmatched categories are left unset.
pub fn extract<'a>(
    message: &str,
    crops: &'a CropTable,
    districts: &'a DistrictTable,
) -> ExtractedQuery<'a> {
    let text = normalize_key(message);
    let mut query = ExtractedQuery::empty(message);
    if text.is_empty() {
        return query;
    }

    query.matched_crop =
        best_match(&text, crops.iter().map(|c| c.key.as_str())).and_then(|key| crops.get(key));

    let state_keys = districts.state_keys();
    query.matched_state = best_match(&text, state_keys.iter().copied()).map(str::to_string);
    query.mentioned_states = all_matches(&text, state_keys.into_iter())
        .into_iter()
        .map(str::to_string)
        .collect();

    if let Some(key) = best_match(&text, districts.iter().map(|d| d.key.as_str())) {
        let (district, ambiguous) = resolve_district(districts, key, &query.mentioned_states);
        query.matched_district = district;
        if !ambiguous.is_empty() {
            query.ambiguous_district = districts.entries_named(key).first().map(|d| d.name.clone());
            query.ambiguous_states = ambiguous;
        }
    }

    tracing::debug!(
        "Extracted crop={:?} district={:?} state={:?} from '{}'",
        query.matched_crop.map(|c| c.key.as_str()),
        query.matched_district.map(|d| d.key.as_str()),
        query.matched_state,
        message
    );

    query
}
