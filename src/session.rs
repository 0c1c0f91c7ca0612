//! Chat Session State
//!
//! A `Session` owns the tables a conversation works against and the
//! entities remembered from the previous turn. It is passed explicitly to
//! the front end; nothing here is global.
//!
//! Tables are replaced wholesale: an upload is parsed first and swapped in
//! only if it is valid, so a failed upload leaves the session untouched.

use crate::data::{
    load_crop_table, load_crop_table_from_path, load_district_table,
    load_district_table_from_path, CropTable, DistrictTable, TableSet,
};
use crate::error::DataFormatError;
use crate::extract::{extract, ExtractedQuery};
use crate::recommend::{recommend, IncompleteQuery, Recommendation};
use crate::utils::normalize_key;
use serde::Serialize;
use std::path::Path;

/// Response to one chat message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Reply {
    Recommendation(Recommendation),
    /// Follow-up question naming the missing entity
    Clarification(String),
    Error(String),
}

impl Reply {
    /// User-facing error for a rejected table
    pub fn from_load_error(err: &DataFormatError) -> Self {
        let mut message = format!("Error reading your file: {}", err);
        if err.is_format_error() {
            message.push_str(
                "\nTip: the header row must name the key column ('crop' or 'district') within the first few lines.",
            );
        }
        Reply::Error(message)
    }
}

/// Counts and origin of the active tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub crops: usize,
    pub districts: usize,
    pub crops_uploaded: bool,
    pub districts_uploaded: bool,
}

/// Entities carried over from the previous turn, by key
#[derive(Debug, Clone, Default, PartialEq)]
struct Remembered {
    crop: Option<String>,
    /// (district key, state key)
    district: Option<(String, String)>,
    /// District key still waiting for a state
    pending_district: Option<String>,
}

pub struct Session {
    defaults: TableSet,
    tables: TableSet,
    crops_uploaded: bool,
    districts_uploaded: bool,
    last: Remembered,
}

impl Session {
    pub fn new(defaults: TableSet) -> Self {
        Session {
            tables: defaults.clone(),
            defaults,
            crops_uploaded: false,
            districts_uploaded: false,
            last: Remembered::default(),
        }
    }

    /// Session over the tables compiled into the crate
    pub fn with_bundled_defaults() -> Result<Self, DataFormatError> {
        Ok(Self::new(TableSet::bundled()?))
    }

    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    pub fn status(&self) -> TableStatus {
        TableStatus {
            crops: self.tables.crops.len(),
            districts: self.tables.districts.len(),
            crops_uploaded: self.crops_uploaded,
            districts_uploaded: self.districts_uploaded,
        }
    }

    /// Replace the crop table; on error the current table stays active
    pub fn upload_crop_table(&mut self, source: &str) -> Result<(), DataFormatError> {
        self.swap_crops(load_crop_table(source))
    }

    /// Replace the crop table from a file; on error the current table stays active
    pub fn upload_crop_table_from_path(&mut self, path: &Path) -> Result<(), DataFormatError> {
        self.swap_crops(load_crop_table_from_path(path))
    }

    /// Replace the district table; on error the current table stays active
    pub fn upload_district_table(&mut self, source: &str) -> Result<(), DataFormatError> {
        self.swap_districts(load_district_table(source))
    }

    /// Replace the district table from a file; on error the current table stays active
    pub fn upload_district_table_from_path(&mut self, path: &Path) -> Result<(), DataFormatError> {
        self.swap_districts(load_district_table_from_path(path))
    }

    fn swap_crops(&mut self, loaded: Result<CropTable, DataFormatError>) -> Result<(), DataFormatError> {
        let crops = loaded.map_err(|e| {
            tracing::warn!("Rejected crop table upload: {}", e);
            e
        })?;
        self.tables.crops = crops;
        self.crops_uploaded = true;
        self.last = Remembered::default();
        Ok(())
    }

    fn swap_districts(
        &mut self,
        loaded: Result<DistrictTable, DataFormatError>,
    ) -> Result<(), DataFormatError> {
        let districts = loaded.map_err(|e| {
            tracing::warn!("Rejected district table upload: {}", e);
            e
        })?;
        self.tables.districts = districts;
        self.districts_uploaded = true;
        self.last = Remembered::default();
        Ok(())
    }

    /// Drop uploads and remembered entities, back to the default tables
    pub fn reset(&mut self) {
        self.tables = self.defaults.clone();
        self.crops_uploaded = false;
        self.districts_uploaded = false;
        self.last = Remembered::default();
        tracing::info!("Session reset to default tables");
    }

    /// Extract entities without consulting or updating memory
    pub fn extract(&self, message: &str) -> ExtractedQuery<'_> {
        extract(message, &self.tables.crops, &self.tables.districts)
    }

    /// Process one chat message
    ///
    /// Entities missing from this message are taken from the previous
    /// turn, so "Rice" followed by "in Ludhiana" yields a recommendation.
    pub fn handle_message(&mut self, message: &str) -> Reply {
        if message.trim().is_empty() {
            return Reply::Clarification(both_missing_prompt());
        }

        let crops = &self.tables.crops;
        let districts = &self.tables.districts;
        let mut query = extract(message, crops, districts);

        if query.matched_crop.is_none() {
            query.matched_crop = self.last.crop.as_deref().and_then(|key| crops.get(key));
        }

        if query.matched_district.is_none() && query.ambiguous_district.is_none() {
            query.matched_district = self
                .last
                .pending_district
                .as_ref()
                .and_then(|pending| {
                    query
                        .mentioned_states
                        .iter()
                        .find_map(|state| districts.find(pending, state))
                })
                .or_else(|| {
                    self.last
                        .district
                        .as_ref()
                        .and_then(|(district, state)| districts.find(district, state))
                });
        }

        if let Some(crop) = query.matched_crop {
            self.last.crop = Some(crop.key.clone());
        }
        if let Some(district) = query.matched_district {
            self.last.district = Some((district.key.clone(), district.state_key.clone()));
            self.last.pending_district = None;
        } else if let Some(name) = &query.ambiguous_district {
            self.last.pending_district = Some(normalize_key(name));
        }

        match recommend(&query) {
            Ok(rec) => {
                tracing::info!(
                    "Recommendation for {} in {}: reduce Urea by {:.2} kg/ha",
                    rec.crop,
                    rec.location(),
                    rec.recommended_urea_kg_ha
                );
                Reply::Recommendation(rec)
            }
            Err(incomplete) => Reply::Clarification(clarification_prompt(&incomplete, &query)),
        }
    }
}

fn both_missing_prompt() -> String {
    "I couldn't identify the location or crop. Please use the format: **'Crop in District'** (e.g., *Rice in Ludhiana*).".to_string()
}

/// Follow-up question for an incomplete query
fn clarification_prompt(incomplete: &IncompleteQuery, query: &ExtractedQuery<'_>) -> String {
    if let Some(name) = &incomplete.ambiguous_district {
        let mut prompt = format!(
            "I found **{}** in more than one state ({}). Which **State** do you mean? (e.g., {}, {})",
            name,
            incomplete.ambiguous_states.join(", "),
            name,
            incomplete.ambiguous_states.last().map_or("", String::as_str)
        );
        if incomplete.missing_crop {
            prompt.push_str(" Which **Crop** are you planning to grow?");
        }
        return prompt;
    }

    match (incomplete.missing_crop, incomplete.missing_district) {
        (true, true) => both_missing_prompt(),
        (false, true) => "Which **District** are you asking about?".to_string(),
        _ => match query.matched_district {
            Some(district) => format!(
                "I found **{}**. Which **Crop** are you planning to grow?",
                district.name
            ),
            None => "Which **Crop** are you planning to grow?".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::with_bundled_defaults().unwrap()
    }

    fn expect_recommendation(reply: Reply) -> Recommendation {
        match reply {
            Reply::Recommendation(rec) => rec,
            other => panic!("expected recommendation, got {:?}", other),
        }
    }

    fn expect_clarification(reply: Reply) -> String {
        match reply {
            Reply::Clarification(text) => text,
            other => panic!("expected clarification, got {:?}", other),
        }
    }

    #[test]
    fn test_full_message() {
        let mut s = session();
        let rec = expect_recommendation(s.handle_message("Plan for Rice in Ludhiana"));
        assert_eq!(rec.crop, "Rice");
        assert_eq!(rec.district, "Ludhiana");
        assert_eq!(rec.recommended_urea_kg_ha, 293.48);
    }

    #[test]
    fn test_nothing_recognised() {
        let mut s = session();
        let text = expect_clarification(s.handle_message("hello there"));
        assert!(text.contains("couldn't identify the location or crop"));

        let blank = expect_clarification(s.handle_message("   "));
        assert_eq!(blank, text);
    }

    #[test]
    fn test_asks_for_missing_crop_then_completes() {
        let mut s = session();
        let text = expect_clarification(s.handle_message("I farm in Hisar"));
        assert_eq!(text, "I found **Hisar**. Which **Crop** are you planning to grow?");

        let rec = expect_recommendation(s.handle_message("Wheat"));
        assert_eq!(rec.crop, "Wheat");
        assert_eq!(rec.district, "Hisar");
    }

    #[test]
    fn test_asks_for_missing_district_then_completes() {
        let mut s = session();
        let text = expect_clarification(s.handle_message("What about maize?"));
        assert_eq!(text, "Which **District** are you asking about?");

        let rec = expect_recommendation(s.handle_message("Karnal"));
        assert_eq!(rec.crop, "Maize");
        assert_eq!(rec.district, "Karnal");
    }

    #[test]
    fn test_ambiguous_district_asks_for_state() {
        let mut s = session();
        let text = expect_clarification(s.handle_message("Rice in Aurangabad"));
        assert!(text.contains("**Aurangabad** in more than one state (Bihar, Maharashtra)"));
        assert!(text.contains("Which **State**"));
        assert!(!text.contains("Which **Crop**"));

        let rec = expect_recommendation(s.handle_message("Maharashtra"));
        assert_eq!(rec.district, "Aurangabad");
        assert_eq!(rec.state, "Maharashtra");
        assert_eq!(rec.crop, "Rice");
    }

    #[test]
    fn test_pending_district_uses_any_mentioned_state() {
        let mut s = session();
        expect_clarification(s.handle_message("Rice in Aurangabad"));
        let rec = expect_recommendation(
            s.handle_message("Maharashtra, though I grew up in Himachal Pradesh"),
        );
        assert_eq!(rec.district, "Aurangabad");
        assert_eq!(rec.state, "Maharashtra");
    }

    #[test]
    fn test_mentioned_state_among_several_resolves_district() {
        let mut s = session();
        let rec = expect_recommendation(
            s.handle_message("Rice in Aurangabad, Maharashtra; I moved from Himachal Pradesh"),
        );
        assert_eq!(rec.district, "Aurangabad");
        assert_eq!(rec.state, "Maharashtra");
        assert_eq!(rec.crop, "Rice");
    }

    #[test]
    fn test_ambiguous_district_without_crop() {
        let mut s = session();
        let text = expect_clarification(s.handle_message("Aurangabad"));
        assert!(text.contains("Which **State**"));
        assert!(text.contains("Which **Crop**"));
    }

    #[test]
    fn test_new_entities_override_memory() {
        let mut s = session();
        expect_recommendation(s.handle_message("Rice in Ludhiana"));
        let rec = expect_recommendation(s.handle_message("and wheat in Jodhpur?"));
        assert_eq!(rec.crop, "Wheat");
        assert_eq!(rec.district, "Jodhpur");
        assert_eq!(rec.excess_n, 0.0);
    }

    #[test]
    fn test_failed_upload_keeps_tables() {
        let mut s = session();
        let before = s.status();
        let err = s
            .upload_crop_table("banner\ncrop,P(kg/ha)\nRice,50\n")
            .unwrap_err();
        assert!(matches!(err, DataFormatError::MissingColumn { .. }));
        assert_eq!(s.status(), before);
        assert!(!s.status().crops_uploaded);
    }

    #[test]
    fn test_upload_then_reset() {
        let mut s = session();
        let default_reply = s.clone_free_reply("Rice in Ludhiana");

        s.upload_crop_table("banner\ncrop,N(kg/ha)\nRice,200\n").unwrap();
        assert!(s.status().crops_uploaded);
        assert_eq!(s.status().crops, 1);
        let uploaded = expect_recommendation(s.handle_message("Rice in Ludhiana"));
        assert_eq!(uploaded.required_n_midpoint, 200.0);

        s.reset();
        assert!(!s.status().crops_uploaded);
        assert_eq!(s.handle_message("Rice in Ludhiana"), default_reply);
    }

    #[test]
    fn test_upload_from_path() {
        let mut s = session();
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        s.upload_district_table_from_path(&dir.join("Fdistrict.csv")).unwrap();
        assert!(s.status().districts_uploaded);

        let before = s.status();
        let err = s
            .upload_crop_table_from_path(Path::new("/nonexistent/C1.csv"))
            .unwrap_err();
        assert!(matches!(err, DataFormatError::Io { .. }));
        assert_eq!(s.status(), before);
    }

    #[test]
    fn test_upload_clears_memory() {
        let mut s = session();
        expect_recommendation(s.handle_message("Rice in Ludhiana"));
        s.upload_district_table("banner\nstate,district,Avg. soil N(kg/ha)\nPunjab,Ludhiana,100\n")
            .unwrap();
        let text = expect_clarification(s.handle_message("tell me more"));
        assert!(text.contains("couldn't identify"));
    }

    #[test]
    fn test_load_error_reply() {
        let err = DataFormatError::EmptyData {
            table: crate::error::TableKind::District,
        };
        match Reply::from_load_error(&err) {
            Reply::Error(text) => {
                assert!(text.contains("district table: no usable rows"));
                assert!(text.contains("Tip:"));
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    impl Session {
        /// Reply from a fresh defaults-only session
        fn clone_free_reply(&self, message: &str) -> Reply {
            Session::new(self.defaults.clone()).handle_message(message)
        }
    }
}
