//! Reference Table Loading and Lookup
//!
//! Two tables drive every recommendation:
//! - Crop requirements: crop name → nitrogen requirement (kg/ha), optionally
//!   a reference Urea dose
//! - District soil data: (state, district) → average soil nitrogen (kg/ha)
//!
//! Both are parsed from CSV with polars, validated column by column and
//! converted to small typed tables. Tables are immutable once built; a
//! session replaces them wholesale.

use crate::error::{DataFormatError, TableKind};
use crate::utils::{
    display_name, find_column, normalize_key, parse_amount, parse_range, read_table,
    resolve_column, string_column, ColumnSpec, NitrogenRange,
};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Crop table compiled into the binary
pub const BUNDLED_CROP_TABLE: &str = include_str!("../data/C1.csv");

/// District table compiled into the binary
pub const BUNDLED_DISTRICT_TABLE: &str = include_str!("../data/Fdistrict.csv");

const CROP_NAME: ColumnSpec = ColumnSpec::new("crop", |h| matches!(h, "crop" | "cropname" | "crop_name"));
const CROP_N: ColumnSpec = ColumnSpec::new("N(kg/ha)", |h| h.contains("n(kg/ha)"));
const CROP_N_LOOSE: ColumnSpec = ColumnSpec::new("nitrogen", |h| h.contains("nitrogen"));
const CROP_UREA: ColumnSpec = ColumnSpec::new("Urea(kg/ha)", |h| h.contains("urea"));

const DISTRICT_NAME: ColumnSpec =
    ColumnSpec::new("district", |h| matches!(h, "district" | "districtname" | "district_name"));
const STATE_NAME: ColumnSpec = ColumnSpec::new("state", |h| matches!(h, "state" | "statename" | "state_name"));
const SOIL_N: ColumnSpec = ColumnSpec::new("Avg. soil N(kg/ha)", |h| {
    h.contains("soil") && (h.contains("n(kg/ha)") || h.contains("nitrogen"))
});

/// Accepted nitrogen headers, preferred first
const CROP_NITROGEN: &[ColumnSpec] = &[CROP_N, CROP_N_LOOSE];
const SOIL_NITROGEN: &[ColumnSpec] = &[SOIL_N, CROP_N, CROP_N_LOOSE];

/// Nitrogen requirement of one crop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropRequirement {
    /// Name as written in the table
    pub name: String,
    /// Normalized matching key
    pub key: String,
    pub nitrogen: NitrogenRange,
    /// Reference Urea dose (kg/ha) when the table carries one
    pub full_urea_dose: Option<f64>,
}

/// Average soil nitrogen of one district
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictSoil {
    pub name: String,
    pub key: String,
    pub state: String,
    pub state_key: String,
    pub avg_soil_nitrogen: f64,
}

/// Deduplicated crop requirements in table order
#[derive(Debug, Clone, Default)]
pub struct CropTable {
    entries: Vec<CropRequirement>,
    index: FxHashMap<String, usize>,
}

impl CropTable {
    /// Build from rows; the first row for each key wins
    pub fn from_entries(rows: Vec<CropRequirement>) -> Self {
        let mut table = CropTable::default();
        for row in rows {
            if table.index.contains_key(&row.key) {
                tracing::debug!("Skipping duplicate crop '{}'", row.name);
                continue;
            }
            table.index.insert(row.key.clone(), table.entries.len());
            table.entries.push(row);
        }
        table
    }

    pub fn get(&self, key: &str) -> Option<&CropRequirement> {
        self.index.get(key).map(|&idx| &self.entries[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CropRequirement> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Deduplicated district soil rows in table order
///
/// District names may repeat across states; (district, state) is unique.
#[derive(Debug, Clone, Default)]
pub struct DistrictTable {
    entries: Vec<DistrictSoil>,
}

impl DistrictTable {
    /// Build from rows; the first row for each (district, state) wins
    pub fn from_entries(rows: Vec<DistrictSoil>) -> Self {
        let mut entries: Vec<DistrictSoil> = Vec::with_capacity(rows.len());
        for row in rows {
            if entries.iter().any(|e| e.key == row.key && e.state_key == row.state_key) {
                tracing::debug!("Skipping duplicate district '{}, {}'", row.name, row.state);
                continue;
            }
            entries.push(row);
        }
        DistrictTable { entries }
    }

    /// All rows sharing a district key, in table order
    pub fn entries_named(&self, key: &str) -> Vec<&DistrictSoil> {
        self.entries.iter().filter(|e| e.key == key).collect()
    }

    pub fn find(&self, district_key: &str, state_key: &str) -> Option<&DistrictSoil> {
        self.entries
            .iter()
            .find(|e| e.key == district_key && e.state_key == state_key)
    }

    /// Distinct non-empty state keys in table order
    pub fn state_keys(&self) -> Vec<&str> {
        let mut states: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !entry.state_key.is_empty() && !states.contains(&entry.state_key.as_str()) {
                states.push(&entry.state_key);
            }
        }
        states
    }

    pub fn iter(&self) -> impl Iterator<Item = &DistrictSoil> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The pair of tables a session works against
#[derive(Debug, Clone)]
pub struct TableSet {
    pub crops: CropTable,
    pub districts: DistrictTable,
}

impl TableSet {
    /// Tables compiled into the crate
    pub fn bundled() -> Result<Self, DataFormatError> {
        Ok(TableSet {
            crops: load_crop_table(BUNDLED_CROP_TABLE)?,
            districts: load_district_table(BUNDLED_DISTRICT_TABLE)?,
        })
    }

    /// Bundled tables, each optionally overridden by a file
    pub fn from_paths(
        crop_path: Option<&Path>,
        district_path: Option<&Path>,
    ) -> Result<Self, DataFormatError> {
        let crops = match crop_path {
            Some(path) => load_crop_table_from_path(path)?,
            None => load_crop_table(BUNDLED_CROP_TABLE)?,
        };
        let districts = match district_path {
            Some(path) => load_district_table_from_path(path)?,
            None => load_district_table(BUNDLED_DISTRICT_TABLE)?,
        };
        Ok(TableSet { crops, districts })
    }
}

fn numeric_error(table: TableKind, column: &str, row: usize, value: Option<&str>) -> DataFormatError {
    DataFormatError::NumericParse {
        table,
        column: column.to_string(),
        row,
        value: value.unwrap_or("").to_string(),
    }
}

/// Parse the crop requirement table
///
/// Rows with a blank crop name are dropped. Row numbers in errors count
/// data rows from 1, directly below the header.
pub fn load_crop_table(source: &str) -> Result<CropTable, DataFormatError> {
    let table = TableKind::Crop;
    let df = read_table(source, &[&[CROP_NAME], CROP_NITROGEN], table)?;

    let name_col = resolve_column(&df, &[CROP_NAME], table)?;
    let n_col = resolve_column(&df, CROP_NITROGEN, table)?;
    let urea_col = find_column(&df, &CROP_UREA);

    let names = string_column(&df, &name_col, table)?;
    let nitrogen = string_column(&df, &n_col, table)?;
    let urea = match urea_col.as_deref() {
        Some(col) => Some(string_column(&df, col, table)?),
        None => None,
    };

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let row = idx + 1;
        let Some(raw_name) = names.get(idx) else {
            continue;
        };
        let key = normalize_key(raw_name);
        if key.is_empty() {
            continue;
        }

        let raw_n = nitrogen.get(idx);
        let range = raw_n
            .and_then(parse_range)
            .ok_or_else(|| numeric_error(table, &n_col, row, raw_n))?;

        let full_urea_dose = match (urea, urea_col.as_deref()) {
            (Some(urea), Some(col)) => match urea.get(idx).filter(|cell| !cell.trim().is_empty()) {
                Some(cell) => Some(
                    parse_amount(cell).ok_or_else(|| numeric_error(table, col, row, Some(cell)))?,
                ),
                None => None,
            },
            _ => None,
        };

        rows.push(CropRequirement {
            name: display_name(raw_name),
            key,
            nitrogen: range,
            full_urea_dose,
        });
    }

    let crops = CropTable::from_entries(rows);
    if crops.is_empty() {
        return Err(DataFormatError::EmptyData { table });
    }

    tracing::info!("Loaded crop table: {} crops", crops.len());
    Ok(crops)
}

/// Parse the district soil table
///
/// Rows with a blank district name are dropped.
pub fn load_district_table(source: &str) -> Result<DistrictTable, DataFormatError> {
    let table = TableKind::District;
    let df = read_table(source, &[&[DISTRICT_NAME], &[STATE_NAME], SOIL_NITROGEN], table)?;

    let district_col = resolve_column(&df, &[DISTRICT_NAME], table)?;
    let state_col = resolve_column(&df, &[STATE_NAME], table)?;
    let soil_col = resolve_column(&df, SOIL_NITROGEN, table)?;

    let districts = string_column(&df, &district_col, table)?;
    let states = string_column(&df, &state_col, table)?;
    let soil = string_column(&df, &soil_col, table)?;

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let row = idx + 1;
        let Some(raw_name) = districts.get(idx) else {
            continue;
        };
        let key = normalize_key(raw_name);
        if key.is_empty() {
            continue;
        }

        let raw_soil = soil.get(idx);
        let avg_soil_nitrogen = raw_soil
            .and_then(parse_amount)
            .ok_or_else(|| numeric_error(table, &soil_col, row, raw_soil))?;

        let raw_state = states.get(idx).unwrap_or("");
        rows.push(DistrictSoil {
            name: display_name(raw_name),
            key,
            state: display_name(raw_state),
            state_key: normalize_key(raw_state),
            avg_soil_nitrogen,
        });
    }

    let districts = DistrictTable::from_entries(rows);
    if districts.is_empty() {
        return Err(DataFormatError::EmptyData { table });
    }

    tracing::info!(
        "Loaded district table: {} districts across {} states",
        districts.len(),
        districts.state_keys().len()
    );
    Ok(districts)
}

fn read_source(path: &Path) -> Result<String, DataFormatError> {
    fs::read_to_string(path).map_err(|source| DataFormatError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a crop table file
pub fn load_crop_table_from_path(path: &Path) -> Result<CropTable, DataFormatError> {
    load_crop_table(&read_source(path)?)
}

/// Read and parse a district table file
pub fn load_district_table_from_path(path: &Path) -> Result<DistrictTable, DataFormatError> {
    load_district_table(&read_source(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CROPS: &str = "\
Crop Nutrient Requirements,,
crop,N(kg/ha),P(kg/ha)
Rice,100-120,50
Wheat,150,60
";

    const DISTRICTS: &str = "\
District-wise Soil Nitrogen,,
state,district,Avg. soil N(kg/ha)
Punjab,Ludhiana,245
Bihar,Aurangabad,130
Maharashtra,Aurangabad,110
";

    #[test]
    fn test_load_crop_table() {
        let crops = load_crop_table(CROPS).unwrap();
        assert_eq!(crops.len(), 2);

        let rice = crops.get("rice").unwrap();
        assert_eq!(rice.name, "Rice");
        assert_relative_eq!(rice.nitrogen.min, 100.0);
        assert_relative_eq!(rice.nitrogen.max, 120.0);
        assert_eq!(rice.full_urea_dose, None);

        let wheat = crops.get("wheat").unwrap();
        assert!(wheat.nitrogen.is_single());
    }

    #[test]
    fn test_crop_dedup_case_insensitive() {
        let text = "banner\ncrop,N(kg/ha)\nRice,100-120\n RICE ,80\nrice,90\n,70\nMaize,150\n";
        let crops = load_crop_table(text).unwrap();
        assert_eq!(crops.len(), 2);
        // first occurrence wins
        assert_relative_eq!(crops.get("rice").unwrap().nitrogen.max, 120.0);
        let keys: Vec<&str> = crops.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["rice", "maize"]);
    }

    #[test]
    fn test_crop_header_is_case_and_space_insensitive() {
        let text = "banner\n  CROP , n (KG/HA) \nRice,100\n";
        let crops = load_crop_table(text).unwrap();
        assert_eq!(crops.len(), 1);
    }

    #[test]
    fn test_missing_nitrogen_column() {
        let text = "banner,,,\ncrop,P(kg/ha),K(kg/ha),season\nRice,50,40,kharif\nWheat,60,40,rabi\n";
        let err = load_crop_table(text).unwrap_err();
        match err {
            DataFormatError::MissingColumn { table, column } => {
                assert_eq!(table, TableKind::Crop);
                assert_eq!(column, "N(kg/ha)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decorative_row_naming_key_column() {
        let crops = load_crop_table("crop,,\ncrop,N(kg/ha)\nRice,100\n").unwrap();
        assert_eq!(crops.len(), 1);
        assert_relative_eq!(crops.get("rice").unwrap().nitrogen.midpoint(), 100.0);

        let districts = load_district_table(
            "District,,\nstate,district,Avg. soil N(kg/ha)\nPunjab,Ludhiana,245\n",
        )
        .unwrap();
        assert!(districts.find("ludhiana", "punjab").is_some());
    }

    #[test]
    fn test_missing_crop_column() {
        let text = "banner\nplant,N(kg/ha)\nRice,100\n";
        let err = load_crop_table(text).unwrap_err();
        assert!(matches!(err, DataFormatError::MissingColumn { ref column, .. } if column == "crop"));
    }

    #[test]
    fn test_only_blank_crop_names_is_empty() {
        let text = "banner\ncrop,N(kg/ha)\n,100\n  ,120\n";
        let err = load_crop_table(text).unwrap_err();
        assert!(matches!(err, DataFormatError::EmptyData { table: TableKind::Crop }));
    }

    #[test]
    fn test_header_only_is_empty() {
        let err = load_crop_table("banner\ncrop,N(kg/ha)\n").unwrap_err();
        assert!(matches!(err, DataFormatError::EmptyData { .. }));
    }

    #[test]
    fn test_bad_nitrogen_cell_names_row() {
        let text = "banner\ncrop,N(kg/ha)\nRice,100-120\nWheat,lots\n";
        let err = load_crop_table(text).unwrap_err();
        match err {
            DataFormatError::NumericParse { row, value, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(value, "lots");
                assert_eq!(column, "N(kg/ha)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_optional_urea_column() {
        let text = "banner\ncrop,N(kg/ha),Urea(kg/ha)\nRice,100-120,260\nMaize,150,\n";
        let crops = load_crop_table(text).unwrap();
        assert_eq!(crops.get("rice").unwrap().full_urea_dose, Some(260.0));
        assert_eq!(crops.get("maize").unwrap().full_urea_dose, None);

        let bad = "banner\ncrop,N(kg/ha),Urea(kg/ha)\nRice,100-120,plenty\n";
        assert!(matches!(
            load_crop_table(bad).unwrap_err(),
            DataFormatError::NumericParse { row: 1, .. }
        ));
    }

    #[test]
    fn test_load_district_table() {
        let districts = load_district_table(DISTRICTS).unwrap();
        assert_eq!(districts.len(), 3);
        assert_eq!(districts.entries_named("aurangabad").len(), 2);
        assert_eq!(districts.state_keys(), vec!["punjab", "bihar", "maharashtra"]);

        let ludhiana = districts.find("ludhiana", "punjab").unwrap();
        assert_eq!(ludhiana.name, "Ludhiana");
        assert_eq!(ludhiana.state, "Punjab");
        assert_relative_eq!(ludhiana.avg_soil_nitrogen, 245.0);
    }

    #[test]
    fn test_district_missing_soil_column() {
        let text = "banner\nstate,district,Avg. soil P(kg/ha)\nPunjab,Ludhiana,28\n";
        let err = load_district_table(text).unwrap_err();
        assert!(matches!(
            err,
            DataFormatError::MissingColumn { ref column, .. } if column == "Avg. soil N(kg/ha)"
        ));
    }

    #[test]
    fn test_district_missing_state_column() {
        let text = "banner\ndistrict,Avg. soil N(kg/ha)\nLudhiana,245\n";
        let err = load_district_table(text).unwrap_err();
        assert!(matches!(err, DataFormatError::MissingColumn { ref column, .. } if column == "state"));
    }

    #[test]
    fn test_district_soil_must_be_single_value() {
        let text = "banner\nstate,district,Avg. soil N(kg/ha)\nPunjab,Ludhiana,200-250\n";
        let err = load_district_table(text).unwrap_err();
        assert!(matches!(err, DataFormatError::NumericParse { row: 1, .. }));
    }

    #[test]
    fn test_district_dedup_by_state() {
        let text = "banner\nstate,district,Avg. soil N(kg/ha)\nPunjab,Ludhiana,245\npunjab,LUDHIANA,999\n";
        let districts = load_district_table(text).unwrap();
        assert_eq!(districts.len(), 1);
        assert_relative_eq!(districts.iter().next().unwrap().avg_soil_nitrogen, 245.0);
    }

    #[test]
    fn test_bundled_tables_load() {
        let tables = TableSet::bundled().unwrap();
        assert!(tables.crops.get("rice").is_some());
        assert!(tables.districts.find("ludhiana", "punjab").is_some());
    }

    #[test]
    fn test_load_from_missing_path() {
        let err = load_crop_table_from_path(Path::new("/nonexistent/C1.csv")).unwrap_err();
        assert!(matches!(err, DataFormatError::Io { .. }));
        assert!(!err.is_format_error());
    }
}
