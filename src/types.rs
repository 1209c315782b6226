use crate::util::{display_quantity, display_rainfall};
use serde::Serialize;
use std::fmt;
use tabled::Tabled;

pub const DEFAULT_TIME_PERIOD_YEARS: u32 = 3;
pub const DEFAULT_TOP_N: u32 = 5;

/// Which aggregation shape a plan asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    TopCrops,
    RainfallOnly,
    CompareStates,
    ProductionOnly,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::TopCrops => "top_crops",
            Action::RainfallOnly => "rainfall_only",
            Action::CompareStates => "compare_states",
            Action::ProductionOnly => "production_only",
        }
    }

    /// Map an external tag onto an action. Unrecognized tags fall through to
    /// `ProductionOnly`, which is also what the executor does for them.
    pub fn from_tag(tag: &str) -> Action {
        match tag.trim().to_ascii_lowercase().as_str() {
            "top_crops" => Action::TopCrops,
            "rainfall_only" => Action::RainfallOnly,
            "compare_states" => Action::CompareStates,
            _ => Action::ProductionOnly,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured reading of one question. Built per request through
/// [`QueryPlan::new`] and read-only afterwards, so the clamped counts hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    action: Action,
    /// Order matters: the first entry is the primary region, and the first
    /// two are the sides of a comparison.
    regions: Vec<String>,
    time_period_years: u32,
    top_n: u32,
    agri_metric: String,
    climate_metric: String,
}

impl QueryPlan {
    pub fn new(action: Action, regions: Vec<String>, time_period_years: u32, top_n: u32) -> Self {
        Self {
            action,
            regions,
            time_period_years: time_period_years.max(1),
            top_n: top_n.max(1),
            agri_metric: "production".to_string(),
            climate_metric: "rainfall".to_string(),
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn time_period_years(&self) -> u32 {
        self.time_period_years
    }

    pub fn top_n(&self) -> u32 {
        self.top_n
    }

    pub fn agri_metric(&self) -> &str {
        &self.agri_metric
    }

    pub fn climate_metric(&self) -> &str {
        &self.climate_metric
    }

    pub fn primary_region(&self) -> Option<&str> {
        self.regions.first().map(String::as_str)
    }
}

/// One crop-production row as stored in `agri_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgriRecord {
    pub state_name: Option<String>,
    pub district_name: Option<String>,
    pub year: Option<i32>,
    pub season: Option<String>,
    pub crop: Option<String>,
    pub area_hectares: Option<f64>,
    pub production_tonnes: f64,
    pub original_source_id: String,
}

/// One sub-division rainfall row as stored in `climate_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateRecord {
    pub region: Option<String>,
    pub year: i32,
    pub annual_rainfall_mm: f64,
    pub original_source_id: String,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CropTotalRow {
    #[serde(rename = "Crop")]
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Total_Production")]
    #[tabled(rename = "Total_Production", display_with = "display_quantity")]
    pub total_production: f64,
    #[serde(rename = "Avg_Production")]
    #[tabled(rename = "Avg_Production", display_with = "display_quantity")]
    pub avg_production: f64,
    #[serde(rename = "Years_Available")]
    #[tabled(rename = "Years_Available")]
    pub years_available: i64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct RainfallRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Rainfall")]
    #[tabled(rename = "Rainfall", display_with = "display_rainfall")]
    pub rainfall: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct DistrictComparisonRow {
    #[serde(rename = "District")]
    #[tabled(rename = "District")]
    pub district: String,
    #[serde(rename = "Avg_Production")]
    #[tabled(rename = "Avg_Production", display_with = "display_quantity")]
    pub avg_production: f64,
    #[serde(rename = "Crop_Count")]
    #[tabled(rename = "Crop_Count")]
    pub crop_count: i64,
    #[serde(rename = "Years_Available")]
    #[tabled(rename = "Years_Available")]
    pub years_available: i64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ProductionRow {
    #[serde(rename = "District")]
    #[tabled(rename = "District")]
    pub district: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Crop")]
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Production")]
    #[tabled(rename = "Production", display_with = "display_quantity")]
    pub production: f64,
}

/// Rows produced by one executed plan. The variant fixes the column set.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultTable {
    #[default]
    Empty,
    TopCrops(Vec<CropTotalRow>),
    Rainfall(Vec<RainfallRow>),
    Comparison(Vec<DistrictComparisonRow>),
    Production(Vec<ProductionRow>),
}

impl ResultTable {
    pub fn len(&self) -> usize {
        match self {
            ResultTable::Empty => 0,
            ResultTable::TopCrops(rows) => rows.len(),
            ResultTable::Rainfall(rows) => rows.len(),
            ResultTable::Comparison(rows) => rows.len(),
            ResultTable::Production(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ResultTable::Empty => &[],
            ResultTable::TopCrops(_) => &["Crop", "Total_Production", "Avg_Production", "Years_Available"],
            ResultTable::Rainfall(_) => &["Region", "Year", "Rainfall"],
            ResultTable::Comparison(_) => &["District", "Avg_Production", "Crop_Count", "Years_Available"],
            ResultTable::Production(_) => &["District", "Year", "Crop", "Production"],
        }
    }

    /// Per-row production quantities, if this table has a `Production` column.
    pub fn production_values(&self) -> Option<Vec<f64>> {
        match self {
            ResultTable::Production(rows) => Some(rows.iter().map(|r| r.production).collect()),
            _ => None,
        }
    }
}
