// Fetch both datasets from data.gov.in, clean them, and replace the tables.
//
// Each resource is handled on its own: a failed fetch or load for one is
// logged and reported, and the other still runs.
use crate::config::{Config, AGRICULTURE_RESOURCE_ID, RAINFALL_RESOURCE_ID};
use crate::error::{Result, SamarthError};
use crate::store::Store;
use crate::types::{AgriRecord, ClimateRecord};
use crate::util::{normalize_column_name, parse_f64_safe, parse_year_safe};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{info, warn};

pub type RawRecord = Map<String, Value>;

const AGRI_RENAMES: &[(&str, &str)] = &[
    ("crop_year", "year"),
    ("area_", "area_hectares"),
    ("production_", "production_tonnes"),
];

const CLIMATE_RENAMES: &[(&str, &str)] = &[
    ("subdivision", "region"),
    ("annual", "annual_rainfall_mm"),
];

/// Anything that can hand back the raw records of a resource.
pub trait RecordSource {
    fn fetch(&self, resource_id: &str, limit: usize) -> Result<Vec<RawRecord>>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    records: Vec<RawRecord>,
}

/// Blocking client for the data.gov.in resource API.
pub struct DataGovClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl DataGovClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let api_key = cfg.require_api_key()?.to_string();
        let http = reqwest::blocking::Client::builder()
            .timeout(cfg.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
            api_key,
        })
    }
}

impl RecordSource for DataGovClient {
    fn fetch(&self, resource_id: &str, limit: usize) -> Result<Vec<RawRecord>> {
        let url = format!("{}{}", self.base_url, resource_id);
        let limit = limit.to_string();
        let body: ApiResponse = self
            .http
            .get(&url)
            .query(&[
                ("api-key", self.api_key.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
            ])
            .send()?
            .error_for_status()?
            .json()?;
        Ok(body.records)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResourceLoad {
    Loaded(LoadReport),
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct EtlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub agriculture: ResourceLoad,
    pub climate: ResourceLoad,
}

/// Lowercase/underscore every key, then apply `renames`. Adds the
/// `original_source_id` column.
pub fn normalize_record(record: RawRecord, renames: &[(&str, &str)], resource_id: &str) -> RawRecord {
    let mut out: RawRecord = record
        .into_iter()
        .map(|(k, v)| {
            let key = normalize_column_name(&k);
            let key = renames
                .iter()
                .find(|(from, _)| *from == key)
                .map(|(_, to)| to.to_string())
                .unwrap_or(key);
            (key, v)
        })
        .collect();
    out.insert(
        "original_source_id".to_string(),
        Value::String(resource_id.to_string()),
    );
    out
}

fn text_field(record: &RawRecord, key: &str) -> Option<String> {
    let s = match record.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Numeric coercion: numbers pass through, strings are parsed, anything
/// else (including unparseable strings) is `None`.
fn number_field(record: &RawRecord, key: &str) -> Option<f64> {
    match record.get(key)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_f64_safe(Some(s)),
        _ => None,
    }
}

fn year_field(record: &RawRecord, key: &str) -> Option<i32> {
    parse_year_safe(text_field(record, key).as_deref())
}

/// Normalize raw agriculture records. Rows whose production is not numeric
/// are dropped.
pub fn clean_agriculture(records: Vec<RawRecord>, resource_id: &str) -> (Vec<AgriRecord>, LoadReport) {
    let total_rows = records.len();
    let cleaned: Vec<AgriRecord> = records
        .into_iter()
        .map(|r| normalize_record(r, AGRI_RENAMES, resource_id))
        .filter_map(|r| {
            let production_tonnes = number_field(&r, "production_tonnes")?;
            Some(AgriRecord {
                state_name: text_field(&r, "state_name"),
                district_name: text_field(&r, "district_name"),
                year: year_field(&r, "year"),
                season: text_field(&r, "season"),
                crop: text_field(&r, "crop"),
                area_hectares: number_field(&r, "area_hectares"),
                production_tonnes,
                original_source_id: resource_id.to_string(),
            })
        })
        .collect();
    let report = LoadReport {
        total_rows,
        kept_rows: cleaned.len(),
        dropped_rows: total_rows - cleaned.len(),
    };
    (cleaned, report)
}

/// Normalize raw rainfall records. Rows without a numeric year and annual
/// rainfall are dropped.
pub fn clean_climate(records: Vec<RawRecord>, resource_id: &str) -> (Vec<ClimateRecord>, LoadReport) {
    let total_rows = records.len();
    let cleaned: Vec<ClimateRecord> = records
        .into_iter()
        .map(|r| normalize_record(r, CLIMATE_RENAMES, resource_id))
        .filter_map(|r| {
            Some(ClimateRecord {
                year: year_field(&r, "year")?,
                annual_rainfall_mm: number_field(&r, "annual_rainfall_mm")?,
                region: text_field(&r, "region"),
                original_source_id: resource_id.to_string(),
            })
        })
        .collect();
    let report = LoadReport {
        total_rows,
        kept_rows: cleaned.len(),
        dropped_rows: total_rows - cleaned.len(),
    };
    (cleaned, report)
}

fn fetch_nonempty(source: &dyn RecordSource, resource_id: &str, limit: usize) -> Result<Vec<RawRecord>> {
    let records = source.fetch(resource_id, limit)?;
    if records.is_empty() {
        return Err(SamarthError::Api {
            resource_id: resource_id.to_string(),
            message: "no records found".to_string(),
        });
    }
    Ok(records)
}

fn load_agriculture(source: &dyn RecordSource, store: &mut Store, limit: usize) -> Result<LoadReport> {
    let raw = fetch_nonempty(source, AGRICULTURE_RESOURCE_ID, limit)?;
    let (records, report) = clean_agriculture(raw, AGRICULTURE_RESOURCE_ID);
    let states: BTreeSet<&str> = records
        .iter()
        .filter_map(|r| r.state_name.as_deref())
        .collect();
    info!(rows = report.kept_rows, dropped = report.dropped_rows, ?states, "cleaned agriculture data");
    store.replace_agriculture(&records)?;
    Ok(report)
}

fn load_climate(source: &dyn RecordSource, store: &mut Store, limit: usize) -> Result<LoadReport> {
    let raw = fetch_nonempty(source, RAINFALL_RESOURCE_ID, limit)?;
    let (records, report) = clean_climate(raw, RAINFALL_RESOURCE_ID);
    let regions: BTreeSet<&str> = records
        .iter()
        .filter_map(|r| r.region.as_deref())
        .collect();
    info!(rows = report.kept_rows, dropped = report.dropped_rows, ?regions, "cleaned climate data");
    store.replace_climate(&records)?;
    Ok(report)
}

fn outcome(resource_id: &str, result: Result<LoadReport>) -> ResourceLoad {
    match result {
        Ok(report) => ResourceLoad::Loaded(report),
        Err(e) => {
            warn!(resource_id, error = %e, "skipping resource");
            ResourceLoad::Skipped {
                reason: e.to_string(),
            }
        }
    }
}

/// Fetch, clean, and load both resources. Never fails as a whole.
pub fn run_extract_load(source: &dyn RecordSource, store: &mut Store, limit: usize) -> EtlReport {
    let started_at = Utc::now();
    info!(limit, "starting extract-load");

    let agriculture = outcome(
        AGRICULTURE_RESOURCE_ID,
        load_agriculture(source, store, limit),
    );
    let climate = outcome(RAINFALL_RESOURCE_ID, load_climate(source, store, limit));

    let finished_at = Utc::now();
    info!(
        elapsed_ms = (finished_at - started_at).num_milliseconds(),
        "extract-load finished"
    );
    EtlReport {
        started_at,
        finished_at,
        agriculture,
        climate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: Value) -> RawRecord {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn normalizes_and_renames_columns() {
        let r = normalize_record(
            raw(json!({"District Name": "GUNTUR", "Crop_Year": 2010, "Production_": "5"})),
            AGRI_RENAMES,
            "agri",
        );
        assert_eq!(r["district_name"], "GUNTUR");
        assert_eq!(r["year"], 2010);
        assert_eq!(r["production_tonnes"], "5");
        assert_eq!(r["original_source_id"], "agri");
    }

    #[test]
    fn drops_non_numeric_production() {
        let (rows, report) = clean_agriculture(
            vec![
                raw(json!({"district_name": "GUNTUR", "crop_year": "2010", "crop": "Rice", "production_": "1200.5", "area_": "NA"})),
                raw(json!({"district_name": "GUNTUR", "crop_year": "2010", "crop": "Maize", "production_": "NA"})),
                raw(json!({"district_name": "GUNTUR", "crop_year": "2011", "crop": "Cotton", "production_": 40})),
            ],
            "agri",
        );
        assert_eq!(report, LoadReport { total_rows: 3, kept_rows: 2, dropped_rows: 1 });
        assert_eq!(rows[0].production_tonnes, 1200.5);
        assert_eq!(rows[0].area_hectares, None);
        assert_eq!(rows[0].year, Some(2010));
        assert_eq!(rows[1].crop.as_deref(), Some("Cotton"));
        assert_eq!(rows[1].production_tonnes, 40.0);
    }

    #[test]
    fn climate_needs_year_and_rainfall() {
        let (rows, report) = clean_climate(
            vec![
                raw(json!({"SUBDIVISION": "TAMIL NADU", "YEAR": "2001", "ANNUAL": "950.2"})),
                raw(json!({"SUBDIVISION": "TAMIL NADU", "YEAR": "n/a", "ANNUAL": "950.2"})),
                raw(json!({"SUBDIVISION": "TAMIL NADU", "YEAR": "2002", "ANNUAL": null})),
            ],
            "rain",
        );
        assert_eq!(report.kept_rows, 1);
        assert_eq!(rows[0].region.as_deref(), Some("TAMIL NADU"));
        assert_eq!(rows[0].year, 2001);
        assert_eq!(rows[0].annual_rainfall_mm, 950.2);
    }
}
