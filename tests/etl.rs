use samarth::config::{AGRICULTURE_RESOURCE_ID, RAINFALL_RESOURCE_ID};
use samarth::error::{Result, SamarthError};
use samarth::etl::{run_extract_load, RawRecord, RecordSource, ResourceLoad};
use samarth::store::Store;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;

/// Serves canned records per resource; a missing entry fails the fetch.
#[derive(Default)]
struct CannedSource {
    records: HashMap<String, Vec<RawRecord>>,
    requests: RefCell<Vec<(String, usize)>>,
}

impl CannedSource {
    fn with(mut self, resource_id: &str, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .map(|v| match v {
                Value::Object(m) => m,
                other => panic!("not an object: {other}"),
            })
            .collect();
        self.records.insert(resource_id.to_string(), rows);
        self
    }
}

impl RecordSource for CannedSource {
    fn fetch(&self, resource_id: &str, limit: usize) -> Result<Vec<RawRecord>> {
        self.requests
            .borrow_mut()
            .push((resource_id.to_string(), limit));
        self.records
            .get(resource_id)
            .cloned()
            .ok_or_else(|| SamarthError::Api {
                resource_id: resource_id.to_string(),
                message: "503 Service Unavailable".to_string(),
            })
    }
}

fn agri_rows() -> Vec<Value> {
    vec![
        json!({"State_Name": "Andhra Pradesh", "District_Name": "GUNTUR", "Crop_Year": 2010, "Season": "Kharif", "Crop": "Rice", "Area_": "120.5", "Production_": "3400"}),
        json!({"State_Name": "Andhra Pradesh", "District_Name": "GUNTUR", "Crop_Year": 2010, "Season": "Rabi", "Crop": "Maize", "Area_": "10", "Production_": "NA"}),
        json!({"State_Name": "Andhra Pradesh", "District_Name": "CHITTOOR", "Crop_Year": 2011, "Season": "Kharif", "Crop": "Groundnut", "Area_": "", "Production_": 780.25}),
    ]
}

fn climate_rows() -> Vec<Value> {
    vec![
        json!({"SUBDIVISION": "COASTAL ANDHRA PRADESH", "YEAR": "2010", "ANNUAL": "1050.3"}),
        json!({"SUBDIVISION": "COASTAL ANDHRA PRADESH", "YEAR": "2011", "ANNUAL": "NA"}),
    ]
}

#[test]
fn loads_both_resources_and_drops_non_numeric_rows() {
    let source = CannedSource::default()
        .with(AGRICULTURE_RESOURCE_ID, agri_rows())
        .with(RAINFALL_RESOURCE_ID, climate_rows());
    let mut store = Store::open_in_memory().unwrap();

    let report = run_extract_load(&source, &mut store, 10_000);

    let ResourceLoad::Loaded(agri) = &report.agriculture else {
        panic!("agriculture skipped: {:?}", report.agriculture);
    };
    assert_eq!((agri.total_rows, agri.kept_rows, agri.dropped_rows), (3, 2, 1));
    let ResourceLoad::Loaded(climate) = &report.climate else {
        panic!("climate skipped: {:?}", report.climate);
    };
    assert_eq!(climate.kept_rows, 1);
    assert!(report.finished_at >= report.started_at);

    let mut districts = store.available_districts().unwrap();
    districts.sort();
    assert_eq!(districts, vec!["CHITTOOR", "GUNTUR"]);

    let rows = store.production("GUNTUR", 3, 50).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].crop, "Rice");
    assert_eq!(rows[0].production, 3400.0);

    let rain = store.rainfall("COASTAL ANDHRA PRADESH", 5).unwrap();
    assert_eq!(rain.len(), 1);
    assert_eq!(rain[0].rainfall, 1050.3);

    let requests = source.requests.borrow();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|(_, limit)| *limit == 10_000));
}

#[test]
fn one_failed_fetch_does_not_stop_the_other() {
    let source = CannedSource::default().with(RAINFALL_RESOURCE_ID, climate_rows());
    let mut store = Store::open_in_memory().unwrap();

    let report = run_extract_load(&source, &mut store, 100);

    match &report.agriculture {
        ResourceLoad::Skipped { reason } => assert!(reason.contains("503")),
        other => panic!("expected skip, got {other:?}"),
    }
    assert!(matches!(report.climate, ResourceLoad::Loaded(_)));
    assert_eq!(store.table_names().unwrap(), vec!["climate_data"]);
}

#[test]
fn empty_resource_is_skipped_and_keeps_previous_table() {
    let mut store = Store::open_in_memory().unwrap();
    let first = CannedSource::default()
        .with(AGRICULTURE_RESOURCE_ID, agri_rows())
        .with(RAINFALL_RESOURCE_ID, climate_rows());
    run_extract_load(&first, &mut store, 100);

    let second = CannedSource::default()
        .with(AGRICULTURE_RESOURCE_ID, vec![])
        .with(RAINFALL_RESOURCE_ID, climate_rows());
    let report = run_extract_load(&second, &mut store, 100);

    assert!(matches!(report.agriculture, ResourceLoad::Skipped { .. }));
    assert_eq!(store.available_districts().unwrap().len(), 2);
}

#[test]
fn loaded_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("samarth.db");
    let source = CannedSource::default()
        .with(AGRICULTURE_RESOURCE_ID, agri_rows())
        .with(RAINFALL_RESOURCE_ID, climate_rows());

    let mut store = Store::open(&path).unwrap();
    let report = run_extract_load(&source, &mut store, 100);
    store.close().unwrap();

    let store = Store::open(&path).unwrap();
    assert_eq!(store.table_names().unwrap(), vec!["agri_data", "climate_data"]);
    assert_eq!(store.available_districts().unwrap(), vec!["CHITTOOR", "GUNTUR"]);
    store.close().unwrap();

    let report_json = serde_json::to_value(&report).unwrap();
    assert_eq!(report_json["agriculture"]["status"], "loaded");
    assert_eq!(report_json["agriculture"]["kept_rows"], 2);
}
