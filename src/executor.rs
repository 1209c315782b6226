// QueryPlan -> rows.
//
// Resolves the plan's regions against the stored district names, picks one
// of four query shapes, and reports how it went. Nothing here returns an
// error to the caller: faults are folded into `QueryStatus::Fault` with an
// empty table, so "no rows" and "query failed" stay distinguishable.
use crate::config::{AGRICULTURE_RESOURCE_ID, FALLBACK_DISTRICTS, RAINFALL_RESOURCE_ID};
use crate::error::Result;
use crate::region::{map_to_climate_region, resolve_region};
use crate::store::{Store, PRODUCTION_ROW_CAP};
use crate::types::{Action, QueryPlan, ResultTable};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    /// The query ran and returned at least one row.
    Rows,
    /// The query ran and matched nothing.
    NoRows,
    /// A requested region matched no stored district, even by substring.
    RegionNotFound { requested: String },
    /// The store could not answer (missing table, I/O, bad SQL).
    Fault { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub table: ResultTable,
    /// Provenance identifiers, for display only.
    pub sources: Vec<String>,
    pub status: QueryStatus,
}

impl QueryOutcome {
    fn completed(table: ResultTable) -> Self {
        let status = if table.is_empty() {
            QueryStatus::NoRows
        } else {
            QueryStatus::Rows
        };
        Self {
            table,
            // Both datasets are cited whichever action ran.
            sources: vec![
                AGRICULTURE_RESOURCE_ID.to_string(),
                RAINFALL_RESOURCE_ID.to_string(),
            ],
            status,
        }
    }

    fn failed(status: QueryStatus) -> Self {
        Self {
            table: ResultTable::Empty,
            sources: vec![AGRICULTURE_RESOURCE_ID.to_string()],
            status,
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self.status, QueryStatus::Fault { .. })
    }

    /// The plain `(table, sources)` pair, for callers that don't care why a
    /// table is empty.
    pub fn into_parts(self) -> (ResultTable, Vec<String>) {
        (self.table, self.sources)
    }
}

/// District names from the store, or the built-in list if it can't be read.
pub fn known_districts(store: &Store) -> Vec<String> {
    match store.available_districts() {
        Ok(districts) => districts,
        Err(e) => {
            warn!(error = %e, "could not list districts, using built-in list");
            FALLBACK_DISTRICTS.iter().map(|d| d.to_string()).collect()
        }
    }
}

pub struct Executor<'a> {
    store: &'a Store,
}

impl<'a> Executor<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn execute(&self, plan: &QueryPlan) -> QueryOutcome {
        let known = known_districts(self.store);

        let requested = match plan.primary_region() {
            Some(r) => r.to_string(),
            None => known.first().cloned().unwrap_or_default(),
        };
        let Some(district) = resolve_region(&requested, &known) else {
            debug!(requested = %requested, "region not found");
            return QueryOutcome::failed(QueryStatus::RegionNotFound { requested });
        };

        let result = match plan.action() {
            Action::TopCrops => self
                .store
                .top_crops(district, plan.time_period_years(), plan.top_n())
                .map(ResultTable::TopCrops),
            Action::RainfallOnly => {
                let region = map_to_climate_region(district);
                debug!(district, region, "mapped district to climate region");
                self.store
                    .rainfall(region, plan.time_period_years())
                    .map(ResultTable::Rainfall)
            }
            Action::CompareStates if plan.regions().len() >= 2 => {
                let mut sides = Vec::with_capacity(2);
                for requested in &plan.regions()[..2] {
                    match resolve_region(requested, &known) {
                        Some(d) => sides.push(d),
                        None => {
                            return QueryOutcome::failed(QueryStatus::RegionNotFound {
                                requested: requested.clone(),
                            })
                        }
                    }
                }
                self.store
                    .compare_districts(sides[0], sides[1], plan.time_period_years())
                    .map(ResultTable::Comparison)
            }
            _ => self.production(district, plan),
        };

        match result {
            Ok(table) => QueryOutcome::completed(table),
            Err(e) => {
                warn!(action = %plan.action(), error = %e, "query failed");
                QueryOutcome::failed(QueryStatus::Fault {
                    message: e.to_string(),
                })
            }
        }
    }

    fn production(&self, district: &str, plan: &QueryPlan) -> Result<ResultTable> {
        self.store
            .production(district, plan.time_period_years(), PRODUCTION_ROW_CAP)
            .map(ResultTable::Production)
    }
}
