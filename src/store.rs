// SQLite-backed store for the two datasets.
//
// The handle is opened once by the caller and passed to whatever needs it;
// nothing in the crate holds a global connection. All reads bind their
// arguments, including the LIMIT values.
use crate::error::{Result, SamarthError};
use crate::types::{
    AgriRecord, ClimateRecord, CropTotalRow, DistrictComparisonRow, ProductionRow, RainfallRow,
};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, info};

pub const AGRI_TABLE: &str = "agri_data";
pub const CLIMATE_TABLE: &str = "climate_data";

/// Rows returned for a plain production listing.
pub const PRODUCTION_ROW_CAP: u32 = 50;

const CREATE_AGRI: &str = r#"
    CREATE TABLE agri_data (
        state_name TEXT,
        district_name TEXT,
        year INTEGER,
        season TEXT,
        crop TEXT,
        area_hectares REAL,
        production_tonnes REAL NOT NULL,
        original_source_id TEXT NOT NULL
    )
"#;

const CREATE_CLIMATE: &str = r#"
    CREATE TABLE climate_data (
        region TEXT,
        year INTEGER NOT NULL,
        annual_rainfall_mm REAL NOT NULL,
        original_source_id TEXT NOT NULL
    )
"#;

/// Subquery for the N most recent years present anywhere in the agriculture
/// table, N bound at `limit_param`. The same window applies to every district
/// and crop in a query.
fn agri_recent_years(limit_param: &str) -> String {
    format!(
        "SELECT DISTINCT year FROM agri_data WHERE year IS NOT NULL ORDER BY year DESC LIMIT {limit_param}"
    )
}

/// Column description returned by [`Store::table_columns`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Close the underlying connection, surfacing any error SQLite reports.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| SamarthError::Store(e))
    }

    /// Distinct non-null district names in the agriculture table, sorted.
    pub fn available_districts(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT district_name FROM agri_data WHERE district_name IS NOT NULL ORDER BY district_name",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// The `n` most recent distinct years in the given table, newest first.
    pub fn recent_years(&self, table: &str, n: u32) -> Result<Vec<i32>> {
        let sql = format!(
            "SELECT DISTINCT year FROM {} WHERE year IS NOT NULL ORDER BY year DESC LIMIT ?1",
            quote_identifier(table)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![n], |row| row.get::<_, i32>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Per-crop totals for one district inside the recent-years window,
    /// largest total first.
    pub fn top_crops(&self, district: &str, years: u32, top_n: u32) -> Result<Vec<CropTotalRow>> {
        let sql = format!(
            r#"
            SELECT crop,
                   SUM(production_tonnes) AS total_production,
                   AVG(production_tonnes) AS avg_production,
                   COUNT(DISTINCT year) AS years_available
            FROM agri_data
            WHERE district_name = ?1
              AND year IN ({window})
            GROUP BY crop
            HAVING years_available > 0
            ORDER BY total_production DESC, crop ASC
            LIMIT ?3
            "#,
            window = agri_recent_years("?2")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![district, years, top_n], |row| {
            Ok(CropTotalRow {
                crop: row
                    .get::<_, Option<String>>(0)?
                    .unwrap_or_else(|| "Unknown".to_string()),
                total_production: row.get(1)?,
                avg_production: row.get(2)?,
                years_available: row.get(3)?,
            })
        })?;
        let rows = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(district, years, top_n, rows = rows.len(), "top crops query");
        Ok(rows)
    }

    /// Rainfall for one sub-division inside the climate table's own
    /// recent-years window, newest first.
    pub fn rainfall(&self, region: &str, years: u32) -> Result<Vec<RainfallRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT region, year, annual_rainfall_mm
            FROM climate_data
            WHERE region = ?1
              AND year IN (SELECT DISTINCT year FROM climate_data ORDER BY year DESC LIMIT ?2)
            ORDER BY year DESC
            "#,
        )?;
        let rows = stmt.query_map(params![region, years], |row| {
            Ok(RainfallRow {
                region: row.get(0)?,
                year: row.get(1)?,
                rainfall: row.get(2)?,
            })
        })?;
        let rows = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(region, years, rows = rows.len(), "rainfall query");
        Ok(rows)
    }

    /// Average production, crop variety, and year coverage for two districts.
    /// `first` sorts ahead of `second` in the output.
    pub fn compare_districts(
        &self,
        first: &str,
        second: &str,
        years: u32,
    ) -> Result<Vec<DistrictComparisonRow>> {
        let sql = format!(
            r#"
            SELECT district_name,
                   AVG(production_tonnes) AS avg_production,
                   COUNT(DISTINCT crop) AS crop_count,
                   COUNT(DISTINCT year) AS years_available
            FROM agri_data
            WHERE district_name IN (?1, ?2)
              AND year IN ({window})
            GROUP BY district_name
            ORDER BY CASE WHEN district_name = ?1 THEN 0 ELSE 1 END
            "#,
            window = agri_recent_years("?3")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![first, second, years], |row| {
            Ok(DistrictComparisonRow {
                district: row.get(0)?,
                avg_production: row.get(1)?,
                crop_count: row.get(2)?,
                years_available: row.get(3)?,
            })
        })?;
        let rows = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(first, second, years, rows = rows.len(), "comparison query");
        Ok(rows)
    }

    /// Raw production rows for one district, newest first, capped at `limit`.
    pub fn production(&self, district: &str, years: u32, limit: u32) -> Result<Vec<ProductionRow>> {
        let sql = format!(
            r#"
            SELECT district_name, year, crop, production_tonnes
            FROM agri_data
            WHERE district_name = ?1
              AND year IN ({window})
            ORDER BY year DESC
            LIMIT ?3
            "#,
            window = agri_recent_years("?2")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![district, years, limit], |row| {
            Ok(ProductionRow {
                district: row.get(0)?,
                year: row.get(1)?,
                crop: row
                    .get::<_, Option<String>>(2)?
                    .unwrap_or_else(|| "Unknown".to_string()),
                production: row.get(3)?,
            })
        })?;
        let rows = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(district, years, rows = rows.len(), "production query");
        Ok(rows)
    }

    /// Drop and rebuild `agri_data` with `records`, in one transaction.
    pub fn replace_agriculture(&mut self, records: &[AgriRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DROP TABLE IF EXISTS agri_data", [])?;
        tx.execute(CREATE_AGRI, [])?;
        {
            let mut insert = tx.prepare(
                r#"
                INSERT INTO agri_data
                (state_name, district_name, year, season, crop, area_hectares, production_tonnes, original_source_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;
            for r in records {
                insert.execute(params![
                    r.state_name,
                    r.district_name,
                    r.year,
                    r.season,
                    r.crop,
                    r.area_hectares,
                    r.production_tonnes,
                    r.original_source_id,
                ])?;
            }
        }
        tx.execute(
            "CREATE INDEX idx_agri_district_year ON agri_data(district_name, year)",
            [],
        )?;
        tx.commit()?;
        Ok(records.len())
    }

    /// Drop and rebuild `climate_data` with `records`, in one transaction.
    pub fn replace_climate(&mut self, records: &[ClimateRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DROP TABLE IF EXISTS climate_data", [])?;
        tx.execute(CREATE_CLIMATE, [])?;
        {
            let mut insert = tx.prepare(
                r#"
                INSERT INTO climate_data (region, year, annual_rainfall_mm, original_source_id)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for r in records {
                insert.execute(params![
                    r.region,
                    r.year,
                    r.annual_rainfall_mm,
                    r.original_source_id,
                ])?;
            }
        }
        tx.execute(
            "CREATE INDEX idx_climate_region_year ON climate_data(region, year)",
            [],
        )?;
        tx.commit()?;
        Ok(records.len())
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let rows = stmt.query_map(params![table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                declared_type: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Up to `limit` rows of `table`, every value rendered as text.
    pub fn sample_rows(&self, table: &str, limit: u32) -> Result<Vec<Vec<String>>> {
        let sql = format!("SELECT * FROM {} LIMIT ?1", quote_identifier(table));
        let mut stmt = self.conn.prepare(&sql)?;
        let width = stmt.column_count();
        let rows = stmt.query_map(params![limit], |row| {
            (0..width)
                .map(|i| row.get_ref(i).map(render_value))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

/// Quote a catalog identifier for the few statements that cannot bind one.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn render_value(v: ValueRef<'_>) -> String {
    match v {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agri(district: &str, year: i32, crop: &str, tonnes: f64) -> AgriRecord {
        AgriRecord {
            state_name: Some("Andhra Pradesh".into()),
            district_name: Some(district.into()),
            year: Some(year),
            season: Some("Kharif".into()),
            crop: Some(crop.into()),
            area_hectares: Some(10.0),
            production_tonnes: tonnes,
            original_source_id: "agri".into(),
        }
    }

    fn climate(region: &str, year: i32, mm: f64) -> ClimateRecord {
        ClimateRecord {
            region: Some(region.into()),
            year,
            annual_rainfall_mm: mm,
            original_source_id: "rain".into(),
        }
    }

    #[test]
    fn reads_fail_before_any_load() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.available_districts().is_err());
        assert!(store.top_crops("GUNTUR", 3, 5).is_err());
    }

    #[test]
    fn replace_discards_previous_contents() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .replace_agriculture(&[agri("GUNTUR", 2010, "Rice", 1.0)])
            .unwrap();
        store
            .replace_agriculture(&[agri("CHITTOOR", 2011, "Maize", 2.0)])
            .unwrap();
        assert_eq!(store.available_districts().unwrap(), vec!["CHITTOOR"]);
    }

    #[test]
    fn districts_skip_nulls() {
        let mut store = Store::open_in_memory().unwrap();
        let mut orphan = agri("X", 2010, "Rice", 1.0);
        orphan.district_name = None;
        store
            .replace_agriculture(&[orphan, agri("GUNTUR", 2010, "Rice", 1.0)])
            .unwrap();
        assert_eq!(store.available_districts().unwrap(), vec!["GUNTUR"]);
    }

    #[test]
    fn recent_years_are_newest_first() {
        let mut store = Store::open_in_memory().unwrap();
        let records: Vec<_> = (2001..=2005)
            .map(|y| agri("GUNTUR", y, "Rice", 1.0))
            .collect();
        store.replace_agriculture(&records).unwrap();
        assert_eq!(store.recent_years(AGRI_TABLE, 3).unwrap(), vec![2005, 2004, 2003]);
    }

    #[test]
    fn rainfall_window_comes_from_climate_table() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .replace_climate(&[
                climate("TAMIL NADU", 2015, 900.0),
                climate("COASTAL ANDHRA PRADESH", 2013, 1000.0),
                climate("COASTAL ANDHRA PRADESH", 2014, 1100.0),
            ])
            .unwrap();
        let rows = store.rainfall("COASTAL ANDHRA PRADESH", 2).unwrap();
        // Window is {2015, 2014}; 2015 only exists for another region.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, 2014);
    }

    #[test]
    fn comparison_keeps_requested_order() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .replace_agriculture(&[
                agri("ANANTAPUR", 2010, "Rice", 10.0),
                agri("ANANTAPUR", 2010, "Maize", 30.0),
                agri("CHITTOOR", 2010, "Rice", 5.0),
            ])
            .unwrap();
        let rows = store.compare_districts("CHITTOOR", "ANANTAPUR", 3).unwrap();
        assert_eq!(rows[0].district, "CHITTOOR");
        assert_eq!(rows[1].district, "ANANTAPUR");
        assert_eq!(rows[1].avg_production, 20.0);
        assert_eq!(rows[1].crop_count, 2);
    }

    #[test]
    fn production_listing_is_capped() {
        let mut store = Store::open_in_memory().unwrap();
        let records: Vec<_> = (0..60)
            .map(|i| agri("GUNTUR", 2010, &format!("Crop{i}"), i as f64))
            .collect();
        store.replace_agriculture(&records).unwrap();
        let rows = store.production("GUNTUR", 3, PRODUCTION_ROW_CAP).unwrap();
        assert_eq!(rows.len(), 50);
    }

    #[test]
    fn district_names_are_bound_not_spliced() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .replace_agriculture(&[agri("GUNTUR", 2010, "Rice", 1.0)])
            .unwrap();
        let rows = store.top_crops("x' OR '1'='1", 3, 5).unwrap();
        assert!(rows.is_empty());
        assert_eq!(store.available_districts().unwrap().len(), 1);
    }

    #[test]
    fn inspection_helpers() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .replace_climate(&[climate("TAMIL NADU", 2015, 900.5)])
            .unwrap();
        assert_eq!(store.table_names().unwrap(), vec!["climate_data"]);
        let cols = store.table_columns(CLIMATE_TABLE).unwrap();
        assert_eq!(cols[0].name, "region");
        assert_eq!(cols[1].declared_type, "INTEGER");
        let sample = store.sample_rows(CLIMATE_TABLE, 2).unwrap();
        assert_eq!(sample, vec![vec!["TAMIL NADU", "2015", "900.5", "rain"]]);
    }
}
