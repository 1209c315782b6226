// Fixed-template summaries of a result table.
use crate::types::{
    Action, CropTotalRow, DistrictComparisonRow, QueryPlan, RainfallRow, ResultTable,
};
use crate::util::{average, format_int, format_number};

pub const ATTRIBUTION: &str = "Data sourced from Government of India datasets";

/// Stands in for the region name when a plan carries none.
const UNSPECIFIED_REGION: &str = "(no region given)";

/// How many districts an empty answer suggests.
const MAX_SUGGESTIONS: usize = 6;

/// Render `table` as a short answer to the question behind `plan`.
///
/// `suggestions` is the district list offered when there is nothing to show.
pub fn summarize<S>(table: &ResultTable, plan: &QueryPlan, suggestions: &[S]) -> String
where
    S: AsRef<str>,
{
    let region = plan.primary_region().unwrap_or(UNSPECIFIED_REGION);

    if table.is_empty() {
        let offered: Vec<&str> = suggestions
            .iter()
            .take(MAX_SUGGESTIONS)
            .map(AsRef::as_ref)
            .collect();
        return format!(
            "No data found for '{}'\n\nAvailable districts: {}\n\nTry questions about these districts.",
            region,
            offered.join(", ")
        );
    }

    let mut answer = match (plan.action(), table) {
        (Action::TopCrops, ResultTable::TopCrops(rows)) => top_crops(rows, plan.top_n(), region),
        (Action::RainfallOnly, ResultTable::Rainfall(rows)) => rainfall(rows),
        (Action::CompareStates, ResultTable::Comparison(rows)) => comparison(rows, plan.regions()),
        _ => production(table, region),
    };
    answer.push_str(ATTRIBUTION);
    answer
}

fn top_crops(rows: &[CropTotalRow], top_n: u32, district: &str) -> String {
    let mut out = format!("Top {} Most Produced Crops in {} District\n\n", top_n, district);
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}\n   Total Production: {} tonnes\n   Average Annual: {} tonnes\n\n",
            i + 1,
            row.crop,
            format_number(row.total_production, 0),
            format_number(row.avg_production, 0)
        ));
    }
    let total: f64 = rows.iter().map(|r| r.total_production).sum();
    out.push_str(&format!(
        "Total production of top {} crops: {} tonnes\n\n",
        top_n,
        format_number(total, 0)
    ));
    out
}

fn rainfall(rows: &[RainfallRow]) -> String {
    let values: Vec<f64> = rows.iter().map(|r| r.rainfall).collect();
    format!(
        "Rainfall Analysis\n\nAverage Rainfall: {} mm\n\nBased on {} years of regional data\n\n",
        format_number(average(&values), 0),
        format_int(rows.len())
    )
}

fn comparison(rows: &[DistrictComparisonRow], requested: &[String]) -> String {
    let mut out = format!("District Comparison: {}\n\n", requested.join(" vs "));
    for row in rows {
        out.push_str(&format!(
            "{}\n   Average Production: {} tonnes\n   Crops Grown: {} types\n\n",
            row.district,
            format_number(row.avg_production, 0),
            row.crop_count
        ));
    }
    out
}

fn production(table: &ResultTable, district: &str) -> String {
    match table.production_values() {
        Some(values) => format!(
            "Agriculture Production in {} District\n\nAverage Production: {} tonnes\n\n",
            district,
            format_number(average(&values), 0)
        ),
        None => format!(
            "Data Summary for {} District\n\nFound {} records of agricultural data.\n\n",
            district,
            format_int(table.len())
        ),
    }
}
