// Region name lookup.
//
// Districts come from the agriculture table; rainfall is reported per
// meteorological sub-division, so a district has to be mapped onto one
// before the climate table can be queried.

/// Sub-division used when no keyword matches.
///
/// This is the same value as the first rule, so any district outside the
/// other three keyword groups reads as coastal Andhra Pradesh. Kept as-is for
/// compatibility with existing answers.
pub const DEFAULT_CLIMATE_REGION: &str = "COASTAL ANDHRA PRADESH";

const CLIMATE_RULES: &[(&[&str], &str)] = &[
    (&["ANDHRA"], "COASTAL ANDHRA PRADESH"),
    (&["ANDAMAN", "NICOBAR"], "ANDAMAN & NICOBAR ISLANDS"),
    (&["TAMIL", "NADU"], "TAMIL NADU"),
    (&["KARNATAKA"], "COASTAL KARNATAKA"),
];

/// Map a user-entered region onto its stored spelling.
///
/// Exact (case-insensitive, trimmed) match wins; otherwise the first known
/// name containing the request. Returns `None` when neither applies, or when
/// the request is blank.
pub fn resolve_region<'a, S>(requested: &str, known: &'a [S]) -> Option<&'a str>
where
    S: AsRef<str>,
{
    let wanted = requested.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }

    let exact = known
        .iter()
        .map(AsRef::as_ref)
        .find(|name| name.trim().to_lowercase() == wanted);
    if exact.is_some() {
        return exact;
    }

    known
        .iter()
        .map(AsRef::as_ref)
        .find(|name| name.trim().to_lowercase().contains(&wanted))
}

/// Map a district name onto a rainfall sub-division. Total: unmatched names
/// get [`DEFAULT_CLIMATE_REGION`].
pub fn map_to_climate_region(district: &str) -> &'static str {
    let upper = district.to_uppercase();
    CLIMATE_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| upper.contains(k)))
        .map(|(_, region)| *region)
        .unwrap_or(DEFAULT_CLIMATE_REGION)
}
