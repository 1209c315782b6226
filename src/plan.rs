// Question text -> QueryPlan.
//
// Keyword containment plus two regexes; no attempt at real language
// understanding. Every input yields a plan, missing pieces take defaults.
use crate::types::{Action, QueryPlan, DEFAULT_TIME_PERIOD_YEARS, DEFAULT_TOP_N};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static YEARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"last\s+(\d+)\s+years?").expect("static regex"));
static TOP_N_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"top\s+(\d+)").expect("static regex"));

/// What the intent rules get to look at.
struct Signals<'a> {
    text: &'a str,
    known_regions: usize,
}

impl Signals<'_> {
    fn has(&self, word: &str) -> bool {
        self.text.contains(word)
    }
}

type IntentRule = (fn(&Signals) -> bool, Action);

/// Evaluated top to bottom; the first satisfied predicate picks the action.
const INTENT_RULES: &[IntentRule] = &[
    (asks_top_crops, Action::TopCrops),
    (asks_rainfall_only, Action::RainfallOnly),
    (asks_comparison, Action::CompareStates),
];

fn asks_top_crops(s: &Signals) -> bool {
    s.has("top") && (s.has("crop") || s.has("produced"))
}

fn asks_rainfall_only(s: &Signals) -> bool {
    s.has("rainfall") && !s.has("production")
}

fn asks_comparison(s: &Signals) -> bool {
    s.has("compare") && s.known_regions >= 2
}

/// Pick the action for an already-lowercased question.
pub fn classify_action(question_lower: &str, known_regions: usize) -> Action {
    let signals = Signals {
        text: question_lower,
        known_regions,
    };
    INTENT_RULES
        .iter()
        .find(|(matches, _)| matches(&signals))
        .map(|(_, action)| *action)
        .unwrap_or(Action::ProductionOnly)
}

/// Build a plan from free text against the list of regions the dashboard
/// knows about.
pub fn build_plan<S>(question: &str, known_regions: &[S]) -> QueryPlan
where
    S: AsRef<str>,
{
    let q = question.to_lowercase();

    let years = capture_count(&YEARS_RE, &q).unwrap_or(DEFAULT_TIME_PERIOD_YEARS);
    let top_n = capture_count(&TOP_N_RE, &q).unwrap_or(DEFAULT_TOP_N);

    let mut regions: Vec<String> = known_regions
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| q.contains(&name.to_lowercase()))
        .map(str::to_string)
        .collect();
    if regions.is_empty() {
        regions.extend(known_regions.first().map(|r| r.as_ref().to_string()));
    }

    let action = classify_action(&q, known_regions.len());
    if action == Action::CompareStates && regions.len() < 2 {
        regions = known_regions
            .iter()
            .take(2)
            .map(|r| r.as_ref().to_string())
            .collect();
    }

    let plan = QueryPlan::new(action, regions, years, top_n);
    debug!(action = %plan.action(), regions = ?plan.regions(), years = plan.time_period_years(), top_n = plan.top_n(), "built query plan");
    plan
}

/// First capture group as a positive count; zero or overflow counts as absent.
fn capture_count(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|n| *n > 0)
}
