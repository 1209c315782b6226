// The question/answer surface: question text in, display text out.
//
// Plan Builder -> Executor -> Narrative, with the district lists read once
// when the dashboard is built. Errors never escape `ask`; they are rendered
// as a short message pointing back at the example questions.
use crate::config::FEATURED_DISTRICT_KEYWORDS;
use crate::error::{Result, SamarthError};
use crate::executor::{known_districts, Executor, QueryOutcome, QueryStatus};
use crate::narrative::summarize;
use crate::plan::build_plan;
use crate::store::Store;
use crate::types::QueryPlan;
use tracing::{info, warn};

/// Districts the dashboard advertises and matches questions against.
///
/// Narrows `available` to names containing one of the featured keywords;
/// falls back to the first three available, then to `ANANTAPUR`.
pub fn featured_districts(available: &[String]) -> Vec<String> {
    let featured: Vec<String> = available
        .iter()
        .filter(|d| {
            let upper = d.to_uppercase();
            FEATURED_DISTRICT_KEYWORDS.iter().any(|k| upper.contains(k))
        })
        .cloned()
        .collect();
    if !featured.is_empty() {
        return featured;
    }
    if !available.is_empty() {
        return available.iter().take(3).cloned().collect();
    }
    vec!["ANANTAPUR".to_string()]
}

/// A fully worked question, before rendering.
#[derive(Debug, Clone)]
pub struct Answer {
    pub plan: QueryPlan,
    pub outcome: QueryOutcome,
    pub narrative: String,
}

pub struct Dashboard<'a> {
    store: &'a Store,
    available: Vec<String>,
    featured: Vec<String>,
}

impl<'a> Dashboard<'a> {
    pub fn new(store: &'a Store) -> Self {
        let available = known_districts(store);
        let featured = featured_districts(&available);
        info!(available = available.len(), featured = ?featured, "dashboard ready");
        Self {
            store,
            available,
            featured,
        }
    }

    pub fn list_available_regions(&self) -> &[String] {
        &self.featured
    }

    pub fn example_questions(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(first) = self.featured.first() {
            out.push(format!(
                "List the top 3 most produced crops in {} from last 3 years",
                first
            ));
        }
        if let [first, second, ..] = self.featured.as_slice() {
            out.push(format!(
                "Compare agriculture production in {} and {}",
                first, second
            ));
        }
        if let Some(first) = self.featured.first() {
            out.push(format!("Show crop production data for {} district", first));
        }
        out
    }

    /// The district list followed by numbered example questions.
    pub fn region_overview(&self) -> String {
        let mut out = format!("Available Districts: {}\n", self.featured.join(", "));
        out.push_str("\nExample questions:\n");
        for (i, q) in self.example_questions().iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, q));
        }
        out
    }

    pub fn plan(&self, question: &str) -> QueryPlan {
        build_plan(question, &self.featured)
    }

    /// Run a plan and summarize it. A store fault comes back as an error;
    /// an unknown region or an empty match is a normal answer.
    pub fn answer_plan(&self, plan: QueryPlan) -> Result<Answer> {
        let outcome = Executor::new(self.store).execute(&plan);
        if let QueryStatus::Fault { message } = &outcome.status {
            return Err(SamarthError::Query(message.clone()));
        }
        let narrative = summarize(&outcome.table, &plan, &self.available);
        Ok(Answer {
            plan,
            outcome,
            narrative,
        })
    }

    pub fn answer(&self, question: &str) -> Result<Answer> {
        self.answer_plan(self.plan(question))
    }

    /// Answer a question as display text. Never fails.
    pub fn ask(&self, question: &str) -> String {
        let question = question.trim();
        if question.is_empty() {
            return "Please enter a question".to_string();
        }
        match self.answer(question) {
            Ok(answer) => render_answer(&answer),
            Err(e) => render_error(&e),
        }
    }
}

pub fn render_answer(answer: &Answer) -> String {
    format!(
        "Analyzing: {} for {} years\n\nAnswer:\n{}\n\nSources: {}",
        answer.plan.regions().join(", "),
        answer.plan.time_period_years(),
        answer.narrative,
        answer.outcome.sources.join(", ")
    )
}

/// Shown in place of an answer when the store could not be read. The
/// underlying error goes to the log, not to the reader.
pub const STORE_FAULT_MESSAGE: &str = "Could not read the data store";

pub fn render_error(err: &SamarthError) -> String {
    warn!(error = %err, "question could not be answered");
    format!(
        "Error: {}\nTry using one of the example questions above.",
        STORE_FAULT_MESSAGE
    )
}
