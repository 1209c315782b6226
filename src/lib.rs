//! Question answering over district crop production and sub-division
//! rainfall, loaded from data.gov.in into SQLite.
pub mod config;
pub mod dashboard;
pub mod error;
pub mod etl;
pub mod executor;
pub mod inspect;
pub mod narrative;
pub mod output;
pub mod plan;
pub mod region;
pub mod store;
pub mod types;
pub mod util;

pub use error::{Result, SamarthError};
