//! State module for tracking scrape progress
//!
//! # Components
//!
//! - `YearState`: the per-year state (pending, attempting, retrying, succeeded, abandoned)
//! - `YearProgress`: enforces legal transitions and the attempt budget

mod year_state;

pub use year_state::{YearProgress, YearState};
