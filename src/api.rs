//! HTTP API for the RoboClean support backend

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::factsheet::Factsheet;
use crate::llm::LlmService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn LlmService>,
    pub factsheet: Arc<Factsheet>,
}

impl AppState {
    pub fn new(llm: Arc<dyn LlmService>, factsheet: Arc<Factsheet>) -> Self {
        Self { llm, factsheet }
    }
}
