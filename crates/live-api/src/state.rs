use std::sync::Arc;

use live_core::Aggregator;

use crate::metrics::LookupMetrics;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub metrics: Arc<LookupMetrics>,
}

impl AppState {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self {
            aggregator,
            metrics: Arc::new(LookupMetrics::default()),
        }
    }
}
