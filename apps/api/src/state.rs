use crate::analysis::client::AnalysisClient;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds configuration only; no request data is shared between requests.
#[derive(Clone)]
pub struct AppState {
    pub analysis: AnalysisClient,
    pub config: Config,
}
