pub mod api;
pub mod betting;
pub mod config;
pub mod db;
pub mod errors;
pub mod identity;
pub mod ledger;
pub mod metrics;
pub mod models;

use std::sync::Arc;

use crate::betting::RiskPolicy;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub risk_policy: Arc<dyn RiskPolicy>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl AppState {
    pub fn new(
        db: sqlx::PgPool,
        config: AppConfig,
        metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> Self {
        let risk_policy = betting::risk_policy::from_config(&config);
        Self {
            db,
            config,
            risk_policy,
            metrics_handle,
        }
    }
}
