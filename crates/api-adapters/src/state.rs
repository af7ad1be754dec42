use std::sync::Arc;

use domains::CsrfGuard;
use services::AppServices;

use crate::metrics::Metrics;

/// Shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
    pub csrf: Arc<dyn CsrfGuard>,
    pub metrics: Arc<Metrics>,
    /// Adds the `Secure` attribute to every cookie we set
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        services: AppServices,
        csrf: Arc<dyn CsrfGuard>,
        metrics: Arc<Metrics>,
        secure_cookies: bool,
    ) -> Self {
        Self {
            services,
            csrf,
            metrics,
            secure_cookies,
        }
    }
}
