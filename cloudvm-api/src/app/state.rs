use crate::service::ProvisioningService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProvisioningService>,
}

impl AppState {
    pub fn new(service: Arc<ProvisioningService>) -> Arc<Self> {
        Arc::new(Self { service })
    }
}
