use vpn_core::EndpointService;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub service: EndpointService,
    pub config: AppConfig,
}
