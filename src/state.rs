use crate::config::Config;
use crate::service::MonitorService;

pub struct AppState {
    pub config: Config,
    pub service: MonitorService,
}
