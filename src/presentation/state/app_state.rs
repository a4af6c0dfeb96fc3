use std::sync::Arc;

use crate::application::services::EpisodeService;
use crate::presentation::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub episode_service: Arc<EpisodeService>,
    pub settings: Settings,
}
