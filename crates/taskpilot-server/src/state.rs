use taskpilot::providers::configs::ProviderConfig;
use taskpilot::todoist::TodoistConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub provider_config: ProviderConfig,
    pub todoist: TodoistConfig,
}
