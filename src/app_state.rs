use crate::config::UiConfig;
use crate::model_store::{ModelStore, StartupNotice};

/// Shared, read-only state handed to every request handler.
pub struct AppState {
    pub store: ModelStore,
    pub ui: UiConfig,
    pub notices: Vec<StartupNotice>,
}

impl AppState {
    pub fn new(store: ModelStore, ui: UiConfig) -> Self {
        let notices = store.notices();
        Self { store, ui, notices }
    }
}
