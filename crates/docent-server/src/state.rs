//! Application state shared across handlers.

use std::sync::Arc;

use docent_controller::Controller;
use docent_session::SessionStore;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The request controller.
    pub controller: Controller,

    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(controller: Controller, config: ServerConfig) -> Self {
        Self {
            controller,
            config: Arc::new(config),
        }
    }

    /// The controller's session store.
    pub fn sessions(&self) -> &SessionStore {
        self.controller.sessions()
    }
}
