// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::accounts::UserStore;
use crate::cache::Coordinator;
use crate::config::Config;
use crate::ledger::ProgressLedger;
use crate::storage::BlobStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub coordinator: Coordinator,
    pub ledger: Arc<ProgressLedger>,
    pub users: Arc<dyn UserStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
