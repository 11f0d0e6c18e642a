//! Shared application state for all routes. Built once at startup; immutable afterwards.

use crate::config::{Settings, TableRegistry};
use crate::error::AppError;
use crate::intent::QueryLimits;
use crate::service::QueryService;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: QueryService,
    pub tables: Arc<TableRegistry>,
    pub limits: QueryLimits,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, settings: &Settings) -> Result<Self, AppError> {
        Ok(AppState {
            service: QueryService::new(store, settings),
            tables: Arc::new(TableRegistry::from_allow_list(&settings.tables)?),
            limits: settings.limits,
        })
    }
}
