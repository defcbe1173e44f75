pub mod handlers;
pub mod routes;

use crate::shared::cache::QueryCache;
use crate::shared::data::access::DataAccess;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub access: DataAccess,
    pub cache: QueryCache,
}

impl AppState {
    pub fn new(access: DataAccess, cache: QueryCache) -> Self {
        Self { access, cache }
    }
}
