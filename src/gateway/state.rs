use std::sync::Arc;

use crate::auth::AdminAuthService;
use crate::content::ContentStore;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentStore>,
    pub auth: Arc<AdminAuthService>,
}

impl AppState {
    pub fn new(content: Arc<ContentStore>, auth: Arc<AdminAuthService>) -> Self {
        Self { content, auth }
    }
}
