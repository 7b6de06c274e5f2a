use std::sync::Arc;

use crate::backend::ClientAccessor;
use crate::background::BackgroundTasks;

#[derive(Clone)]
pub struct AppState {
    pub flags: Arc<ClientAccessor>,
    pub background: Arc<dyn BackgroundTasks>,
}
