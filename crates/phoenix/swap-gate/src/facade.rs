use crate::manager::ActiveSlot;
use arc_swap::ArcSwap;
use phoenix_types::{Request, Response, Service, ServiceError};
use std::sync::Arc;

/// Stable entry point for live traffic.
///
/// Holds no implementation itself. Each call takes one snapshot of the active
/// slot and runs to completion on it, so a concurrent swap neither tears the
/// call nor frees the implementation under it.
#[derive(Clone)]
pub struct StableFacade {
    active: Arc<ArcSwap<ActiveSlot>>,
}

impl StableFacade {
    pub(crate) fn new(active: Arc<ArcSwap<ActiveSlot>>) -> Self {
        Self { active }
    }

    /// Version currently serving.
    pub fn active_version(&self) -> String {
        self.active.load().version_id().to_string()
    }
}

impl Service for StableFacade {
    fn process(&self, request: &Request) -> Result<Response, ServiceError> {
        let slot = self.active.load_full();
        slot.service.process(request)
    }

    fn name(&self) -> &str {
        "facade"
    }
}
