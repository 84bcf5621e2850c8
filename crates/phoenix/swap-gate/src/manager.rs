use crate::candidate::{CandidateHandle, ScriptService, ENTRY_POINT};
use crate::error::SwapError;
use crate::facade::StableFacade;
use arc_swap::ArcSwap;
use phoenix_compiler::ExecutionContext;
use phoenix_types::{DefaultService, Service};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Contents of the active-implementation cell. Published whole, never
/// mutated in place.
pub struct ActiveSlot {
    pub candidate: Option<CandidateHandle>,
    pub service: Arc<dyn Service>,
}

impl ActiveSlot {
    fn default_slot(service: Arc<dyn Service>) -> Self {
        Self {
            candidate: None,
            service,
        }
    }

    /// Candidate version, or the default service's name.
    pub fn version_id(&self) -> &str {
        match &self.candidate {
            Some(c) => &c.version_id,
            None => self.service.name(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.candidate.is_none()
    }
}

/// Loads candidates and swaps the active implementation.
pub struct HotSwapManager {
    active: Arc<ArcSwap<ActiveSlot>>,
    swaps: AtomicU64,
    rollbacks: AtomicU64,
}

impl HotSwapManager {
    /// Starts serving [`DefaultService`].
    pub fn new() -> Self {
        Self::with_default(Arc::new(DefaultService))
    }

    pub fn with_default(service: Arc<dyn Service>) -> Self {
        Self {
            active: Arc::new(ArcSwap::from_pointee(ActiveSlot::default_slot(service))),
            swaps: AtomicU64::new(0),
            rollbacks: AtomicU64::new(0),
        }
    }

    /// Links `artifacts` into a fresh context and instantiates the service
    /// exported by `target_unit`. Nothing is published.
    pub fn load_candidate(
        &self,
        artifacts: &BTreeMap<String, Vec<u8>>,
        target_unit: &str,
        version_id: &str,
    ) -> Result<CandidateHandle, SwapError> {
        let context =
            ExecutionContext::link(artifacts).map_err(|e| SwapError::load_failed(version_id, e))?;
        if !context.has_unit(target_unit) {
            return Err(SwapError::load_failed(
                version_id,
                format!("target unit {target_unit} not found"),
            ));
        }
        match context.export_arity(target_unit, ENTRY_POINT) {
            Some(1) => {}
            Some(n) => {
                return Err(SwapError::load_failed(
                    version_id,
                    format!("{target_unit}::{ENTRY_POINT} must take 1 argument, takes {n}"),
                ))
            }
            None => {
                return Err(SwapError::load_failed(
                    version_id,
                    format!("{target_unit} does not export {ENTRY_POINT}"),
                ))
            }
        }

        let context = Arc::new(context);
        let service: Arc<dyn Service> = Arc::new(ScriptService::new(
            version_id,
            target_unit,
            Arc::clone(&context),
        ));
        tracing::debug!(version_id, target_unit, "candidate loaded");
        Ok(CandidateHandle {
            version_id: version_id.to_string(),
            target_unit: target_unit.to_string(),
            context,
            service,
        })
    }

    /// Publishes `candidate` with one atomic store.
    pub fn switch_to(&self, candidate: &CandidateHandle) {
        let slot = ActiveSlot {
            candidate: Some(candidate.clone()),
            service: Arc::clone(&candidate.service),
        };
        self.active.store(Arc::new(slot));
        self.swaps.fetch_add(1, Ordering::Relaxed);
        tracing::info!(version_id = %candidate.version_id, "switched active implementation");
    }

    /// Re-publishes `previous`. Returns `false` when it is already active.
    pub fn rollback_to(&self, previous: &Arc<ActiveSlot>) -> bool {
        let current = self.active.load();
        if Arc::ptr_eq(&current, previous) {
            return false;
        }
        drop(current);
        self.active.store(Arc::clone(previous));
        self.rollbacks.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(version_id = %previous.version_id(), "rolled back active implementation");
        true
    }

    /// Snapshot of the active slot.
    pub fn active(&self) -> Arc<ActiveSlot> {
        self.active.load_full()
    }

    pub fn facade(&self) -> StableFacade {
        StableFacade::new(Arc::clone(&self.active))
    }

    pub fn swap_count(&self) -> u64 {
        self.swaps.load(Ordering::Relaxed)
    }

    pub fn rollback_count(&self) -> u64 {
        self.rollbacks.load(Ordering::Relaxed)
    }
}

impl Default for HotSwapManager {
    fn default() -> Self {
        Self::new()
    }
}
