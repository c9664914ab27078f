//! Exactly-once load slots for the model and the environment map.

use crate::error::LoadError;
use crate::{error, log};


/// Opaque id handed out by the scene graph when it takes ownership of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetHandle(pub u32);


#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Pending,
    Ready(T),
    Failed,
}


/// A slot that is settled at most once per page lifetime.
/// There is no retry and no timeout: a load that never completes keeps the
/// slot `Pending` forever.
#[derive(Debug)]
pub struct AssetSlot<T> {
    label: &'static str,
    state: LoadState<T>,
}
impl<T> AssetSlot<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            state: LoadState::Pending,
        }
    }


    pub fn state(&self) -> &LoadState<T> {
        &self.state
    }


    pub fn get(&self) -> Option<&T> {
        match &self.state {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }


    pub fn is_ready(&self) -> bool {
        matches!(self.state, LoadState::Ready(_))
    }


    pub fn is_settled(&self) -> bool {
        !matches!(self.state, LoadState::Pending)
    }


    /// Stores the outcome of the single load attempt.
    /// Returns `true` if this call settled the slot.
    pub fn settle(&mut self, outcome: Result<T, LoadError>) -> bool {
        if self.is_settled() {
            log!("AssetSlot::settle(): WARNING: {} already settled, ignoring.", self.label);
            return false;
        }

        self.state = match outcome {
            Ok(value) => {
                log!("AssetSlot::settle(): {} ready.", self.label);
                LoadState::Ready(value)
            },
            Err(e) => {
                error!("AssetSlot::settle(): {}", e);
                LoadState::Failed
            },
        };
        true
    }


    pub fn progress(&self, ratio: f64) {
        if ratio.is_finite() {
            log!("{}: {:.0}% loaded", self.label, (ratio * 100.0).clamp(0.0, 100.0));
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn model_error() -> LoadError {
        LoadError::Model {
            url: "public/DamagedHelmet.gltf".into(),
            reason: "404".into(),
        }
    }

    #[test]
    fn starts_pending_and_empty() {
        let slot = AssetSlot::<AssetHandle>::new("model");
        assert_eq!(slot.state(), &LoadState::Pending);
        assert!(slot.get().is_none());
        assert!(!slot.is_settled());
    }

    #[test]
    fn success_fills_the_slot() {
        let mut slot = AssetSlot::new("model");
        assert!(slot.settle(Ok(AssetHandle(7))));
        assert_eq!(slot.get(), Some(&AssetHandle(7)));
        assert!(slot.is_ready());
    }

    #[test]
    fn failure_leaves_the_slot_empty_for_good() {
        let mut slot = AssetSlot::<AssetHandle>::new("model");
        assert!(slot.settle(Err(model_error())));
        assert_eq!(slot.state(), &LoadState::Failed);

        // a late success cannot revive a failed slot
        assert!(!slot.settle(Ok(AssetHandle(1))));
        assert!(slot.get().is_none());
    }

    #[test]
    fn second_success_is_ignored() {
        let mut slot = AssetSlot::new("environment");
        slot.settle(Ok(AssetHandle(1)));
        assert!(!slot.settle(Ok(AssetHandle(2))));
        assert_eq!(slot.get(), Some(&AssetHandle(1)));
    }

    #[test]
    fn progress_never_settles() {
        let slot = AssetSlot::<AssetHandle>::new("model");
        slot.progress(0.5);
        slot.progress(f64::NAN);
        assert!(!slot.is_settled());
    }
}
