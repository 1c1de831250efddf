// src/scene.rs
//! Attachment points for the planner's transient render resources.
//!
//! A slot holds at most one live instance. Replacements are built completely
//! before `attach` swaps them in, so a frame reading the slot sees either the
//! old resource or the new one and never a half-built one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::NormalizedInputs;
use crate::estimate::{Estimate, EstimateReport};
use crate::floor::FloorMesh;
use crate::grid::GridOverlay;

#[derive(Debug)]
pub struct SceneSlot<T> {
    current: RwLock<Option<Arc<T>>>,
    replacements: AtomicU64,
}

impl<T> Default for SceneSlot<T> {
    fn default() -> Self {
        Self {
            current: RwLock::new(None),
            replacements: AtomicU64::new(0),
        }
    }
}

impl<T> SceneSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `value`, releasing whatever was attached before.
    pub fn attach(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let previous = self.current.write().replace(Arc::clone(&value));
        self.replacements.fetch_add(1, Ordering::AcqRel);
        // The old instance goes away here unless a frame still holds it.
        drop(previous);
        value
    }

    pub fn detach(&self) -> Option<Arc<T>> {
        self.current.write().take()
    }

    pub fn current(&self) -> Option<Arc<T>> {
        self.current.read().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.current.read().is_some()
    }

    /// Number of `attach` calls so far.
    pub fn replacements(&self) -> u64 {
        self.replacements.load(Ordering::Acquire)
    }
}

/// Everything the render loop needs for one frame. Taken after an input
/// change, read by each frame.
#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    pub inputs: NormalizedInputs,
    pub estimate: Estimate,
    pub report: EstimateReport,
    pub floor: Option<Arc<FloorMesh>>,
    pub grid: Option<Arc<GridOverlay>>,
    /// Incremented by every completed recompute.
    pub revision: u64,
}

impl SceneSnapshot {
    pub fn is_renderable(&self) -> bool {
        self.floor.is_some() && self.grid.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_releases_previous() {
        let slot = SceneSlot::new();
        assert!(!slot.is_attached());

        let first = slot.attach(String::from("first"));
        let weak = Arc::downgrade(&first);
        drop(first);
        assert!(weak.upgrade().is_some());

        slot.attach(String::from("second"));
        assert!(weak.upgrade().is_none());
        assert_eq!(slot.current().as_deref().map(String::as_str), Some("second"));
        assert_eq!(slot.replacements(), 2);
    }

    #[test]
    fn test_reader_keeps_old_instance_alive() {
        let slot = SceneSlot::new();
        slot.attach(1u32);
        let frame = slot.current().unwrap();
        slot.attach(2u32);
        assert_eq!(*frame, 1);
        assert_eq!(*slot.current().unwrap(), 2);
    }

    #[test]
    fn test_detach() {
        let slot = SceneSlot::new();
        slot.attach(7u8);
        assert_eq!(slot.detach().map(|v| *v), Some(7));
        assert!(slot.current().is_none());
    }
}
