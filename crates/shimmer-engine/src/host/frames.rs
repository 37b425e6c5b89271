use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::FrameHandle;

/// Owner of the closures handed to a host's frame scheduler.
///
/// A closure lives until its frame is cancelled, or until it has fired and the
/// next frame is requested. The closure currently running never counts as fired,
/// so a frame callback that requests the next frame does not drop itself.
pub(crate) struct FrameSlots<C> {
    slots: BTreeMap<FrameHandle, (Rc<Cell<bool>>, C)>,
}

impl<C> FrameSlots<C> {
    pub(crate) fn new() -> Self {
        Self { slots: BTreeMap::new() }
    }

    /// Drops closures whose frame already ran and returns the fired flag for the
    /// next closure. The closure sets it once its callback has returned.
    pub(crate) fn prepare(&mut self) -> Rc<Cell<bool>> {
        self.slots.retain(|_, (fired, _)| !fired.get());
        Rc::new(Cell::new(false))
    }

    pub(crate) fn insert(&mut self, handle: FrameHandle, fired: Rc<Cell<bool>>, closure: C) {
        self.slots.insert(handle, (fired, closure));
    }

    /// Forgets `handle`, dropping its closure. `None` if it was unknown.
    pub(crate) fn cancel(&mut self, handle: FrameHandle) -> Option<C> {
        self.slots.remove(&handle).map(|(_, closure)| closure)
    }

    /// Handles whose closure has not fired yet.
    pub(crate) fn pending(&self) -> Vec<FrameHandle> {
        self.slots
            .iter()
            .filter(|(_, (fired, _))| !fired.get())
            .map(|(handle, _)| *handle)
            .collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.len()
    }
}
