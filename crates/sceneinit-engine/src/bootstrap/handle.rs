use std::cell::Cell;
use std::rc::Rc;

/// Cancels a running animation loop.
///
/// Clones share state. Once cancelled, the next `animate` call neither draws
/// nor requests another frame.
#[derive(Debug, Clone, Default)]
pub struct AnimationHandle {
    cancelled: Rc<Cell<bool>>,
}

impl AnimationHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}
