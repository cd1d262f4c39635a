//! Focus port.
//!
//! When an atomic state change arrives via external navigation (back or
//! forward button), the object-state synchronizer asks the host to move
//! focus somewhere sensible, typically the control the state belongs to.
//! What "focus" means is entirely the host's business; the synchronizer only
//! needs something it can poke.

/// Something that can receive focus on request.
pub trait FocusTarget {
    /// Asks the target to take focus.
    ///
    /// Called at most once per navigation event and never for non-atomic
    /// changes, so implementations need no debouncing of their own.
    fn request_focus(&self);
}

/// Any plain closure works as a focus target.
impl<F: Fn()> FocusTarget for F {
    fn request_focus(&self) {
        self()
    }
}

/// Focus target that ignores every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFocus;

impl FocusTarget for NoopFocus {
    fn request_focus(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn closures_are_focus_targets() {
        let calls = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&calls);
        let target = move || counter.set(counter.get() + 1);

        target.request_focus();
        target.request_focus();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn noop_target_swallows_requests() {
        NoopFocus.request_focus();
    }
}
