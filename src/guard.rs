//! Circular dependency detection.
//!
//! Each thread keeps the stack of providers currently constructing. Entering a
//! provider that is already on the stack means its constructor asked for
//! itself, directly or through its dependencies.

use crate::{DiError, Result};
use std::cell::RefCell;

thread_local! {
    static RESOLVING: RefCell<Vec<(usize, &'static str)>> = const { RefCell::new(Vec::new()) };
}

/// RAII entry on the thread-local resolution stack.
pub(crate) struct ResolutionGuard {
    key: usize,
}

impl ResolutionGuard {
    /// Push `key` onto the stack, or fail if it is already there.
    pub(crate) fn enter(key: usize, type_name: &'static str) -> Result<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(start) = stack.iter().position(|(k, _)| *k == key) {
                let mut path: Vec<&'static str> = stack[start..].iter().map(|(_, name)| *name).collect();
                path.push(type_name);
                return Err(DiError::CircularDependency { type_name, path });
            }
            stack.push((key, type_name));
            Ok(Self { key })
        })
    }

    /// Number of providers constructing on this thread
    #[cfg(test)]
    pub(crate) fn depth() -> usize {
        RESOLVING.with(|stack| stack.borrow().len())
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|(k, _)| *k == self.key) {
                stack.remove(pos);
            }
        });
    }
}
