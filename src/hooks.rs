//! Hook registry (§6): named hook keys at the event boundaries of
//! interactive operations, invoked in reverse-registration order. A hook
//! failure is swallowed so a third-party callback can never corrupt an
//! edit in progress (§7).
//!
//! No direct teacher analogue exists for this module — `ishikawa-seiren`
//! has no callback system — so it borrows the "one trait behind one
//! concrete, engine-owned registry" shape the teacher uses for
//! `Backend`/`SVGBackend` (`backend.rs`) and applies it to dispatch instead
//! of rendering.

use std::panic::{catch_unwind, AssertUnwindSafe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKey {
    MouseClickPre,
    MouseClickPost,
}

#[derive(Debug, Clone, Copy)]
pub struct HookEvent {
    pub key: HookKey,
    pub x: i32,
    pub y: i32,
}

type HookFn = Box<dyn FnMut(&HookEvent)>;

#[derive(Default)]
pub struct HookRegistry {
    pre: Vec<(u64, HookFn)>,
    post: Vec<(u64, HookFn)>,
    next_id: u64,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: HookKey, f: impl FnMut(&HookEvent) + 'static) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.bucket_mut(key).push((id, Box::new(f)));
        id
    }

    pub fn unregister(&mut self, key: HookKey, id: u64) {
        self.bucket_mut(key).retain(|(i, _)| *i != id);
    }

    /// Invoke every callback registered for `event.key`, most-recently
    /// registered first, swallowing any panic so a broken hook cannot
    /// corrupt the edit it was installed to observe.
    pub fn fire(&mut self, event: HookEvent) {
        let bucket = self.bucket_mut(event.key);
        for (_, f) in bucket.iter_mut().rev() {
            let _ = catch_unwind(AssertUnwindSafe(|| f(&event)));
        }
    }

    fn bucket_mut(&mut self, key: HookKey) -> &mut Vec<(u64, HookFn)> {
        match key {
            HookKey::MouseClickPre => &mut self.pre,
            HookKey::MouseClickPost => &mut self.post,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn fires_in_reverse_registration_order() {
        let log = Rc::new(RefCell::new(vec![]));
        let mut reg = HookRegistry::new();

        let l1 = log.clone();
        reg.register(HookKey::MouseClickPre, move |_| l1.borrow_mut().push(1));
        let l2 = log.clone();
        reg.register(HookKey::MouseClickPre, move |_| l2.borrow_mut().push(2));

        reg.fire(HookEvent {
            key: HookKey::MouseClickPre,
            x: 0,
            y: 0,
        });

        assert_eq!(*log.borrow(), vec![2, 1]);
    }

    #[test]
    fn panicking_hook_is_swallowed() {
        let log = Rc::new(RefCell::new(vec![]));
        let mut reg = HookRegistry::new();

        reg.register(HookKey::MouseClickPost, |_| panic!("boom"));
        let l = log.clone();
        reg.register(HookKey::MouseClickPost, move |_| l.borrow_mut().push(42));

        reg.fire(HookEvent {
            key: HookKey::MouseClickPost,
            x: 1,
            y: 1,
        });

        // The non-panicking hook (registered first, so it fires second in
        // reverse order) still ran.
        assert_eq!(*log.borrow(), vec![42]);
    }
}
