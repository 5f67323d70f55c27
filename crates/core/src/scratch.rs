//! Per-thread scratch slot for by-value getter results
//!
//! A computed property whose getter returns by value has no stable address.
//! When the erased read path needs one, the value is parked here. The slot
//! holds a single value per thread: parking a second value drops the first,
//! so a pointer obtained from an earlier park is dangling afterwards.

use std::any::Any;
use std::cell::RefCell;

thread_local! {
    static SLOT: RefCell<Option<Box<dyn Any>>> = const { RefCell::new(None) };
}

/// Park `value` in this thread's slot and return its address
///
/// The previous occupant is dropped only after the new value is in place,
/// so a getter that reads the previous occupant through a pointer (nested
/// traversal) completes before it is released.
pub(crate) fn park<V: 'static>(value: V) -> *const u8 {
    let boxed: Box<dyn Any> = Box::new(value);
    let ptr = boxed
        .downcast_ref::<V>()
        .map(|v| v as *const V as *const u8)
        .unwrap_or(std::ptr::null());
    let previous = SLOT.with(|slot| slot.borrow_mut().replace(boxed));
    drop(previous);
    ptr
}

/// Drop whatever is parked on this thread
pub fn clear() {
    let previous = SLOT.with(|slot| slot.borrow_mut().take());
    drop(previous);
}

/// Whether this thread currently holds a parked value
pub fn is_occupied() -> bool {
    SLOT.with(|slot| slot.borrow().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_park_returns_stable_address() {
        let ptr = park(String::from("first"));
        assert!(is_occupied());
        assert_eq!(unsafe { &*(ptr as *const String) }, "first");
        clear();
        assert!(!is_occupied());
    }

    #[test]
    fn test_second_park_replaces_first() {
        let _first = park(1u64);
        let second = park(2u64);
        assert_eq!(unsafe { *(second as *const u64) }, 2);
        clear();
    }

    #[test]
    fn test_slot_is_thread_local() {
        let _ptr = park(5i32);
        let other = std::thread::spawn(is_occupied).join().unwrap();
        assert!(!other);
        assert!(is_occupied());
        clear();
    }
}
