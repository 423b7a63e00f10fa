//! Shared object handles with pointer identity.
//!
//! Domain objects reference each other through [`RnRef`] (strong) and
//! [`RnWeak`] (weak back-reference) handles. Two handles are equal exactly
//! when they point at the same allocation; field contents never take part
//! in equality or hashing.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

/// Identity of one allocated domain object.
///
/// Only meaningful while the object is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(usize);

impl ObjectKey {
    fn of<T>(rc: &Rc<RefCell<T>>) -> Self {
        ObjectKey(Rc::as_ptr(rc) as *const () as usize)
    }
}

/// Strong, shared, interior-mutable handle to a domain object.
pub struct RnRef<T>(Rc<RefCell<T>>);

impl<T> RnRef<T> {
    pub fn new(value: T) -> Self {
        RnRef(Rc::new(RefCell::new(value)))
    }

    /// Immutably borrows the object.
    ///
    /// Panics if the object is currently mutably borrowed, as `RefCell` does.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrows the object.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    pub fn downgrade(&self) -> RnWeak<T> {
        RnWeak(Rc::downgrade(&self.0))
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::of(&self.0)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of strong handles to this object, this one included.
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl<T: Default> Default for RnRef<T> {
    fn default() -> Self {
        RnRef::new(T::default())
    }
}

impl<T> Clone for RnRef<T> {
    fn clone(&self) -> Self {
        RnRef(Rc::clone(&self.0))
    }
}

impl<T> PartialEq for RnRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for RnRef<T> {}

impl<T> Hash for RnRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

// Only the identity is printed: printing contents would walk the whole graph.
impl<T> fmt::Debug for RnRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RnRef({:#x})", self.key().0)
    }
}

/// Weak handle used for back-references (lane to parent link and similar).
///
/// A default-constructed or dangling weak handle reads as null.
pub struct RnWeak<T>(Weak<RefCell<T>>);

impl<T> RnWeak<T> {
    pub fn new() -> Self {
        RnWeak(Weak::new())
    }

    pub fn upgrade(&self) -> Option<RnRef<T>> {
        self.0.upgrade().map(RnRef)
    }

    pub fn is_null(&self) -> bool {
        self.0.strong_count() == 0
    }
}

impl<T> Default for RnWeak<T> {
    fn default() -> Self {
        RnWeak::new()
    }
}

impl<T> Clone for RnWeak<T> {
    fn clone(&self) -> Self {
        RnWeak(Weak::clone(&self.0))
    }
}

impl<T> PartialEq for RnWeak<T> {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}

impl<T> From<&RnRef<T>> for RnWeak<T> {
    fn from(handle: &RnRef<T>) -> Self {
        handle.downgrade()
    }
}

impl<T> fmt::Debug for RnWeak<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(strong) => write!(f, "RnWeak({:#x})", strong.key().0),
            None => f.write_str("RnWeak(null)"),
        }
    }
}
