//! Selects the synchronization primitives the crate is built against.
//!
//! Regular builds use `parking_lot` locks and a thin wrapper around
//! [`core::cell::UnsafeCell`]. Loom models (`cfg(all(loom, test))`) swap in
//! Loom's locks and cells so that every lock acquisition and every access to
//! a queue node cell is tracked by the model checker.

pub mod cell {
    #[cfg(not(all(loom, test)))]
    pub use self::plain::UnsafeCell;

    #[cfg(all(loom, test))]
    pub use loom::cell::UnsafeCell;

    #[cfg(not(all(loom, test)))]
    mod plain {
        /// A [`core::cell::UnsafeCell`] exposing Loom's closure based API.
        #[repr(transparent)]
        pub struct UnsafeCell<T: ?Sized>(core::cell::UnsafeCell<T>);

        impl<T> UnsafeCell<T> {
            /// Creates a new cell holding `value`.
            #[inline(always)]
            pub const fn new(value: T) -> Self {
                Self(core::cell::UnsafeCell::new(value))
            }
        }

        impl<T: ?Sized> UnsafeCell<T> {
            /// Runs `f` with a shared raw pointer to the cell contents.
            #[inline(always)]
            pub fn with<F, Ret>(&self, f: F) -> Ret
            where
                F: FnOnce(*const T) -> Ret,
            {
                f(self.0.get())
            }

            /// Runs `f` with an exclusive raw pointer to the cell contents.
            #[inline(always)]
            pub fn with_mut<F, Ret>(&self, f: F) -> Ret
            where
                F: FnOnce(*mut T) -> Ret,
            {
                f(self.0.get())
            }
        }
    }
}

pub mod sync {
    #[cfg(not(all(loom, test)))]
    pub use parking_lot::{Mutex, RwLock, RwLockReadGuard};

    #[cfg(all(not(loom), test))]
    pub use std::sync::Arc;

    #[cfg(all(loom, test))]
    pub use self::model::{Arc, Mutex, RwLock, RwLockReadGuard};

    /// Loom locks with the non-poisoning surface of `parking_lot`.
    ///
    /// A poisoned lock only happens after a panic inside a model, which has
    /// already failed the model, so unwrapping here is fine.
    #[cfg(all(loom, test))]
    mod model {
        pub use loom::sync::{Arc, MutexGuard, RwLockReadGuard, RwLockWriteGuard};

        pub struct Mutex<T>(loom::sync::Mutex<T>);

        impl<T> Mutex<T> {
            pub fn new(value: T) -> Self {
                Self(loom::sync::Mutex::new(value))
            }

            pub fn lock(&self) -> MutexGuard<'_, T> {
                self.0.lock().unwrap()
            }
        }

        pub struct RwLock<T>(loom::sync::RwLock<T>);

        impl<T> RwLock<T> {
            pub fn new(value: T) -> Self {
                Self(loom::sync::RwLock::new(value))
            }

            pub fn read(&self) -> RwLockReadGuard<'_, T> {
                self.0.read().unwrap()
            }

            // Loom readers never queue behind a waiting writer.
            pub fn read_recursive(&self) -> RwLockReadGuard<'_, T> {
                self.read()
            }

            pub fn write(&self) -> RwLockWriteGuard<'_, T> {
                self.0.write().unwrap()
            }
        }
    }
}
