#![allow(unused_macros)]

/// Helper macro for locking items.
///
/// Expands to a `Result` holding the guard: a poisoned mutex becomes
/// [`crate::Error::LockError`], so call sites propagate it with `?`.
///
/// ```rust, ignore
///  let mut cache = lock!(self.inner)?;
///  cache.len();
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().map_err(|_| crate::Error::LockError)
    };
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::Error;

    #[test]
    fn test_lock_poisoned() {
        let shared = Arc::new(Mutex::new(0_u32));

        *lock!(shared).unwrap() += 1;
        assert_eq!(*lock!(shared).unwrap(), 1);

        let poisoner = Arc::clone(&shared);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(matches!(lock!(shared), Err(Error::LockError)));
    }
}
