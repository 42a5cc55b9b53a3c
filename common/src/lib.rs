pub mod dashboard;
pub mod telemetry;

/// Convenience helper for passing the last of a value between threads. For example from the
/// polling thread building dashboard frames to the foreground thread rendering them.
#[derive(Clone)]
pub struct ValueStore<T>(std::sync::Arc<std::sync::Mutex<Option<T>>>);

impl<T> Default for ValueStore<T> {
    fn default() -> Self {
        Self(std::sync::Arc::default())
    }
}

impl<T: Clone> ValueStore<T> {
    /// Sets `value` as the last value, replacing any value not yet taken.
    ///
    /// # Panics
    ///
    /// If the locking the interally used mutex fails.
    pub fn set(&self, value: T) {
        let mut data = self.0.lock().unwrap();
        let _ = data.insert(value);
    }

    /// Takes the stored value, leaving the slot empty until the next `set`.
    ///
    /// # Panics
    ///
    /// If the locking of the mutex fails
    pub fn get(&self) -> Option<T> {
        let mut data = self.0.lock().unwrap();
        data.take()
    }
}
