//! Holds async calls at a fixed point until the test lets them through.

use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Open until [`Gate::close`]; once closed, each passing call needs a permit.
#[derive(Default)]
pub(crate) struct Gate {
    permits: Mutex<Option<Arc<Semaphore>>>,
}

impl Gate {
    pub(crate) fn close(&self) {
        *self.permits.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `n` held calls through.
    pub(crate) fn release(&self, n: usize) {
        if let Some(permits) = self.permits.lock().unwrap().as_ref() {
            permits.add_permits(n);
        }
    }

    pub(crate) async fn pass(&self) {
        let permits = self.permits.lock().unwrap().clone();
        if let Some(permits) = permits {
            if let Ok(permit) = permits.acquire().await {
                permit.forget();
            }
        }
    }
}
