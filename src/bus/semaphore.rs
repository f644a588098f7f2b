// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Bounded admission control for in-flight requests (component C4).

use std::sync::Arc;

use tokio::sync::Semaphore;

/// A counting semaphore bounding the number of operations allowed to be
/// in-flight simultaneously for one session.
///
/// Acquires a permit and forgets it on [`Self::take`]; the permit count is
/// restored explicitly by [`Self::give`] once the corresponding response
/// (or timeout) has been observed, matching the send/receive split of the
/// pipeline rather than a scope-guard lifetime.
#[derive(Debug, Clone)]
pub struct AdmissionControl {
    inner: Arc<Semaphore>,
}

impl AdmissionControl {
    pub fn new(max_outstanding: usize) -> Self {
        Self {
            inner: Arc::new(Semaphore::new(max_outstanding)),
        }
    }

    /// Awaits an admission slot, consuming it permanently until [`Self::give`]
    /// restores it.
    pub async fn take(&self) {
        self.inner
            .acquire()
            .await
            .expect("semaphore is never closed for the session's lifetime")
            .forget();
    }

    /// Releases one previously-taken admission slot.
    pub fn give(&self) {
        self.inner.add_permits(1);
    }

    #[cfg(test)]
    fn available(&self) -> usize {
        self.inner.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_up_to_capacity_then_restores() {
        let sem = AdmissionControl::new(2);
        sem.take().await;
        sem.take().await;
        assert_eq!(sem.available(), 0);
        sem.give();
        assert_eq!(sem.available(), 1);
        sem.give();
        assert_eq!(sem.available(), 2);
    }
}
