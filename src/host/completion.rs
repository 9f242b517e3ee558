// SPDX-License-Identifier: GPL-3.0-only
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// One-shot terminal slot shared by every party that may finish a request.
///
/// The first `complete` wins; later calls are dropped and return `false`.
pub struct Completion<T> {
    slot: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

pub fn completion<T>() -> (Completion<T>, oneshot::Receiver<T>) {
    let (tx, rx) = oneshot::channel();
    (
        Completion {
            slot: Arc::new(Mutex::new(Some(tx))),
        },
        rx,
    )
}

impl<T> Completion<T> {
    pub fn complete(&self, value: T) -> bool {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            Some(tx) => {
                if tx.send(value).is_err() {
                    debug!("Completion receiver already gone");
                }
                true
            }
            None => {
                debug!("Ignoring duplicate completion");
                false
            }
        }
    }

    /// Complete with `fallback` when the guard drops before anyone else completed
    pub fn guard(&self, fallback: T) -> CompletionGuard<T> {
        CompletionGuard {
            completion: self.clone(),
            fallback: Some(fallback),
        }
    }
}

pub struct CompletionGuard<T> {
    completion: Completion<T>,
    fallback: Option<T>,
}

impl<T> Drop for CompletionGuard<T> {
    fn drop(&mut self) {
        if let Some(fallback) = self.fallback.take() {
            if self.completion.complete(fallback) {
                warn!("Task ended without completing; reported fallback result");
            }
        }
    }
}
