//! Background expiry sweep.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Weak;
use std::sync::mpsc::{RecvTimeoutError, Sender, channel};
use std::thread;
use std::time::Duration;

use log::{debug, warn};

use super::CacheCore;
use crate::error::CacheResult;

enum MaintenanceMessage {
    Shutdown,
}

/// Owns the maintenance thread. The thread only holds a weak reference to
/// the cache state, so it never keeps a dropped cache alive.
pub struct MaintenanceScheduler {
    tx: Sender<MaintenanceMessage>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MaintenanceScheduler {
    pub(crate) fn start<V>(core: Weak<CacheCore<V>>, interval: Duration) -> CacheResult<Self>
    where
        V: Clone + Send + Sync + 'static,
    {
        let (tx, rx) = channel::<MaintenanceMessage>();

        let handle = thread::Builder::new()
            .name("eval-cache-maintenance".to_string())
            .spawn(move || {
                loop {
                    match rx.recv_timeout(interval) {
                        Ok(MaintenanceMessage::Shutdown)
                        | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }

                    let Some(core) = core.upgrade() else {
                        break;
                    };
                    // A failed sweep must never take the thread down with it.
                    match panic::catch_unwind(AssertUnwindSafe(|| core.maintenance_tick())) {
                        Ok(Ok(report)) if report.ran => debug!(
                            "Maintenance sweep expired {} entries, dropped {} orphaned signatures",
                            report.expired, report.orphaned_signatures
                        ),
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => warn!("Maintenance sweep failed: {}", e),
                        Err(_) => warn!("Maintenance sweep panicked; retrying on next tick"),
                    }
                }
                debug!("Maintenance thread stopped");
            })?;

        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for an in-flight sweep to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.tx.send(MaintenanceMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Maintenance thread terminated abnormally");
            }
        }
    }
}

impl Drop for MaintenanceScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
