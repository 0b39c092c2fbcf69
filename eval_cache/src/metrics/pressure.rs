//! Process memory probes for the memory-pressure ratio.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::warn;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Reading is reused for this long before the process is queried again.
const MEMORY_REFRESH_INTERVAL: Duration = Duration::from_millis(250);

/// Reports how much memory the host process currently uses.
pub trait MemoryProbe: Send + Sync {
    /// Resident bytes of the process, or 0 when unknown.
    fn process_memory(&self) -> u64;
}

/// Reads the current process's resident memory through `sysinfo`.
///
/// Querying the OS is comparatively expensive, so the last reading is kept
/// for a short window and shared by every caller in that window.
pub struct ProcessMemoryProbe {
    pid: Option<Pid>,
    state: Mutex<ProbeState>,
}

struct ProbeState {
    system: System,
    last_bytes: u64,
    last_refresh: Option<Instant>,
}

impl ProcessMemoryProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("Process memory unavailable, pressure checks disabled: {}", e);
                None
            }
        };
        Self {
            pid,
            state: Mutex::new(ProbeState {
                system: System::new(),
                last_bytes: 0,
                last_refresh: None,
            }),
        }
    }
}

impl Default for ProcessMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    fn process_memory(&self) -> u64 {
        let Some(pid) = self.pid else {
            return 0;
        };
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let fresh = state
            .last_refresh
            .is_some_and(|at| at.elapsed() < MEMORY_REFRESH_INTERVAL);
        if fresh {
            return state.last_bytes;
        }

        state.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let bytes = state.system.process(pid).map_or(0, |p| p.memory());
        state.last_bytes = bytes;
        state.last_refresh = Some(Instant::now());
        bytes
    }
}

/// A probe that always reports the same number of bytes.
#[derive(Clone, Copy, Debug)]
pub struct FixedMemoryProbe(pub u64);

impl MemoryProbe for FixedMemoryProbe {
    fn process_memory(&self) -> u64 {
        self.0
    }
}

/// Ratio of cache-attributed memory to process memory. An unknown process
/// size yields 0 so pressure handling stays off.
pub fn pressure_ratio(cache_bytes: u64, process_bytes: u64) -> f64 {
    if process_bytes == 0 {
        0.0
    } else {
        cache_bytes as f64 / process_bytes as f64
    }
}
