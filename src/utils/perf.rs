//! Memory and timing helpers for the benchmark binaries.
//!
//! Peak memory is read from `/proc/self/status`, so it is only available on Linux.

use std::time::{Duration, Instant};

/// Runs `f` and returns its output together with the wall time it took.
pub fn timed<R>(f: impl FnOnce() -> R) -> (R, Duration) {
    let start = Instant::now();
    let output = f();
    (output, start.elapsed())
}

/// Peak virtual memory (`VmPeak`) of the current process in kilobytes.
///
/// Returns 0 if the value cannot be read.
#[cfg(target_os = "linux")]
pub fn peak_memory_kb() -> u64 {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| {
            status
                .lines()
                .find(|line| line.starts_with("VmPeak:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|value| value.parse().ok())
        })
        .unwrap_or(0)
}

#[cfg(not(target_os = "linux"))]
pub fn peak_memory_kb() -> u64 {
    use std::sync::Once;
    static WARN_ONCE: Once = Once::new();
    WARN_ONCE.call_once(|| {
        log::warn!("Peak memory measurement is only supported on Linux; reporting 0.");
    });
    0
}
