//! ESP32 time adapter.
//!
//! Implements [`ClockPort`] for the node.
//!
//! - **`target_os = "espidf"`**: monotonic time from `esp_timer_get_time()`
//!   (microsecond precision); wall clock from the C library once SNTP has
//!   set it (see [`sync_wall_clock`]).
//! - **`not(target_os = "espidf")`**: `std::time::Instant` and
//!   `SystemTime` for host-side testing and simulation.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::app::ports::ClockPort;

/// Clock adapter for the ESP32 platform.
pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl ClockPort for SystemClock {
    #[cfg(target_os = "espidf")]
    fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Poll `ready` until it holds or `timeout` passes, running `pause`
/// between polls.  Returns the last value of `ready`.
pub fn wait_for(
    timeout: Duration,
    mut ready: impl FnMut() -> bool,
    mut pause: impl FnMut(),
) -> bool {
    let started = Instant::now();
    while !ready() {
        if started.elapsed() >= timeout {
            return false;
        }
        pause();
    }
    true
}

/// Start SNTP and wait up to `timeout` for the first sync.  The returned
/// handle must be kept alive to keep the clock disciplined; it keeps
/// syncing in the background after a timeout.
#[cfg(target_os = "espidf")]
pub fn sync_wall_clock(
    timeout: Duration,
) -> Result<(esp_idf_svc::sntp::EspSntp<'static>, bool), crate::error::Error> {
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::sntp::{EspSntp, SyncStatus};
    use log::{info, warn};

    let sntp = EspSntp::new_default().map_err(|_| crate::error::Error::Init("sntp"))?;
    info!("SNTP: waiting up to {:?} for time sync", timeout);
    let synced = wait_for(
        timeout,
        || sntp.get_sync_status() == SyncStatus::Completed,
        || FreeRtos::delay_ms(100),
    );
    if synced {
        info!("SNTP: wall clock set");
    } else {
        warn!("SNTP: no sync yet, timestamps stay unset until it completes");
    }
    Ok((sntp, synced))
}
