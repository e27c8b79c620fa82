//! Periodic publish timer.
//!
//! On the device the ESP timer service runs the callback in the esp_timer
//! task context (not ISR); it only calls
//! [`PendingPublishes::record_tick`], a single atomic add.  On simulation
//! targets a background thread drives a [`PublishTicker`] from
//! `std::time::Instant`.
//!
//! Dropping the returned [`PublishTimer`] stops the ticks.

use log::info;

use crate::scheduler::PendingPublishes;

#[cfg(target_os = "espidf")]
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

/// Handle keeping the periodic timer alive.
pub struct PublishTimer {
    #[cfg(target_os = "espidf")]
    _timer: EspTimer<'static>,
    #[cfg(not(target_os = "espidf"))]
    stop: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

/// Start ticking `pending` every `period_ms`.
#[cfg(target_os = "espidf")]
pub fn start_publish_timer(
    service: &EspTaskTimerService,
    period_ms: u64,
    pending: PendingPublishes,
) -> Result<PublishTimer, crate::error::Error> {
    let timer = service
        .timer(move || pending.record_tick())
        .map_err(|_| crate::error::Error::Init("publish timer create"))?;
    timer
        .every(core::time::Duration::from_millis(period_ms))
        .map_err(|_| crate::error::Error::Init("publish timer start"))?;
    info!("hw_timer: publish tick every {} ms", period_ms);
    Ok(PublishTimer { _timer: timer })
}

/// Start ticking `pending` every `period_ms` from a simulation thread.
#[cfg(not(target_os = "espidf"))]
pub fn start_publish_timer(
    period_ms: u64,
    pending: PendingPublishes,
) -> Result<PublishTimer, crate::error::Error> {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};

    use crate::scheduler::PublishTicker;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    std::thread::Builder::new()
        .name("publish-timer".into())
        .spawn(move || {
            let started = Instant::now();
            let mut ticker = PublishTicker::new(period_ms, 0);
            let poll = Duration::from_millis(period_ms.clamp(1, 50));
            while !stop_flag.load(Ordering::Acquire) {
                std::thread::sleep(poll);
                let now_ms = started.elapsed().as_millis() as u64;
                ticker.advance(now_ms, &pending);
            }
        })
        .map_err(|_| crate::error::Error::Init("publish timer thread"))?;
    info!("hw_timer(sim): publish tick every {} ms", period_ms);
    Ok(PublishTimer { stop })
}

#[cfg(not(target_os = "espidf"))]
impl Drop for PublishTimer {
    fn drop(&mut self) {
        self.stop.store(true, std::sync::atomic::Ordering::Release);
    }
}
