//! Periodic tick loop: read → schedule → write.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)` to lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` to pin to one CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, prio)` for RT priority.
//!
//! All four are no-ops without the `rt` feature.
//!
//! ## Cycle Loop
//! With `rt`, absolute-time sleep on `CLOCK_MONOTONIC` for drift-free
//! pacing; otherwise `std::thread::sleep` for the remainder of the period.
//! An overrun is logged and counted. The scheduler simply runs late; the
//! next tick is not skipped.
//!
//! ## Shutdown
//! When the running flag clears or the cycle limit is reached the scheduler
//! gets a final tick in which every routine stops, that frame is written,
//! and the driver is shut down.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, info, warn};

use arbiter_common::hal::driver::{HalDriver, HalError};
use arbiter_common::hal::types::ActuationFrame;

use crate::config::CycleConfig;
use crate::routine::context::TickReport;
use crate::scheduler::tick::Scheduler;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Loop timing and scheduler counters, updated once per tick.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Ticks run so far.
    pub cycle_count: u64,
    /// Work time of the latest tick, ns.
    pub last_cycle_ns: i64,
    /// Fastest tick, ns.
    pub min_cycle_ns: i64,
    /// Slowest tick, ns.
    pub max_cycle_ns: i64,
    pub sum_cycle_ns: i64,
    /// Cycles whose work exceeded the period.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
    /// Ownership conflicts reported by the scheduler.
    pub conflicts: u64,
    /// Routine faults reported by the scheduler.
    pub faults: u64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
            conflicts: 0,
            faults: 0,
        }
    }

    /// Fold in one tick's work time and wake-up latency.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Fold the scheduler's per-tick counters in.
    #[inline]
    pub fn absorb(&mut self, report: &TickReport) {
        self.conflicts += u64::from(report.conflicts);
        self.faults += u64::from(report.faulted);
    }

    /// Mean work time per tick, ns; 0 before the first tick.
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

// ─── Error Type ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CycleError {
    /// RT setup or clock failure.
    #[error("RT setup failed: {0}")]
    RtSetup(String),

    /// Driver init or shutdown failure.
    #[error(transparent)]
    Hal(#[from] HalError),
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Lock all current and future memory pages.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 256 KiB of stack so the loop never faults a fresh page in.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 targets the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Perform the RT setup sequence. Call before [`CycleRunner::run`].
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    debug!(cpu_core, rt_priority, rt = cfg!(feature = "rt"), "RT setup complete");
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the scheduler, the hardware driver and the actuation frame.
pub struct CycleRunner<D: HalDriver> {
    scheduler: Scheduler,
    driver: D,
    frame: ActuationFrame,
    stats: CycleStats,
    period_ns: i64,
    stats_interval: u64,
}

impl<D: HalDriver> CycleRunner<D> {
    pub fn new(scheduler: Scheduler, driver: D, config: &CycleConfig) -> Self {
        Self {
            scheduler,
            driver,
            frame: ActuationFrame::new(),
            stats: CycleStats::new(),
            period_ns: i64::from(config.period_ms) * 1_000_000,
            stats_interval: config.stats_interval,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Frame written by the most recent step.
    pub fn last_frame(&self) -> &ActuationFrame {
        &self.frame
    }

    /// One cycle body: read status, tick the scheduler, write the frame.
    pub fn step(&mut self) -> TickReport {
        let status = self.driver.read();
        self.frame.clear();
        let report = self.scheduler.tick(&status, &mut self.frame);
        self.driver.write(&self.frame);
        self.stats.absorb(&report);
        report
    }

    /// Final tick: stop every routine, flush, shut the driver down.
    pub fn finish(&mut self) -> Result<(), CycleError> {
        let status = self.driver.read();
        self.frame.clear();
        let report = self.scheduler.shutdown(&status, &mut self.frame);
        self.driver.write(&self.frame);
        info!(
            cycles = self.stats.cycle_count,
            stopped = report.stopped,
            overruns = self.stats.overruns,
            conflicts = self.stats.conflicts,
            faults = self.stats.faults,
            "cycle loop finished"
        );
        self.driver.shutdown()?;
        Ok(())
    }

    fn after_cycle(&mut self, duration_ns: i64, latency_ns: i64) {
        self.stats.record(duration_ns, latency_ns);
        if duration_ns > self.period_ns {
            self.stats.overruns += 1;
            warn!(
                tick = self.scheduler.tick_count(),
                duration_ns,
                budget_ns = self.period_ns,
                "cycle overrun"
            );
        }
        if self.stats_interval > 0 && self.stats.cycle_count % self.stats_interval == 0 {
            info!(
                cycles = self.stats.cycle_count,
                avg_ns = self.stats.avg_cycle_ns(),
                min_ns = self.stats.min_cycle_ns,
                max_ns = self.stats.max_cycle_ns,
                overruns = self.stats.overruns,
                "cycle stats"
            );
        }
    }

    fn keep_going(&self, running: &AtomicBool, max_cycles: Option<u64>) -> bool {
        running.load(Ordering::SeqCst) && max_cycles.is_none_or(|max| self.stats.cycle_count < max)
    }

    /// Initialize the driver, loop until `running` clears or `max_cycles`
    /// is reached, then [`finish`](Self::finish).
    pub fn run(&mut self, running: &AtomicBool, max_cycles: Option<u64>) -> Result<(), CycleError> {
        self.driver.init()?;
        info!(
            driver = self.driver.name(),
            version = self.driver.version(),
            period_ms = self.period_ns / 1_000_000,
            "cycle loop starting"
        );

        #[cfg(feature = "rt")]
        self.run_rt_loop(running, max_cycles)?;

        #[cfg(not(feature = "rt"))]
        self.run_sim_loop(running, max_cycles);

        self.finish()
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, running: &AtomicBool, max_cycles: Option<u64>) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = || clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")));
        let mut next_wake = now()?;

        while self.keep_going(running, max_cycles) {
            let cycle_start = now()?;
            let latency_ns = timespec_diff_ns(&cycle_start, &next_wake).abs();

            self.step();

            let cycle_end = now()?;
            self.after_cycle(timespec_diff_ns(&cycle_end, &cycle_start), latency_ns);

            next_wake = timespec_add_ns(next_wake, self.period_ns);
            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, running: &AtomicBool, max_cycles: Option<u64>) {
        use std::time::{Duration, Instant};

        let period = Duration::from_nanos(self.period_ns as u64);
        while self.keep_going(running, max_cycles) {
            let cycle_start = Instant::now();
            self.step();
            let elapsed = cycle_start.elapsed();
            self.after_cycle(elapsed.as_nanos() as i64, 0);

            if let Some(remaining) = period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let total = ts.tv_nsec() + ns;
    let secs = ts.tv_sec() + total.div_euclid(1_000_000_000);
    let nanos = total.rem_euclid(1_000_000_000);
    TimeSpec::new(secs, nanos)
}

/// `a - b` in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
