//! Tick Runner - Background thread that ticks the simulation at regular intervals

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::world::{Simulation, TickReport};

/// Drives [`Simulation::advance_tick`] from a background thread.
pub struct TickRunner {
    is_running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl TickRunner {
    pub fn new() -> Self {
        Self {
            is_running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start ticking every `interval_ms` milliseconds.
    ///
    /// # Arguments
    /// * `sim` - Shared simulation; locked once per tick for the whole tick
    /// * `interval_ms` - Milliseconds between ticks
    /// * `callback` - Called with each tick's report, outside the lock
    pub fn start<F>(&mut self, sim: Arc<Mutex<Simulation>>, interval_ms: u64, callback: F)
    where
        F: Fn(TickReport) + Send + 'static,
    {
        if self.is_running.load(Ordering::Relaxed) {
            warn!("tick runner already running");
            return;
        }

        info!(interval_ms, "starting tick runner");
        self.is_running.store(true, Ordering::Relaxed);
        let running = Arc::clone(&self.is_running);

        let handle = thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                let report = match sim.lock() {
                    Ok(mut sim) => sim.advance_tick(),
                    Err(_) => {
                        error!("simulation lock poisoned; stopping tick runner");
                        running.store(false, Ordering::Relaxed);
                        break;
                    }
                };

                callback(report);

                thread::sleep(Duration::from_millis(interval_ms));
            }
            info!("tick runner thread stopped");
        });

        self.thread_handle = Some(handle);
    }

    /// Stop ticking and wait for the thread to exit.
    pub fn stop(&mut self) {
        if !self.is_running.load(Ordering::Relaxed) && self.thread_handle.is_none() {
            return;
        }

        info!("stopping tick runner");
        self.is_running.store(false, Ordering::Relaxed);

        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join(); // a panicked runner has nothing left to clean up
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }
}

impl Default for TickRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TickRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_tick_runner() {
        let sim = Arc::new(Mutex::new(Simulation::with_seed(SimConfig::default(), 3).unwrap()));

        let tick_count = Arc::new(AtomicU32::new(0));
        let tick_count_clone = Arc::clone(&tick_count);

        let mut runner = TickRunner::new();
        runner.start(Arc::clone(&sim), 100, move |report| {
            if report.advanced {
                tick_count_clone.fetch_add(1, Ordering::Relaxed);
            }
        });

        // ~550ms at 100ms intervals
        thread::sleep(Duration::from_millis(550));
        runner.stop();
        assert!(!runner.is_running());

        let count = tick_count.load(Ordering::Relaxed);
        assert!((4..=6).contains(&count), "expected ~5 ticks, got {count}");
        assert_eq!(sim.lock().unwrap().tick(), u64::from(count));
    }

    #[test]
    fn test_paused_simulation_does_not_advance() {
        let sim = Arc::new(Mutex::new(Simulation::with_seed(SimConfig::default(), 3).unwrap()));
        sim.lock().unwrap().pause();

        let mut runner = TickRunner::new();
        runner.start(Arc::clone(&sim), 20, |_| {});
        thread::sleep(Duration::from_millis(120));
        runner.stop();

        assert_eq!(sim.lock().unwrap().tick(), 0);
    }

    #[test]
    fn test_poisoned_lock_stops_runner() {
        let sim = Arc::new(Mutex::new(Simulation::with_seed(SimConfig::default(), 3).unwrap()));
        let poisoner = Arc::clone(&sim);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let mut runner = TickRunner::new();
        runner.start(Arc::clone(&sim), 10, |_| {});
        thread::sleep(Duration::from_millis(100));
        assert!(!runner.is_running());
        runner.stop();
    }
}
