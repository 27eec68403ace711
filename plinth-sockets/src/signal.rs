//! Readiness signal shared by every socket of a context.
//!
//! Any change that can flip a socket's readiness bumps a generation counter
//! and wakes all waiters. A waiter records the generation *before* checking
//! readiness and only sleeps while it is unchanged, so a notification that
//! lands between the check and the sleep is never lost.

use parking_lot::{Condvar, Mutex};
use std::time::Instant;

#[derive(Debug, Default)]
pub struct ReadySignal {
    generation: Mutex<u64>,
    cond: Condvar,
}

impl ReadySignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        *self.generation.lock()
    }

    /// Record a readiness-relevant change and wake every waiter.
    pub fn notify(&self) {
        let mut generation = self.generation.lock();
        *generation = generation.wrapping_add(1);
        self.cond.notify_all();
    }

    /// Sleep until the generation moves past `seen` or `deadline` passes.
    ///
    /// Returns `false` only on timeout with no change. `None` waits forever.
    pub fn wait(&self, seen: u64, deadline: Option<Instant>) -> bool {
        let mut generation = self.generation.lock();
        while *generation == seen {
            match deadline {
                None => self.cond.wait(&mut generation),
                Some(deadline) => {
                    if self.cond.wait_until(&mut generation, deadline).timed_out() {
                        return *generation != seen;
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn wait_times_out_without_change() {
        let signal = ReadySignal::new();
        let seen = signal.generation();
        let deadline = Instant::now() + Duration::from_millis(10);
        assert!(!signal.wait(seen, Some(deadline)));
    }

    #[test]
    fn stale_generation_returns_immediately() {
        let signal = ReadySignal::new();
        let seen = signal.generation();
        signal.notify();
        assert!(signal.wait(seen, Some(Instant::now())));
    }

    #[test]
    fn notify_from_other_thread_wakes_waiter() {
        let signal = Arc::new(ReadySignal::new());
        let seen = signal.generation();

        let notifier = Arc::clone(&signal);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            notifier.notify();
        });

        assert!(signal.wait(seen, Some(Instant::now() + Duration::from_secs(5))));
        handle.join().unwrap();
    }
}
