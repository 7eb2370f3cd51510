use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// The cancellation and suspension primitive every `RePro::main` is given
/// (spec.md §5). Soft-stop is a polled flag checked between stimulus
/// iterations; hard-stop wakes any blocked `sleep`/`sleep_wait` promptly so
/// the `write` family can return an error instead of completing.
#[derive(Clone)]
pub struct RunControl {
    soft_stop: Arc<AtomicBool>,
    hard_stop: Arc<AtomicBool>,
    wake: Arc<(Mutex<bool>, Condvar)>,
}

impl RunControl {
    pub fn new() -> Self {
        Self {
            soft_stop: Arc::new(AtomicBool::new(false)),
            hard_stop: Arc::new(AtomicBool::new(false)),
            wake: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    /// `softStop()`: cooperative, polled between iterations.
    pub fn request_soft_stop(&self) {
        self.soft_stop.store(true, Ordering::SeqCst);
        self.notify();
    }

    pub fn soft_stop_requested(&self) -> bool {
        self.soft_stop.load(Ordering::SeqCst)
    }

    /// `interrupt()`: hard-stop, must wake any blocked sleep immediately.
    pub fn interrupt(&self) {
        self.hard_stop.store(true, Ordering::SeqCst);
        self.notify();
    }

    pub fn is_interrupted(&self) -> bool {
        self.hard_stop.load(Ordering::SeqCst)
    }

    fn notify(&self) {
        let (lock, cvar) = &*self.wake;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    /// `sleep(t)`: blocks up to `duration` or until interrupted, whichever
    /// comes first. Returns `true` if the full duration elapsed.
    pub fn sleep(&self, duration: Duration) -> bool {
        if self.is_interrupted() {
            return false;
        }
        let (lock, cvar) = &*self.wake;
        let guard = lock.lock().unwrap();
        let (_guard, result) = cvar.wait_timeout_while(guard, duration, |_| !self.is_interrupted()).unwrap();
        result.timed_out()
    }

    /// `sleepWait(cond, timeout)`: blocks until `predicate` holds, the
    /// timeout elapses, or a hard-stop is requested. Returns `true` if the
    /// predicate became true.
    pub fn sleep_wait<F>(&self, timeout: Duration, mut predicate: F) -> bool
    where
        F: FnMut() -> bool,
    {
        if predicate() {
            return true;
        }
        let (lock, cvar) = &*self.wake;
        let guard = lock.lock().unwrap();
        let _ = cvar
            .wait_timeout_while(guard, timeout, |_| !predicate() && !self.is_interrupted())
            .unwrap();
        predicate()
    }

    pub fn reset(&self) {
        self.soft_stop.store(false, Ordering::SeqCst);
        self.hard_stop.store(false, Ordering::SeqCst);
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn interrupt_wakes_a_blocked_sleep_early() {
        let control = RunControl::new();
        let waiter = control.clone();
        let handle = thread::spawn(move || waiter.sleep(Duration::from_secs(5)));
        thread::sleep(Duration::from_millis(20));
        control.interrupt();
        let completed_fully = handle.join().unwrap();
        assert!(!completed_fully);
    }

    #[test]
    fn soft_stop_is_observable_without_blocking() {
        let control = RunControl::new();
        assert!(!control.soft_stop_requested());
        control.request_soft_stop();
        assert!(control.soft_stop_requested());
    }

    #[test]
    fn sleep_wait_returns_true_when_predicate_satisfied() {
        let control = RunControl::new();
        let flag = Arc::new(AtomicBool::new(false));
        let setter = flag.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            setter.store(true, Ordering::SeqCst);
        });
        assert!(control.sleep_wait(Duration::from_secs(2), || flag.load(Ordering::SeqCst)));
    }
}
