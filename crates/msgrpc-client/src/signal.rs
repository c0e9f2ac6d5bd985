//! One-shot completion signal
//!
//! A manual-reset event with an attached handoff cell. Each `reset` starts a
//! new generation; only a `signal` carrying the current generation is
//! accepted, so a handler that fires after its caller gave up cannot
//! complete a later request.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

struct State<T> {
    generation: u64,
    signaled: bool,
    value: Option<T>,
}

pub struct Completion<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Completion<T> {
    /// Create an unsignaled completion at generation 0
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                generation: 0,
                signaled: false,
                value: None,
            }),
            ready: Condvar::new(),
        }
    }

    /// Clear the signal and any pending value, returning the new generation
    pub fn reset(&self) -> u64 {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
        state.signaled = false;
        state.value = None;
        state.generation
    }

    /// Store `value` and release every waiter.
    ///
    /// Returns false if `generation` is stale or the current generation was
    /// already signaled; the value is dropped in that case.
    pub fn signal(&self, generation: u64, value: T) -> bool {
        let mut state = self.lock();
        if state.generation != generation || state.signaled {
            return false;
        }
        state.signaled = true;
        state.value = Some(value);
        drop(state);
        self.ready.notify_all();
        true
    }

    pub fn is_signaled(&self) -> bool {
        self.lock().signaled
    }

    /// Block until signaled or until `timeout` elapses. Returns whether the
    /// completion is signaled.
    ///
    /// A timeout too large to represent as a deadline waits without limit.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.lock();
        while !state.signaled {
            state = match deadline {
                None => self
                    .ready
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return false;
                    }
                    self.ready
                        .wait_timeout(state, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
        true
    }

    /// Take the value delivered by `signal`. The completion stays signaled.
    pub fn take(&self) -> Option<T> {
        self.lock().value.take()
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for Completion<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_signal_releases_waiter() {
        let completion = Arc::new(Completion::new());
        let generation = completion.reset();

        let signaller = {
            let completion = completion.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                completion.signal(generation, "done")
            })
        };

        assert!(completion.wait_timeout(Duration::from_secs(5)));
        assert!(signaller.join().unwrap());
        assert_eq!(completion.take(), Some("done"));
    }

    #[test]
    fn test_stays_signaled_until_reset() {
        let completion = Completion::new();
        let generation = completion.reset();
        assert!(completion.signal(generation, 1));

        assert!(completion.wait_timeout(Duration::from_millis(1)));
        assert!(completion.wait_timeout(Duration::from_millis(1)));
        assert_eq!(completion.take(), Some(1));
        assert!(completion.is_signaled());
        assert_eq!(completion.take(), None);

        completion.reset();
        assert!(!completion.is_signaled());
        assert!(!completion.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_signal_is_one_shot() {
        let completion = Completion::new();
        let generation = completion.reset();

        assert!(completion.signal(generation, "first"));
        assert!(!completion.signal(generation, "second"));
        assert_eq!(completion.take(), Some("first"));
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let completion = Completion::new();
        let stale = completion.reset();
        let current = completion.reset();

        assert!(!completion.signal(stale, "late"));
        assert!(!completion.is_signaled());

        assert!(completion.signal(current, "fresh"));
        assert_eq!(completion.take(), Some("fresh"));
    }

    #[test]
    fn test_wait_times_out() {
        let completion: Completion<()> = Completion::new();
        completion.reset();

        let started = Instant::now();
        assert!(!completion.wait_timeout(Duration::from_millis(30)));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_unbounded_wait() {
        let completion = Arc::new(Completion::new());
        let generation = completion.reset();
        assert!(completion.signal(generation, 1));
        assert!(completion.wait_timeout(Duration::MAX));

        let generation = completion.reset();
        let signaller = {
            let completion = completion.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                completion.signal(generation, 2)
            })
        };

        assert!(completion.wait_timeout(Duration::MAX));
        assert!(signaller.join().unwrap());
        assert_eq!(completion.take(), Some(2));
    }

    #[test]
    fn test_signal_releases_all_waiters() {
        let completion = Arc::new(Completion::new());
        let generation = completion.reset();

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let completion = completion.clone();
                thread::spawn(move || completion.wait_timeout(Duration::from_secs(5)))
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        assert!(completion.signal(generation, ()));

        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
    }
}
