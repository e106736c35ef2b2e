//! Named global counters, compiled in with the `counter` feature.
//!
//! They are cheap enough to be bumped per primary ray and are reported once,
//! at the end of a run, through the `counter_report` log target.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

pub enum Counter {
    Events(EventCounter),
    Time(TimeCounter),
}

impl Counter {
    pub fn format(&self) -> String {
        match self {
            Counter::Events(c) => c.value().to_string(),
            Counter::Time(c) => super::timer::format_elapsed(c.value()),
        }
    }
}

#[derive(Default)]
pub struct EventCounter {
    atomic: AtomicU64,
}

impl EventCounter {
    pub const fn new() -> Self {
        Self {
            atomic: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, amount: u64) {
        // Additions commute, no ordering needed between threads
        self.atomic.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.atomic.load(Ordering::Acquire)
    }
}

#[derive(Default)]
pub struct TimeCounter {
    // Saturates after ~584 years
    nanos: AtomicU64,
}

impl TimeCounter {
    pub const fn new() -> Self {
        Self {
            nanos: AtomicU64::new(0),
        }
    }

    pub fn add(&self, dur: Duration) {
        let nanos = u64::try_from(dur.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn value(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }
}

lazy_static::lazy_static! {
    pub static ref __COUNTERS: Mutex<BTreeMap<&'static str, Arc<Counter>>> = Mutex::new(BTreeMap::new());
}

/// Register a counter under `descr`, returning the already registered one if any.
pub fn insert_counter(descr: &'static str, counter: Counter) -> Arc<Counter> {
    let mut counters = __COUNTERS.lock().unwrap_or_else(|e| e.into_inner());
    counters.entry(descr).or_insert_with(|| Arc::new(counter)).clone()
}

/// Current value of an event counter, `None` if it was never bumped.
pub fn event_count(descr: &str) -> Option<u64> {
    let counters = __COUNTERS.lock().unwrap_or_else(|e| e.into_inner());
    match counters.get(descr).map(|c| &**c) {
        Some(Counter::Events(c)) => Some(c.value()),
        _ => None,
    }
}

pub fn report_counters() {
    let counters = __COUNTERS.lock().unwrap_or_else(|e| e.into_inner());
    for (counter_name, counter) in counters.iter() {
        log::log!(target: "counter_report", log::Level::Info, "{}: {}", counter_name, counter.format())
    }
}

#[macro_export]
macro_rules! counter {
    ($descr:literal) => {
        $crate::counter!($descr, 1)
    };
    ($descr:literal, $amount:expr) => {
        if cfg!(feature = "counter") {
            use $crate::utils::counter::{insert_counter, lazy_static, Counter, EventCounter};
            lazy_static::lazy_static! {
                static ref COUNTER_REF: std::sync::Arc<Counter> = {
                    insert_counter($descr, Counter::Events(EventCounter::new()))
                };
            }

            if let Counter::Events(c) = &**COUNTER_REF {
                c.add($amount as u64);
            }
        }
    };
}

/// Evaluates `$body`, adding the time it took to a named time counter when the
/// `counter_time` feature is on
#[macro_export]
macro_rules! time_counter {
    ($descr:literal, $body:expr) => {{
        if cfg!(feature = "counter_time") {
            use $crate::utils::counter::{insert_counter, lazy_static, Counter, TimeCounter};
            lazy_static::lazy_static! {
                static ref COUNTER_REF: std::sync::Arc<Counter> = {
                    insert_counter($descr, Counter::Time(TimeCounter::new()))
                };
            }

            match &**COUNTER_REF {
                Counter::Time(timer) => {
                    $crate::utils::timer::timed_scope_accumulate(timer, || $body).res
                }
                Counter::Events(_) => $body,
            }
        } else {
            $body
        }
    }};
}

pub use crate::{counter, time_counter};
// Reexport for ease of use
pub use lazy_static;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_counter_adds_up() {
        let c = EventCounter::new();
        c.inc();
        c.add(4);
        assert_eq!(c.value(), 5);
    }

    #[test]
    fn time_counter_returns_the_body() {
        let v = crate::time_counter!("test time", 2 + 3);
        assert_eq!(v, 5);
    }

    #[test]
    fn registered_counter_is_shared() {
        let a = insert_counter("test shared", Counter::Events(EventCounter::new()));
        let b = insert_counter("test shared", Counter::Events(EventCounter::new()));
        assert!(Arc::ptr_eq(&a, &b));
    }
}
