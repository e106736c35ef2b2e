use std::{
    ops::{Deref, DerefMut},
    time::{Duration, Instant},
};

pub struct TimedResult<T> {
    pub res: T,
    pub elapsed: Duration,
}

impl<T> Deref for TimedResult<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.res
    }
}

impl<T> DerefMut for TimedResult<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.res
    }
}

pub fn timed_scope<R, F: FnOnce() -> R>(f: F) -> TimedResult<R> {
    let begin = Instant::now();
    let res = f();

    TimedResult {
        res,
        elapsed: begin.elapsed(),
    }
}

pub fn timed_scope_log<R, F: FnOnce() -> R>(label: &'static str, f: F) -> TimedResult<R> {
    let time_res = timed_scope(f);
    log::log!(target: "scoped timer", log::Level::Info, "{}: {}", label, format_elapsed(time_res.elapsed));
    time_res
}

/// Same as [timed_scope] but the elapsed time is also added to a [TimeCounter]
///
/// [TimeCounter]: super::counter::TimeCounter
pub fn timed_scope_accumulate<R, F: FnOnce() -> R>(
    timer: &super::counter::TimeCounter,
    f: F,
) -> TimedResult<R> {
    let timed_res = timed_scope(f);
    timer.add(timed_res.elapsed);
    timed_res
}

pub fn format_elapsed(elapsed: Duration) -> String {
    if elapsed < Duration::from_millis(1) {
        let micro = elapsed.as_secs_f32() * 1000. * 1000.;
        format!("{micro:.3}µs")
    } else if elapsed < Duration::from_secs(1) {
        let milli = elapsed.as_secs_f32() * 1000.;
        format!("{milli:.3}ms")
    } else if elapsed < Duration::from_secs(60) {
        let s = elapsed.as_secs_f32();
        format!("{s:.3}s")
    } else {
        let total = elapsed.as_secs();
        let h = total / 3600;
        let m = (total / 60) % 60;
        let s = total % 60;
        format!("{h}h{m}m{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_elapsed_units() {
        assert_eq!(format_elapsed(Duration::from_micros(12)), "12.000µs");
        assert_eq!(format_elapsed(Duration::from_millis(5)), "5.000ms");
        assert_eq!(format_elapsed(Duration::from_secs(2)), "2.000s");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1h2m5s");
    }

    #[test]
    fn accumulate_adds_elapsed() {
        let counter = crate::utils::counter::TimeCounter::new();
        let res = timed_scope_accumulate(&counter, || 3);
        assert_eq!(res.res, 3);
        assert_eq!(counter.value(), res.elapsed);
    }
}
