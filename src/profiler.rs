use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Scoped profiler accumulating wall time and call counts per section.
#[derive(Debug, Default)]
pub struct Profiler {
    pub timings: HashMap<&'static str, (Duration, u64)>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        let entry = self.timings.entry(name).or_default();
        entry.0 += elapsed;
        entry.1 += 1;
    }

    pub fn finish(&mut self, guard: &ProfilerGuard) {
        self.record(guard.name, guard.start.elapsed());
    }

    /// Sections by descending total time.
    pub fn report_sorted(&self) -> Vec<(&'static str, Duration, u64)> {
        let mut v: Vec<_> = self.timings.iter().map(|(n, (d, c))| (*n, *d, *c)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1));
        v
    }

    pub fn clear(&mut self) {
        self.timings.clear();
    }

    pub fn print_and_clear(&mut self) {
        for (name, total, calls) in self.report_sorted() {
            log::info!("{:<20} {:>12?} over {} call(s)", name, total, calls);
        }
        self.clear();
    }
}

pub struct ProfilerGuard {
    name: &'static str,
    start: Instant,
}

/// Start a profiling section. Returns a guard that will update the global
/// profiler when dropped.
pub fn start(name: &'static str) -> ProfilerGuard {
    ProfilerGuard { name, start: Instant::now() }
}

#[cfg(feature = "profiling")]
impl Drop for ProfilerGuard {
    fn drop(&mut self) {
        crate::PROFILER.lock().finish(self);
    }
}

/// Macro helper to profile a scope only when the `profiling` feature is enabled.
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        #[cfg(feature = "profiling")]
        let _guard = $crate::profiler::start($name);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_orders_by_total_time() {
        let mut p = Profiler::new();
        p.record("forces", Duration::from_millis(5));
        p.record("collision", Duration::from_millis(1));
        p.record("forces", Duration::from_millis(5));
        let report = p.report_sorted();
        assert_eq!(report[0], ("forces", Duration::from_millis(10), 2));
        assert_eq!(report[1].0, "collision");
        p.print_and_clear();
        assert!(p.timings.is_empty());
    }
}
