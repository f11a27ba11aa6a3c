//! Dispatch metrics.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by method, status, route
//! - `dispatch_request_duration_seconds` (histogram): latency distribution
//!
//! Unmatched requests are labelled with route `none`.

use std::time::Instant;

pub const REQUESTS_TOTAL: &str = "dispatch_requests_total";
pub const REQUEST_DURATION: &str = "dispatch_request_duration_seconds";

/// Record one dispatched request started at `start`.
pub fn record_dispatch(method: &str, status: u16, route: &str, start: Instant) {
    let status = status.to_string();
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.clone(),
        "route" => route.to_string()
    )
    .increment(1);
    metrics::histogram!(
        REQUEST_DURATION,
        "method" => method.to_string(),
        "status" => status,
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    use metrics::{
        Counter, Gauge, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder, SharedString,
        Unit,
    };

    #[derive(Default)]
    struct Samples(Mutex<Vec<f64>>);

    impl HistogramFn for Samples {
        fn record(&self, value: f64) {
            self.0.lock().unwrap().push(value);
        }
    }

    /// Keeps every registered metric by name and labels.
    #[derive(Default)]
    struct CapturingRecorder {
        counters: Mutex<BTreeMap<String, Arc<AtomicU64>>>,
        histograms: Mutex<BTreeMap<String, Arc<Samples>>>,
    }

    fn render(key: &Key) -> String {
        let labels: Vec<String> = key
            .labels()
            .map(|l| format!("{}={}", l.key(), l.value()))
            .collect();
        format!("{}{{{}}}", key.name(), labels.join(","))
    }

    impl Recorder for CapturingRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            let counter = self
                .counters
                .lock()
                .unwrap()
                .entry(render(key))
                .or_default()
                .clone();
            Counter::from_arc(counter)
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
            let samples = self
                .histograms
                .lock()
                .unwrap()
                .entry(render(key))
                .or_default()
                .clone();
            Histogram::from_arc(samples)
        }
    }

    #[test]
    fn test_record_dispatch_labels() {
        let recorder = CapturingRecorder::default();
        metrics::with_local_recorder(&recorder, || {
            record_dispatch("GET", 200, "post", Instant::now());
            record_dispatch("GET", 200, "post", Instant::now());
            record_dispatch("POST", 404, "none", Instant::now());
        });

        let counters = recorder.counters.lock().unwrap();
        let hits = |key: &str| counters[key].load(Ordering::Relaxed);
        assert_eq!(hits("dispatch_requests_total{method=GET,status=200,route=post}"), 2);
        assert_eq!(hits("dispatch_requests_total{method=POST,status=404,route=none}"), 1);

        let histograms = recorder.histograms.lock().unwrap();
        let samples = histograms["dispatch_request_duration_seconds{method=GET,status=200,route=post}"]
            .0
            .lock()
            .unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| *s >= 0.0));
    }
}
