//! OpenTelemetry metrics for executed statements.
//!
//! Instruments are created on the global meter provider; installing an
//! exporter is left to the application.

use crate::events::{Event, EventKind, EventSink};
use once_cell::sync::Lazy;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
    KeyValue,
};

pub static METRICS: Lazy<RiptideMetrics> = Lazy::new(RiptideMetrics::init);

pub struct RiptideMetrics {
    pub queries_total: Counter<u64>,
    pub query_errors_total: Counter<u64>,
    pub query_duration: Histogram<f64>,
}

impl RiptideMetrics {
    pub fn init() -> Self {
        let meter = global::meter("riptide");

        let queries_total = meter
            .u64_counter("riptide_queries_total")
            .with_description("Total statements sent to the executor")
            .build();

        let query_errors_total = meter
            .u64_counter("riptide_query_errors_total")
            .with_description("Statements that failed, by error class")
            .build();

        let query_duration = meter
            .f64_histogram("riptide_query_duration_seconds")
            .with_description("Executor time per statement")
            .with_unit("s")
            .build();

        Self {
            queries_total,
            query_errors_total,
            query_duration,
        }
    }

    fn attributes(event: &Event) -> Vec<KeyValue> {
        let mut attrs = vec![
            KeyValue::new("dialect", event.dialect.name()),
            KeyValue::new("query_kind", event.query_kind.name()),
        ];
        if let Some(class) = event.error_class {
            attrs.push(KeyValue::new("error_class", class.name()));
        }
        attrs
    }

    pub fn record(&self, event: &Event) {
        let attrs = Self::attributes(event);
        match event.kind {
            EventKind::Attempt => self.queries_total.add(1, &attrs),
            EventKind::Success | EventKind::Failure => {
                if let Some(duration) = event.duration {
                    self.query_duration.record(duration.as_secs_f64(), &attrs);
                }
                if event.kind == EventKind::Failure {
                    self.query_errors_total.add(1, &attrs);
                }
            }
        }
    }
}

/// Event sink that feeds [`METRICS`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSink;

impl EventSink for MetricsSink {
    fn record(&self, event: &Event) {
        METRICS.record(event);
    }
}
