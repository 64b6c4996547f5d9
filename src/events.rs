//! Execution events.
//!
//! A [`Session`](crate::executor::Session) reports every statement it sends
//! as an attempt followed by a success or a failure. A query rejected by
//! translation is reported as a lone failure with neither duration nor
//! error class. Sinks are
//! fire-and-forget: `record` cannot fail and must not block.

use crate::classify::ErrorClass;
use crate::dialect::Dialect;
use crate::query::QueryKind;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Attempt,
    Success,
    Failure,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Attempt => "attempt",
            EventKind::Success => "success",
            EventKind::Failure => "failure",
        }
    }
}

/// One structured execution event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub dialect: Dialect,
    pub query_kind: QueryKind,
    /// Time spent in the executor; `None` for attempts and rejections
    pub duration: Option<Duration>,
    /// Set on failures returned by the executor
    pub error_class: Option<ErrorClass>,
}

impl Event {
    pub fn attempt(dialect: Dialect, query_kind: QueryKind) -> Self {
        Self {
            kind: EventKind::Attempt,
            dialect,
            query_kind,
            duration: None,
            error_class: None,
        }
    }

    pub fn success(dialect: Dialect, query_kind: QueryKind, duration: Duration) -> Self {
        Self {
            kind: EventKind::Success,
            duration: Some(duration),
            ..Self::attempt(dialect, query_kind)
        }
    }

    pub fn failure(dialect: Dialect, query_kind: QueryKind, duration: Duration, class: ErrorClass) -> Self {
        Self {
            kind: EventKind::Failure,
            duration: Some(duration),
            error_class: Some(class),
            ..Self::attempt(dialect, query_kind)
        }
    }

    /// Failure raised before anything reached the executor
    pub fn rejected(dialect: Dialect, query_kind: QueryKind) -> Self {
        Self {
            kind: EventKind::Failure,
            ..Self::attempt(dialect, query_kind)
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.kind == EventKind::Failure && self.duration.is_none()
    }
}

/// Receiver of execution events
pub trait EventSink: Send + Sync {
    fn record(&self, event: &Event);
}

impl<F> EventSink for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn record(&self, event: &Event) {
        self(event)
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn record(&self, _event: &Event) {}
}

/// Writes events through the `log` facade: attempts and successes at
/// `debug`, failures at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: &Event) {
        match (event.kind, event.duration, event.error_class) {
            (EventKind::Failure, None, None) => {
                log::warn!("{} {} rejected before execution", event.dialect, event.query_kind)
            }
            (EventKind::Failure, duration, class) => log::warn!(
                "{} {} failed after {:?}: {}",
                event.dialect,
                event.query_kind,
                duration.unwrap_or_default(),
                class.map_or("unclassified", ErrorClass::name)
            ),
            (EventKind::Success, Some(duration), _) => {
                log::debug!("{} {} succeeded in {duration:?}", event.dialect, event.query_kind)
            }
            (kind, _, _) => log::debug!("{} {} {}", event.dialect, event.query_kind, kind.name()),
        }
    }
}

/// Emits each event as a `tracing` event with structured fields
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[cfg(feature = "tracing")]
impl EventSink for TracingSink {
    fn record(&self, event: &Event) {
        let duration_ms = event.duration.map(|d| d.as_secs_f64() * 1000.0);
        let error_class = event.error_class.map(ErrorClass::name);
        match event.kind {
            EventKind::Failure => tracing::warn!(
                target: "riptide",
                event = event.kind.name(),
                dialect = event.dialect.name(),
                query_kind = event.query_kind.name(),
                duration_ms,
                error_class,
                "query failed"
            ),
            _ => tracing::debug!(
                target: "riptide",
                event = event.kind.name(),
                dialect = event.dialect.name(),
                query_kind = event.query_kind.name(),
                duration_ms,
                "query event"
            ),
        }
    }
}

/// Forwards every event to each sink in turn
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl std::fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutSink").field("sinks", &self.sinks.len()).finish()
    }
}

impl EventSink for FanoutSink {
    fn record(&self, event: &Event) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}
