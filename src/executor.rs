//! Execution collaborator and the session pipeline.
//!
//! The crate never talks to a database itself. An [`Executor`] takes
//! rendered text and positional parameters and returns rows or a
//! [`NativeError`]. A [`Session`] ties a translator, an executor and an event
//! sink together: translate, report the attempt, execute, report the
//! outcome, classify failures. It does not retry.
//!
//! # Examples
//!
//! ```
//! use riptide::classify::NativeError;
//! use riptide::dialect::Capabilities;
//! use riptide::executor::{Executor, Session};
//! use riptide::query::Raw;
//! use riptide::translate::Translator;
//! use riptide::Value;
//!
//! struct Echo;
//!
//! impl Executor for Echo {
//!     type Rows = usize;
//!
//!     fn execute(&self, _sql: &str, params: &[Value]) -> Result<usize, NativeError> {
//!         Ok(params.len())
//!     }
//! }
//!
//! let caps = Capabilities::sqlite();
//! let session = Session::new(Translator::new(&caps), Echo);
//! let bound = session.execute(&Raw::new("SELECT :a, :b").bind("a", 1).bind("b", 2).into())?;
//! assert_eq!(bound, 2);
//! # Ok::<(), riptide::Error>(())
//! ```

use crate::classify::{classify_parts, NativeError};
use crate::config::RiptideConfig;
use crate::dialect::CapabilityRegistry;
use crate::error::{Error, Result};
use crate::events::{Event, EventSink, LogSink};
use crate::query::Query;
use crate::translate::{Statement, Translator};
use crate::value::Value;
use std::fmt;
use std::time::Instant;

/// Sends rendered statements to a database
pub trait Executor {
    type Rows;

    /// Execute `sql` with `params` bound positionally, in order.
    ///
    /// # Errors
    ///
    /// Returns the driver's error code and message unchanged.
    fn execute(&self, sql: &str, params: &[Value]) -> std::result::Result<Self::Rows, NativeError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    type Rows = E::Rows;

    fn execute(&self, sql: &str, params: &[Value]) -> std::result::Result<Self::Rows, NativeError> {
        (**self).execute(sql, params)
    }
}

/// Translate-execute-classify pipeline over one executor
pub struct Session<'c, E> {
    translator: Translator<'c>,
    executor: E,
    sink: Box<dyn EventSink + 'c>,
    log_sql: bool,
}

impl<'c, E: Executor> Session<'c, E> {
    /// Session reporting through [`LogSink`]
    pub fn new(translator: Translator<'c>, executor: E) -> Self {
        Self {
            translator,
            executor,
            sink: Box::new(LogSink),
            log_sql: false,
        }
    }

    /// Session for the dialect and limits in `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownDialect` if `registry` has no entry for the
    /// configured dialect.
    pub fn from_config(config: &RiptideConfig, registry: &'c CapabilityRegistry, executor: E) -> Result<Self> {
        Ok(Self::new(config.translator(registry)?, executor).log_sql(config.log_sql))
    }

    pub fn with_sink(mut self, sink: impl EventSink + 'c) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Log each statement at `trace` level before it is executed
    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    pub fn translator(&self) -> &Translator<'c> {
        &self.translator
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Translate and execute `query`.
    ///
    /// # Errors
    ///
    /// Translation errors are returned before anything is sent and are
    /// reported as a rejected failure event. A driver failure is classified
    /// and returned as `Error::Execution`.
    pub fn execute(&self, query: &Query<'_>) -> Result<E::Rows> {
        let statement = match self.translator.translate(query) {
            Ok(statement) => statement,
            Err(err) => {
                log::debug!("{} {} rejected: {err}", self.translator.dialect(), query.kind());
                self.sink
                    .record(&Event::rejected(self.translator.dialect(), query.kind()));
                return Err(err);
            }
        };
        self.send(&statement, query.table())
    }

    /// Execute an already translated statement; `table` is used as the
    /// classification fallback when the native message names none.
    ///
    /// # Errors
    ///
    /// Returns `Error::Execution` on driver failure.
    pub fn send(&self, statement: &Statement, table: Option<&str>) -> Result<E::Rows> {
        let dialect = statement.dialect();
        let kind = statement.kind();

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "riptide.execute",
            dialect = dialect.name(),
            query_kind = kind.name(),
            params = statement.params().len()
        )
        .entered();

        if self.log_sql {
            log::trace!("{dialect} {kind}: {} ({} params)", statement.sql(), statement.params().len());
        }

        self.sink.record(&Event::attempt(dialect, kind));
        let start = Instant::now();
        let result = self.executor.execute(statement.sql(), statement.params());
        let elapsed = start.elapsed();

        match result {
            Ok(rows) => {
                self.sink.record(&Event::success(dialect, kind, elapsed));
                Ok(rows)
            }
            Err(native) => {
                let classified = classify_parts(dialect, kind, table, native);
                self.sink
                    .record(&Event::failure(dialect, kind, elapsed, classified.class()));
                Err(Error::Execution(classified))
            }
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for Session<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("translator", &self.translator)
            .field("executor", &self.executor)
            .field("log_sql", &self.log_sql)
            .finish_non_exhaustive()
    }
}
