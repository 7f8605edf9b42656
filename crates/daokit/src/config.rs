use std::time::Duration;

/// Rows returned by [`Dao::select`](crate::Dao::select) when a query sets no limit.
pub const DEFAULT_LIMIT: u64 = 20;

/// Configuration for [`Dao`](crate::Dao).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaoConfig {
    /// Table name override; derived from the model when `None`.
    pub table: Option<String>,
    /// Row cap applied to selects that neither set a limit nor call `no_limit()`.
    pub default_limit: Option<u64>,
    /// Upper bound for each executor call, unless the context carries its own.
    pub query_timeout: Option<Duration>,
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            table: None,
            default_limit: Some(DEFAULT_LIMIT),
            query_timeout: None,
        }
    }
}

impl DaoConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the model onto `table` instead of its derived name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the select default limit; `None` returns every row.
    pub fn default_limit(mut self, limit: Option<u64>) -> Self {
        self.default_limit = limit.filter(|&n| n > 0);
        self
    }

    /// Set query timeout.
    pub fn query_timeout(mut self, duration: Duration) -> Self {
        self.query_timeout = Some(duration);
        self
    }
}
