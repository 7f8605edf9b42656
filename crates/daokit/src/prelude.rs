//! Convenient imports for typical `daokit` usage.
//!
//! ```ignore
//! use daokit::prelude::*;
//! ```

pub use crate::{
    Dao, DaoConfig, ExecContext, Executor, InsertOptions, Model, OrmError, OrmResult, Query,
    SelectOptions, UpdateEntry, Value,
};

pub use crate::Json;

#[cfg(feature = "mysql")]
pub use crate::mysql::MySqlExecutor;
