//! # daokit
//!
//! A struct-to-table mapping layer for MySQL-style SQL.
//!
//! ## Features
//!
//! - **Cached model metadata**: a [`ModelRegistry`] per (model, table) with dual
//!   name/column lookup and ready-made column and placeholder lists
//! - **Condition trees**: a fluent [`Query`] with nested AND/OR groups, ordering
//!   and pagination
//! - **Pure compilers**: [`qb`] turns registries and queries into backtick-quoted
//!   SQL with `?` placeholders and arguments in placeholder order
//! - **Guarded mutations**: conditional UPDATE and DELETE refuse an empty WHERE;
//!   whole-table writes have their own explicitly named calls
//! - **Explicit context**: every [`Dao`] call takes an [`ExecContext`] that may
//!   carry a transaction; no hidden lookups
//!
//! ## Example
//!
//! ```ignore
//! use daokit::prelude::*;
//!
//! #[derive(Debug, Default, Model)]
//! struct UserInfo {
//!     #[orm(primary, auto_increment)]
//!     id: i64,
//!     name: String,
//!     last_login: i64,
//! }
//!
//! let users = Dao::<UserInfo>::new(DaoConfig::new())?;
//! let ctx = ExecContext::new(&executor);
//!
//! let active = users
//!     .select(
//!         &ctx,
//!         &Query::new().or().wrap(Query::new().gt("last_login", 100)).wrap(Query::new().eq("name", "root")),
//!         &SelectOptions::new(),
//!     )
//!     .await?;
//!
//! users
//!     .update_by(&ctx, &Query::new().eq("id", 7), &[UpdateEntry::increase("last_login", 1)])
//!     .await?;
//! ```

extern crate self as daokit;

pub mod client;
pub mod condition;
pub mod config;
pub mod context;
pub mod dao;
pub mod error;
pub mod ident;
pub mod model;
pub mod prelude;
pub mod qb;
pub mod query;
pub mod registry;
pub mod row;
pub mod value;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use client::{ExecResult, Executor};
pub use condition::{Condition, Op, Operand, Order};
pub use config::DaoConfig;
pub use context::ExecContext;
pub use dao::{BatchInsert, Dao, Number};
pub use error::{OrmError, OrmResult};
pub use model::{FieldDef, FieldType, Model};
pub use qb::{InsertOptions, SelectOptions, Statement, UpdateEntry};
pub use query::Query;
pub use registry::{FieldDescriptor, ModelRegistry, register};
pub use row::Row;
pub use value::{FromValue, Json, ToValue, Value};

#[cfg(feature = "derive")]
pub use daokit_derive::Model;
