//! Schema-aware checking of ADQL queries
//!
//! [`DbChecker`] implements [`QueryChecker`](adql_ast::QueryChecker) over a
//! list of published [`DbTable`](adql_ast::DbTable)s. It resolves the tables
//! of every FROM clause and the column references of every query, nested
//! ones included, and binds each column to its metadata.
//!
//! ```
//! use adql_ast::{DbColumn, DbTable, DbType, DbTypeKind, QueryChecker};
//! use adql_checker::DbChecker;
//!
//! let checker = DbChecker::new([DbTable::new("basic")
//!     .with_column(DbColumn::new("ra", DbType::new(DbTypeKind::Double)))]);
//! let mut ast = adql_parser::parse("SELECT ra FROM basic").unwrap();
//! let root = ast.root().unwrap();
//! checker.check(&mut ast, root).unwrap();
//! ```

mod checker;
mod scope;

pub use checker::DbChecker;
