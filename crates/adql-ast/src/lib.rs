//! ADQL Abstract Syntax Tree
//!
//! The tree is stored in an arena ([`Ast`]) and addressed by [`NodeId`].
//! Every node has a [`NodeKind`] holding its scalar data, an ordered list of
//! child ids and an optional source position. Children are visited and
//! replaced through a [`ChildCursor`], which checks every replacement against
//! the category of the slot it goes into.
//!
//! The crate also holds the language-feature registry used to gate optional
//! grammar productions, the search/replace engine and the metadata contract
//! consumed by schema-aware query checkers.

mod db;
mod feature;
mod ident;
mod node;
mod render;
pub mod search;
mod tree;
mod types;
mod udf;
mod version;

pub use db::*;
pub use feature::*;
pub use ident::*;
pub use node::*;
pub use tree::*;
pub use types::*;
pub use udf::*;
pub use version::*;
