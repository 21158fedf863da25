#![forbid(unsafe_code)]
//! Declarative registry and processor for named query-string parameter
//! sets.
//!
//! A [`registry::Registry`] describes each recognized parameter with a
//! [`template::Template`]: value type, cardinality, interdependencies,
//! derivation rules, and serialization format.  Processing turns a raw
//! key→values mapping into a validated [`instance::Instance`];
//! instances support guarded mutation and re-serialize into a
//! canonical, byte-stable query string.
//!
//! The evaluation engine is the heart of the crate:
//! - the per-parameter value pipeline (parse → coerce → constrain →
//!   compose) lives on [`template::Template`];
//! - the depends/conflicts/consumes graph is normalized at construction
//!   and stratified into ranks, so evaluation settles every
//!   prerequisite before its dependents;
//! - serialization walks the canonical sequence and applies the
//!   set-complement shortcut where it is strictly shorter.

pub mod error;
pub mod instance;
pub mod query;
pub mod registry;
pub mod template;
pub mod value;
pub mod value_type;
