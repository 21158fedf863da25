//! Structured failure values surfaced by templates, registries, and
//! instances.
//!
//! One sum type covers the whole taxonomy; the rendered message is a
//! Display concern only.  Construction-time kinds (`Cycle`,
//! `DuplicateName`, `UnknownReference`) abort registry creation; the rest
//! are raised by `process`/`set` atomically: on failure the target
//! instance is not mutated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvalError {
    /// Coercion produced (or left) a value that fails the type check.
    #[error("parameter `{name}` atom {index}: `{cause}` is not a valid {type_name}")]
    BadAtom {
        name: String,
        index: usize,
        type_name: String,
        cause: String,
    },

    /// Fewer atoms than the template's `min` after the pipeline ran.
    #[error("parameter `{name}` has {have} value(s), below the required minimum {min}")]
    TooFew { name: String, have: usize, min: usize },

    /// More atoms than `max` on a template with truncation disabled.
    #[error("parameter `{name}` has {have} value(s), above the allowed maximum {max}")]
    TooMany { name: String, have: usize, max: usize },

    /// Two mutually exclusive parameters both ended up in the output.
    #[error("parameters `{a}` and `{b}` conflict")]
    Conflict { a: String, b: String },

    /// A declared dependency is absent at the end of the pipeline.
    #[error("parameter `{name}` requires `{missing}`, which is absent")]
    MissingDependency { name: String, missing: String },

    /// The depends/consumes graph is not a DAG.
    #[error("dependency cycle among parameters: {}", cycle.join(", "))]
    Cycle { cycle: Vec<String> },

    /// A composite adapter with no coercion from a sequence.
    #[error("parameter `{name}` declares a composite type with no coercion from a sequence")]
    UnknownComposite { name: String },

    /// Complement requested for a parameter that cannot be complemented.
    #[error("complement requested for parameter `{name}` but no complement is defined")]
    BadComplement { name: String },

    /// Two templates (or a template and the reserved complement name)
    /// under the same name.
    #[error("duplicate parameter name `{name}`")]
    DuplicateName { name: String },

    /// A reuse pointer, edge set, or group names a parameter that does
    /// not exist.
    #[error("parameter `{name}` references unknown parameter `{referent}`")]
    UnknownReference { name: String, referent: String },

    /// A caller-provided callback failed; tagged with the template name.
    #[error("callback failure in parameter `{name}`: {detail}")]
    Callback { name: String, detail: String },
}
