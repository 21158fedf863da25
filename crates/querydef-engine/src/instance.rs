//! A validated, registry-bound value set.
//!
//! Instances come out of `Registry::process` and stay consistent under
//! mutation: `set` re-runs the rank-ordered pipeline seeded with the
//! existing content plus the overrides, and replaces the content only on
//! success.  Serialization walks the registry sequence and applies the
//! set-complement rewrite wherever it is strictly shorter.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::EvalResult;
use crate::query::{join_pairs, replace_query, RawQuery};
use crate::registry::{Input, Registry};
use crate::value::Value;

/// Options for [`Instance::set_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Run default thunks for absent, non-conflicting parameters.
    /// Off by default.
    pub with_defaults: bool,
}

/// A validated value map bound to a registry.  The registry must outlive
/// the instance; the borrow encodes that.
#[derive(Debug, Clone)]
pub struct Instance<'r> {
    registry: &'r Registry,
    content: BTreeMap<String, Value>,
    other: BTreeMap<String, Vec<String>>,
}

impl<'r> Instance<'r> {
    pub(crate) fn from_parts(
        registry: &'r Registry,
        content: BTreeMap<String, Value>,
        other: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            registry,
            content,
            other,
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.content.get(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.content.contains_key(key)
    }

    /// The processed values, keyed by template name.
    pub fn content(&self) -> &BTreeMap<String, Value> {
        &self.content
    }

    /// Input names the registry does not know, preserved verbatim.
    /// Never serialized by [`Instance::as_string`].
    pub fn other(&self) -> &BTreeMap<String, Vec<String>> {
        &self.other
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Apply overrides through the full rank pipeline.  Defaults stay
    /// off; see [`Instance::set_with`].
    pub fn set(&mut self, overrides: RawQuery) -> EvalResult<()> {
        self.set_with(overrides, SetOptions::default())
    }

    /// Apply overrides, optionally with defaults.  The pipeline is
    /// seeded with the existing content, so conflicts, cascading, and
    /// cardinality are enforced exactly as in `process`.  Atomic: on
    /// failure the instance is left unchanged.
    pub fn set_with(&mut self, overrides: RawQuery, options: SetOptions) -> EvalResult<()> {
        debug!("applying {} override(s)", overrides.len());
        let mut inputs: BTreeMap<String, Input> = self
            .content
            .iter()
            .map(|(name, value)| (name.clone(), Input::Ready(value.clone())))
            .collect();
        for (name, atoms) in self.other.iter() {
            inputs.insert(name.clone(), Input::Raw(atoms.clone()));
        }
        for (name, atoms) in overrides.iter() {
            inputs.insert(name.clone(), Input::Raw(atoms.clone()));
        }

        let (content, other) = self.registry.evaluate(inputs, options.with_defaults)?;
        self.content = content;
        self.other = other;
        Ok(())
    }

    /// Shallow view restricted to a named group.  Absent keys stay
    /// absent; present-but-null keys are included.  `None` for an
    /// unknown group name.
    pub fn group(&self, name: &str) -> Option<BTreeMap<String, Value>> {
        let members = self.registry.group(name)?;
        Some(
            members
                .iter()
                .filter_map(|member| {
                    self.content
                        .get(member)
                        .map(|value| (member.clone(), value.clone()))
                })
                .collect(),
        )
    }

    /// Structural copy with overrides applied through `set`.
    pub fn clone_with(&self, overrides: RawQuery) -> EvalResult<Instance<'r>> {
        let mut copy = self.clone();
        copy.set(overrides)?;
        Ok(copy)
    }

    /// Canonical query-string serialization.
    ///
    /// Keys are emitted in registry sequence order, one `k=v` pair per
    /// formatted atom.  A set-valued key with a universe and complement
    /// is rewritten to its complemented form when that form (including
    /// the trailing reserved `complement=<key>` pair it costs) is
    /// strictly shorter in bytes.  Reserved complement pairs come last.
    /// An empty instance serializes to the empty string.
    pub fn as_string(&self) -> String {
        let reserved = self.registry.complement_name();
        let mut pairs: Vec<String> = Vec::new();
        let mut complemented_keys: Vec<&str> = Vec::new();

        for name in self.registry.sequence() {
            let template = self.registry.template(name).expect("sequence is exact");
            let Some(value) = self.content.get(name) else {
                continue;
            };
            let Some(unprocessed) = template.unprocess(value) else {
                continue;
            };
            let direct = join_pairs(name, &unprocessed.strings);

            if unprocessed.complemented {
                // A custom unwind already produced the complement form.
                if !direct.is_empty() {
                    pairs.push(direct);
                }
                complemented_keys.push(name.as_str());
                continue;
            }

            let rewrite = if value.is_null() {
                None
            } else {
                template
                    .complement_of(value)
                    .map(|cv| join_pairs(name, &template.render_value(&cv)))
                    .filter(|complement| {
                        !complement.is_empty()
                            && complement.len() + reserved.len() + name.len() + 2
                                < direct.len()
                    })
            };

            match rewrite {
                Some(complement) => {
                    pairs.push(complement);
                    complemented_keys.push(name.as_str());
                }
                None => {
                    if !direct.is_empty() {
                        pairs.push(direct);
                    }
                }
            }
        }

        for key in complemented_keys {
            pairs.push(format!("{reserved}={key}"));
        }

        pairs.join("&")
    }

    /// Clone of `uri` with its query component replaced by
    /// [`Instance::as_string`].
    pub fn make_uri(&self, uri: &str) -> String {
        replace_query(uri, &self.as_string())
    }
}
