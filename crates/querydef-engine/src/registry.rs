//! Ordered template collection and the rank-ordered evaluation engine.
//!
//! Construction normalizes the schema so evaluation never cross-looks:
//! `reuse` pointers are merged descriptor-to-descriptor, conflict edges
//! are mirrored onto both sides, and `consumes` folds into both
//! `depends` (firing eligibility) and `conflicts` (derived parameter may
//! not coexist with its inputs).  Templates are then stratified into
//! ranks over the dependency graph; evaluation walks ranks in order so
//! every prerequisite is settled before its dependents run.
//!
//! The registry is read-only after construction and freely shareable
//! across threads for reads; `refresh` takes `&mut self` so universe
//! refreshes are serialized by the borrow checker.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{EvalError, EvalResult};
use crate::instance::Instance;
use crate::query::RawQuery;
use crate::template::{Template, TemplateSpec};
use crate::value::Value;

/// Default reserved name for the complement parameter.
pub const DEFAULT_COMPLEMENT_NAME: &str = "complement";

/// One evaluation input: raw atoms awaiting the template pipeline, or an
/// already-validated value seeded from existing instance content.
#[derive(Debug, Clone)]
pub(crate) enum Input {
    Raw(Vec<String>),
    Ready(Value),
}

// ---------------------------------------------------------------------------
// RegistryBuilder
// ---------------------------------------------------------------------------

/// Builder accepting template descriptors in canonical output order.
#[derive(Default)]
pub struct RegistryBuilder {
    specs: Vec<TemplateSpec>,
    groups: BTreeMap<String, Vec<String>>,
    complement_name: Option<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter descriptor.  Declaration order defines the
    /// canonical serialization sequence.
    pub fn param(mut self, spec: TemplateSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Declare a named group over previously (or later) declared
    /// parameter names.
    pub fn group<I, S>(mut self, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .entry(name.into())
            .or_default()
            .extend(members.into_iter().map(Into::into));
        self
    }

    /// Override the reserved complement parameter name.
    pub fn complement_name(mut self, name: impl Into<String>) -> Self {
        self.complement_name = Some(name.into());
        self
    }

    pub fn build(self) -> EvalResult<Registry> {
        let complement_name = self
            .complement_name
            .unwrap_or_else(|| DEFAULT_COMPLEMENT_NAME.to_string());

        // Merge reuse pointers against already-installed descriptors.
        let mut merged: Vec<TemplateSpec> = Vec::with_capacity(self.specs.len());
        let mut index_of: BTreeMap<String, usize> = BTreeMap::new();
        for mut spec in self.specs {
            let name = spec.name().to_string();
            if name == complement_name || index_of.contains_key(&name) {
                return Err(EvalError::DuplicateName { name });
            }
            if let Some(base) = spec.reuse.clone() {
                let Some(&base_idx) = index_of.get(&base) else {
                    return Err(EvalError::UnknownReference {
                        name,
                        referent: base,
                    });
                };
                spec.merge_from(&merged[base_idx]);
            }
            index_of.insert(name, merged.len());
            merged.push(spec);
        }

        let sequence: Vec<String> = merged.iter().map(|s| s.name().to_string()).collect();

        // Named groups: builder-level declarations first, then
        // descriptor-level registrations in sequence order.
        let mut groups = self.groups;
        for spec in &merged {
            for group in &spec.groups {
                groups
                    .entry(group.clone())
                    .or_default()
                    .push(spec.name().to_string());
            }
        }
        for (group, members) in &groups {
            for member in members {
                if !index_of.contains_key(member) {
                    return Err(EvalError::UnknownReference {
                        name: group.clone(),
                        referent: member.clone(),
                    });
                }
            }
        }

        let mut templates: BTreeMap<String, Template> = merged
            .into_iter()
            .map(|spec| (spec.name().to_string(), spec.into_template()))
            .collect();

        // Every edge target must exist before normalization.
        for (name, template) in &templates {
            let referenced = template
                .depends
                .iter()
                .chain(template.conflicts.iter())
                .chain(template.consumes.iter());
            for referent in referenced {
                if !templates.contains_key(referent) {
                    return Err(EvalError::UnknownReference {
                        name: name.clone(),
                        referent: referent.clone(),
                    });
                }
            }
        }

        // Symmetric conflict edges, including the implicit ones from
        // consumption; consumes also implies depends.
        let mut mirrored: Vec<(String, String)> = Vec::new();
        for (name, template) in &templates {
            for conflict in &template.conflicts {
                mirrored.push((conflict.clone(), name.clone()));
            }
            for consumed in &template.consumes {
                mirrored.push((consumed.clone(), name.clone()));
            }
        }
        let consumption: Vec<(String, Vec<String>)> = templates
            .iter()
            .map(|(name, t)| (name.clone(), t.consumes.clone()))
            .collect();
        for (name, consumed) in consumption {
            let template = templates.get_mut(&name).expect("template exists");
            for c in consumed {
                template.depends.insert(c.clone());
                template.conflicts.insert(c);
            }
        }
        for (target, conflict) in mirrored {
            templates
                .get_mut(&target)
                .expect("edge target validated")
                .conflicts
                .insert(conflict);
        }

        let ranks = stratify(&templates, &sequence)?;

        for template in templates.values_mut() {
            template.refresh();
        }

        Ok(Registry {
            templates,
            sequence,
            groups,
            complement_name,
            ranks,
        })
    }
}

/// Kahn-style stratification over the `depends` graph (consumption is
/// already folded in).  Rank 0 holds every template with no
/// prerequisites; rank k holds templates whose prerequisites all sit in
/// earlier ranks.  Sequence order is preserved within a rank.
fn stratify(
    templates: &BTreeMap<String, Template>,
    sequence: &[String],
) -> EvalResult<Vec<Vec<String>>> {
    let mut placed: BTreeSet<String> = BTreeSet::new();
    let mut remaining: Vec<String> = sequence.to_vec();
    let mut ranks: Vec<Vec<String>> = Vec::new();

    while !remaining.is_empty() {
        let (ready, rest): (Vec<String>, Vec<String>) =
            remaining.into_iter().partition(|name| {
                templates[name]
                    .depends
                    .iter()
                    .all(|dep| placed.contains(dep))
            });
        if ready.is_empty() {
            return Err(EvalError::Cycle { cycle: rest });
        }
        placed.extend(ready.iter().cloned());
        ranks.push(ready);
        remaining = rest;
    }

    Ok(ranks)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The whole-schema object: templates, canonical sequence, named groups,
/// the reserved complement name, and the precomputed evaluation ranks.
#[derive(Debug)]
pub struct Registry {
    templates: BTreeMap<String, Template>,
    sequence: Vec<String>,
    groups: BTreeMap<String, Vec<String>>,
    complement_name: String,
    ranks: Vec<Vec<String>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn template(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Canonical serialization order (declaration order).
    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }

    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    pub fn complement_name(&self) -> &str {
        &self.complement_name
    }

    /// Evaluation strata; exposed for diagnostics.
    pub fn ranks(&self) -> &[Vec<String>] {
        &self.ranks
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Re-invoke every template's universe thunk.  Takes `&mut self` so
    /// refreshes cannot race ongoing evaluations.
    pub fn refresh(&mut self) {
        debug!("refreshing {} template universe(s)", self.templates.len());
        for template in self.templates.values_mut() {
            template.refresh();
        }
    }

    /// Turn a raw key→values mapping into a validated instance.
    /// Defaults are enabled; unrecognized names are preserved in the
    /// instance's `other` map and never serialized.
    pub fn process(&self, raw: &RawQuery) -> EvalResult<Instance<'_>> {
        debug!("processing {} raw parameter(s)", raw.len());
        let inputs = raw
            .iter()
            .map(|(name, atoms)| (name.clone(), Input::Raw(atoms.clone())))
            .collect();
        let (content, other) = self.evaluate(inputs, true)?;
        Ok(Instance::from_parts(self, content, other))
    }

    /// The rank-ordered evaluation core shared by `process` and
    /// `Instance::set`.
    pub(crate) fn evaluate(
        &self,
        mut inputs: BTreeMap<String, Input>,
        with_defaults: bool,
    ) -> EvalResult<(BTreeMap<String, Value>, BTreeMap<String, Vec<String>>)> {
        // Reserved complement parameter: a list of names to complement.
        // Unknown names are ignored.
        let mut complement_targets: BTreeSet<String> = BTreeSet::new();
        if let Some(input) = inputs.remove(&self.complement_name) {
            for name in complement_target_names(&input) {
                if self.templates.contains_key(&name) {
                    complement_targets.insert(name);
                } else {
                    debug!("ignoring unknown complement target `{name}`");
                }
            }
        }

        // Names outside the registry pass through untouched.
        let unknown: Vec<String> = inputs
            .keys()
            .filter(|name| !self.templates.contains_key(*name))
            .cloned()
            .collect();
        let mut other: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for name in unknown {
            if let Some(input) = inputs.remove(&name) {
                let atoms = match input {
                    Input::Raw(atoms) => atoms,
                    Input::Ready(value) => vec![value.render()],
                };
                other.insert(name, atoms);
            }
        }

        let mut out: BTreeMap<String, Value> = BTreeMap::new();
        let mut doomed: BTreeSet<String> = BTreeSet::new();

        for rank in &self.ranks {
            for name in rank {
                let template = &self.templates[name];
                let mut assigned = false;

                if let Some(input) = inputs.get(name) {
                    // Supplied input wins over consumer eligibility.
                    let value = match input {
                        Input::Raw(atoms) => {
                            let atoms: Vec<Value> =
                                atoms.iter().map(|s| Value::from(s.as_str())).collect();
                            template.process(&atoms)?
                        }
                        Input::Ready(value) => Some(value.clone()),
                    };
                    if let Some(value) = value {
                        out.insert(name.clone(), value);
                        doomed.extend(template.consumes.iter().cloned());
                        assigned = true;
                    }
                } else if !template.consumes.is_empty() {
                    if template.consumes.iter().all(|c| out.contains_key(c)) {
                        let consumed: Vec<Value> = template
                            .consumes
                            .iter()
                            .map(|c| out[c].clone())
                            .collect();
                        // Consumer failures propagate unchanged.
                        let value = match &template.consumer {
                            Some(consumer) => consumer(&consumed)?,
                            None => Value::Seq(consumed),
                        };
                        out.insert(name.clone(), value);
                        doomed.extend(template.consumes.iter().cloned());
                        assigned = true;
                    }
                } else if with_defaults {
                    if let Some(default) = &template.default {
                        let conflicted = template
                            .conflicts
                            .iter()
                            .any(|c| out.contains_key(c) && !doomed.contains(c));
                        if !conflicted {
                            out.insert(name.clone(), default());
                            assigned = true;
                        }
                    }
                }

                if assigned {
                    for conflict in &template.conflicts {
                        if conflict != name
                            && out.contains_key(conflict)
                            && !doomed.contains(conflict)
                        {
                            return Err(EvalError::Conflict {
                                a: name.clone(),
                                b: conflict.clone(),
                            });
                        }
                    }
                }

                if complement_targets.contains(name) {
                    if let Some(value) = out.get(name) {
                        match template.complement_of(value) {
                            Some(complemented) => {
                                out.insert(name.clone(), complemented);
                            }
                            None => {
                                return Err(EvalError::BadComplement {
                                    name: name.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }

        // Deletions are deferred to here; consumed values stay visible
        // to same-rank siblings and to intermediate conflict checks.
        for name in &doomed {
            out.remove(name);
        }

        for (name, template) in &self.templates {
            if template.min == 0 || doomed.contains(name) {
                continue;
            }
            let have = out.get(name).map(Value::atom_count).unwrap_or(0);
            if have < template.min {
                return Err(EvalError::TooFew {
                    name: name.clone(),
                    have,
                    min: template.min,
                });
            }
        }

        // Dependency validation covers the declared edges minus
        // consumption; consumed inputs were just deleted.
        for name in out.keys() {
            let template = &self.templates[name];
            for dep in &template.depends {
                if template.consumes.contains(dep) {
                    continue;
                }
                if !out.contains_key(dep) {
                    return Err(EvalError::MissingDependency {
                        name: name.clone(),
                        missing: dep.clone(),
                    });
                }
            }
        }

        Ok((out, other))
    }
}

/// Interpret a complement-parameter input as a list of parameter names.
fn complement_target_names(input: &Input) -> Vec<String> {
    match input {
        Input::Raw(atoms) => atoms.clone(),
        Input::Ready(Value::Seq(items)) => items.iter().map(Value::render).collect(),
        Input::Ready(Value::Set(members)) => members.iter().map(Value::render).collect(),
        Input::Ready(value) => vec![value.render()],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
