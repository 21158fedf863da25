//! Per-parameter schema: the value pipeline and its declarative envelope.
//!
//! A [`Template`] owns both directions of the value pipeline:
//! `process` (raw atoms → validated value: cardinality cap, per-atom
//! normalization, composite construction, scalar selection) and
//! `unprocess` (value → formatted string list).  The registry composes
//! templates into the rank-ordered evaluation; nothing here looks at
//! other parameters.
//!
//! Templates are immutable after registry construction except for the
//! memoized universe cache, which is refreshed behind `&mut` so callers
//! get quiescence from the borrow checker.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use crate::value_type::{CompositeType, StrType, ValueType};

/// Thunk producing a default value.
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Derives one parameter from its consumed inputs, in declaration order.
/// Failures propagate unchanged; `EvalError::Callback` is the
/// conventional kind for generic failures and carries the template name.
pub type ConsumerFn = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// Thunk producing the universal set used for complementing.
pub type UniverseFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// `(value, universe) -> complemented value`.
pub type ComplementFn = Arc<dyn Fn(&Value, &Value) -> Value + Send + Sync>;

/// Inverse of composite construction: `(template, value) -> (atoms,
/// complement_flag)`.  A `true` flag forces the complemented
/// serialization branch.
pub type UnwindFn = Arc<dyn Fn(&Template, &Value) -> (Vec<Value>, bool) + Send + Sync>;

/// Custom atom formatter.
pub type FormatFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Set-theoretic complement over [`Value::Set`]: `U \ S`.  The canonical
/// [`ComplementFn`] for set-valued parameters; non-set inputs pass
/// through unchanged.
pub fn set_complement(value: &Value, universe: &Value) -> Value {
    match (value, universe) {
        (Value::Set(s), Value::Set(u)) => Value::Set(u.difference(s).cloned().collect()),
        _ => value.clone(),
    }
}

// ---------------------------------------------------------------------------
// Format
// ---------------------------------------------------------------------------

/// Per-atom serialization format: either a pattern with a single `%s`
/// placeholder or a caller-provided function.
#[derive(Clone)]
pub enum Format {
    Pattern(String),
    Custom(FormatFn),
}

impl Format {
    /// Render one atom.  Preserved nulls always emit the empty string,
    /// regardless of pattern.
    pub fn apply(&self, atom: &Value) -> String {
        if atom.is_null() {
            return String::new();
        }
        match self {
            Self::Pattern(pattern) => pattern.replacen("%s", &atom.render(), 1),
            Self::Custom(f) => f(atom),
        }
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::Pattern("%s".to_string())
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(p) => f.debug_tuple("Pattern").field(p).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// Result of `unprocess`: the formatted atoms and whether the
/// complemented serialization branch was forced by a custom unwind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unprocessed {
    pub strings: Vec<String>,
    pub complemented: bool,
}

/// The schema for a single parameter.  Immutable after registry
/// construction; built from a [`TemplateSpec`].
pub struct Template {
    pub(crate) name: String,
    pub(crate) value_type: Arc<dyn ValueType>,
    pub(crate) composite: Option<Arc<dyn CompositeType>>,
    pub(crate) format: Format,
    pub(crate) min: usize,
    pub(crate) max: Option<usize>,
    pub(crate) shift: bool,
    pub(crate) empty: bool,
    pub(crate) truncate: bool,
    pub(crate) reverse: bool,
    pub(crate) depends: BTreeSet<String>,
    pub(crate) conflicts: BTreeSet<String>,
    pub(crate) consumes: Vec<String>,
    pub(crate) default: Option<DefaultFn>,
    pub(crate) consumer: Option<ConsumerFn>,
    pub(crate) universe: Option<UniverseFn>,
    pub(crate) complement: Option<ComplementFn>,
    pub(crate) unwind: Option<UnwindFn>,
    pub(crate) unicache: Option<Value>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("type", &self.value_type.name())
            .field("min", &self.min)
            .field("max", &self.max)
            .field("depends", &self.depends)
            .field("conflicts", &self.conflicts)
            .field("consumes", &self.consumes)
            .finish()
    }
}

impl Template {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub fn depends(&self) -> &BTreeSet<String> {
        &self.depends
    }

    pub fn conflicts(&self) -> &BTreeSet<String> {
        &self.conflicts
    }

    pub fn consumes(&self) -> &[String] {
        &self.consumes
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Whether this template can produce a complemented form: both a
    /// complement function and a cached universe are required.
    pub fn can_complement(&self) -> bool {
        self.complement.is_some() && self.unicache.is_some()
    }

    /// The memoized universe, if any.
    pub fn universe(&self) -> Option<&Value> {
        self.unicache.as_ref()
    }

    /// Re-invoke the universe thunk into the cache.
    pub fn refresh(&mut self) {
        if let Some(universe) = &self.universe {
            self.unicache = Some(universe());
        }
    }

    /// Apply the complement function against the cached universe.
    /// `None` when the template has no complement or no universe.
    pub fn complement_of(&self, value: &Value) -> Option<Value> {
        match (&self.complement, &self.unicache) {
            (Some(complement), Some(universe)) => Some(complement(value, universe)),
            _ => None,
        }
    }

    /// Raw atoms → validated value.
    ///
    /// Runs the cardinality cap, per-atom normalization (empty handling,
    /// coercion, type check), composite construction, and scalar
    /// selection.  Returns `Ok(None)` when every atom was dropped as
    /// empty; the parameter stays absent.  `min` is not checked here:
    /// that is a registry-level invariant applied after cascading.
    pub fn process(&self, raw: &[Value]) -> EvalResult<Option<Value>> {
        let mut atoms: Vec<Value> = raw.to_vec();

        if let Some(max) = self.max {
            if atoms.len() > max {
                if !self.truncate {
                    return Err(EvalError::TooMany {
                        name: self.name.clone(),
                        have: atoms.len(),
                        max,
                    });
                }
                if self.shift {
                    atoms.drain(..atoms.len() - max);
                } else {
                    atoms.truncate(max);
                }
            }
        }

        let mut kept: Vec<Value> = Vec::with_capacity(atoms.len());
        for (index, atom) in atoms.into_iter().enumerate() {
            let is_empty =
                atom.is_null() || matches!(&atom, Value::Str(s) if s.is_empty());
            let atom = if is_empty {
                if !self.empty {
                    continue;
                }
                Value::Null
            } else if let Some(coerced) = self.value_type.coerce(&atom) {
                coerced
            } else {
                atom
            };
            if !atom.is_null() && !self.value_type.check(&atom) {
                return Err(EvalError::BadAtom {
                    name: self.name.clone(),
                    index,
                    type_name: self.value_type.name().to_string(),
                    cause: atom.render(),
                });
            }
            kept.push(atom);
        }

        if kept.is_empty() && !self.empty {
            return Ok(None);
        }

        if let Some(composite) = &self.composite {
            return match composite.from_atoms(&kept) {
                Some(value) => Ok(Some(value)),
                None => Err(EvalError::UnknownComposite {
                    name: self.name.clone(),
                }),
            };
        }

        if self.max == Some(1) {
            return Ok(Some(kept.into_iter().next().unwrap_or(Value::Null)));
        }

        Ok(Some(Value::Seq(kept)))
    }

    /// Value → formatted string list.
    ///
    /// `None` means the key is omitted entirely.  Absent keys never
    /// reach this method; the serializer skips them.  A preserved-null
    /// value serializes as a single empty atom when `empty` is set and
    /// `max == 1`, as nothing when `empty` is set with a wider
    /// cardinality, and is omitted otherwise.
    pub fn unprocess(&self, value: &Value) -> Option<Unprocessed> {
        if value.is_null() {
            if self.empty && self.max == Some(1) {
                return Some(Unprocessed {
                    strings: vec![String::new()],
                    complemented: false,
                });
            }
            if self.empty {
                return Some(Unprocessed {
                    strings: Vec::new(),
                    complemented: false,
                });
            }
            return None;
        }

        let (atoms, complemented) = match &self.unwind {
            Some(unwind) => unwind(self, value),
            None => (self.atoms_of(value), false),
        };

        Some(Unprocessed {
            strings: self.format_atoms(&atoms),
            complemented,
        })
    }

    /// Format an arbitrary value through this template's atom format,
    /// without unwind or complement logic.  Serialization uses this for
    /// the complemented branch candidate.
    pub(crate) fn render_value(&self, value: &Value) -> Vec<String> {
        self.format_atoms(&self.atoms_of(value))
    }

    /// Flatten a value into its atom list.  Sets order ascending, or
    /// descending when `reverse` is set; scalars wrap as a single atom.
    fn atoms_of(&self, value: &Value) -> Vec<Value> {
        match value {
            Value::Seq(items) => items.clone(),
            Value::Set(members) => {
                if self.reverse {
                    members.iter().rev().cloned().collect()
                } else {
                    members.iter().cloned().collect()
                }
            }
            scalar => vec![scalar.clone()],
        }
    }

    fn format_atoms(&self, atoms: &[Value]) -> Vec<String> {
        atoms.iter().map(|atom| self.format.apply(atom)).collect()
    }
}

// ---------------------------------------------------------------------------
// TemplateSpec, the construction descriptor
// ---------------------------------------------------------------------------

/// Construction-time descriptor for one template.
///
/// Every field is optional so that a `reuse` pointer can inherit unset
/// fields from an earlier descriptor; `RegistryBuilder` performs the
/// merge and applies defaults.  Builder methods consume and return
/// `self`.
#[derive(Clone, Default)]
pub struct TemplateSpec {
    pub(crate) name: String,
    pub(crate) reuse: Option<String>,
    pub(crate) value_type: Option<Arc<dyn ValueType>>,
    pub(crate) composite: Option<Arc<dyn CompositeType>>,
    pub(crate) format: Option<Format>,
    pub(crate) min: Option<usize>,
    pub(crate) max: Option<Option<usize>>,
    pub(crate) shift: Option<bool>,
    pub(crate) empty: Option<bool>,
    pub(crate) truncate: Option<bool>,
    pub(crate) reverse: Option<bool>,
    pub(crate) depends: Option<BTreeSet<String>>,
    pub(crate) conflicts: Option<BTreeSet<String>>,
    pub(crate) consumes: Option<Vec<String>>,
    pub(crate) default: Option<DefaultFn>,
    pub(crate) consumer: Option<ConsumerFn>,
    pub(crate) universe: Option<UniverseFn>,
    pub(crate) complement: Option<ComplementFn>,
    pub(crate) unwind: Option<UnwindFn>,
    pub(crate) groups: Vec<String>,
}

impl fmt::Debug for TemplateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSpec")
            .field("name", &self.name)
            .field("reuse", &self.reuse)
            .finish()
    }
}

impl TemplateSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inherit unset fields from the named, previously declared
    /// descriptor.
    pub fn reuse(mut self, other: impl Into<String>) -> Self {
        self.reuse = Some(other.into());
        self
    }

    pub fn value_type(mut self, t: impl ValueType + 'static) -> Self {
        self.value_type = Some(Arc::new(t));
        self
    }

    pub fn composite(mut self, t: impl CompositeType + 'static) -> Self {
        self.composite = Some(Arc::new(t));
        self
    }

    /// Format pattern with a single `%s` placeholder.
    pub fn format_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.format = Some(Format::Pattern(pattern.into()));
        self
    }

    pub fn format_with(
        mut self,
        f: impl Fn(&Value) -> String + Send + Sync + 'static,
    ) -> Self {
        self.format = Some(Format::Custom(Arc::new(f)));
        self
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(Some(max));
        self
    }

    /// Explicitly unbounded cardinality (overrides an inherited `max`).
    pub fn no_max(mut self) -> Self {
        self.max = Some(None);
        self
    }

    /// Keep the rightmost `max` atoms on overflow instead of the
    /// leftmost.
    pub fn shift(mut self, shift: bool) -> Self {
        self.shift = Some(shift);
        self
    }

    /// Preserve empty atoms as meaningful nulls.
    pub fn empty(mut self, empty: bool) -> Self {
        self.empty = Some(empty);
        self
    }

    /// Fail with `TooMany` on overflow instead of capping.
    pub fn no_truncate(mut self) -> Self {
        self.truncate = Some(false);
        self
    }

    /// Descending set/range ordering on serialization.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = Some(reverse);
        self
    }

    pub fn depends<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn conflicts<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflicts = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Ordered list of parameters whose values feed the consumer.
    pub fn consumes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.consumes = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn default_with(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(Arc::new(f));
        self
    }

    /// Constant default value.
    pub fn default_value(self, value: Value) -> Self {
        self.default_with(move || value.clone())
    }

    pub fn consumer(
        mut self,
        f: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        self.consumer = Some(Arc::new(f));
        self
    }

    pub fn universe(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.universe = Some(Arc::new(f));
        self
    }

    /// Constant universe value.
    pub fn universe_value(self, value: Value) -> Self {
        self.universe(move || value.clone())
    }

    pub fn complement(
        mut self,
        f: impl Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.complement = Some(Arc::new(f));
        self
    }

    pub fn unwind(
        mut self,
        f: impl Fn(&Template, &Value) -> (Vec<Value>, bool) + Send + Sync + 'static,
    ) -> Self {
        self.unwind = Some(Arc::new(f));
        self
    }

    /// Register this parameter into named registry groups.
    pub fn groups<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = names.into_iter().map(Into::into).collect();
        self
    }

    /// Fill unset fields from `base` (the `reuse` merge).  `name`,
    /// `reuse`, and group registrations are never inherited.
    pub(crate) fn merge_from(&mut self, base: &TemplateSpec) {
        macro_rules! inherit {
            ($field:ident) => {
                if self.$field.is_none() {
                    self.$field = base.$field.clone();
                }
            };
        }
        inherit!(value_type);
        inherit!(composite);
        inherit!(format);
        inherit!(min);
        inherit!(max);
        inherit!(shift);
        inherit!(empty);
        inherit!(truncate);
        inherit!(reverse);
        inherit!(depends);
        inherit!(conflicts);
        inherit!(consumes);
        inherit!(default);
        inherit!(consumer);
        inherit!(universe);
        inherit!(complement);
        inherit!(unwind);
    }

    /// Apply defaults and produce the immutable template.  Edge
    /// normalization (symmetric conflicts, consumes implications) and
    /// universe caching happen in the registry builder, which sees all
    /// templates at once.
    pub(crate) fn into_template(self) -> Template {
        Template {
            name: self.name,
            value_type: self
                .value_type
                .unwrap_or_else(|| Arc::new(StrType)),
            composite: self.composite,
            format: self.format.unwrap_or_default(),
            min: self.min.unwrap_or(0),
            max: self.max.unwrap_or(None),
            shift: self.shift.unwrap_or(false),
            empty: self.empty.unwrap_or(false),
            truncate: self.truncate.unwrap_or(true),
            reverse: self.reverse.unwrap_or(false),
            depends: self.depends.unwrap_or_default(),
            conflicts: self.conflicts.unwrap_or_default(),
            consumes: self.consumes.unwrap_or_default(),
            default: self.default,
            consumer: self.consumer,
            universe: self.universe,
            complement: self.complement,
            unwind: self.unwind,
            unicache: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_type::{IntType, SetOf};

    fn template(spec: TemplateSpec) -> Template {
        let mut t = spec.into_template();
        t.refresh();
        t
    }

    fn strs(atoms: &[&str]) -> Vec<Value> {
        atoms.iter().map(|s| Value::from(*s)).collect()
    }

    // -- process: cardinality --

    #[test]
    fn cap_keeps_leftmost_by_default() {
        let t = template(TemplateSpec::new("k").max(2));
        let v = t.process(&strs(&["x", "y", "z"])).unwrap().unwrap();
        assert_eq!(v, Value::Seq(strs(&["x", "y"])));
    }

    #[test]
    fn cap_keeps_rightmost_with_shift() {
        let t = template(TemplateSpec::new("k").max(2).shift(true));
        let v = t.process(&strs(&["x", "y", "z"])).unwrap().unwrap();
        assert_eq!(v, Value::Seq(strs(&["y", "z"])));
    }

    #[test]
    fn overflow_fails_when_truncation_disabled() {
        let t = template(TemplateSpec::new("k").max(2).no_truncate());
        assert_eq!(
            t.process(&strs(&["x", "y", "z"])),
            Err(EvalError::TooMany {
                name: "k".into(),
                have: 3,
                max: 2,
            })
        );
    }

    // -- process: normalization --

    #[test]
    fn coercion_then_check() {
        let t = template(TemplateSpec::new("n").value_type(IntType).max(1));
        assert_eq!(
            t.process(&strs(&["42"])).unwrap(),
            Some(Value::Int(42))
        );
        assert_eq!(
            t.process(&strs(&["4x"])),
            Err(EvalError::BadAtom {
                name: "n".into(),
                index: 0,
                type_name: "int".into(),
                cause: "4x".into(),
            })
        );
    }

    #[test]
    fn empty_atoms_dropped_by_default() {
        let t = template(TemplateSpec::new("k").max(1));
        assert_eq!(t.process(&strs(&[""])).unwrap(), None);
    }

    #[test]
    fn empty_atoms_preserved_when_enabled() {
        let t = template(TemplateSpec::new("k").max(1).empty(true));
        assert_eq!(t.process(&strs(&[""])).unwrap(), Some(Value::Null));
    }

    #[test]
    fn preserved_null_survives_in_sequences() {
        let t = template(TemplateSpec::new("k").empty(true));
        let v = t.process(&strs(&["a", "", "b"])).unwrap().unwrap();
        assert_eq!(
            v,
            Value::Seq(vec![Value::from("a"), Value::Null, Value::from("b")])
        );
    }

    // -- process: composite / scalar selection --

    #[test]
    fn composite_collects_atoms() {
        let t = template(
            TemplateSpec::new("s")
                .value_type(IntType)
                .composite(SetOf::new(IntType)),
        );
        let v = t.process(&strs(&["3", "1", "3"])).unwrap().unwrap();
        assert_eq!(v, Value::set(vec![Value::Int(1), Value::Int(3)]));
    }

    #[test]
    fn composite_declining_sequence_coercion_rejected() {
        struct Opaque;
        impl ValueType for Opaque {
            fn name(&self) -> &str {
                "opaque"
            }
            fn check(&self, _: &Value) -> bool {
                true
            }
        }
        impl CompositeType for Opaque {
            fn from_atoms(&self, _: &[Value]) -> Option<Value> {
                None
            }
        }

        let t = template(TemplateSpec::new("s").composite(Opaque));
        assert_eq!(
            t.process(&strs(&["1"])),
            Err(EvalError::UnknownComposite { name: "s".into() })
        );
    }

    #[test]
    fn scalar_selection_at_max_one() {
        let t = template(TemplateSpec::new("k").max(1));
        assert_eq!(
            t.process(&strs(&["only"])).unwrap(),
            Some(Value::from("only"))
        );
    }

    #[test]
    fn unbounded_returns_ordered_sequence() {
        let t = template(TemplateSpec::new("k"));
        assert_eq!(
            t.process(&strs(&["b", "a"])).unwrap(),
            Some(Value::Seq(strs(&["b", "a"])))
        );
    }

    // -- unprocess --

    #[test]
    fn unprocess_null_without_empty_is_omitted() {
        let t = template(TemplateSpec::new("k").max(1));
        assert!(t.unprocess(&Value::Null).is_none());
    }

    #[test]
    fn unprocess_preserved_null_scalar_emits_empty_pair() {
        let t = template(TemplateSpec::new("k").max(1).empty(true));
        let up = t.unprocess(&Value::Null).unwrap();
        assert_eq!(up.strings, vec![String::new()]);
        assert!(!up.complemented);
    }

    #[test]
    fn unprocess_formats_each_atom() {
        let t = template(TemplateSpec::new("k").format_pattern("id-%s"));
        let up = t.unprocess(&Value::Seq(strs(&["a", "b"]))).unwrap();
        assert_eq!(up.strings, vec!["id-a", "id-b"]);
    }

    #[test]
    fn unprocess_orders_sets_and_honors_reverse() {
        let asc = template(TemplateSpec::new("k"));
        let set = Value::set(strs(&["b", "a", "c"]));
        assert_eq!(asc.unprocess(&set).unwrap().strings, vec!["a", "b", "c"]);
        let desc = template(TemplateSpec::new("k").reverse(true));
        assert_eq!(desc.unprocess(&set).unwrap().strings, vec!["c", "b", "a"]);
    }

    #[test]
    fn custom_unwind_forces_complement_flag() {
        let t = template(
            TemplateSpec::new("k")
                .unwind(|_, _| (vec![Value::from("x")], true)),
        );
        let up = t.unprocess(&Value::from("anything")).unwrap();
        assert_eq!(up.strings, vec!["x"]);
        assert!(up.complemented);
    }

    // -- universe / complement --

    #[test]
    fn refresh_populates_universe_cache() {
        let mut t = TemplateSpec::new("k")
            .universe_value(Value::set(strs(&["a", "b"])))
            .complement(set_complement)
            .into_template();
        assert!(!t.can_complement());
        t.refresh();
        assert!(t.can_complement());
        let c = t.complement_of(&Value::set(strs(&["a"]))).unwrap();
        assert_eq!(c, Value::set(strs(&["b"])));
    }

    #[test]
    fn set_complement_passes_non_sets_through() {
        let u = Value::set(strs(&["a", "b"]));
        assert_eq!(set_complement(&Value::from("x"), &u), Value::from("x"));
    }

    // -- reuse merge --

    #[test]
    fn merge_inherits_only_unset_fields() {
        let base = TemplateSpec::new("base").value_type(IntType).max(3).shift(true);
        let mut derived = TemplateSpec::new("derived").max(1);
        derived.merge_from(&base);
        let t = template(derived);
        assert_eq!(t.max(), Some(1));
        assert!(t.shift);
        assert_eq!(t.value_type.name(), "int");
        assert_eq!(t.name(), "derived");
    }
}
