//! Value type adapters: the façade between templates and whatever type
//! system describes atom shapes.
//!
//! A [`ValueType`] exposes exactly three things: a membership check, an
//! optional coercion, and a human-readable name for error messages.
//! Composite adapters implement [`CompositeType`] on top of that and
//! additionally build one value from an ordered sequence of atoms;
//! only a `CompositeType` can sit in a template's composite position.
//!
//! Adapters are stateless and shared behind `Arc<dyn ValueType>` or
//! `Arc<dyn CompositeType>`.

use std::sync::Arc;

use crate::value::Value;

/// Uniform interface over an upstream type constraint.
pub trait ValueType: Send + Sync {
    /// Human-readable type name, used in `BadAtom` errors.
    fn name(&self) -> &str;

    /// Membership check.  Never sees a preserved null; the pipeline
    /// short-circuits those.
    fn check(&self, value: &Value) -> bool;

    /// Optional coercion.  `None` means either no coercion is defined or
    /// the coercion does not apply to this input; in both cases the atom
    /// is left unchanged and `check` decides its fate.
    fn coerce(&self, value: &Value) -> Option<Value> {
        let _ = value;
        None
    }
}

/// A value type that can also be built from an ordered sequence of
/// atoms.  `None` from `from_atoms` means the adapter declines the
/// sequence coercion; a template using it in composite position then
/// fails with `UnknownComposite`.
pub trait CompositeType: ValueType {
    fn from_atoms(&self, atoms: &[Value]) -> Option<Value>;
}

/// The default atom type: any string, no coercion.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrType;

impl ValueType for StrType {
    fn name(&self) -> &str {
        "str"
    }

    fn check(&self, value: &Value) -> bool {
        matches!(value, Value::Str(_))
    }
}

/// Decimal integers; coerces string atoms.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntType;

impl ValueType for IntType {
    fn name(&self) -> &str {
        "int"
    }

    fn check(&self, value: &Value) -> bool {
        matches!(value, Value::Int(_))
    }

    fn coerce(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Str(s) => s.parse::<i64>().ok().map(Value::Int),
            _ => None,
        }
    }
}

/// Booleans; coerces `true`/`false`/`1`/`0` string atoms.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolType;

impl ValueType for BoolType {
    fn name(&self) -> &str {
        "bool"
    }

    fn check(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(_))
    }

    fn coerce(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Str(s) => match s.as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Composite adapter collecting atoms into an ordered, deduplicated set.
///
/// Element atoms are delegated to the inner adapter for checking; the
/// composite itself accepts any `Value::Set` whose members all pass.
pub struct SetOf {
    elem: Arc<dyn ValueType>,
    name: String,
}

impl SetOf {
    pub fn new(elem: impl ValueType + 'static) -> Self {
        let name = format!("set<{}>", elem.name());
        Self {
            elem: Arc::new(elem),
            name,
        }
    }
}

impl ValueType for SetOf {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, value: &Value) -> bool {
        match value {
            Value::Set(members) => members
                .iter()
                .all(|m| m.is_null() || self.elem.check(m)),
            _ => false,
        }
    }
}

impl CompositeType for SetOf {
    fn from_atoms(&self, atoms: &[Value]) -> Option<Value> {
        Some(Value::Set(atoms.iter().cloned().collect()))
    }
}

/// Composite adapter that keeps the ordered sequence as-is.
pub struct SeqOf {
    elem: Arc<dyn ValueType>,
    name: String,
}

impl SeqOf {
    pub fn new(elem: impl ValueType + 'static) -> Self {
        let name = format!("seq<{}>", elem.name());
        Self {
            elem: Arc::new(elem),
            name,
        }
    }
}

impl ValueType for SeqOf {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, value: &Value) -> bool {
        match value {
            Value::Seq(items) => items.iter().all(|i| i.is_null() || self.elem.check(i)),
            _ => false,
        }
    }
}

impl CompositeType for SeqOf {
    fn from_atoms(&self, atoms: &[Value]) -> Option<Value> {
        Some(Value::Seq(atoms.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_type_accepts_strings_only() {
        assert!(StrType.check(&Value::from("x")));
        assert!(!StrType.check(&Value::from(3)));
        assert!(StrType.coerce(&Value::from("x")).is_none());
    }

    #[test]
    fn int_type_coerces_decimal_strings() {
        assert_eq!(IntType.coerce(&Value::from("42")), Some(Value::Int(42)));
        assert_eq!(IntType.coerce(&Value::from("-7")), Some(Value::Int(-7)));
        assert!(IntType.coerce(&Value::from("4x")).is_none());
        assert!(IntType.check(&Value::Int(1)));
        assert!(!IntType.check(&Value::from("1")));
    }

    #[test]
    fn bool_type_coerces_known_spellings() {
        assert_eq!(BoolType.coerce(&Value::from("true")), Some(Value::Bool(true)));
        assert_eq!(BoolType.coerce(&Value::from("0")), Some(Value::Bool(false)));
        assert!(BoolType.coerce(&Value::from("yes")).is_none());
    }

    #[test]
    fn set_of_builds_deduplicated_sets() {
        let t = SetOf::new(IntType);
        let v = t
            .from_atoms(&[Value::Int(2), Value::Int(1), Value::Int(2)])
            .expect("set composite");
        assert_eq!(v, Value::set(vec![Value::Int(1), Value::Int(2)]));
        assert!(t.check(&v));
        assert_eq!(t.name(), "set<int>");
    }

    #[test]
    fn set_of_rejects_foreign_members() {
        let t = SetOf::new(IntType);
        assert!(!t.check(&Value::set(vec![Value::from("a")])));
        assert!(!t.check(&Value::from(1)));
    }

    #[test]
    fn seq_of_preserves_order() {
        let t = SeqOf::new(StrType);
        let v = t
            .from_atoms(&[Value::from("b"), Value::from("a")])
            .expect("seq composite");
        assert_eq!(v, Value::Seq(vec![Value::from("b"), Value::from("a")]));
        assert_eq!(t.name(), "seq<str>");
    }
}
