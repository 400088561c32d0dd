//! Contraceptive method registry.
//!
//! Methods are kept in insertion order and addressed by name. The order
//! doubles as the row/column order of every switching matrix, so the
//! registry never reorders or removes entries. Slot 0 is always the
//! none-method (not using contraception), which everything else measures
//! against.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Name of a contraceptive method, e.g. `"Injectables"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodName(pub String);

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MethodName {
    fn from(s: &str) -> Self {
        MethodName(s.to_string())
    }
}

impl From<String> for MethodName {
    fn from(s: String) -> Self {
        MethodName(s)
    }
}

/// Per-method parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    /// Annual probability that the method prevents conception while in use.
    pub efficacy: f64,
}

/// Ordered method registry.
///
/// A fresh registry contains only the none-method. Adding a method appends
/// it; there is no removal, so indices handed out by [`Methods::index_of`]
/// stay valid for the life of the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Methods {
    entries: IndexMap<MethodName, MethodDef>,
}

impl Methods {
    /// Name reserved for the none-method.
    pub const NONE: &'static str = "None";

    pub fn new() -> Self {
        let mut entries = IndexMap::new();
        entries.insert(MethodName::from(Self::NONE), MethodDef { efficacy: 0.0 });
        Methods { entries }
    }

    /// Appends a method. Efficacy must be a probability.
    pub fn add(&mut self, name: impl Into<MethodName>, efficacy: f64) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(ModelError::DuplicateMethod(name));
        }
        check_probability(&format!("efficacy of {name}"), efficacy)?;
        self.entries.insert(name, MethodDef { efficacy });
        Ok(())
    }

    /// The none-method's name. Index 0 for every registry built through
    /// this API; falls back to [`Methods::NONE`] for a hollow deserialized
    /// registry, which [`Methods::validate`] rejects anyway.
    pub fn none(&self) -> MethodName {
        self.entries
            .get_index(0)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| MethodName::from(Self::NONE))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &MethodName) -> bool {
        self.entries.contains_key(name)
    }

    /// Position of a method in the registry order.
    pub fn index_of(&self, name: &MethodName) -> Option<usize> {
        self.entries.get_index_of(name)
    }

    /// Like [`Methods::index_of`], but an error for unknown names.
    pub fn require(&self, name: &MethodName) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| ModelError::UnknownMethod(name.clone()))
    }

    pub fn name_at(&self, index: usize) -> Option<&MethodName> {
        self.entries.get_index(index).map(|(name, _)| name)
    }

    pub fn get(&self, name: &MethodName) -> Option<&MethodDef> {
        self.entries.get(name)
    }

    pub fn set_efficacy(&mut self, name: &MethodName, efficacy: f64) -> Result<()> {
        check_probability(&format!("efficacy of {name}"), efficacy)?;
        match self.entries.get_mut(name) {
            Some(def) => {
                def.efficacy = efficacy;
                Ok(())
            }
            None => Err(ModelError::UnknownMethod(name.clone())),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &MethodName> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MethodName, &MethodDef)> {
        self.entries.iter()
    }

    /// Registry invariants: non-empty, none-method first with zero efficacy,
    /// every efficacy a probability. Deserialized registries are checked via
    /// [`crate::config::ModelConfig::validate`].
    pub fn validate(&self) -> Result<()> {
        let (first, def) = self
            .entries
            .get_index(0)
            .ok_or_else(|| ModelError::InvalidMethods("no methods registered".into()))?;
        if first.0 != Self::NONE {
            return Err(ModelError::InvalidMethods(format!(
                "first method must be {}, found {first}",
                Self::NONE
            )));
        }
        if def.efficacy != 0.0 {
            return Err(ModelError::InvalidMethods(format!(
                "the none-method cannot have efficacy {}",
                def.efficacy
            )));
        }
        for (name, def) in &self.entries {
            check_probability(&format!("efficacy of {name}"), def.efficacy)?;
        }
        Ok(())
    }
}

impl Default for Methods {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn check_probability(context: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ModelError::InvalidProbability {
            context: context.to_string(),
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_registry_has_only_none() {
        let methods = Methods::new();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods.none(), MethodName::from("None"));
        assert_eq!(methods.index_of(&MethodName::from("None")), Some(0));
    }

    #[test]
    fn add_preserves_insertion_order() {
        let mut methods = Methods::new();
        methods.add("Pill", 0.945).unwrap();
        methods.add("Injectables", 0.983).unwrap();
        let names: Vec<_> = methods.names().map(|n| n.0.as_str()).collect();
        assert_eq!(names, vec!["None", "Pill", "Injectables"]);
        assert_eq!(methods.index_of(&MethodName::from("Injectables")), Some(2));
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut methods = Methods::new();
        methods.add("Pill", 0.945).unwrap();
        let err = methods.add("Pill", 0.5).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateMethod(name) if name.0 == "Pill"));
    }

    #[test]
    fn efficacy_must_be_a_probability() {
        let mut methods = Methods::new();
        assert!(methods.add("Pill", 1.2).is_err());
        assert!(methods.add("Pill", -0.1).is_err());
        assert!(methods.add("Pill", f64::NAN).is_err());
        methods.add("Pill", 0.945).unwrap();
        let err = methods
            .set_efficacy(&MethodName::from("Pill"), 1.01)
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidProbability { .. }));
    }

    #[test]
    fn validate_rejects_nonzero_none_efficacy() {
        let mut methods = Methods::new();
        methods
            .set_efficacy(&MethodName::from("None"), 0.25)
            .unwrap();
        assert!(matches!(
            methods.validate(),
            Err(ModelError::InvalidMethods(_))
        ));
    }

    #[test]
    fn serde_round_trip_keeps_order() {
        let mut methods = Methods::new();
        methods.add("Pill", 0.945).unwrap();
        methods.add("IUDs", 0.986).unwrap();
        let json = serde_json::to_string(&methods).unwrap();
        let back: Methods = serde_json::from_str(&json).unwrap();
        assert_eq!(back, methods);
        assert_eq!(back.none().0, "None");
    }
}
