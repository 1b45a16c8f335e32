//! Typed value slots (variables) referenced from formulas as `%N%`

use serde::{Deserialize, Serialize};

/// A declared input/output parameter usable inside an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    /// Human readable name shown in the editor
    pub label: String,
    /// Fully qualified type name used for structure lookups
    #[serde(rename = "$fqn", default)]
    pub fqn: String,
    #[serde(default)]
    pub is_list: bool,
    #[serde(default)]
    pub is_abstract: bool,
    /// Overrides `fqn` for structure resolution (dynamic typing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast_to_fqn: Option<String>,
}

impl Value {
    pub fn new(label: impl Into<String>, fqn: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fqn: fqn.into(),
            is_list: false,
            is_abstract: false,
            cast_to_fqn: None,
        }
    }

    /// Same as [`Value::new`] but marked as a list
    pub fn list(label: impl Into<String>, fqn: impl Into<String>) -> Self {
        Self {
            is_list: true,
            ..Self::new(label, fqn)
        }
    }

    /// Abstract stand-in for a value the expression mentions but nobody declared
    pub fn placeholder(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fqn: String::new(),
            is_list: false,
            is_abstract: true,
            cast_to_fqn: None,
        }
    }

    pub fn with_cast(mut self, fqn: impl Into<String>) -> Self {
        self.cast_to_fqn = Some(fqn.into());
        self
    }

    /// Type name to resolve structures against
    pub fn effective_fqn(&self) -> &str {
        match self.cast_to_fqn.as_deref() {
            Some(cast) if !cast.is_empty() => cast,
            _ => &self.fqn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_fqn_prefers_cast() {
        let value = Value::new("order", "com.acme.Order").with_cast("com.acme.RushOrder");
        assert_eq!(value.effective_fqn(), "com.acme.RushOrder");
    }

    #[test]
    fn test_empty_cast_is_ignored() {
        let value = Value::new("order", "com.acme.Order").with_cast("");
        assert_eq!(value.effective_fqn(), "com.acme.Order");
    }

    #[test]
    fn test_placeholder_is_abstract() {
        let value = Value::placeholder("%7%");
        assert!(value.is_abstract);
        assert_eq!(value.label, "%7%");
        assert!(value.fqn.is_empty());
    }

    #[test]
    fn test_deserialize_dollar_fqn() {
        let yaml = "label: customer\n$fqn: com.acme.Customer\nis_list: true\n";
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(value.fqn, "com.acme.Customer");
        assert!(value.is_list);
        assert!(!value.is_abstract);
    }
}
