//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::sync::Arc;

use xfl_editor::model::{Formula, Part, PartId, Value};
use xfl_editor::structure::{StaticResolver, Structure, StructureChild, TypeRef};

/// Input declarations used across tests: `%0%` order, `%1%` customer,
/// `%2%` a list of order lines
pub fn variables() -> Vec<Value> {
    vec![
        Value::new("order", "com.acme.Order"),
        Value::new("customer", "com.acme.Customer"),
        Value::list("lines", "com.acme.Line"),
    ]
}

/// Parse with the shared declarations
pub fn formula(expression: &str) -> Formula {
    Formula::parse(expression, variables(), vec![])
}

/// Raw text of every part, in order
pub fn texts(formula: &Formula) -> Vec<String> {
    formula.parts().iter().map(|p| p.text().to_string()).collect()
}

/// Kind labels of every part, in order
pub fn kinds(formula: &Formula) -> Vec<&'static str> {
    formula.parts().iter().map(Part::kind_name).collect()
}

/// Id of the first part with the given text
pub fn part_id(formula: &Formula, text: &str) -> PartId {
    formula
        .parts()
        .iter()
        .find(|p| p.text() == text)
        .map(|p| p.id)
        .unwrap_or_else(|| panic!("no part {:?} in {:?}", text, formula.expression()))
}

pub fn field(name: &str, fqn: &str) -> StructureChild {
    StructureChild::Field {
        name: name.into(),
        type_ref: TypeRef::new(fqn),
    }
}

pub fn method(name: &str, returns: &str) -> StructureChild {
    StructureChild::Method {
        name: name.into(),
        returns: vec![TypeRef::new(returns)],
    }
}

/// Structures matching [`variables`]
pub fn structures() -> Vec<Structure> {
    vec![
        Structure {
            fqn: "com.acme.Order".into(),
            children: vec![
                field("customer", "com.acme.Customer"),
                field("id", "java.lang.String"),
                method("total", "java.math.BigDecimal"),
            ],
        },
        Structure {
            fqn: "com.acme.Customer".into(),
            children: vec![
                field("name", "java.lang.String"),
                field("address", "com.acme.Address"),
            ],
        },
        Structure {
            fqn: "com.acme.Address".into(),
            children: vec![field("city", "java.lang.String")],
        },
        Structure {
            fqn: "com.acme.Line".into(),
            children: vec![field("sku", "java.lang.String")],
        },
    ]
}

pub fn resolver() -> Arc<StaticResolver> {
    Arc::new(StaticResolver::new(structures()))
}
