//! Structure lookup tests: caching, deduplication, stale results and the
//! background runtime

mod common;

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{part_id, resolver, variables};
use xfl_editor::commands::Cmd;
use xfl_editor::config::EditorConfig;
use xfl_editor::messages::{FormulaMsg, Msg, StructureMsg, TemplateMsg};
use xfl_editor::model::{EditorModel, FormulaId, MemberClass, Value};
use xfl_editor::runtime::Runtime;
use xfl_editor::structure::{CatalogResolver, RuntimeContext, StructureKey, StructureResolver};
use xfl_editor::update::update;

const WAIT: Duration = Duration::from_secs(5);

/// Resolve `key` synchronously and feed the result back through `update`
fn deliver(model: &mut EditorModel, key: StructureKey) -> Option<Cmd> {
    let result = resolver().resolve(&key).map_err(|e| e.to_string());
    update(model, Msg::Structure(StructureMsg::Resolved { key, result }))
}

fn keys(cmd: &Option<Cmd>) -> Vec<StructureKey> {
    cmd.iter()
        .flat_map(|c| c.structure_keys())
        .cloned()
        .collect()
}

fn class_of(model: &EditorModel, id: FormulaId, member: &str) -> MemberClass {
    let formula = model.formula(id).unwrap();
    formula
        .part(part_id(formula, member))
        .and_then(|p| p.member())
        .map(|m| m.class)
        .unwrap()
}

fn open(model: &mut EditorModel, expression: &str) -> (FormulaId, Option<Cmd>) {
    let id = model.open_formula(expression, variables(), vec![]);
    let cmd = update(model, Msg::resolve_members(id));
    (id, cmd)
}

// ========================================================================
// Update-Level Resolution
// ========================================================================

#[test]
fn test_chain_resolves_one_owner_at_a_time() {
    let mut model = EditorModel::default();
    let (id, cmd) = open(&mut model, "%0%.customer.address.city");

    let first = keys(&cmd);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].fqn, "com.acme.Order");

    let cmd = deliver(&mut model, first[0].clone());
    assert_eq!(class_of(&model, id, ".customer"), MemberClass::Variable);
    let second = keys(&cmd);
    assert_eq!(second[0].fqn, "com.acme.Customer");

    let cmd = deliver(&mut model, second[0].clone());
    let third = keys(&cmd);
    assert_eq!(third[0].fqn, "com.acme.Address");

    assert_eq!(deliver(&mut model, third[0].clone()), None);
    assert_eq!(class_of(&model, id, ".city"), MemberClass::Variable);
}

#[test]
fn test_concurrent_requests_are_deduplicated() {
    let mut model = EditorModel::default();
    let (a, first) = open(&mut model, "%0%.id");
    let (b, second) = open(&mut model, "%0%.total()");

    assert_eq!(keys(&first).len(), 1);
    assert!(keys(&second).is_empty());
    assert_eq!(model.structures.in_flight_count(), 1);

    deliver(&mut model, keys(&first)[0].clone());
    assert_eq!(class_of(&model, a, ".id"), MemberClass::Variable);
    assert_eq!(class_of(&model, b, ".total"), MemberClass::Function);
    assert_eq!(model.structures.in_flight_count(), 0);
}

#[test]
fn test_cached_structure_classifies_immediately() {
    let mut model = EditorModel::default();
    let (_, cmd) = open(&mut model, "%0%.id");
    deliver(&mut model, keys(&cmd)[0].clone());

    let (id, cmd) = open(&mut model, "%0%.customer");
    assert_eq!(cmd, None);
    assert_eq!(class_of(&model, id, ".customer"), MemberClass::Variable);
}

#[test]
fn test_stale_result_for_renamed_member_is_dropped() {
    let mut model = EditorModel::default();
    let (id, cmd) = open(&mut model, "%0%.nope");
    let key = keys(&cmd)[0].clone();

    let member = part_id(model.formula(id).unwrap(), ".nope");
    update(
        &mut model,
        Msg::Formula(
            id,
            FormulaMsg::SetPartText {
                part: member,
                text: ".customer".into(),
            },
        ),
    );

    deliver(&mut model, key);
    let formula = model.formula(id).unwrap();
    let settled = formula.part(member).unwrap().member().unwrap();
    assert_eq!(settled.name, "customer");
    assert_eq!(settled.class, MemberClass::Variable);
    assert_eq!(settled.value.fqn, "com.acme.Customer");
}

#[test]
fn test_result_for_removed_part_is_ignored() {
    let mut model = EditorModel::default();
    let (id, cmd) = open(&mut model, "%0%.id");
    let member = part_id(model.formula(id).unwrap(), ".id");
    update(&mut model, Msg::Formula(id, FormulaMsg::RemovePart(member)));

    assert_eq!(deliver(&mut model, keys(&cmd)[0].clone()), None);
    assert_eq!(model.formula(id).unwrap().expression(), "%0%");
}

#[test]
fn test_result_for_closed_formula_is_ignored() {
    let mut model = EditorModel::default();
    let (id, cmd) = open(&mut model, "%0%.id");
    update(&mut model, Msg::Formula(id, FormulaMsg::Close));

    assert_eq!(deliver(&mut model, keys(&cmd)[0].clone()), None);
    assert_eq!(model.structures.cache().len(), 1);
}

#[test]
fn test_failed_resolve_falls_back_to_spelling() {
    let mut model = EditorModel::default();
    let id = model.open_formula(
        "%0%.a.b()",
        vec![Value::new("x", "com.acme.Unknown")],
        vec![],
    );
    let cmd = update(&mut model, Msg::resolve_members(id));
    let cmd = deliver(&mut model, keys(&cmd)[0].clone());

    // `.a` settles with an untyped value, so `.b` resolves against nothing
    assert_eq!(cmd, None);
    assert_eq!(class_of(&model, id, ".a"), MemberClass::Variable);
    assert_eq!(class_of(&model, id, ".b"), MemberClass::Function);
}

#[test]
fn test_missing_type_name_needs_no_fetch() {
    let mut model = EditorModel::default();
    let id = model.open_formula("%0%.anything", vec![Value::new("x", "")], vec![]);
    assert_eq!(update(&mut model, Msg::resolve_members(id)), None);
    assert_eq!(class_of(&model, id, ".anything"), MemberClass::Variable);
}

#[test]
fn test_long_member_chain_settles_in_one_update() {
    let chain = 2_000;
    let expression = format!("%0%{}", ".a".repeat(chain));
    let mut model = EditorModel::default();
    let id = model.open_formula(&expression, vec![Value::new("x", "")], vec![]);

    let started = Instant::now();
    assert_eq!(update(&mut model, Msg::resolve_members(id)), None);
    assert!(started.elapsed() < Duration::from_secs(10));

    let formula = model.formula(id).unwrap();
    let settled = formula
        .parts()
        .iter()
        .filter_map(|p| p.member())
        .filter(|m| m.class == MemberClass::Variable)
        .count();
    assert_eq!(settled, chain);
    assert!(formula.pending_member_lookups(&model.structures).is_empty());
}

#[test]
fn test_context_switch_uses_new_cache_keys() {
    let mut model = EditorModel::default();
    let (id, cmd) = open(&mut model, "%0%.id");
    assert_eq!(keys(&cmd)[0].context, RuntimeContext::default());

    let cmd = update(
        &mut model,
        Msg::Structure(StructureMsg::SetContext(RuntimeContext::from("v2"))),
    );
    assert_eq!(keys(&cmd)[0].context, RuntimeContext::from("v2"));
    assert_eq!(model.config.runtime_context, "v2");

    deliver(&mut model, keys(&cmd)[0].clone());
    assert_eq!(class_of(&model, id, ".id"), MemberClass::Variable);
}

#[test]
fn test_cache_capacity_from_config() {
    let config = EditorConfig {
        structure_cache_capacity: 2,
        ..EditorConfig::default()
    };
    let mut model = EditorModel::new(config);
    let (_, cmd) = open(&mut model, "%0%.id+%1%.name+%2%.sku");
    for key in keys(&cmd) {
        deliver(&mut model, key);
    }

    let cache = model.structures.cache();
    assert_eq!(cache.capacity(), 2);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats().evictions, 1);
}

// ========================================================================
// Template Members
// ========================================================================

fn template_member(model: &EditorModel, id: FormulaId, row: usize, item: usize) -> MemberClass {
    let formula = model.template(id).unwrap().formula_item(row, item).unwrap();
    formula.parts().iter().find_map(|p| p.member()).map(|m| m.class).unwrap()
}

#[test]
fn test_template_formulas_get_member_types() {
    let mut model = EditorModel::default();
    let id = model.open_template(r#"concat("Dear ",%1%.name)"#, variables(), vec![]);
    let cmd = update(&mut model, Msg::resolve_template_members(id));
    assert_eq!(template_member(&model, id, 0, 1), MemberClass::Undetermined);

    let key = keys(&cmd)[0].clone();
    assert_eq!(key.fqn, "com.acme.Customer");
    assert_eq!(deliver(&mut model, key), None);
    assert_eq!(template_member(&model, id, 0, 1), MemberClass::Variable);

    // Rows are decoded again on every edit; cached structures settle them at once
    let cmd = update(
        &mut model,
        Msg::Template(
            id,
            TemplateMsg::InsertFormula {
                row: 0,
                index: 2,
                expression: "%1%.address".into(),
            },
        ),
    );
    assert!(keys(&cmd).is_empty());
    assert_eq!(template_member(&model, id, 0, 1), MemberClass::Variable);
    assert_eq!(template_member(&model, id, 0, 3), MemberClass::Variable);
}

#[test]
fn test_template_result_after_row_edit_lands_on_new_rows() {
    let mut model = EditorModel::default();
    let id = model.open_template(r#"concat("Dear ",%1%.name)"#, variables(), vec![]);
    let cmd = update(&mut model, Msg::resolve_template_members(id));
    let key = keys(&cmd)[0].clone();

    // The edit shifts the formula to row 1 while the resolve is still running
    let cmd = update(&mut model, Msg::Template(id, TemplateMsg::InsertRow(0)));
    assert!(keys(&cmd).is_empty());
    assert_eq!(model.structures.in_flight_count(), 1);

    assert_eq!(deliver(&mut model, key), None);
    assert_eq!(template_member(&model, id, 1, 1), MemberClass::Variable);
}

// ========================================================================
// Runtime
// ========================================================================

#[test]
fn test_runtime_resolves_each_type_once() {
    let resolver = resolver();
    let mut runtime = Runtime::new(EditorModel::default(), resolver.clone());
    let a = runtime.open_formula("%0%.customer.name", variables(), vec![]);
    let b = runtime.open_formula("%0%.customer.address", variables(), vec![]);
    assert!(runtime.run_until_idle(WAIT));

    assert_eq!(class_of(runtime.model(), a, ".name"), MemberClass::Variable);
    assert_eq!(class_of(runtime.model(), b, ".address"), MemberClass::Variable);
    // Order and Customer; the second formula joins or hits the cache
    assert_eq!(resolver.calls(), 2);
}

#[test]
fn test_runtime_with_catalog_contexts() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
        file,
        r#"
structures:
  - $fqn: com.acme.Order
    children:
      - kind: field
        name: id
        type: {{ $fqn: java.lang.String }}
contexts:
  v2:
    - $fqn: com.acme.Order
      children:
        - kind: method
          name: id
          returns:
            - $fqn: java.util.UUID
"#
    )
    .unwrap();

    let catalog: Arc<dyn StructureResolver> =
        Arc::new(CatalogResolver::load(file.path()).unwrap());
    let mut runtime = Runtime::new(EditorModel::default(), catalog.clone());
    let shared = runtime.open_formula("%0%.id", variables(), vec![]);
    assert!(runtime.run_until_idle(WAIT));
    assert_eq!(class_of(runtime.model(), shared, ".id"), MemberClass::Variable);

    let config = EditorConfig {
        runtime_context: "v2".into(),
        ..EditorConfig::default()
    };
    let mut runtime = Runtime::new(EditorModel::new(config), catalog);
    let versioned = runtime.open_formula("%0%.id", variables(), vec![]);
    assert!(runtime.run_until_idle(WAIT));
    assert_eq!(class_of(runtime.model(), versioned, ".id"), MemberClass::Function);
}
