//! Application model - the complete state of the formula editor
//!
//! This module contains all the state types following the Elm Architecture pattern.

pub mod brackets;
pub mod formula;
pub mod functions;
pub mod part;
pub mod value;

pub use brackets::brackets_valid;
pub use formula::{
    keystroke_part, AddOutcome, Formula, FormulaOptions, MemberLookup, VisibleWindow,
};
pub use functions::{FunctionContext, FunctionInfo, FunctionScope};
pub use part::{
    FunctionPart, MemberClass, MemberPart, NewPart, Operator, Part, PartId, PartKind,
    SpecialToken,
};
pub use value::Value;

use std::collections::HashMap;
use std::fmt;

use crate::config::EditorConfig;
use crate::structure::{LookupTarget, StructureCache, StructureState};
use crate::template::Template;

/// Identifier of an open formula or template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormulaId(pub u64);

impl fmt::Display for FormulaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "formula-{}", self.0)
    }
}

/// The complete editor model
#[derive(Debug)]
pub struct EditorModel {
    pub formulas: HashMap<FormulaId, Formula>,
    pub templates: HashMap<FormulaId, Template>,
    /// Structure cache and pending lookups, shared by all formulas
    pub structures: StructureState,
    pub config: EditorConfig,
    next_id: u64,
}

impl Default for EditorModel {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorModel {
    pub fn new(config: EditorConfig) -> Self {
        let structures = StructureState::new(
            StructureCache::new(config.structure_cache_capacity),
            config.context(),
        );
        Self {
            formulas: HashMap::new(),
            templates: HashMap::new(),
            structures,
            config,
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> FormulaId {
        let id = FormulaId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Parse `expression` into a new formula
    pub fn open_formula(
        &mut self,
        expression: &str,
        input: Vec<Value>,
        output: Vec<Value>,
    ) -> FormulaId {
        let id = self.allocate_id();
        let mut formula = Formula::new(input, output).with_options(self.config.formula_options());
        let outcome = formula.parse_expression(expression);
        tracing::debug!(
            %id,
            parts = formula.len(),
            skipped = outcome.skipped.len(),
            "Opened formula"
        );
        self.formulas.insert(id, formula);
        id
    }

    /// Decode `expression` as a `concat(...)` template
    pub fn open_template(
        &mut self,
        expression: &str,
        input: Vec<Value>,
        output: Vec<Value>,
    ) -> FormulaId {
        let id = self.allocate_id();
        let template = Template::parse(expression, input, output, self.config.formula_options());
        tracing::debug!(%id, rows = template.rows().len(), "Opened template");
        self.templates.insert(id, template);
        id
    }

    pub fn formula(&self, id: FormulaId) -> Option<&Formula> {
        self.formulas.get(&id)
    }

    pub fn formula_mut(&mut self, id: FormulaId) -> Option<&mut Formula> {
        self.formulas.get_mut(&id)
    }

    pub fn template(&self, id: FormulaId) -> Option<&Template> {
        self.templates.get(&id)
    }

    pub fn template_mut(&mut self, id: FormulaId) -> Option<&mut Template> {
        self.templates.get_mut(&id)
    }

    /// The formula a member lookup was started for, if it is still the same
    /// one. Template items from an earlier revision are gone.
    pub fn target_formula(&self, target: LookupTarget) -> Option<&Formula> {
        match target {
            LookupTarget::Formula(id) => self.formulas.get(&id),
            LookupTarget::TemplateItem {
                template,
                row,
                item,
                revision,
            } => self
                .templates
                .get(&template)
                .filter(|t| t.revision() == revision)?
                .formula_item(row, item),
        }
    }

    pub fn target_formula_mut(&mut self, target: LookupTarget) -> Option<&mut Formula> {
        match target {
            LookupTarget::Formula(id) => self.formulas.get_mut(&id),
            LookupTarget::TemplateItem {
                template,
                row,
                item,
                revision,
            } => self
                .templates
                .get_mut(&template)
                .filter(|t| t.revision() == revision)?
                .formula_item_mut(row, item),
        }
    }

    /// Drop a formula or template; lookups still running for it become no-ops
    pub fn close(&mut self, id: FormulaId) -> bool {
        self.formulas.remove(&id).is_some() || self.templates.remove(&id).is_some()
    }
}
