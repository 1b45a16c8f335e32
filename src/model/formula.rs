//! Formula: the part sequence of one expression
//!
//! The formula owns its parts in source order. `expression` is always the
//! concatenation of the parts' raw text and is re-derived, together with the
//! visible window, after every structural change.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::brackets::{brackets_valid, SuffixBrackets};
use super::part::{MemberClass, NewPart, Operator, Part, PartId, PartKind, SpecialToken};
use super::value::Value;
use crate::expression::Expression;
use crate::parser::{self, MatchContext, ParseOutcome, DEFAULT_ITERATION_LIMIT};
use crate::structure::StructureLookup;

/// Per-formula parsing and display options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaOptions {
    pub iteration_limit: usize,
    /// A lone `?` is kept in the model but excluded from the visible window
    pub hide_question_mark: bool,
}

impl Default for FormulaOptions {
    fn default() -> Self {
        Self {
            iteration_limit: DEFAULT_ITERATION_LIMIT,
            hide_question_mark: true,
        }
    }
}

/// Result of inserting a part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted(PartId),
    /// The new part was absorbed by its predecessor
    Merged(PartId),
    Rejected,
}

impl AddOutcome {
    pub fn part(self) -> Option<PartId> {
        match self {
            AddOutcome::Inserted(id) | AddOutcome::Merged(id) => Some(id),
            AddOutcome::Rejected => None,
        }
    }
}

/// Sub-range of parts shown to the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleWindow {
    pub parts: Vec<PartId>,
    /// `¿` sentinel when the window is explicit
    pub before: Option<PartId>,
    /// `?` sentinel when the window is explicit
    pub after: Option<PartId>,
}

/// Member access waiting for its owner's structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberLookup {
    pub part: PartId,
    pub generation: u64,
    pub owner: PartId,
    pub owner_fqn: String,
}

#[derive(Debug, Clone)]
pub struct Formula {
    parts: Vec<Part>,
    /// Arena index of every part, rebuilt with the expression
    positions: HashMap<PartId, usize>,
    expression: String,
    input: Vec<Value>,
    output: Vec<Value>,
    variables: Vec<Value>,
    visible: VisibleWindow,
    options: FormulaOptions,
    next_id: u64,
    revision: u64,
}

impl Default for Formula {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl Formula {
    pub fn new(input: Vec<Value>, output: Vec<Value>) -> Self {
        let variables = input.iter().chain(output.iter()).cloned().collect();
        Self {
            parts: Vec::new(),
            positions: HashMap::new(),
            expression: String::new(),
            input,
            output,
            variables,
            visible: VisibleWindow::default(),
            options: FormulaOptions::default(),
            next_id: 1,
            revision: 0,
        }
    }

    pub fn with_options(mut self, options: FormulaOptions) -> Self {
        self.options = options;
        self.refresh();
        self
    }

    /// Construct and parse in one step
    pub fn parse(expression: &str, input: Vec<Value>, output: Vec<Value>) -> Self {
        let mut formula = Self::new(input, output);
        formula.parse_expression(expression);
        formula
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.index_of(id).map(|index| &self.parts[index])
    }

    pub fn index_of(&self, id: PartId) -> Option<usize> {
        self.positions
            .get(&id)
            .copied()
            .filter(|&index| self.parts.get(index).is_some_and(|p| p.id == id))
    }

    pub fn input(&self) -> &[Value] {
        &self.input
    }

    pub fn output(&self) -> &[Value] {
        &self.output
    }

    /// Input followed by output declarations; `%N%` indexes into this
    pub fn variables(&self) -> &[Value] {
        &self.variables
    }

    pub fn options(&self) -> FormulaOptions {
        self.options
    }

    /// Bumped on every change of the part sequence or part text
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn visible_window(&self) -> &VisibleWindow {
        &self.visible
    }

    pub fn visible_parts(&self) -> impl Iterator<Item = &Part> + '_ {
        self.visible.parts.iter().filter_map(move |id| self.part(*id))
    }

    pub fn visible_expression(&self) -> String {
        self.visible_parts().map(Part::text).collect()
    }

    pub fn part_before_visible_part(&self) -> Option<&Part> {
        self.visible.before.and_then(|id| self.part(id))
    }

    pub fn part_after_visible_part(&self) -> Option<&Part> {
        self.visible.after.and_then(|id| self.part(id))
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    /// Replace all parts by tokenizing `expression`.
    ///
    /// Unknown characters are dropped one at a time; whitespace silently,
    /// anything else with a warning. Parsing stops after the configured
    /// iteration limit and reports the unconsumed rest.
    pub fn parse_expression(&mut self, expression: &str) -> ParseOutcome {
        self.parts.clear();
        let mut outcome = ParseOutcome::default();
        let mut rest = expression;

        while !rest.is_empty() {
            if outcome.iterations >= self.options.iteration_limit {
                warn!(
                    expression,
                    residual_len = rest.len(),
                    "Gave up parsing expression after {} iterations",
                    outcome.iterations
                );
                outcome.residual = Some(rest.to_string());
                break;
            }
            outcome.iterations += 1;

            let ctx = MatchContext {
                variables: &self.variables,
                predecessor: self.parts.last(),
            };
            match parser::next_part(rest, &ctx) {
                Some((new, remaining)) => {
                    rest = remaining;
                    let index = self.parts.len();
                    self.splice(index, new);
                }
                None => {
                    let Some((ch, remaining)) = parser::skip_char(rest) else {
                        break;
                    };
                    if !ch.is_whitespace() {
                        warn!(expression, "Skipping unexpected character {:?}", ch);
                        outcome.skipped.push(ch);
                    }
                    rest = remaining;
                }
            }
        }

        self.refresh();
        outcome
    }

    /// Re-derive the expression and the visible window from the parts
    pub fn update_expression(&mut self) {
        self.refresh();
    }

    /// Replace the variable declarations and re-resolve `%N%` references
    pub fn set_variables(&mut self, input: Vec<Value>, output: Vec<Value>) {
        self.variables = input.iter().chain(output.iter()).cloned().collect();
        self.input = input;
        self.output = output;
        for part in &mut self.parts {
            let token = part.text().to_string();
            if let PartKind::Variable { index, value } = &mut part.kind {
                *value = resolve_variable(&self.variables, *index, &token);
            }
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert a part.
    ///
    /// The part goes before `preceding_to_part` when given, at the end of the
    /// visible window when `respect_visible_area` is set, and at the end
    /// otherwise. A new part that merges into its predecessor is not inserted.
    pub fn add_part(
        &mut self,
        new: NewPart,
        preceding_to_part: Option<PartId>,
        respect_visible_area: bool,
    ) -> AddOutcome {
        let anchored = preceding_to_part.and_then(|id| {
            let index = self.index_of(id);
            if index.is_none() {
                debug!("add_part: anchor {} not in formula, ignoring", id);
            }
            index
        });
        let index = match anchored {
            Some(index) => index,
            None if respect_visible_area => self.visible_insert_index(),
            None => self.parts.len(),
        };

        let outcome = self.splice(index, new);
        if outcome != AddOutcome::Rejected {
            self.refresh();
        }
        outcome
    }

    pub fn append_part(&mut self, new: NewPart) -> AddOutcome {
        self.add_part(new, None, false)
    }

    /// Tokenize a fragment (e.g. a drag-and-drop payload) and insert each token
    pub fn insert_snippet(
        &mut self,
        snippet: &str,
        preceding_to_part: Option<PartId>,
        respect_visible_area: bool,
    ) -> Vec<AddOutcome> {
        let mut scratch = Formula::new(self.input.clone(), self.output.clone());
        scratch.options = self.options;
        scratch.parse_expression(snippet);

        scratch
            .parts
            .into_iter()
            .map(|part| {
                let new = NewPart {
                    text: part.text().to_string(),
                    kind: part.kind,
                };
                self.add_part(new, preceding_to_part, respect_visible_area)
            })
            .collect()
    }

    /// Insert the part a single keystroke stands for
    pub fn insert_keystroke(
        &mut self,
        ch: char,
        preceding_to_part: Option<PartId>,
        respect_visible_area: bool,
    ) -> AddOutcome {
        match keystroke_part(ch) {
            Some(new) => self.add_part(new, preceding_to_part, respect_visible_area),
            None => AddOutcome::Rejected,
        }
    }

    /// Remove a part and splice the predecessor chain around it
    pub fn remove_part(&mut self, id: PartId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let removed = self.parts.remove(index);
        for part in &mut self.parts {
            if part.predecessor == Some(id) {
                part.predecessor = removed.predecessor;
            }
        }
        self.refresh();
        true
    }

    /// Change a part's raw text; `false` when nothing changed
    pub fn set_part_text(&mut self, id: PartId, text: &str) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let part = &mut self.parts[index];
        if !part.set_text(text) {
            return false;
        }
        if let PartKind::Variable { index, value } = &mut part.kind {
            *value = resolve_variable(&self.variables, *index, text);
        }
        self.refresh();
        true
    }

    /// Change a literal's decoded value; `false` when nothing changed
    pub fn set_literal_value(&mut self, id: PartId, value: &str) -> bool {
        let changed = self
            .parts
            .iter_mut()
            .find(|p| p.id == id)
            .map(|p| p.set_literal_value(value))
            .unwrap_or(false);
        if changed {
            self.refresh();
        }
        changed
    }

    /// Place `new` at `index` without re-deriving derived state
    fn splice(&mut self, index: usize, new: NewPart) -> AddOutcome {
        if new.is_special(SpecialToken::VisibleEnd)
            && self
                .parts
                .iter()
                .any(|p| p.is_special_token(SpecialToken::VisibleEnd))
        {
            debug!("Rejecting second '?' sentinel");
            return AddOutcome::Rejected;
        }

        let index = index.min(self.parts.len());
        if index > 0 {
            let predecessor = &mut self.parts[index - 1];
            if predecessor.merge(&new) {
                return AddOutcome::Merged(predecessor.id);
            }
        }

        let id = PartId(self.next_id);
        self.next_id += 1;
        let predecessor = index.checked_sub(1).map(|i| self.parts[i].id);
        self.parts.insert(index, Part::place(id, new, predecessor));
        if let Some(next) = self.parts.get_mut(index + 1) {
            next.predecessor = Some(id);
        }
        AddOutcome::Inserted(id)
    }

    fn refresh(&mut self) {
        self.expression = self.parts.iter().map(Part::text).collect();
        self.positions = self.parts.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        self.recompute_visible();
        self.revision += 1;
    }

    // =========================================================================
    // Visible window
    // =========================================================================

    fn recompute_visible(&mut self) {
        let is_start = |p: &Part| p.is_special_token(SpecialToken::VisibleStart);
        let is_end = |p: &Part| p.is_special_token(SpecialToken::VisibleEnd);

        if let Some(start) = self.parts.iter().rposition(is_start) {
            if let Some(offset) = self.parts[start + 1..].iter().position(is_end) {
                let end = start + 1 + offset;
                self.visible = VisibleWindow {
                    parts: self.parts[start + 1..end].iter().map(|p| p.id).collect(),
                    before: Some(self.parts[start].id),
                    after: Some(self.parts[end].id),
                };
                return;
            }
        }

        let hidden = if self.options.hide_question_mark {
            let mut questions = self.parts.iter().filter(|p| is_end(*p));
            match (questions.next(), questions.next()) {
                (Some(only), None) => Some(only.id),
                _ => None,
            }
        } else {
            None
        };

        self.visible = VisibleWindow {
            parts: self
                .parts
                .iter()
                .map(|p| p.id)
                .filter(|id| Some(*id) != hidden)
                .collect(),
            before: None,
            after: None,
        };
    }

    /// Index right after the last visible part
    fn visible_insert_index(&self) -> usize {
        if let Some(index) = self.visible.after.and_then(|id| self.index_of(id)) {
            return index;
        }
        if let Some(index) = self.visible.parts.last().and_then(|id| self.index_of(*id)) {
            return index + 1;
        }
        self.visible
            .before
            .and_then(|id| self.index_of(id))
            .map(|index| index + 1)
            .unwrap_or(0)
    }

    // =========================================================================
    // Structure lookup
    // =========================================================================
    //
    // Predecessor links always follow arena order (`splice` and `remove_part`
    // keep them that way), so the backward walks below step by index.

    /// Nearest part at or before `id` that owns a navigable structure and
    /// whose bracket span up to `id` is valid
    pub fn structured_part(&self, id: PartId) -> Option<PartId> {
        self.structured_part_from(self.index_of(id))
    }

    /// Same as [`Formula::structured_part`] but never returns `id` itself
    pub fn preceding_structured_part(&self, id: PartId) -> Option<PartId> {
        let index = self.index_of(id)?;
        self.structured_part_from(index.checked_sub(1))
    }

    fn structured_part_from(&self, start: Option<usize>) -> Option<PartId> {
        let mut brackets = SuffixBrackets::default();
        for part in self.parts[..=start?].iter().rev() {
            brackets.prepend(part.text());
            if part.is_structure_candidate() && brackets.is_valid() {
                return Some(part.id);
            }
        }
        None
    }

    /// Type name of the structure a candidate part exposes
    pub fn structure_fqn(&self, id: PartId, structures: &dyn StructureLookup) -> Option<String> {
        self.structure_fqn_at(self.index_of(id)?, structures)
    }

    fn structure_fqn_at(&self, index: usize, structures: &dyn StructureLookup) -> Option<String> {
        let part = self.parts.get(index)?;
        match &part.kind {
            PartKind::Variable { value, .. } => Some(value.effective_fqn().to_string()),
            PartKind::Member(member) if member.class != MemberClass::Undetermined => {
                Some(member.value.effective_fqn().to_string())
            }
            PartKind::Function(function) if function.returns_variable => {
                function.parameter.clone().or_else(|| {
                    Expression::parse_at(self, index)?
                        .resolved_type(self, structures)
                        .map(|t| t.fqn)
                })
            }
            _ => None,
        }
    }

    /// Undetermined members whose owner is known and whose chain to the owner
    /// has no other undetermined member
    pub fn pending_member_lookups(&self, structures: &dyn StructureLookup) -> Vec<MemberLookup> {
        (0..self.parts.len())
            .filter_map(|index| self.member_lookup_at(index, structures))
            .collect()
    }

    /// Lookup for the part at `index` when it is an undetermined member with
    /// a known owner. An undetermined member on the way back to the owner
    /// has to settle first.
    pub fn member_lookup_at(
        &self,
        index: usize,
        structures: &dyn StructureLookup,
    ) -> Option<MemberLookup> {
        let part = self.parts.get(index)?;
        let member = part.member()?;
        if member.class != MemberClass::Undetermined {
            return None;
        }

        let mut brackets = SuffixBrackets::default();
        for owner_index in (0..index).rev() {
            let candidate = &self.parts[owner_index];
            if matches!(candidate.member(), Some(m) if m.class == MemberClass::Undetermined) {
                return None;
            }
            brackets.prepend(candidate.text());
            if candidate.is_structure_candidate() && brackets.is_valid() {
                return Some(MemberLookup {
                    part: part.id,
                    generation: member.generation,
                    owner: candidate.id,
                    owner_fqn: self.structure_fqn_at(owner_index, structures)?,
                });
            }
        }
        None
    }

    /// Settle a member's classification. Ignored when the member is gone,
    /// already settled, or was renamed since the lookup started.
    pub fn classify_member(
        &mut self,
        id: PartId,
        generation: u64,
        class: MemberClass,
        value: Value,
    ) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        match &mut self.parts[index].kind {
            PartKind::Member(member)
                if member.generation == generation
                    && member.class == MemberClass::Undetermined
                    && class != MemberClass::Undetermined =>
            {
                member.class = class;
                member.value = value;
                true
            }
            _ => false,
        }
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Expression suitable for embedding in a template: wrapped in `{...}`
    /// unless already brace-wrapped or bracket-valid
    pub fn template_value(&self) -> String {
        let value = &self.expression;
        let wrapped = value.starts_with('{') && value.ends_with('}');
        if wrapped || brackets_valid(value) {
            value.clone()
        } else {
            format!("{{{}}}", value)
        }
    }
}

fn resolve_variable(variables: &[Value], index: usize, token: &str) -> Value {
    variables
        .get(index)
        .cloned()
        .unwrap_or_else(|| Value::placeholder(token))
}

/// Part synthesized for a single keystroke
pub fn keystroke_part(ch: char) -> Option<NewPart> {
    let op = match ch {
        '=' => Some(Operator::Equal),
        '&' => Some(Operator::And),
        '|' => Some(Operator::Or),
        '~' => Some(Operator::Like),
        '+' => Some(Operator::Plus),
        '-' => Some(Operator::Minus),
        '*' => Some(Operator::Multiply),
        '/' => Some(Operator::Divide),
        '<' => Some(Operator::Less),
        '>' => Some(Operator::Greater),
        '!' => Some(Operator::Not),
        _ => None,
    };
    if let Some(op) = op {
        return Some(NewPart::operation(op));
    }
    if ch == '"' {
        return Some(NewPart::literal(""));
    }
    SpecialToken::from_char(ch).map(NewPart::special)
}
