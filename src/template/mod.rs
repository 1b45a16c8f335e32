//! Multi-row text templates
//!
//! A template is stored as a single `concat(...)` formula. Decoding splits the
//! arguments into rows of text and embedded formulas; every edit re-encodes
//! the rows into the backing formula and decodes again, so the rows always
//! reflect what will be persisted.
//!
//! ```text
//! concat("Dear ",%0%.name,"\n","Regards")
//!   row 0: [text "Dear "] [formula %0%.name]
//!   row 1: [text "Regards"]
//! ```

mod codec;
mod row;
mod text;

pub use codec::{concat_arguments, CONCAT, ROW_SEPARATOR};
pub use row::{TemplateRow, TextItem};
pub use text::{escape, unescape, TemplateText};

use crate::model::{Formula, FormulaOptions, Part, Value};

/// Argument text for an embedded formula. Formulas with a top-level comma
/// are brace-wrapped so they decode as one argument.
pub(crate) fn formula_argument(formula: &Formula) -> String {
    let expression = formula.expression();
    let braced = expression.starts_with('{') && expression.ends_with('}');
    if !braced && codec::has_top_level_comma(formula.parts()) {
        format!("{{{}}}", expression)
    } else {
        expression.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    formula: Formula,
    rows: Vec<TemplateRow>,
}

impl Template {
    /// Decode the rows of an already parsed formula
    pub fn decode(formula: Formula) -> Self {
        let rows = decode_rows(&formula);
        Self { formula, rows }
    }

    pub fn parse(
        expression: &str,
        input: Vec<Value>,
        output: Vec<Value>,
        options: FormulaOptions,
    ) -> Self {
        let mut formula = Formula::new(input, output).with_options(options);
        formula.parse_expression(expression);
        Self::decode(formula)
    }

    /// Template with a single empty row
    pub fn empty(input: Vec<Value>, output: Vec<Value>, options: FormulaOptions) -> Self {
        let mut template = Self {
            formula: Formula::new(input, output).with_options(options),
            rows: vec![TemplateRow::empty()],
        };
        template.commit();
        template
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn expression(&self) -> &str {
        self.formula.expression()
    }

    pub fn rows(&self) -> &[TemplateRow] {
        &self.rows
    }

    /// Moves whenever the rows are decoded again, so row/item positions
    /// taken at one revision do not carry over to the next
    pub fn revision(&self) -> u64 {
        self.formula.revision()
    }

    /// `(row, item)` of every embedded formula
    pub fn formula_items(&self) -> Vec<(usize, usize)> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.items()
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| item.is_formula())
                    .map(move |(i, _)| (r, i))
            })
            .collect()
    }

    pub fn formula_item(&self, row: usize, item: usize) -> Option<&Formula> {
        self.rows.get(row)?.items().get(item)?.as_formula()
    }

    /// Mutable access for member classification only; text edits go
    /// through `set_formula` so they are re-encoded
    pub(crate) fn formula_item_mut(&mut self, row: usize, item: usize) -> Option<&mut Formula> {
        self.rows.get_mut(row)?.item_mut(item)?.as_formula_mut()
    }

    pub fn encode(&self) -> String {
        let rows: Vec<String> = self
            .rows
            .iter()
            .map(|row| row.encode_arguments().join(","))
            .collect();
        format!("{}({})", CONCAT, rows.join(ROW_SEPARATOR))
    }

    // =========================================================================
    // Editing
    // =========================================================================

    pub fn set_text(&mut self, row: usize, item: usize, text: &str) -> bool {
        let changed = match self.rows.get_mut(row).and_then(|r| r.item_mut(item)) {
            Some(TextItem::Text(current)) => current.set_text(text),
            _ => false,
        };
        changed && self.commit()
    }

    pub fn set_formula(&mut self, row: usize, item: usize, expression: &str) -> bool {
        let changed = match self.rows.get_mut(row).and_then(|r| r.item_mut(item)) {
            Some(TextItem::Formula(formula)) if formula.expression() != expression => {
                formula.parse_expression(expression);
                true
            }
            _ => false,
        };
        changed && self.commit()
    }

    /// Insert a text, or a formula parsed with this template's variables
    pub fn insert_text(&mut self, row: usize, index: usize, text: &str) -> bool {
        self.insert_item(row, index, TextItem::text(text))
    }

    pub fn insert_formula(&mut self, row: usize, index: usize, expression: &str) -> bool {
        let mut formula = Formula::new(
            self.formula.input().to_vec(),
            self.formula.output().to_vec(),
        )
        .with_options(self.formula.options());
        formula.parse_expression(expression);
        self.insert_item(row, index, TextItem::Formula(formula))
    }

    pub fn insert_item(&mut self, row: usize, index: usize, item: TextItem) -> bool {
        let Some(target) = self.rows.get_mut(row) else {
            return false;
        };
        target.add_part(item, index);
        self.commit()
    }

    pub fn remove_item(&mut self, row: usize, index: usize) -> bool {
        let removed = self
            .rows
            .get_mut(row)
            .and_then(|r| r.remove_part(index))
            .is_some();
        removed && self.commit()
    }

    /// Insert an empty row at `index`, clamped to the end
    pub fn insert_row(&mut self, index: usize) -> bool {
        let index = index.min(self.rows.len());
        self.rows.insert(index, TemplateRow::empty());
        self.commit()
    }

    /// Remove a row; the last remaining row is cleared instead
    pub fn remove_row(&mut self, index: usize) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        if self.rows.len() == 1 {
            self.rows[0] = TemplateRow::empty();
        } else {
            self.rows.remove(index);
        }
        self.commit()
    }

    /// Re-encode into the backing formula and decode again
    fn commit(&mut self) -> bool {
        let mut encoded = self.encode();
        if encoded == self.formula.expression() {
            return false;
        }
        // Newlines typed into a text only become row breaks after one decode
        for _ in 0..2 {
            self.formula.parse_expression(&encoded);
            self.rows = decode_rows(&self.formula);
            let normalized = self.encode();
            if normalized == encoded {
                break;
            }
            encoded = normalized;
        }
        true
    }
}

fn decode_rows(formula: &Formula) -> Vec<TemplateRow> {
    let Some(arguments) = concat_arguments(formula.parts()) else {
        tracing::warn!(
            expression = formula.expression(),
            "No {} call in template expression, rows left empty",
            CONCAT
        );
        return Vec::new();
    };

    let mut rows = Vec::new();
    let mut row = TemplateRow::new();
    for argument in arguments {
        match argument {
            [] => {}
            [part] if part.is_literal() => {
                let text = codec::literal_text(part);
                for (i, line) in text.split('\n').enumerate() {
                    if i > 0 {
                        rows.push(std::mem::take(&mut row));
                    }
                    row.push(TextItem::text(line));
                }
            }
            parts => {
                let expression: String = parts.iter().map(Part::text).collect();
                let mut sub = Formula::new(formula.input().to_vec(), formula.output().to_vec())
                    .with_options(formula.options());
                sub.parse_expression(&expression);
                row.push(TextItem::Formula(sub));
            }
        }
    }
    rows.push(row);

    for row in &mut rows {
        if row.is_empty() {
            *row = TemplateRow::empty();
        }
    }
    rows
}
