use super::text::TemplateText;
use crate::model::Formula;

#[derive(Debug, Clone)]
pub enum TextItem {
    Text(TemplateText),
    Formula(Formula),
}

impl TextItem {
    pub fn text(text: impl Into<String>) -> Self {
        TextItem::Text(TemplateText::new(text))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, TextItem::Text(_))
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, TextItem::Formula(_))
    }

    pub fn as_text(&self) -> Option<&TemplateText> {
        match self {
            TextItem::Text(text) => Some(text),
            TextItem::Formula(_) => None,
        }
    }

    pub fn as_formula(&self) -> Option<&Formula> {
        match self {
            TextItem::Formula(formula) => Some(formula),
            TextItem::Text(_) => None,
        }
    }

    pub fn as_formula_mut(&mut self) -> Option<&mut Formula> {
        match self {
            TextItem::Formula(formula) => Some(formula),
            TextItem::Text(_) => None,
        }
    }
}

/// One line of a template.
///
/// Items alternate between text and formulas, always starting with text:
/// adjacent texts are merged and an empty text is placed before a formula
/// that would otherwise start the row or follow another formula.
#[derive(Debug, Clone, Default)]
pub struct TemplateRow {
    items: Vec<TextItem>,
}

impl TemplateRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row holding just an empty text, so it stays editable
    pub fn empty() -> Self {
        Self {
            items: vec![TextItem::text("")],
        }
    }

    pub fn items(&self) -> &[TextItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn item_mut(&mut self, index: usize) -> Option<&mut TextItem> {
        self.items.get_mut(index)
    }

    /// Insert `item` at `index` (clamped to the end), keeping the row's
    /// alternation
    pub fn add_part(&mut self, item: TextItem, index: usize) {
        let index = index.min(self.items.len());
        match item {
            TextItem::Text(text) => {
                let before = index.checked_sub(1).and_then(|i| self.items.get_mut(i));
                if let Some(TextItem::Text(before)) = before {
                    before.push_str(text.text());
                } else if let Some(TextItem::Text(after)) = self.items.get_mut(index) {
                    after.insert_str(text.text());
                } else {
                    self.items.insert(index, TextItem::Text(text));
                }
            }
            TextItem::Formula(formula) => {
                self.items.insert(index, TextItem::Formula(formula));
                self.normalize();
            }
        }
    }

    pub fn push(&mut self, item: TextItem) {
        self.add_part(item, self.items.len());
    }

    /// Remove the item at `index`; neighbouring texts are merged back
    pub fn remove_part(&mut self, index: usize) -> Option<TextItem> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.normalize();
        Some(removed)
    }

    fn normalize(&mut self) {
        let mut items: Vec<TextItem> = Vec::with_capacity(self.items.len() + 1);
        for item in self.items.drain(..) {
            match item {
                TextItem::Text(text) => {
                    if let Some(TextItem::Text(before)) = items.last_mut() {
                        before.push_str(text.text());
                    } else {
                        items.push(TextItem::Text(text));
                    }
                }
                TextItem::Formula(formula) => {
                    if !matches!(items.last(), Some(TextItem::Text(_))) {
                        items.push(TextItem::text(""));
                    }
                    items.push(TextItem::Formula(formula));
                }
            }
        }
        self.items = items;
    }

    /// Arguments this row contributes to `concat(...)`. Empty texts are
    /// dropped unless the row has nothing else.
    pub fn encode_arguments(&self) -> Vec<String> {
        let arguments: Vec<String> = self
            .items
            .iter()
            .filter_map(|item| match item {
                TextItem::Text(text) if text.is_empty() => None,
                TextItem::Formula(formula) if formula.is_empty() => None,
                TextItem::Text(text) => Some(text.encode()),
                TextItem::Formula(formula) => Some(super::formula_argument(formula)),
            })
            .collect();
        if arguments.is_empty() {
            vec![TemplateText::default().encode()]
        } else {
            arguments
        }
    }
}
