//! Structure-aware completion
//!
//! After a `.` or a half-typed member the candidates are the children of the
//! owner's structure. Anywhere else they are the functions offered in the
//! current context plus the declared variables. Candidates are ranked with
//! nucleo's fuzzy matcher.

use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use serde::Serialize;

use crate::commands::Cmd;
use crate::model::{functions, EditorModel, Formula, FormulaId, FunctionContext, PartId, SpecialToken};
use crate::structure::{RequestOutcome, Structure, StructureChild};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    Field,
    Method,
    Function,
    Variable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub label: String,
    /// Part text to insert (replacing a trailing `.`, for members)
    pub insert: String,
    pub kind: CompletionKind,
    /// Type name or description
    pub detail: Option<String>,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Suggestions {
    Ready(Vec<Completion>),
    /// The owner's structure is still being resolved. The command, when
    /// present, has to be run to start the resolve.
    Pending(Option<Cmd>),
    /// No formula with that id
    Unavailable,
}

/// Where and what to complete
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub formula: FormulaId,
    /// Part the cursor is after; defaults to the last visible part
    pub after: Option<PartId>,
    pub query: String,
    pub context: FunctionContext,
}

impl CompletionRequest {
    pub fn new(formula: FormulaId, query: impl Into<String>) -> Self {
        Self {
            formula,
            after: None,
            query: query.into(),
            context: FunctionContext::default(),
        }
    }
}

pub fn suggest(model: &mut EditorModel, request: &CompletionRequest) -> Suggestions {
    let Some(formula) = model.formulas.get(&request.formula) else {
        return Suggestions::Unavailable;
    };

    let anchor = request
        .after
        .or_else(|| formula.visible_window().parts.last().copied());

    if let Some(owner_fqn) = anchor.and_then(|id| member_owner_fqn(formula, id, model)) {
        return match model.structures.request(&owner_fqn, None) {
            RequestOutcome::Cached => match model.structures.structure(&owner_fqn) {
                Some(structure) => Suggestions::Ready(member_completions(structure, &request.query)),
                None => Suggestions::Ready(Vec::new()),
            },
            RequestOutcome::Started(key) => Suggestions::Pending(Some(Cmd::ResolveStructure { key })),
            RequestOutcome::Joined => Suggestions::Pending(None),
        };
    }

    Suggestions::Ready(general_completions(formula, request.context, &request.query))
}

/// Owner type when the cursor sits on a `.` or a member being typed
fn member_owner_fqn(formula: &Formula, anchor: PartId, model: &EditorModel) -> Option<String> {
    let part = formula.part(anchor)?;
    if !(part.is_special_token(SpecialToken::Dot) || part.is_member()) {
        return None;
    }
    let owner = formula.preceding_structured_part(anchor)?;
    formula.structure_fqn(owner, &model.structures)
}

fn member_completions(structure: &Structure, query: &str) -> Vec<Completion> {
    let candidates = structure.children.iter().map(|child| match child {
        StructureChild::Field { name, type_ref } => Completion {
            label: name.clone(),
            insert: format!(".{}", name),
            kind: CompletionKind::Field,
            detail: Some(type_ref.fqn.clone()),
            score: 0,
        },
        StructureChild::Method { name, returns } => Completion {
            label: format!("{}()", name),
            insert: format!(".{}(", name),
            kind: CompletionKind::Method,
            detail: returns.first().map(|r| r.fqn.clone()),
            score: 0,
        },
    });
    rank(candidates.collect(), query)
}

fn general_completions(formula: &Formula, context: FunctionContext, query: &str) -> Vec<Completion> {
    let functions = functions::offered(context).map(|info| Completion {
        label: info.name.to_string(),
        insert: format!("{}(", info.name),
        kind: CompletionKind::Function,
        detail: Some(info.description.to_string()),
        score: 0,
    });
    let variables = formula.variables().iter().enumerate().map(|(i, value)| Completion {
        label: value.label.clone(),
        insert: format!("%{}%", i),
        kind: CompletionKind::Variable,
        detail: Some(value.effective_fqn().to_string()).filter(|fqn| !fqn.is_empty()),
        score: 0,
    });
    rank(variables.chain(functions).collect(), query)
}

/// Filter by fuzzy match on the label, best first. An empty query keeps
/// everything in catalog order.
fn rank(candidates: Vec<Completion>, query: &str) -> Vec<Completion> {
    if query.is_empty() {
        return candidates;
    }

    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);
    let mut buf = Vec::new();

    let mut scored: Vec<Completion> = candidates
        .into_iter()
        .filter_map(|mut completion| {
            let score = pattern.score(Utf32Str::new(&completion.label, &mut buf), &mut matcher)?;
            completion.score = score;
            Some(completion)
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.label.cmp(&b.label)));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::structure::TypeRef;

    fn order_structure() -> Structure {
        Structure {
            fqn: "com.acme.Order".into(),
            children: vec![
                StructureChild::Field {
                    name: "customer".into(),
                    type_ref: TypeRef::new("com.acme.Customer"),
                },
                StructureChild::Field {
                    name: "createdAt".into(),
                    type_ref: TypeRef::new("java.util.Date"),
                },
                StructureChild::Method {
                    name: "total".into(),
                    returns: vec![TypeRef::new("java.math.BigDecimal")],
                },
            ],
        }
    }

    #[test]
    fn test_rank_filters_and_orders() {
        let ranked = member_completions(&order_structure(), "cus");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].label, "customer");
        assert_eq!(ranked[0].insert, ".customer");
    }

    #[test]
    fn test_empty_query_keeps_order() {
        let all = member_completions(&order_structure(), "");
        let labels: Vec<_> = all.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["customer", "createdAt", "total()"]);
        assert_eq!(all[2].insert, ".total(");
    }

    #[test]
    fn test_general_lists_variables_and_context_functions() {
        let formula = Formula::parse("", vec![Value::new("order", "com.acme.Order")], vec![]);
        let all = general_completions(&formula, FunctionContext::Standard, "");
        assert_eq!(all[0].insert, "%0%");
        assert!(all.iter().any(|c| c.label == "concat"));
        assert!(!all.iter().any(|c| c.label == "glob"));

        let glob = general_completions(&formula, FunctionContext::Glob, "glob");
        assert!(glob.iter().any(|c| c.label == "glob"));
    }

    #[test]
    fn test_suggest_after_dot_waits_for_structure() {
        let mut model = EditorModel::default();
        let id = model.open_formula("%0%.", vec![Value::new("order", "com.acme.Order")], vec![]);

        let request = CompletionRequest::new(id, "");
        let Suggestions::Pending(Some(Cmd::ResolveStructure { key })) = suggest(&mut model, &request)
        else {
            panic!("expected a resolve command");
        };
        assert_eq!(key.fqn, "com.acme.Order");
        assert_eq!(suggest(&mut model, &request), Suggestions::Pending(None));

        model.structures.complete(key, Ok(order_structure()));
        let Suggestions::Ready(ready) = suggest(&mut model, &request) else {
            panic!("expected completions");
        };
        assert_eq!(ready.len(), 3);
    }

    #[test]
    fn test_suggest_unknown_formula() {
        let mut model = EditorModel::default();
        let request = CompletionRequest::new(FormulaId(99), "");
        assert_eq!(suggest(&mut model, &request), Suggestions::Unavailable);
    }
}
