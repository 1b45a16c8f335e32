//! Formula editing handlers

use crate::commands::Cmd;
use crate::messages::FormulaMsg;
use crate::model::{AddOutcome, EditorModel, FormulaId, Part};
use crate::structure::{LookupTarget, RequestOutcome, Waiter};

/// Handle formula messages
pub fn update_formula(model: &mut EditorModel, id: FormulaId, msg: FormulaMsg) -> Option<Cmd> {
    if let FormulaMsg::Close = msg {
        if model.formulas.remove(&id).is_none() {
            tracing::debug!("update_formula: close of unknown formula {}", id);
        }
        return None;
    }

    let Some(formula) = model.formulas.get_mut(&id) else {
        tracing::warn!("update_formula: formula {} not found", id);
        return None;
    };

    let changed = match msg {
        FormulaMsg::Parse(expression) => {
            let before = formula.expression().to_string();
            let outcome = formula.parse_expression(&expression);
            if !outcome.is_clean() {
                tracing::debug!(
                    %id,
                    skipped = outcome.skipped.len(),
                    truncated = outcome.residual.is_some(),
                    "Parsed with diagnostics"
                );
            }
            formula.expression() != before
        }
        FormulaMsg::SetVariables { input, output } => {
            formula.set_variables(input, output);
            false
        }
        FormulaMsg::AddPart {
            part,
            before,
            respect_visible_area,
        } => formula.add_part(part, before, respect_visible_area) != AddOutcome::Rejected,
        FormulaMsg::InsertSnippet {
            snippet,
            before,
            respect_visible_area,
        } => formula
            .insert_snippet(&snippet, before, respect_visible_area)
            .iter()
            .any(|outcome| *outcome != AddOutcome::Rejected),
        FormulaMsg::InsertKeystroke {
            ch,
            before,
            respect_visible_area,
        } => formula.insert_keystroke(ch, before, respect_visible_area) != AddOutcome::Rejected,
        FormulaMsg::RemovePart(part) => formula.remove_part(part),
        FormulaMsg::SetPartText { part, text } => formula.set_part_text(part, &text),
        FormulaMsg::SetLiteralValue { part, value } => formula.set_literal_value(part, &value),
        FormulaMsg::ResolveMembers | FormulaMsg::Close => false,
    };

    let mut cmds = Vec::new();
    if changed {
        cmds.push(Cmd::PublishExpression {
            target: id,
            expression: formula.expression().to_string(),
        });
    }
    cmds.extend(schedule_member_lookups(model, LookupTarget::Formula(id)));
    Cmd::collect(cmds)
}

/// Classify every member whose owner structure is known and request the
/// ones that are not.
///
/// Owners sit left of their members, so one left-to-right sweep settles a
/// whole chain whose structures are cached.
pub fn schedule_member_lookups(model: &mut EditorModel, target: LookupTarget) -> Vec<Cmd> {
    let mut cmds = Vec::new();
    let mut index = 0;
    loop {
        let Some(formula) = model.target_formula(target) else {
            break;
        };
        if index >= formula.len() {
            break;
        }
        let lookup = formula.member_lookup_at(index, &model.structures);
        index += 1;
        let Some(lookup) = lookup else {
            continue;
        };

        let waiter = Waiter {
            target,
            part: lookup.part,
            generation: lookup.generation,
        };
        match model.structures.request(&lookup.owner_fqn, Some(waiter)) {
            RequestOutcome::Cached => {
                classify_waiter(model, waiter, &lookup.owner_fqn);
            }
            RequestOutcome::Started(key) => cmds.push(Cmd::ResolveStructure { key }),
            RequestOutcome::Joined => {}
        }
    }
    cmds
}

/// Apply a cached structure to one waiting member. Waiters whose formula
/// was closed or re-decoded, whose part was removed, or whose member was
/// renamed since are dropped.
pub(crate) fn classify_waiter(model: &mut EditorModel, waiter: Waiter, owner_fqn: &str) -> bool {
    let Some(structure) = model.structures.structure(owner_fqn) else {
        return false;
    };
    let Some(formula) = model.target_formula(waiter.target) else {
        tracing::debug!("Dropping lookup result for gone {:?}", waiter.target);
        return false;
    };
    let Some(member) = formula.part(waiter.part).and_then(Part::member) else {
        tracing::debug!("Dropping lookup result for removed part {}", waiter.part);
        return false;
    };

    let (class, value) = structure.classify(member);
    let settled = model
        .target_formula_mut(waiter.target)
        .is_some_and(|formula| formula.classify_member(waiter.part, waiter.generation, class, value));
    if settled {
        tracing::debug!(part = %waiter.part, ?class, owner_fqn, "Member classified");
    }
    settled
}
