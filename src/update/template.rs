//! Template row editing handlers

use super::formula::schedule_member_lookups;
use crate::commands::Cmd;
use crate::messages::TemplateMsg;
use crate::model::{EditorModel, FormulaId};
use crate::structure::LookupTarget;

/// Handle template messages. Every effective edit publishes the re-encoded
/// `concat(...)` expression and restarts member lookups for the freshly
/// decoded rows.
pub fn update_template(model: &mut EditorModel, id: FormulaId, msg: TemplateMsg) -> Option<Cmd> {
    if let TemplateMsg::Close = msg {
        model.templates.remove(&id);
        return None;
    }

    let Some(template) = model.templates.get_mut(&id) else {
        tracing::warn!("update_template: template {} not found", id);
        return None;
    };

    let changed = match msg {
        TemplateMsg::SetText { row, item, text } => template.set_text(row, item, &text),
        TemplateMsg::SetFormula {
            row,
            item,
            expression,
        } => template.set_formula(row, item, &expression),
        TemplateMsg::InsertText { row, index, text } => template.insert_text(row, index, &text),
        TemplateMsg::InsertFormula {
            row,
            index,
            expression,
        } => template.insert_formula(row, index, &expression),
        TemplateMsg::RemoveItem { row, index } => template.remove_item(row, index),
        TemplateMsg::InsertRow(index) => template.insert_row(index),
        TemplateMsg::RemoveRow(index) => template.remove_row(index),
        TemplateMsg::ResolveMembers => {
            return Cmd::collect(schedule_template_lookups(model, id));
        }
        TemplateMsg::Close => false,
    };

    if !changed {
        tracing::debug!("update_template: edit on {} changed nothing", id);
        return None;
    }

    let mut cmds = vec![Cmd::PublishExpression {
        target: id,
        expression: template.expression().to_string(),
    }];
    cmds.extend(schedule_template_lookups(model, id));
    Cmd::collect(cmds)
}

/// Run member lookups over every embedded formula of a template, addressed
/// at its current revision
pub fn schedule_template_lookups(model: &mut EditorModel, id: FormulaId) -> Vec<Cmd> {
    let Some(template) = model.templates.get(&id) else {
        return Vec::new();
    };
    let revision = template.revision();
    let items = template.formula_items();
    items
        .into_iter()
        .flat_map(|(row, item)| {
            let target = LookupTarget::TemplateItem {
                template: id,
                row,
                item,
                revision,
            };
            schedule_member_lookups(model, target)
        })
        .collect()
}
