//! Structure lookup handlers

use super::formula::{classify_waiter, schedule_member_lookups};
use super::template::schedule_template_lookups;
use crate::commands::Cmd;
use crate::messages::StructureMsg;
use crate::model::EditorModel;
use crate::structure::LookupTarget;

/// Handle structure messages
pub fn update_structure(model: &mut EditorModel, msg: StructureMsg) -> Option<Cmd> {
    match msg {
        StructureMsg::Resolved { key, result } => {
            tracing::debug!(
                fqn = %key.fqn,
                ok = result.is_ok(),
                "update_structure: resolve completed"
            );
            let fqn = key.fqn.clone();
            let waiters = model.structures.complete(key, result);

            let mut touched = Vec::new();
            for waiter in waiters {
                classify_waiter(model, waiter, &fqn);
                if !touched.contains(&waiter.target) {
                    touched.push(waiter.target);
                }
            }

            // Members further along the same chains may be resolvable now
            let cmds = touched
                .into_iter()
                .flat_map(|target| schedule_member_lookups(model, target))
                .collect();
            Cmd::collect(cmds)
        }
        StructureMsg::SetContext(context) => {
            tracing::info!("Structure context set to {}", context.0);
            model.config.runtime_context = context.0.clone();
            model.structures.set_context(context);

            let formulas: Vec<_> = model.formulas.keys().copied().collect();
            let templates: Vec<_> = model.templates.keys().copied().collect();
            let mut cmds: Vec<Cmd> = formulas
                .into_iter()
                .flat_map(|id| schedule_member_lookups(model, LookupTarget::Formula(id)))
                .collect();
            for id in templates {
                cmds.extend(schedule_template_lookups(model, id));
            }
            Cmd::collect(cmds)
        }
    }
}
