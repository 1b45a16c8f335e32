use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use xfl_editor::autocomplete::{CompletionRequest, Suggestions};
use xfl_editor::cli::{
    render_completions, CliArgs, Command, FormulaReport, TemplateReport, VariablesFile,
};
use xfl_editor::config::EditorConfig;
use xfl_editor::model::{EditorModel, FunctionContext};
use xfl_editor::runtime::Runtime;
use xfl_editor::structure::{CatalogResolver, StaticResolver, StructureResolver};

/// How long the CLI waits for structure lookups
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

fn main() -> Result<()> {
    xfl_editor::tracing::init();

    let args = CliArgs::parse();
    let mut config = EditorConfig::load();
    if let Some(context) = &args.context {
        config.runtime_context = context.clone();
    }

    let variables = match &args.variables {
        Some(path) => VariablesFile::load(path).map_err(anyhow::Error::msg)?,
        None => VariablesFile::default(),
    };

    let resolver = load_resolver(&args, &config)?;
    let mut runtime = Runtime::new(EditorModel::new(config), resolver);

    let output = match &args.command {
        Command::Parse { expression } => {
            let id = runtime.open_formula(expression, variables.input, variables.output);
            if !runtime.run_until_idle(RESOLVE_TIMEOUT) {
                tracing::warn!("Printing with unresolved members");
            }
            let formula = runtime
                .model()
                .formula(id)
                .context("formula closed while resolving")?;
            let report = FormulaReport::new(formula);
            if args.json {
                serde_json::to_string_pretty(&report)?
            } else {
                report.render()
            }
        }
        Command::Template { expression } => {
            let id = runtime.open_template(expression, variables.input, variables.output);
            let template = runtime
                .model()
                .template(id)
                .context("template closed while decoding")?;
            let report = TemplateReport::new(template);
            if args.json {
                serde_json::to_string_pretty(&report)?
            } else {
                report.render()
            }
        }
        Command::Complete {
            expression,
            query,
            glob,
        } => {
            let id = runtime.open_formula(expression, variables.input, variables.output);
            let mut request = CompletionRequest::new(id, query.clone());
            if *glob {
                request.context = FunctionContext::Glob;
            }

            let mut suggestions = runtime.suggest(&request);
            if matches!(suggestions, Suggestions::Pending(_)) {
                runtime.run_until_idle(RESOLVE_TIMEOUT);
                suggestions = runtime.suggest(&request);
            }
            let completions = match suggestions {
                Suggestions::Ready(completions) => completions,
                Suggestions::Pending(_) => anyhow::bail!("structure lookup did not finish"),
                Suggestions::Unavailable => anyhow::bail!("formula closed while completing"),
            };
            if args.json {
                serde_json::to_string_pretty(&completions)?
            } else {
                render_completions(&completions)
            }
        }
    };

    println!("{}", output.trim_end());
    Ok(())
}

/// `--catalog`, else the configured catalog, else no structures at all
fn load_resolver(args: &CliArgs, config: &EditorConfig) -> Result<Arc<dyn StructureResolver>> {
    match args.catalog.clone().or_else(|| config.catalog_path()) {
        Some(path) => {
            let catalog = CatalogResolver::load(&path)
                .with_context(|| format!("loading structure catalog {}", path.display()))?;
            Ok(Arc::new(catalog))
        }
        None => {
            tracing::debug!("No structure catalog, member types stay unknown");
            Ok(Arc::new(StaticResolver::default()))
        }
    }
}
