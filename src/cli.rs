//! Command-line interface for the `xfl` tool
//!
//! Supports:
//! - Parsing an expression into parts, with member types resolved
//! - Decoding a `concat(...)` template into rows
//! - Completions at the end of an expression

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::autocomplete::Completion;
use crate::model::{Formula, MemberClass, Part, Value};
use crate::template::{Template, TextItem};

/// Inspect XFL formula expressions
#[derive(Parser, Debug)]
#[command(name = "xfl", version, about = "Inspect XFL formula expressions")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// YAML or JSON file with `input` and `output` value lists
    #[arg(long, global = true, value_name = "FILE")]
    pub variables: Option<PathBuf>,

    /// Structure catalog, overrides the configured one
    #[arg(long, global = true, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Runtime context structure lookups run against
    #[arg(long, global = true, value_name = "NAME")]
    pub context: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Parse an expression and list its parts
    Parse { expression: String },
    /// Decode a `concat(...)` expression into template rows
    Template { expression: String },
    /// Suggest completions at the end of an expression
    Complete {
        expression: String,
        /// Fuzzy filter for the candidates
        #[arg(long, default_value = "")]
        query: String,
        /// Offer selection-mask (glob) functions instead of the standard ones
        #[arg(long)]
        glob: bool,
    },
}

/// Declared variables, as read from `--variables`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VariablesFile {
    pub input: Vec<Value>,
    pub output: Vec<Value>,
}

impl VariablesFile {
    /// Files ending in `.json` are read as JSON, everything else as YAML
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    }
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PartReport {
    pub kind: &'static str,
    pub text: String,
    /// Resolved type of variables and classified members
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqn: Option<String>,
}

impl PartReport {
    fn from_part(part: &Part) -> Self {
        let fqn = match part.member() {
            Some(member) if member.class != MemberClass::Undetermined => {
                Some(member.value.effective_fqn().to_string())
            }
            Some(_) => None,
            None => part.variable_value().map(|v| v.effective_fqn().to_string()),
        }
        .filter(|fqn| !fqn.is_empty());

        Self {
            kind: part.kind_name(),
            text: part.display_text().into_owned(),
            fqn,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormulaReport {
    pub expression: String,
    pub visible: String,
    pub parts: Vec<PartReport>,
}

impl FormulaReport {
    pub fn new(formula: &Formula) -> Self {
        Self {
            expression: formula.expression().to_string(),
            visible: formula.visible_expression(),
            parts: formula.parts().iter().map(PartReport::from_part).collect(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = format!("expression: {}\nvisible:    {}\n", self.expression, self.visible);
        for (i, part) in self.parts.iter().enumerate() {
            out.push_str(&format!("{:>4}  {:<10} {}", i, part.kind, part.text));
            if let Some(fqn) = &part.fqn {
                out.push_str(&format!("  : {}", fqn));
            }
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ItemReport {
    Text(String),
    Formula(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateReport {
    pub expression: String,
    pub rows: Vec<Vec<ItemReport>>,
}

impl TemplateReport {
    pub fn new(template: &Template) -> Self {
        let rows = template
            .rows()
            .iter()
            .map(|row| {
                row.items()
                    .iter()
                    .map(|item| match item {
                        TextItem::Text(text) => ItemReport::Text(text.text().to_string()),
                        TextItem::Formula(formula) => {
                            ItemReport::Formula(formula.expression().to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        Self {
            expression: template.expression().to_string(),
            rows,
        }
    }

    pub fn render(&self) -> String {
        let mut out = format!("expression: {}\n", self.expression);
        for (i, row) in self.rows.iter().enumerate() {
            let items: Vec<String> = row
                .iter()
                .map(|item| match item {
                    ItemReport::Text(text) => format!("{:?}", text),
                    ItemReport::Formula(expression) => format!("{{{}}}", expression),
                })
                .collect();
            out.push_str(&format!("{:>4}  {}\n", i, items.join(" ")));
        }
        out
    }
}

pub fn render_completions(completions: &[Completion]) -> String {
    completions
        .iter()
        .map(|c| match &c.detail {
            Some(detail) => format!("{:<24} {}\n", c.label, detail),
            None => format!("{}\n", c.label),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommand_with_globals() {
        let args = CliArgs::try_parse_from([
            "xfl",
            "parse",
            "%0%.name",
            "--variables",
            "vars.yaml",
            "--json",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Command::Parse {
                expression: "%0%.name".into()
            }
        );
        assert_eq!(args.variables, Some(PathBuf::from("vars.yaml")));
        assert!(args.json);
        assert!(args.catalog.is_none());
    }

    #[test]
    fn test_complete_defaults() {
        let args = CliArgs::try_parse_from(["xfl", "complete", "%0%."]).unwrap();
        assert_eq!(
            args.command,
            Command::Complete {
                expression: "%0%.".into(),
                query: String::new(),
                glob: false,
            }
        );
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(CliArgs::try_parse_from(["xfl"]).is_err());
    }

    #[test]
    fn test_variables_file_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.yaml");
        std::fs::write(
            &path,
            "input:\n  - label: order\n    $fqn: com.acme.Order\noutput:\n  - label: total\n    $fqn: java.math.BigDecimal\n",
        )
        .unwrap();

        let vars = VariablesFile::load(&path).unwrap();
        assert_eq!(vars.input, vec![Value::new("order", "com.acme.Order")]);
        assert_eq!(vars.output.len(), 1);
    }

    #[test]
    fn test_variables_file_json_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.json");
        std::fs::write(&path, r#"{"input": [{"label": "a", "$fqn": "T"}]}"#).unwrap();
        let vars = VariablesFile::load(&path).unwrap();
        assert_eq!(vars.input.len(), 1);
        assert!(vars.output.is_empty());

        assert!(VariablesFile::load(&dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_formula_report_lists_parts() {
        let formula = Formula::parse("%0%+\"x\"", vec![Value::new("a", "com.acme.A")], vec![]);
        let report = FormulaReport::new(&formula);
        assert_eq!(report.parts.len(), 3);
        assert_eq!(report.parts[0].fqn.as_deref(), Some("com.acme.A"));
        assert!(report.render().contains("com.acme.A"));
    }
}
