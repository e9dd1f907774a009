//! `graphguard explain` command - rewrite a query and additionally print the
//! inferred type bindings for every variable.

use graphguard_core::{Rewriter, TypeInferencer};
use graphguard_rdf::{parse_select, InMemoryDataset};

use crate::cli::ExplainArgs;
use crate::commands::{self, resolve_dataset_path, resolve_policy_path, resolve_query_text};
use crate::config::Config;
use crate::error::CliResult;
use crate::output;

/// Run the explain command.
pub async fn run(args: ExplainArgs) -> CliResult<()> {
    let config = Config::discover()?;
    let dataset_path = resolve_dataset_path(args.dataset, &config)?;
    let policy_path = resolve_policy_path(args.policy, &config)?;

    let dataset = InMemoryDataset::load_from_path(&dataset_path)?;
    let (policy, accepted, skipped) = graphguard_core::policy::json::load_from_path(&policy_path)?;
    if skipped > 0 {
        tracing::warn!(accepted, skipped, "some policy entries were skipped while loading");
    }

    let query_text = resolve_query_text(&args.query)?;
    let parsed = parse_select(&query_text)?;

    let bindings = TypeInferencer::new().infer(&parsed.query, &dataset, &dataset);

    let rewriter = Rewriter::new(&policy, &dataset, &dataset, args.user)?;
    let (output_query, report) = rewriter.rewrite(parsed.query.clone())?;

    commands::rewrite::print_text(&parsed.prefixes, &parsed.query, &output_query, &report);

    output::header("Inferred type bindings");
    if bindings.var_types.is_empty() && bindings.iri_types.is_empty() && bindings.pred_var_types.is_empty() {
        output::list_item("no type bindings inferred");
    }
    for (var, types) in &bindings.var_types {
        output::list_item(&format!("?{} : {}", var.as_str(), type_set(types)));
    }
    for (iri, types) in &bindings.iri_types {
        output::list_item(&format!("{} : {}", iri.as_str(), type_set(types)));
    }
    for (var, preds) in &bindings.pred_var_types {
        output::list_item(&format!(
            "?{} (predicate) : {}",
            var.as_str(),
            preds.iter().map(|p| p.as_str().to_string()).collect::<Vec<_>>().join(", ")
        ));
    }
    output::newline();

    Ok(())
}

fn type_set<'a>(types: impl IntoIterator<Item = &'a graphguard_core::TypeId>) -> String {
    let mut names: Vec<&str> = types.into_iter().map(|t| t.as_str()).collect();
    names.sort_unstable();
    names.join(", ")
}
