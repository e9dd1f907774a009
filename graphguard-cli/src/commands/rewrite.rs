//! `graphguard rewrite` command - rewrite a SPARQL query under a user's policy.

use graphguard_core::{PassReport, Query, RewriteReport, Rewriter};
use graphguard_rdf::{parse_select, write_filter, write_select, write_triple, InMemoryDataset};

use crate::cli::{OutputFormat, RewriteArgs};
use crate::commands::{resolve_dataset_path, resolve_policy_path, resolve_query_text};
use crate::config::Config;
use crate::error::CliResult;
use crate::output;

/// Run the rewrite command.
pub async fn run(args: RewriteArgs) -> CliResult<()> {
    let config = Config::discover()?;
    let dataset_path = resolve_dataset_path(args.dataset, &config)?;
    let policy_path = resolve_policy_path(args.policy, &config)?;
    let format = args.format.unwrap_or_else(|| default_format(&config));

    let dataset = InMemoryDataset::load_from_path(&dataset_path)?;
    let (policy, accepted, skipped) = graphguard_core::policy::json::load_from_path(&policy_path)?;
    if skipped > 0 {
        tracing::warn!(accepted, skipped, "some policy entries were skipped while loading");
    }

    let query_text = resolve_query_text(&args.query)?;
    let parsed = parse_select(&query_text)?;

    let rewriter = Rewriter::new(&policy, &dataset, &dataset, args.user)?;
    let (output_query, report) = rewriter.rewrite(parsed.query.clone())?;

    match format {
        OutputFormat::Text => print_text(&parsed.prefixes, &parsed.query, &output_query, &report),
        OutputFormat::Json => print_json(&parsed.prefixes, &parsed.query, &output_query, &report)?,
    }

    Ok(())
}

pub(crate) fn default_format(config: &Config) -> OutputFormat {
    match config.format.as_deref() {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Text,
    }
}

pub(crate) fn print_text(
    prefixes: &[(String, String)],
    input: &Query,
    output_query: &Query,
    report: &RewriteReport,
) {
    output::header("Input query");
    output::code(&write_select(prefixes, input));

    print_pass("node", &report.node);
    print_pass("predicate", &report.predicate);
    print_pass("attribute", &report.attribute);

    output::header("Output query");
    output::code(&write_select(prefixes, output_query));
}

fn print_pass(kind: &str, pass: &PassReport) {
    output::section(&format!("{kind} pass"));
    if pass.constraints_applied == 0 {
        output::list_item(&format!("no {kind} constraints applied"));
        output::newline();
        return;
    }
    for t in &pass.triples_removed {
        output::list_item(&format!("removed triple: {}", write_triple(t)));
    }
    for f in &pass.filters_added {
        output::list_item(&format!("added filter: {}", write_filter(f)));
    }
    for f in &pass.filters_removed {
        output::list_item(&format!("removed filter: {}", write_filter(f)));
    }
    output::newline();
}

pub(crate) fn print_json(
    prefixes: &[(String, String)],
    input: &Query,
    output_query: &Query,
    report: &RewriteReport,
) -> CliResult<()> {
    let value = serde_json::json!({
        "input_query": write_select(prefixes, input),
        "output_query": write_select(prefixes, output_query),
        "passes": {
            "node": pass_to_json(&report.node),
            "predicate": pass_to_json(&report.predicate),
            "attribute": pass_to_json(&report.attribute),
        },
    });
    println!("{}", serde_json::to_string_pretty(&value).map_err(|e| {
        crate::error::CliError::Config(format!("failed to serialize rewrite report: {e}"))
    })?);
    Ok(())
}

fn pass_to_json(pass: &PassReport) -> serde_json::Value {
    serde_json::json!({
        "constraints_applied": pass.constraints_applied,
        "triples_removed": pass.triples_removed.iter().map(write_triple).collect::<Vec<_>>(),
        "filters_added": pass.filters_added.iter().map(write_filter).collect::<Vec<_>>(),
        "filters_removed": pass.filters_removed.iter().map(write_filter).collect::<Vec<_>>(),
    })
}
