//! `graphguard check-policy` command - parse a policy file and report
//! accepted/skipped entry counts without running a rewrite.

use crate::cli::CheckPolicyArgs;
use crate::commands::resolve_policy_path;
use crate::config::Config;
use crate::error::CliResult;
use crate::output::{self, kv, success, warn};

/// Run the check-policy command.
pub async fn run(args: CheckPolicyArgs) -> CliResult<()> {
    let config = Config::discover()?;
    let policy_path = resolve_policy_path(args.policy, &config)?;

    output::header("Check Policy");

    let (_policy, accepted, skipped) = graphguard_core::policy::json::load_from_path(&policy_path)?;

    kv("File", &policy_path.display().to_string());
    kv("Accepted entries", &accepted.to_string());
    kv("Skipped entries", &skipped.to_string());
    output::newline();

    if skipped == 0 {
        success(&format!("all {accepted} policy entries parsed cleanly"));
    } else {
        warn(&format!(
            "{skipped} entries were skipped; re-run with GRAPHGUARD_DEBUG=1 to see why"
        ));
    }

    Ok(())
}
