use anyhow::Context;
use rulegen_core::generate::{generate, GenerateOptions};
use rulegen_core::report::generation_summary;
use rulegen_core::schema::{self, SchemaError};
use rulegen_core::severity::SeverityPolicy;
use rulegen_core::tables::CatalogTables;
use std::path::Path;

use super::read_json;
use crate::cli::args::{GenerateArgs, SeverityPolicyArg};
use crate::exit_codes;

pub fn run(args: GenerateArgs) -> anyhow::Result<i32> {
    let assertions_raw = read_json(&args.assertions)?;
    let matrix_raw = read_json(&args.matrix)?;
    let profile_raw = read_json(&args.profile)?;

    let assertions = match schema::assertions_pack(&assertions_raw) {
        Ok(pack) => pack,
        Err(e) => return Ok(report_schema_failure(&args.assertions, &e)),
    };
    let matrix = match schema::matrix(&matrix_raw) {
        Ok(m) => m,
        Err(e) => return Ok(report_schema_failure(&args.matrix, &e)),
    };
    let profile = match schema::generation_profile(&profile_raw) {
        Ok(p) => p,
        Err(e) => return Ok(report_schema_failure(&args.profile, &e)),
    };

    let opts = GenerateOptions {
        severity_policy: match args.severity_policy {
            SeverityPolicyArg::Keyword => SeverityPolicy::KeywordScan,
            SeverityPolicyArg::Preset => SeverityPolicy::PresetFirst,
        },
    };

    let tables = CatalogTables::builtin();
    let generated = match generate(&assertions, &matrix, &profile, &tables, &opts) {
        Ok(g) => g,
        Err(e) => {
            // No partial pack is ever written.
            eprintln!("generation aborted: {e}");
            return Ok(exit_codes::INPUT_ERROR);
        }
    };

    let json = serde_json::to_string_pretty(&generated.pack)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            print!("{}", generation_summary(&generated));
        }
        None => {
            println!("{json}");
            eprint!("{}", generation_summary(&generated));
        }
    }

    Ok(exit_codes::OK)
}

fn report_schema_failure(path: &Path, err: &SchemaError) -> i32 {
    eprintln!("{}: {err}", path.display());
    for violation in &err.violations {
        eprintln!("  {violation}");
    }
    exit_codes::INPUT_ERROR
}
