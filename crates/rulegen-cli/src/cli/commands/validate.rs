use anyhow::Context;
use rulegen_core::consistency::{validate_value, ValidateOptions, ValidationReport};
use rulegen_core::report::validation_summary;
use rulegen_core::schema;
use rulegen_core::tables::CatalogTables;

use super::read_json;
use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::exit_codes;

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let rules_raw = read_json(&args.rules)?;
    let assertions_raw = read_json(&args.assertions)?;

    let assertions = match schema::assertions_pack(&assertions_raw) {
        Ok(pack) => pack,
        Err(e) => {
            eprintln!("{}: {e}", args.assertions.display());
            for violation in &e.violations {
                eprintln!("  {violation}");
            }
            return Ok(exit_codes::INPUT_ERROR);
        }
    };

    let opts = ValidateOptions {
        strict_unresolved: args.strict,
    };
    let report = validate_value(&rules_raw, &assertions, &CatalogTables::builtin(), &opts);

    print_report(&report, &args)?;

    if report.is_valid() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::VALIDATION_FAILED)
    }
}

fn print_report(report: &ValidationReport, args: &ValidateArgs) -> anyhow::Result<()> {
    let rendered = match args.format {
        OutputFormat::Text => validation_summary(report),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(report)?;
            json.push('\n');
            json
        }
    };
    print!("{rendered}");
    if let Some(path) = &args.output {
        std::fs::write(path, rendered.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}
