use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rulegen",
    version,
    about = "Compliance rule-pack generator — joins an assertions pack with a coverage matrix into provider-specific check rules"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a rules pack from assertions, matrix and profile
    Generate(GenerateArgs),
    /// Validate a rules pack for schema and consistency
    Validate(ValidateArgs),
    Version,
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Assertions pack (JSON)
    #[arg(long, value_name = "FILE")]
    pub assertions: PathBuf,

    /// Coverage matrix (JSON)
    #[arg(long, value_name = "FILE")]
    pub matrix: PathBuf,

    /// Generation profile (JSON)
    #[arg(long, value_name = "FILE")]
    pub profile: PathBuf,

    /// Where to write the rules pack; stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// How rule severity is decided
    #[arg(long, value_enum, default_value_t = SeverityPolicyArg::Keyword)]
    pub severity_policy: SeverityPolicyArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityPolicyArg {
    /// Scan assertion title and id against the severity keyword tables
    Keyword,
    /// Honor the assertion's editorial severity, scan only when absent
    Preset,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Rules pack to validate (JSON)
    pub rules: PathBuf,

    /// Assertions pack the rules must reference (JSON)
    #[arg(long, value_name = "FILE")]
    pub assertions: PathBuf,

    /// Treat unresolved TBD-by-adapter conditions as errors
    #[arg(long)]
    pub strict: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the report here in addition to stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
