//! hclref cli interface

use clap::{Parser, Subcommand, ValueEnum};
use hclref::{format::Format, variable::ResourceMode};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; hclref ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a schema into its decode specification
    Spec(SpecCommand),

    /// List the variables a configuration body references
    ///
    /// Reads HCL from stdin unless any other source is provided (via --input-*)
    #[command(alias = "vars")]
    Variables(VariablesCommand),

    /// Look up the schema of a resource or data source type in a provider manifest
    Schema(SchemaCommand),
}

#[derive(Parser, Debug)]
pub struct SpecCommand {
    /// Schema file (.json, .yaml or .yml)
    #[clap(short = 's', long = "schema")]
    pub schema: PathBuf,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct VariablesCommand {
    /// Schema of the block the body belongs to (.json, .yaml or .yml)
    #[clap(short = 's', long = "schema")]
    pub schema: PathBuf,

    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct SchemaCommand {
    /// Provider manifest (.json, .yaml or .yml)
    #[clap(short = 'p', long = "provider")]
    pub provider: PathBuf,

    #[arg(short = 'm', long = "mode", default_value_t)]
    pub mode: ModeArg,

    /// Print the decode specification instead of the schema
    #[clap(long = "compile")]
    pub compile: bool,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Resource or data source type name
    pub resource_type: String,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load files from work directory
    #[clap(short = 'w', long = "input-workdir")]
    pub workdir: bool,

    /// Load a file
    #[clap(short = 'f', long = "input-file")]
    pub files: Vec<PathBuf>,

    /// Load .tf and .hcl files from given directory
    #[clap(short = 'd', long = "input-dir")]
    pub directories: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&Format::from(*self), f)
    }
}

impl From<OutputFormat> for Format {
    fn from(value: OutputFormat) -> Self {
        match value {
            OutputFormat::Json => Format::Json,
            OutputFormat::Yaml => Format::Yaml,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum ModeArg {
    /// `resource` blocks
    #[default]
    Managed,
    /// `data` blocks
    Data,
}

impl std::fmt::Display for ModeArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModeArg::Managed => f.write_str("managed"),
            ModeArg::Data => f.write_str("data"),
        }
    }
}

impl From<ModeArg> for ResourceMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Managed => ResourceMode::Managed,
            ModeArg::Data => ResourceMode::Data,
        }
    }
}
