mod cli;

use hclref::{
    documents::Documents,
    format::{self, Format},
    lower::detect_variables_with_spec,
    provider::Manifest,
    resolve::resolve_schema,
    schema::Block,
    variable::ResourceMode,
};
use serde::Serialize;
use std::path::Path;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("HCLREF_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Spec(spec_cli) => spec(spec_cli),
        cli::Command::Variables(variables_cli) => variables(variables_cli),
        cli::Command::Schema(schema_cli) => schema(schema_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn spec(cli: cli::SpecCommand) -> anyhow::Result<()> {
    let schema = load_schema(&cli.schema)?;

    output(&cli.output, &schema.decoder_spec())
}

pub fn variables(cli: cli::VariablesCommand) -> anyhow::Result<()> {
    let schema = load_schema(&cli.schema)?;
    let spec = schema.decoder_spec();
    let documents = load(&cli.input)?;

    let lowering = detect_variables_with_spec(&documents, &spec);
    if !lowering.skipped.is_empty() {
        tracing::info!(count = lowering.skipped.len(), "some traversals were skipped");
    }

    output(&cli.output, &lowering)
}

pub fn schema(cli: cli::SchemaCommand) -> anyhow::Result<()> {
    let mode = ResourceMode::from(cli.mode);
    let manifest: Manifest = format::load(&cli.provider)?;

    let Some(schema) = resolve_schema(mode, &cli.resource_type, &manifest)? else {
        anyhow::bail!("no schema available for {mode} type {:?}", cli.resource_type);
    };

    if cli.compile {
        schema.validate()?;
        output(&cli.output, &schema.decoder_spec())
    } else {
        output(&cli.output, &schema)
    }
}

/// Reads and validates a schema file
fn load_schema(path: &Path) -> anyhow::Result<Block> {
    let schema: Block = format::load(path)?;
    schema.validate()?;
    Ok(schema)
}

fn load(input: &cli::InputArgs) -> anyhow::Result<Documents> {
    if !input.workdir && input.files.is_empty() && input.directories.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        let body = hcl_edit::parser::parse_body(&stdin)?;
        return Ok(hcl::Body::from(body).into());
    }

    let mut documents = Documents::default();

    if input.workdir {
        documents.load_directory(&std::env::current_dir()?)?;
    }

    for file_path in &input.files {
        documents.load_file(file_path)?;
    }

    for dir_path in &input.directories {
        documents.load_directory(dir_path)?;
    }

    anyhow::ensure!(documents.source_count() > 0, "No files loaded");

    Ok(documents)
}

fn output<T: Serialize>(output: &cli::OutputArgs, value: &T) -> anyhow::Result<()> {
    Format::from(output.format).write(std::io::stdout(), value)?;
    Ok(())
}
