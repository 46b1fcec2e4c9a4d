use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use relmap::{Dialect, EntityDescriptor, MetadataExtractor, SchemaGenerator};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "relmap")]
#[command(about = "Generate dialect-specific DDL from entity descriptors")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print CREATE TABLE statements for JSON entity descriptors
    Ddl {
        #[arg(long, short)]
        dialect: String,
        #[arg(required = true)]
        descriptors: Vec<PathBuf>,
    },
    /// List supported dialect names
    Dialects,
    /// Print the metadata extracted from a JSON entity descriptor
    Metadata { descriptor: PathBuf },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    for line in run(cli.command)? {
        println!("{}", line);
    }
    Ok(())
}

/// Executes one subcommand and returns the blocks to print.
fn run(command: Command) -> Result<Vec<String>> {
    match command {
        Command::Ddl {
            dialect,
            descriptors,
        } => render_ddl(&dialect, &descriptors),
        Command::Dialects => Ok(dialect_names()),
        Command::Metadata { descriptor } => Ok(vec![render_metadata(&descriptor)?]),
    }
}

fn dialect_names() -> Vec<String> {
    let mut names: Vec<String> = Dialect::ALL.iter().map(|d| d.to_string()).collect();
    names.push("postgres (alias of postgresql)".to_string());
    names
}

/// One statement per entity descriptor; non-entities are skipped.
fn render_ddl(dialect: &str, paths: &[PathBuf]) -> Result<Vec<String>> {
    let generator = SchemaGenerator::new(dialect)?;
    let mut statements = Vec::with_capacity(paths.len());

    for path in paths {
        let descriptor = load_descriptor(path)?;
        match generator
            .create_table_sql_for(&descriptor)
            .with_context(|| format!("failed to generate DDL for {}", path.display()))?
        {
            Some(ddl) => statements.push(format!("{}\n", ddl)),
            None => info!("{} is not an entity, skipped", descriptor.type_name),
        }
    }

    Ok(statements)
}

fn render_metadata(path: &Path) -> Result<String> {
    let descriptor = load_descriptor(path)?;
    let Some(metadata) = MetadataExtractor::extract(&descriptor)
        .with_context(|| format!("invalid entity declaration in {}", path.display()))?
    else {
        bail!("{} is not an entity", descriptor.type_name);
    };

    Ok(serde_json::to_string_pretty(&metadata)?)
}

fn load_descriptor(path: &Path) -> Result<EntityDescriptor> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
