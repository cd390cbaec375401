use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;
use quarry_common::config::AppConfig;
use quarry_common::logging::init_logger;
use quarry_json::{json, JsonProcessor, JsonValueType};
use quarry_table::column::string_col;
use quarry_table::filter::and_;
use quarry_table::{json_table, new_table, Filter, JsonTableOptions, Source};

#[derive(Parser)]
#[command(version, name = "quarry")]
#[command(about = "Ingest JSON documents into typed tables")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the output columns of a JSON value type description
    Schema {
        /// Path to the JSON value type description
        #[arg(long)]
        options: PathBuf,
    },
    /// Ingest JSON files and print the resulting table
    Ingest {
        /// Path to the JSON value type description
        #[arg(long)]
        options: PathBuf,

        /// Allow multiple whitespace-separated JSON values in each file
        #[arg(long)]
        multi_value: bool,

        /// Number of rows appended at a time (default: from configuration)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Maximum number of worker threads (default: from configuration)
        #[arg(long)]
        max_threads: Option<usize>,

        /// Row conditions such as `price > 10`, all of which must hold
        #[arg(long = "where")]
        conditions: Vec<String>,

        /// Maximum number of rows to print
        #[arg(long)]
        limit: Option<usize>,

        /// Truncate cell values to this many characters (0 = no truncation)
        #[arg(long, default_value = "0")]
        truncate: usize,

        /// JSON files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn load_value_type(path: &Path) -> Result<JsonValueType, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let value = serde_json::from_str::<serde_json::Value>(&content)?;
    Ok(JsonValueType::from_json_value(&value)?)
}

fn print_schema(config: &AppConfig, options: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let processor = JsonProcessor::try_new(json(load_value_type(options)?)?, &config.naming)?;
    let types = processor
        .column_types()
        .map(|t| t.to_string())
        .collect::<Vec<_>>();
    let schema = new_table([
        string_col("column", processor.column_names().to_vec())?,
        string_col("type", types)?,
    ])?;
    print!("{schema}");
    Ok(())
}

pub fn main(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_from(args);
    let config = AppConfig::load()?;
    init_logger()?;

    match cli.command {
        Command::Schema { options } => print_schema(&config, &options)?,
        Command::Ingest {
            options,
            multi_value,
            chunk_size,
            max_threads,
            conditions,
            limit,
            truncate,
            files,
        } => {
            let value_type = load_value_type(&options)?;
            let mut options = JsonTableOptions::from_config(
                value_type,
                files.into_iter().map(Source::File),
                &config,
            );
            options.multi_value_support |= multi_value;
            if let Some(chunk_size) = chunk_size {
                options.chunk_size = chunk_size;
            }
            if let Some(max_threads) = max_threads {
                options.max_threads = max_threads;
            }
            let mut table = json_table(options)?;
            if !conditions.is_empty() {
                table = table.where_(&and_(Filter::from_(conditions)?))?;
                info!("{} rows match the conditions", table.num_rows());
            }
            let limit = limit.unwrap_or(table.num_rows());
            print!("{}", table.show(limit, truncate));
        }
    }
    Ok(())
}
