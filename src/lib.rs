pub mod classify;
pub mod cli;
pub mod coerce;
pub mod error;
pub mod filter;
pub mod query;
pub mod records;
pub mod schema;
pub mod value;

use std::{
    env,
    fs::{self, File},
    io::{self, BufReader, Read, Write},
    path::Path,
    sync::OnceLock,
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::{
    cli::{Cli, Commands, DescribeArgs, QueryArgs},
    filter::{WhereClause, parse_filter_expressions},
    records::RecordCollection,
    schema::{Schema, build_schema_with},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("json_sift", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Describe(args) => handle_describe(&args),
        Commands::Query(args) => handle_query(&args),
    }
}

fn handle_describe(args: &DescribeArgs) -> Result<()> {
    let options = args.inference.options()?;
    info!("Describing '{}'", args.input.display());
    let data = load_dataset(&args.input)?;
    let schema = query::describe_schema(&data, &options)
        .with_context(|| format!("Inferring schema from {:?}", args.input))?;
    match &args.output {
        Some(path) if !is_dash(path) => {
            schema
                .save(path)
                .with_context(|| format!("Writing schema to {path:?}"))?;
            info!(
                "Inferred schema for {} field(s) written to {:?}",
                schema.len(),
                path
            );
        }
        _ => write_json(None, &schema, false)?,
    }
    Ok(())
}

fn handle_query(args: &QueryArgs) -> Result<()> {
    let options = args.inference.options()?;
    let where_value = collect_where_clause(args)?;
    let data = load_dataset(&args.input)?;
    let records = RecordCollection::from_json(&data)
        .with_context(|| format!("Reading records from {:?}", args.input))?;
    let clause = WhereClause::parse(&where_value)?;
    info!(
        "Querying '{}' with {} condition(s)",
        args.input.display(),
        clause.len()
    );
    let schema = match &args.schema {
        Some(path) => {
            Schema::load(path).with_context(|| format!("Loading schema from {path:?}"))?
        }
        None => build_schema_with(&records, &options),
    };
    debug!("Schema fields: {:?}", schema.names());

    let mut rows = query::query_with_schema(&records, &schema, &clause)?;
    let matched = rows.len();
    if let Some(limit) = args.limit {
        rows.truncate(limit);
    }
    write_json(args.output.as_deref(), &rows, args.compact)?;
    info!(
        "Matched {} of {} record(s), emitted {}",
        matched,
        records.len(),
        rows.len()
    );
    Ok(())
}

/// Merges `--where`/`--where-file` with `--filter` shorthands into one object.
fn collect_where_clause(args: &QueryArgs) -> Result<JsonValue> {
    let base = match (&args.where_json, &args.where_file) {
        (Some(text), _) => {
            Some(serde_json::from_str::<JsonValue>(text).context("Parsing --where JSON")?)
        }
        (None, Some(path)) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Reading where clause from {path:?}"))?;
            Some(
                serde_json::from_str::<JsonValue>(&text)
                    .with_context(|| format!("Parsing where clause in {path:?}"))?,
            )
        }
        (None, None) => None,
    };
    let shorthand = parse_filter_expressions(&args.filters)?;
    match base {
        None => Ok(JsonValue::Object(shorthand)),
        Some(value) if shorthand.is_empty() => Ok(value),
        Some(JsonValue::Object(mut map)) => {
            for (field, condition) in shorthand {
                if map.contains_key(&field) {
                    return Err(anyhow!(
                        "Field '{field}' is constrained by both the where clause and --filter"
                    ));
                }
                map.insert(field, condition);
            }
            Ok(JsonValue::Object(map))
        }
        // Let the core report the malformed clause.
        Some(other) => Ok(other),
    }
}

pub fn load_dataset(path: &Path) -> Result<JsonValue> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(path).with_context(|| format!("Opening dataset {path:?}"))?;
        Box::new(file)
    };
    serde_json::from_reader(BufReader::new(reader))
        .with_context(|| format!("Parsing JSON dataset {path:?}"))
}

fn write_json<T: Serialize + ?Sized>(path: Option<&Path>, value: &T, compact: bool) -> Result<()> {
    let mut writer: Box<dyn Write> = match path {
        Some(path) if !is_dash(path) => Box::new(
            File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
        ),
        _ => Box::new(io::stdout().lock()),
    };
    if compact {
        serde_json::to_writer(&mut writer, value).context("Writing JSON output")?;
    } else {
        serde_json::to_writer_pretty(&mut writer, value).context("Writing JSON output")?;
    }
    writeln!(writer).context("Writing JSON output")?;
    writer.flush().context("Flushing JSON output")
}

fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}
