// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command-line interface for ld-query
//!
//! Runs path queries against JSON-LD documents read from a file or stdin.

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use ld_query::{CacheConfig, Context, LdQuery};
use serde_json::Value as JsonValue;
use std::fs;
use std::io::{self, Read};
use std::process;

#[derive(Parser)]
#[command(name = "ld-query")]
#[command(about = "Query linked-data JSON documents with selector-style paths")]
#[command(version)]
#[command(author = "OctoFHIR Team <funyloony@gmail.com>")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ContextArgs {
    /// JSON file holding the context object
    #[arg(short, long)]
    context: Option<String>,
    /// Context object given inline as JSON
    #[arg(long, conflicts_with = "context")]
    context_json: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a path query against a document
    Query {
        /// Path expression to evaluate
        path: String,
        /// JSON file containing the document (reads from stdin if not provided)
        #[arg(short, long)]
        file: Option<String>,
        #[command(flatten)]
        context: ContextArgs,
        /// Return every match instead of the first one
        #[arg(short, long)]
        all: bool,
        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
        /// Do not cache document traces
        #[arg(long)]
        no_cache: bool,
    },
    /// Show the compiled match steps of a path expression
    Compile {
        /// Path expression to compile
        path: String,
        #[command(flatten)]
        context: ContextArgs,
        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    // Setup human-panic for better error messages
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Query {
            path,
            file,
            context,
            all,
            pretty,
            no_cache,
        } => {
            let document = read_document(file.as_deref())?;
            let context = load_context(&context, Some(&document))?;
            let config = if no_cache {
                CacheConfig::disabled()
            } else {
                CacheConfig::default()
            };

            let node = LdQuery::with_config(&context, config).document(document);
            let output = if all {
                JsonValue::Array(node.query_all(&path).into_json())
            } else {
                node.query(&path)
                    .map(|selection| selection.into_json())
                    .unwrap_or(JsonValue::Null)
            };
            print_json(&output, pretty)
        }
        Commands::Compile {
            path,
            context,
            pretty,
        } => {
            let context = load_context(&context, None)?;
            let compiled = LdQuery::new(&context).compile(&path);
            print_json(&serde_json::to_value(&*compiled)?, pretty)
        }
    }
}

fn read_document(file: Option<&str>) -> Result<JsonValue> {
    let data = match file {
        Some(filename) => fs::read_to_string(filename)
            .with_context(|| format!("reading document '{filename}'"))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading document from stdin")?;
            buffer
        }
    };
    serde_json::from_str(&data).context("parsing document JSON")
}

/// Resolve the context from the flags, falling back to the document's own
/// `@context`
fn load_context(args: &ContextArgs, document: Option<&JsonValue>) -> Result<Context> {
    let value = if let Some(path) = &args.context {
        let data =
            fs::read_to_string(path).with_context(|| format!("reading context '{path}'"))?;
        serde_json::from_str(&data).context("parsing context JSON")?
    } else if let Some(inline) = &args.context_json {
        serde_json::from_str(inline).context("parsing inline context JSON")?
    } else {
        match document.and_then(|doc| doc.get("@context")) {
            Some(embedded) => embedded.clone(),
            None => return Ok(Context::new()),
        }
    };

    // a context file may itself be a document wrapping "@context"
    let value = match value.get("@context") {
        Some(inner) if inner.is_object() => inner.clone(),
        _ => value,
    };
    let context = Context::from_json(&value)?;
    log::debug!(
        "Loaded context with {} alias(es), vocab: {}",
        context.len(),
        context.vocab().unwrap_or("none")
    );
    Ok(context)
}

fn print_json(value: &JsonValue, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}
