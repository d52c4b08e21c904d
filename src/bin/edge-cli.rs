use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use edge_rewrite::config::{self, EdgeConfig};
use edge_rewrite::functions::{EdgeEvent, Outcome, Request, Response};
use edge_rewrite::http::response::status_code;
use edge_rewrite::store::{import, KeyValueStore};
use edge_rewrite::Router;

#[derive(Parser)]
#[command(name = "edge-cli")]
#[command(about = "Offline tooling for the edge rewrite engine", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Store import document layered over the configured entries.
    #[arg(short, long)]
    kvs: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a viewer request through its behavior's request chain
    Rewrite {
        uri: String,
        #[arg(short, long, default_value = "GET")]
        method: String,
        /// Extra header as `name=value`
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
    /// Run an origin response through the response chain of the behavior for `path`
    Respond {
        #[arg(short, long)]
        path: String,
        #[arg(short, long, default_value_t = 200)]
        status: u16,
    },
    /// Run a function event document (`{"request": ...}` or `{"response": ...}`)
    Event {
        file: PathBuf,
        /// Path selecting the behavior for response events
        #[arg(short, long, default_value = "/")]
        path: String,
    },
    /// Inspect the key-value store
    Kvs {
        #[command(subcommand)]
        command: KvsCommands,
    },
    /// Validate the configuration and print the route table
    Check,
}

#[derive(Subcommand)]
enum KvsCommands {
    /// Print every entry as an import document
    List,
    /// Print a single value
    Get { key: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => EdgeConfig::default(),
    };

    let store = config::load_store(&config.store)?;
    if let Some(path) = &cli.kvs {
        let mut entries = store.entries();
        entries.extend(import::load_import(path)?);
        store.replace(entries);
    }
    let store = Arc::new(store);

    match cli.command {
        Commands::Rewrite {
            uri,
            method,
            headers,
        } => {
            let router = Router::from_config(&config, store)?;
            let mut request = Request::new(method.to_uppercase(), uri);
            for header in &headers {
                let (name, value) = header
                    .split_once('=')
                    .ok_or_else(|| format!("header `{}` is not `name=value`", header))?;
                request = request.with_header(name, value);
            }

            let evaluation = router.evaluate(request);
            print_json(&json!({
                "behavior": evaluation.behavior.name,
                "origin": evaluation.behavior.origin,
                "stages": evaluation.behavior.viewer_request.names(),
                "outcome": evaluation.outcome,
                "anomalies": evaluation.anomalies,
            }))?;
        }
        Commands::Respond { path, status } => {
            let router = Router::from_config(&config, store)?;
            let behavior = router.match_path(&path);
            let reason = status_code(status).canonical_reason().unwrap_or_default();
            let response = router.respond(behavior, Response::new(status, reason));
            print_json(&json!({
                "behavior": behavior.name,
                "stages": behavior.viewer_response.names(),
                "response": response,
            }))?;
        }
        Commands::Event { file, path } => {
            let event: EdgeEvent = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            let router = Router::from_config(&config, store)?;

            let result = match (event.request, event.response) {
                (Some(request), _) => match router.evaluate(request).outcome {
                    Outcome::Forward(request) => EdgeEvent {
                        request: Some(request),
                        response: None,
                    },
                    Outcome::Respond(response) => EdgeEvent {
                        request: None,
                        response: Some(response),
                    },
                },
                (None, Some(response)) => EdgeEvent {
                    request: None,
                    response: Some(router.respond(router.match_path(&path), response)),
                },
                (None, None) => return Err("event carries neither a request nor a response".into()),
            };
            print_json(&serde_json::to_value(&result)?)?;
        }
        Commands::Kvs { command } => match command {
            KvsCommands::List => println!("{}", import::to_import(&store.entries())?),
            KvsCommands::Get { key } => match store.get(&key) {
                Some(value) => println!("{}", value),
                None => {
                    eprintln!("Error: key `{}` is missing or empty", key);
                    std::process::exit(1);
                }
            },
        },
        Commands::Check => {
            if let Err(errors) = config::validate_config(&config) {
                for error in &errors {
                    eprintln!("Error: {}", error);
                }
                std::process::exit(1);
            }

            let router = Router::from_config(&config, store)?;
            let behaviors: Vec<Value> = router
                .behaviors()
                .map(|b| {
                    json!({
                        "name": b.name,
                        "origin": b.origin,
                        "viewer_request": b.viewer_request.names(),
                        "viewer_response": b.viewer_response.names(),
                    })
                })
                .collect();
            print_json(&json!({ "valid": true, "behaviors": behaviors }))?;
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
