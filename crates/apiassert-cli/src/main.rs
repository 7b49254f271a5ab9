//! apiassert CLI - OpenAPI contract checks for recorded and live HTTP exchanges

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use apiassert_core::{Config, RecordedExchange, ValidationOutcome};
use apiassert_validator::{ModuleBuilder, RecordingClient, SchemaDocument};

#[derive(Parser)]
#[command(name = "apiassert")]
#[command(about = "OpenAPI contract checks for HTTP exchanges")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Config file (default: .apiassert.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a recorded exchange file
    Validate {
        /// Exchange JSON file (see `apiassert schema`)
        #[arg(short, long)]
        exchange: PathBuf,

        /// Validate only one side of the exchange
        #[arg(long)]
        only: Option<Side>,
    },

    /// Send one request to base_url and validate the exchange
    Check {
        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path, relative to base_url
        #[arg(short, long)]
        path: String,

        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,
    },

    /// List the operations declared by the schema
    Operations,

    /// Initialize config file
    Init,

    /// Export JSON Schema for the exchange file format
    Schema,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum Side {
    Request,
    Response,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    tracing::debug!(schema = %config.schema_path().display(), "config loaded");
    Ok(config)
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Validate { exchange, only } => {
            let cfg = load_config(cli.config.as_deref())?;
            let recorded = RecordedExchange::load(&exchange)
                .with_context(|| format!("loading exchange {}", exchange.display()))?;
            let facade = ModuleBuilder::new(cfg)
                .with_rest(&recorded)
                .with_browser(&recorded)
                .build()?;

            let request = if only == Some(Side::Response) {
                None
            } else {
                Some(facade.validate_request()?)
            };
            let response = if only == Some(Side::Request) {
                None
            } else {
                Some(facade.validate_response()?)
            };
            report(cli.output, request.as_ref(), response.as_ref())
        }

        Commands::Check { method, path, body } => {
            let cfg = load_config(cli.config.as_deref())?;
            let mut client = RecordingClient::from_config(&cfg)?;
            match body.as_deref() {
                Some(body) => {
                    let value: serde_json::Value =
                        serde_json::from_str(body).context("--body is not valid JSON")?;
                    client.send_json(&method, &path, &value)?;
                }
                None => {
                    client.send(&method, &path, None)?;
                }
            }

            let facade = ModuleBuilder::new(cfg)
                .with_rest(&client)
                .with_browser(&client)
                .build()?;
            let request = facade.validate_request()?;
            let response = facade.validate_response()?;
            report(cli.output, Some(&request), Some(&response))
        }

        Commands::Operations => {
            let cfg = load_config(cli.config.as_deref())?;
            let document = SchemaDocument::load(&cfg.schema_path())?;
            match cli.output {
                OutputFormat::Terminal => {
                    println!(
                        "{} ({} operations)",
                        cfg.schema_path().display(),
                        document.operations().len()
                    );
                    for op in document.operations() {
                        println!("  {} -> {}", op.label(), op.declared_statuses().join(", "));
                    }
                }
                OutputFormat::Json => {
                    let ops: Vec<_> = document
                        .operations()
                        .iter()
                        .map(|op| {
                            serde_json::json!({
                                "method": op.method,
                                "path": op.path,
                                "statuses": op.declared_statuses(),
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&ops)?);
                }
                OutputFormat::Silent => {}
            }
            Ok(0)
        }

        Commands::Init => {
            let config_path = ".apiassert.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - schema: path to your OpenAPI document");
            println!("  - base_url: server for `apiassert check`");
            println!("  - headers: auth tokens, API keys");
            Ok(0)
        }

        Commands::Schema => {
            let schema = apiassert_core::schema::generate_schema();
            println!("{schema}");
            Ok(0)
        }
    }
}

/// Print outcomes; exit code 0 when every checked side is valid, else 1.
fn report(
    output: OutputFormat,
    request: Option<&ValidationOutcome>,
    response: Option<&ValidationOutcome>,
) -> Result<i32> {
    let valid = request.into_iter().chain(response).all(ValidationOutcome::is_valid);

    match output {
        OutputFormat::Terminal => {
            for (side, outcome) in [("request", request), ("response", response)] {
                let Some(outcome) = outcome else { continue };
                if outcome.valid {
                    println!("PASS {side}");
                } else {
                    println!("FAIL {side}: {}", outcome.message);
                }
            }
        }
        OutputFormat::Json => {
            let json_output = serde_json::json!({
                "valid": valid,
                "request": request,
                "response": response,
            });
            println!("{}", serde_json::to_string_pretty(&json_output)?);
        }
        OutputFormat::Silent => {}
    }

    Ok(if valid { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_exit_codes() {
        let pass = ValidationOutcome::passed();
        let fail = ValidationOutcome::failed("Status 500 is not declared");
        assert_eq!(report(OutputFormat::Silent, Some(&pass), Some(&pass)).unwrap(), 0);
        assert_eq!(report(OutputFormat::Silent, Some(&pass), Some(&fail)).unwrap(), 1);
        assert_eq!(report(OutputFormat::Silent, None, Some(&pass)).unwrap(), 0);
    }

    #[test]
    fn cli_parses_validate() {
        let cli = Cli::try_parse_from([
            "apiassert",
            "validate",
            "--exchange",
            "last.json",
            "--only",
            "response",
            "--output",
            "json",
        ])
        .unwrap();
        assert!(cli.output == OutputFormat::Json);
        let Commands::Validate { exchange, only } = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(exchange, PathBuf::from("last.json"));
        assert_eq!(only, Some(Side::Response));
    }
}
