//! pharmacheck CLI - field-level validation of hospital pharmacy REST APIs

mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use pharmacheck_core::dryrun::build_plan;
use pharmacheck_core::template::{self, Params};
use pharmacheck_core::{Config, ExpectationEngine, to_http_file};
use pharmacheck_runner::SuiteRunner;

#[derive(Parser)]
#[command(name = "pharmacheck")]
#[command(about = "Field-level validation suite for hospital pharmacy REST APIs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the endpoint suite against the configured API
    Run {
        /// Endpoint keys to run (repeatable; default: config `only`, then all)
        #[arg(long)]
        only: Vec<String>,

        /// Config file (default: .pharmacheck.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for reproductions.http
        #[arg(short = 'd', long, default_value = ".pharmacheck")]
        output_dir: PathBuf,

        /// Dump all request/response pairs to JSONL files
        #[arg(long)]
        dump: bool,

        /// Directory for dump files (default: .pharmacheck/dumps)
        #[arg(long)]
        dump_dir: Option<PathBuf>,

        /// Stop after the first failing endpoint
        #[arg(long)]
        stop_on_failure: bool,
    },

    /// Validate a saved JSON response body against one endpoint, offline
    Check {
        /// Endpoint key
        #[arg(long)]
        endpoint: String,

        /// HTTP status code the body was received with
        #[arg(long, default_value_t = 200)]
        status: u16,

        /// JSON body file
        file: PathBuf,

        /// Placeholder override, `name=value` (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Config file (default: .pharmacheck.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List catalog endpoints
    List {
        /// Config file (default: .pharmacheck.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show resolved requests and config validations without sending anything
    Plan {
        /// Endpoint keys to plan (repeatable)
        #[arg(long)]
        only: Vec<String>,

        /// Config file (default: .pharmacheck.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema for catalog files
    Schema {
        /// Schema of `plan --output json` instead
        #[arg(long)]
        plan: bool,
    },
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got `{raw}`")),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("PHARMACHECK_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
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

fn load_config(path: Option<&Path>) -> Result<Config> {
    let cfg = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    tracing::debug!(base_url = %cfg.base_url, catalog = ?cfg.catalog, "config loaded");
    Ok(cfg)
}

fn run(cli: Cli) -> Result<i32> {
    let output = cli.output;
    match cli.command {
        Commands::Run {
            only,
            config,
            output_dir,
            dump,
            dump_dir,
            stop_on_failure,
        } => {
            let cfg = load_config(config.as_deref())?;

            if output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  base_url: {}", cfg.base_url);
                if let Some(var) = &cfg.auth_env {
                    eprintln!("  auth:     ${var}");
                } else if !cfg.headers.is_empty() {
                    eprintln!("  headers:  {} configured", cfg.headers.len());
                }
                if let Some(path) = &cfg.catalog {
                    eprintln!("  catalog:  {}", path.display());
                }
                eprintln!();
            }

            let policy = cfg.suite_policy();
            let runner = SuiteRunner::from_config(&cfg)?
                .with_stop_on_failure(stop_on_failure)
                .with_policy(policy.clone())
                .with_progress(output == OutputFormat::Terminal);
            let report = runner.run(&only)?;
            let verdict = report.verdict(&policy);

            match output {
                OutputFormat::Terminal => {
                    println!("{}", render::suite_terminal(&report, &verdict));
                }
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&render::suite_json(&report, &verdict))?
                    );
                }
                OutputFormat::Silent => {}
            }

            // Reproduction file for every unsuccessful case
            if report.unsuccessful().next().is_some() {
                let http_path = output_dir.join("reproductions.http");
                let written = std::fs::create_dir_all(&output_dir)
                    .and_then(|()| std::fs::write(&http_path, to_http_file(report.unsuccessful())));
                match written {
                    Err(e) => eprintln!("Warning: failed to write .http file: {e}"),
                    Ok(()) if output != OutputFormat::Silent => {
                        eprintln!("Reproductions: {}", http_path.display());
                    }
                    Ok(()) => {}
                }
            }

            if dump || cfg.dump {
                let dump_path = dump_dir.unwrap_or_else(|| cfg.dump_dir());
                match pharmacheck_core::dump::write_dump(&report.cases, &dump_path, true) {
                    Ok(index) => {
                        if output != OutputFormat::Silent {
                            eprintln!(
                                "Dump: {} cases → {} ({} files)",
                                index.total,
                                dump_path.display(),
                                index.endpoints.len(),
                            );
                        }
                    }
                    Err(e) => eprintln!("Warning: failed to write dump: {e}"),
                }
            }

            Ok(verdict.exit_code)
        }

        Commands::Check {
            endpoint,
            status,
            file,
            params,
            config,
        } => {
            let cfg = load_config(config.as_deref())?;
            let engine = ExpectationEngine::new(cfg.catalog()?);

            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let body: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;

            let cli_params: Params = params.into_iter().collect();
            let mut layers = cfg.param_layers(&endpoint);
            layers.push(&cli_params);
            let overrides = template::layered(layers);

            let response = engine.adapt(&endpoint, body, status)?;
            let verdict = cfg
                .suite_policy()
                .apply(&engine.evaluate_with(&endpoint, &response, &overrides)?);

            match output {
                OutputFormat::Terminal => println!("{}", render::verdict_terminal(&endpoint, &verdict)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&verdict)?),
                OutputFormat::Silent => {}
            }
            Ok(i32::from(!verdict.passed))
        }

        Commands::List { config } => {
            let cfg = load_config(config.as_deref())?;
            let catalog = cfg.catalog()?;
            match output {
                OutputFormat::Terminal => println!("{}", render::catalog_table(&catalog)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&catalog)?),
                OutputFormat::Silent => {}
            }
            Ok(0)
        }

        Commands::Plan { only, config } => {
            let mut cfg = load_config(config.as_deref())?;
            if !only.is_empty() {
                cfg.only = only;
            }
            let catalog = cfg.catalog()?;
            let plan = build_plan(&cfg, &catalog, |var| std::env::var(var).ok());
            match output {
                OutputFormat::Terminal => println!("{}", plan.to_terminal()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                OutputFormat::Silent => {}
            }
            Ok(i32::from(plan.has_errors()))
        }

        Commands::Init => {
            let config_path = ".pharmacheck.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - base_url: server to test");
            println!("  - auth_env: variable holding the Authorization value");
            println!("  - params / endpoint_params: patient, visit and scheme ids");
            Ok(0)
        }

        Commands::Schema { plan } => {
            let schema = if plan {
                pharmacheck_core::schema::generate_plan_schema()
            } else {
                pharmacheck_core::schema::generate_schema()
            };
            println!("{schema}");
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn param_parsing() {
        assert_eq!(
            parse_param("patientId=115").unwrap(),
            ("patientId".to_string(), "115".to_string())
        );
        assert_eq!(
            parse_param("search=Devid8 Roy8=x").unwrap().1,
            "Devid8 Roy8=x"
        );
        assert!(parse_param("=1").is_err());
        assert!(parse_param("patientId").is_err());
    }

    #[test]
    fn check_args_parse() {
        let cli = Cli::try_parse_from([
            "pharmacheck",
            "check",
            "--endpoint",
            "getBillingSummaryByPatientId",
            "--param",
            "patientId=115",
            "body.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Check {
                status, params, ..
            } => {
                assert_eq!(status, 200);
                assert_eq!(params, vec![("patientId".to_string(), "115".to_string())]);
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn empty_config_path_is_error() {
        let err = load_config(Some(Path::new("/nonexistent/pharmacheck.toml"))).unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
    }
}
