use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use yamlquery::config::Config;
use yamlquery::expression::{compile, SyntaxError};
use yamlquery::file::loader::{load_sources, load_stdin};
use yamlquery::file::printer::{JsonPrinter, OutputFormat, YamlPrinter};
use yamlquery::navigator::MissingKeyPolicy;
use yamlquery::stream::{OutputSink, StreamEvaluator};

/// Environment variable holding the log filter (e.g. `debug`, `yamlquery=trace`).
const LOG_ENV: &str = "YAMLQUERY_LOG";

/// yamlquery - query and transform YAML documents with path expressions
#[derive(Parser)]
#[command(name = "yamlquery")]
#[command(version)]
#[command(about = "Query and transform YAML documents with path expressions", long_about = None)]
struct Cli {
    /// Expression to evaluate, e.g. '.spec.containers[].image'
    expression: String,

    /// YAML files to read (omit, or use '-', to read stdin)
    files: Vec<PathBuf>,

    /// Evaluate once against a single null document instead of reading input
    #[arg(short, long)]
    null_input: bool,

    /// Output format: yaml or json
    #[arg(short, long, value_name = "FORMAT")]
    output_format: Option<OutputFormat>,

    /// Spaces per indentation level (0 prints compact JSON)
    #[arg(short = 'I', long, value_name = "N")]
    indent: Option<usize>,

    /// Print top-level strings without quotes
    #[arg(short, long, overrides_with = "no_raw")]
    raw: bool,

    /// Always quote top-level strings as needed
    #[arg(long, overrides_with = "raw")]
    no_raw: bool,

    /// What '.key' does when the key is absent: skip, null or error
    #[arg(long, value_name = "POLICY")]
    missing_key: Option<MissingKeyPolicy>,

    /// Drop comments from YAML output
    #[arg(long)]
    no_comments: bool,

    /// Ignore ~/.config/yamlquery/config.toml
    #[arg(long)]
    no_config: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if err.downcast_ref::<SyntaxError>().is_some() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = if cli.no_config {
        Config::default()
    } else {
        Config::load()
    };

    // Syntax errors are reported before any input is read
    let ast = compile(&cli.expression)?;
    debug!(expression = %cli.expression, "compiled expression");

    let mut navigator_options = config.navigator_options()?;
    if let Some(policy) = cli.missing_key {
        navigator_options.missing_key = policy;
    }

    let format = match cli.output_format {
        Some(format) => format,
        None => config.output_format()?,
    };

    let mut print_options = config.print_options();
    if let Some(indent) = cli.indent {
        print_options.indent_size = indent;
    }
    if cli.no_comments {
        print_options.preserve_comments = false;
    }
    // JSON keeps strings quoted unless raw output is asked for explicitly
    print_options.unwrap_scalars = if cli.raw {
        true
    } else if cli.no_raw {
        false
    } else {
        format == OutputFormat::Yaml && print_options.unwrap_scalars
    };

    let stdout = io::stdout();
    let writer = BufWriter::new(stdout.lock());
    let mut sink: Box<dyn OutputSink> = match format {
        OutputFormat::Yaml => Box::new(YamlPrinter::new(writer, print_options)),
        OutputFormat::Json => Box::new(JsonPrinter::new(writer, print_options)),
    };

    let evaluator = StreamEvaluator::new(navigator_options);
    if cli.null_input {
        evaluator.run_null_input(&ast, sink.as_mut())?;
        return Ok(());
    }

    let sources = if cli.files.is_empty() {
        vec![load_stdin()?]
    } else {
        load_sources(&cli.files)?
    };
    evaluator
        .run(&sources, &ast, sink.as_mut())
        .context("Evaluation failed")?;

    Ok(())
}
