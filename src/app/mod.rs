use anyhow::{Context, Result};
use clap::{Parser as ClapParser, ValueEnum};
use std::path::PathBuf;

use filterlex::dsl::{Group, Parser};
use filterlex::{ParserConfig, StreamMode};

#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Filter expression, e.g. "(a == 1 || a > 5) && b >= 19"
    #[arg(required_unless_present = "input", conflicts_with = "input")]
    pub expression: Option<String>,

    /// Read the expression from a file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Parser configuration file (YAML)
    #[arg(short, long, env = "FILTERLEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the configured token stream mode
    #[arg(long, value_enum)]
    pub stream_mode: Option<StreamMode>,

    /// Override the tokenizer queue capacity
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Print every token seen by the parser to stderr
    #[arg(long)]
    pub tokens: bool,

    /// Output format for the parsed tree
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum OutputFormat {
    Json,
    Yaml,
}

pub fn output_format_label(format: &OutputFormat) -> &'static str {
    match format {
        OutputFormat::Json => "json",
        OutputFormat::Yaml => "yaml",
    }
}

/// Config file first, then command line overrides.
pub fn load_config(cli: &Cli) -> Result<ParserConfig> {
    let mut config = match &cli.config {
        Some(path) => ParserConfig::load(path)
            .with_context(|| format!("Config: Failed to load {:?}", path))?,
        None => ParserConfig::default(),
    };

    if let Some(mode) = cli.stream_mode {
        config.stream_mode = mode;
    }
    if let Some(capacity) = cli.queue_capacity {
        config.queue_capacity = capacity;
    }
    Ok(config)
}

pub fn read_expression(cli: &Cli) -> Result<String> {
    match (&cli.expression, &cli.input) {
        (Some(expression), _) => Ok(expression.clone()),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("CLI: Failed to read expression from {:?}", path)),
        (None, None) => anyhow::bail!("CLI: No expression given; pass one or use --input"),
    }
}

pub fn render(group: &Group, format: &OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(group)?,
        OutputFormat::Yaml => serde_yaml::to_string(group)?,
    };
    Ok(rendered)
}

pub fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let expression = read_expression(cli)?;
    tracing::info!(
        "Parsing {:?} (stream: {:?}, queue: {})",
        expression,
        config.stream_mode,
        config.queue_capacity
    );

    let mut parser = Parser::new(expression.as_str()).with_config(config);
    let tokens = cli.tokens.then(|| parser.subscribe());
    let result = parser.parse();

    if let Some(rx) = tokens {
        for token in rx.try_iter() {
            eprintln!("{}", token);
        }
    }

    let group = result.with_context(|| format!("Parse: Invalid expression {:?}", expression))?;
    tracing::info!(
        "Parsed {} group(s), output: {}",
        group.groups().count(),
        output_format_label(&cli.format)
    );

    println!("{}", render(&group, &cli.format)?);
    Ok(())
}
