use anyhow::{Context, bail};
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use token_gate::{
    Config, DEFAULT_MAX_TOKENS, Encoding, LimitMode, Pipeline, Report, parse_max_tokens,
    split_patterns,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "token-gate",
    version,
    author,
    about = "Fail a build when files selected by glob patterns exceed a token budget",
    long_about = "Counts tokens in every file matched by the given glob patterns and fails \
    when the budget is exceeded.\n\n\
    In `total` mode the sum over all files is compared against the limit; in `per_file` \
    mode every file is compared on its own. Files containing NUL bytes are treated as \
    binary and count as 0 tokens.\n\n\
    Inputs can also be supplied through GitHub Actions-style environment variables \
    (INPUT_PATTERNS, INPUT_MAX_TOKENS, INPUT_TOKEN_LIMIT_MODE, INPUT_ENCODING).\n\n\
    USAGE EXAMPLES:\n  \
      # Keep all agent instructions under 2,500 tokens in total\n  \
      token-gate -p 'CLAUDE.md' -p '.claude/**/*.md'\n\n  \
      # Limit every doc page individually\n  \
      token-gate -p 'docs/**/*.md' --max-tokens 8000 --mode per_file"
)]
struct Cli {
    /// Glob pattern selecting files to check (repeatable, newline-separated lists allowed)
    ///
    /// Prefix a pattern with `!` to exclude its matches; lines starting with `#` are ignored.
    #[arg(
        short,
        long = "pattern",
        value_name = "GLOB",
        env = "INPUT_PATTERNS",
        required = true
    )]
    patterns: Vec<String>,

    /// Token limit (non-negative integer)
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_MAX_TOKENS,
        value_parser = parse_max_tokens,
        env = "INPUT_MAX_TOKENS"
    )]
    max_tokens: usize,

    /// Limit mode: `total` or `per_file`
    #[arg(
        long,
        default_value_t = LimitMode::Total,
        value_parser = parse_trimmed::<LimitMode>,
        env = "INPUT_TOKEN_LIMIT_MODE"
    )]
    mode: LimitMode,

    /// Tokenizer encoding (cl100k_base, o200k_base, p50k_base, p50k_edit, r50k_base)
    #[arg(
        short,
        long,
        default_value_t = Encoding::Cl100kBase,
        value_parser = parse_trimmed::<Encoding>,
        env = "INPUT_ENCODING"
    )]
    encoding: Encoding,

    /// Directory relative patterns are resolved against
    #[arg(long, default_value = ".", value_name = "PATH")]
    root: PathBuf,

    /// Print the result as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Append a Markdown summary to this file
    #[arg(long, value_name = "FILE", env = "GITHUB_STEP_SUMMARY")]
    summary_file: Option<PathBuf>,

    /// Append `name=value` outputs to this file
    #[arg(long, value_name = "FILE", env = "GITHUB_OUTPUT")]
    output_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let config = build_config(&cli).context("Invalid configuration")?;

    let pipeline = Pipeline::new(config).context("Failed to create pipeline")?;
    let result = pipeline.run().context("Token check failed")?;
    let report = Report::new(&result, pipeline.config(), pipeline.root());

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.table());
    }

    if let Some(path) = cli.summary_file.as_deref().filter(|p| !p.as_os_str().is_empty()) {
        report
            .append_summary(path)
            .context("Failed to write job summary")?;
    }

    if let Some(path) = cli.output_file.as_deref().filter(|p| !p.as_os_str().is_empty()) {
        report
            .write_outputs(path)
            .context("Failed to write outputs")?;
    }

    if let Some(message) = report.failure_message() {
        bail!(message);
    }

    Ok(())
}

fn build_config(cli: &Cli) -> token_gate::Result<Config> {
    let patterns: Vec<String> = cli
        .patterns
        .iter()
        .flat_map(|p| split_patterns(p))
        .collect();

    Config::builder()
        .patterns(patterns)
        .root_dir(&cli.root)
        .max_tokens(cli.max_tokens)
        .mode(cli.mode)
        .encoding(cli.encoding)
        .build()
}

fn parse_trimmed<T>(value: &str) -> token_gate::Result<T>
where
    T: FromStr<Err = token_gate::Error>,
{
    value.trim().parse()
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("token_gate=info"),
        1 => EnvFilter::new("token_gate=debug"),
        _ => EnvFilter::new("token_gate=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .try_init()?;

    Ok(())
}
