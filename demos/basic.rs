//! Basic example of using token-gate as a library
//!
//! Checks every Markdown file under the current directory against a per-file budget
//! and prints the same table the CLI does.

use token_gate::{Config, Encoding, LimitMode, Pipeline, Report};

fn main() -> anyhow::Result<()> {
    let config = Config::builder()
        .pattern("**/*.md")
        .pattern("!target/**")
        .max_tokens(8_000)
        .mode(LimitMode::PerFile)
        .encoding(Encoding::O200kBase)
        .build()?;

    let pipeline = Pipeline::new(config)?;
    let result = pipeline.run()?;

    let report = Report::new(&result, pipeline.config(), pipeline.root());
    println!("{}", report.table());

    match report.failure_message() {
        Some(message) => println!("✗ {message}"),
        None => println!("✓ All {} file(s) within budget", result.file_count()),
    }

    Ok(())
}
