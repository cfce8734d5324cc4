use anyhow::{Context, Result};
use clap::Parser;
use kustcrawl::{run_crawler, Cli, LocalRepository};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let cli = Cli::parse();
    anyhow::ensure!(
        cli.root.is_dir(),
        "repository root {} is not a directory",
        cli.root.display()
    );

    let controls = cli.build_controls();
    let repository = LocalRepository::new(
        &cli.root,
        cli.repository_url.clone(),
        controls.manifest_names().clone(),
    );

    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let stats = run_crawler(&controls, &repository, cli.seed_documents(), |doc| {
        serde_json::to_writer(&mut writer, &doc).context("failed to serialize record")?;
        writer.write_all(b"\n").context("failed to write record")
    })?;
    writer.flush().context("failed to flush output")?;

    eprintln!(
        "indexed {} documents ({} parse failures, {} unreadable, {} remote skipped)",
        stats.emitted, stats.parse_failures, stats.load_failures, stats.skipped_remote
    );
    Ok(())
}
