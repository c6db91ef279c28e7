//! pecan CLI
//!
//! Inspect component part archives and repack them as tar files.

use anyhow::{Context, Result};
use clap::Parser;
use pecan::{Archive, AttributeKind, ParserConfig};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pecan")]
#[command(version)]
#[command(about = "Virtual electronic component part bins in your file system")]
struct Cli {
    /// Input archive (unpacked directory or packed tar file)
    input: PathBuf,

    /// Dump the metadata of the archive to stdout
    #[arg(short, long)]
    dump: bool,

    /// Write the archive to a new packed file
    #[arg(short = 'O', long)]
    output: Option<PathBuf>,

    /// Skip malformed attribute records instead of failing
    #[arg(long)]
    lenient: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("{}", error_message(&err, pecan::error::last_error()));
        std::process::exit(1);
    }
}

/// Outermost context plus the message recorded by the failed archive operation
fn error_message(err: &anyhow::Error, last_error: Option<String>) -> String {
    match last_error {
        Some(msg) => format!("ERROR: {}: {}", err, msg),
        None => format!("ERROR: {:#}", err),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = if cli.lenient {
        ParserConfig::lenient()
    } else {
        ParserConfig::default()
    };

    let mut part = Archive::with_config(config);
    part.read(&cli.input)
        .with_context(|| format!("Failed to read: {}", cli.input.display()))?;

    if cli.dump {
        let stdout = io::stdout();
        dump_archive(&part, &mut stdout.lock())?;
    }

    if let Some(output) = &cli.output {
        part.write(output)
            .with_context(|| format!("Failed to write: {}", output.display()))?;

        if cli.verbose {
            println!("Created: {}", output.display());
        }
    }

    Ok(())
}

fn dump_archive<W: Write>(part: &Archive, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "=============== Manifest [{}] ===============",
        part.attr_len(AttributeKind::Manifest)
    )?;
    for attr in &part.manifest {
        writeln!(out, "{}", attr)?;
    }

    writeln!(
        out,
        "\n============== Parameters [{}] ==============",
        part.attr_len(AttributeKind::Parameters)
    )?;
    for attr in &part.parameters {
        writeln!(out, "{}", attr)?;
    }

    writeln!(out, "\n================= Blobs ================")?;
    writeln!(out, "Image: {} bytes", part.image.len())?;
    writeln!(out, "Datasheet: {} bytes", part.datasheet.len())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_archive() {
        let mut part = Archive::new();
        part.add_attr_str(AttributeKind::Manifest, "Name", "LM358");
        part.add_attr_str(AttributeKind::Parameters, "Channels", "2");
        part.image = pecan::Blob::from_bytes(vec![0; 4]);

        let mut out = Vec::new();
        dump_archive(&part, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("=============== Manifest [1] ===============\n\"Name\" = \"LM358\"\n"));
        assert!(text.contains("============== Parameters [1] ==============\n\"Channels\" = \"2\"\n"));
        assert!(text.contains("Image: 4 bytes\nDatasheet: 0 bytes\n"));
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from(["pecan", "-d", "-O", "out.tar", "--lenient", "parts/lm358"]).unwrap();
        assert!(cli.dump);
        assert!(cli.lenient);
        assert_eq!(cli.output, Some(PathBuf::from("out.tar")));
        assert_eq!(cli.input, PathBuf::from("parts/lm358"));
    }

    #[test]
    fn test_error_message_keeps_context() {
        let err = anyhow::Error::new(pecan::Error::PathNotFound(PathBuf::from("parts/x")))
            .context("Failed to read: parts/x");

        assert_eq!(
            error_message(&err, Some("Path not found. Path: 'parts/x'".to_string())),
            "ERROR: Failed to read: parts/x: Path not found. Path: 'parts/x'"
        );
        assert_eq!(
            error_message(&err, None),
            "ERROR: Failed to read: parts/x: Path not found. Path: 'parts/x'"
        );
    }
}
