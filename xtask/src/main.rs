use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for the experience crates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// fmt, clippy, tests, docs, then the headless smoke run
    Check,
    Fmt,
    Clippy,
    Test,
    Doc,
    /// Validate the sample manifest and run the lifecycle headless for a few frames
    Smoke,
}

const FMT: &[&str] = &["fmt", "--all", "--", "--check"];
const CLIPPY: &[&str] = &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"];
const TEST: &[&str] = &["test", "--workspace"];
const DOC: &[&str] = &["doc", "--workspace", "--no-deps"];
const SMOKE_VALIDATE: &[&str] = &[
    "run", "-q", "-p", "experience-cli", "--", "validate", "--manifest", "config/sources.json",
];
const SMOKE_RUN: &[&str] = &[
    "run", "-q", "-p", "experience-cli", "--", "run", "--frames", "30", "--config", "config/experience.yaml",
];

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> {step}: cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        bail!("{step} failed ({status})");
    }
    Ok(())
}

fn smoke() -> Result<()> {
    cargo("smoke validate", SMOKE_VALIDATE)?;
    cargo("smoke run", SMOKE_RUN)
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Check => {
            cargo("fmt", FMT)?;
            cargo("clippy", CLIPPY)?;
            cargo("test", TEST)?;
            cargo("doc", DOC)?;
            smoke()?;
        }
        Commands::Fmt => cargo("fmt", FMT)?,
        Commands::Clippy => cargo("clippy", CLIPPY)?,
        Commands::Test => cargo("test", TEST)?,
        Commands::Doc => cargo("doc", DOC)?,
        Commands::Smoke => smoke()?,
    }
    Ok(())
}
