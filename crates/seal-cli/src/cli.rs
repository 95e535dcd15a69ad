use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "seal",
    about = "Seal: detached, verifiable signatures for commits",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Repository path (searched upwards for `.seal`)
    #[arg(long, global = true, default_value = ".")]
    pub repo: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new repository
    Init(InitArgs),
    /// Record a commit on the current branch
    Commit(CommitArgs),
    /// Show commit history
    Log(LogArgs),
    /// Sign a commit
    Sign(SignArgs),
    /// Verify commit signatures
    Verify(VerifyArgs),
    /// List signed objects
    List(ListArgs),
    /// Get or set configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: String,
    /// Add a file's contents to the commit's tree
    #[arg(long = "file")]
    pub files: Vec<PathBuf>,
    #[arg(long)]
    pub author_name: Option<String>,
    #[arg(long)]
    pub author_email: Option<String>,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct SignArgs {
    /// Revision to sign
    #[arg(default_value = "HEAD")]
    pub reference: String,
    /// PEM private key (overrides signing.key)
    #[arg(long, requires = "cert")]
    pub key: Option<PathBuf>,
    /// PEM certificate (overrides signing.certificate)
    #[arg(long, requires = "key")]
    pub cert: Option<PathBuf>,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Revision to verify
    #[arg(default_value = "HEAD", conflicts_with = "all")]
    pub reference: String,
    /// Verify every commit reachable from any ref
    #[arg(long)]
    pub all: bool,
    /// Trust anchor PEM file (repeatable; overrides verify.trust_anchors)
    #[arg(long = "ca")]
    pub ca: Vec<PathBuf>,
    /// Accept signers that do not chain to a trust anchor
    #[arg(long)]
    pub skip_signer_verification: bool,
}

#[derive(Args)]
pub struct ListArgs {}

#[derive(Args)]
pub struct ConfigArgs {
    pub key: Option<String>,
    pub value: Option<String>,
    #[arg(long, requires = "key", conflicts_with = "value")]
    pub unset: bool,
    #[arg(short, long, conflicts_with_all = ["key", "unset"])]
    pub list: bool,
}
