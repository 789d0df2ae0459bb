use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use nsstore_core::FieldKind;

#[derive(Parser)]
#[command(
    name = "nsstore",
    about = "Namespaced batch store over a file-backed key-value store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(long, global = true, env = "NSSTORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend directory (overrides the configuration)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum KindArg {
    String,
    Number,
    Boolean,
    Json,
}

impl From<KindArg> for FieldKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::String => FieldKind::String,
            KindArg::Number => FieldKind::Number,
            KindArg::Boolean => FieldKind::Boolean,
            KindArg::Json => FieldKind::Json,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a single value
    Set(SetArgs),
    /// Show the raw value stored under a key
    Get(KeyArgs),
    /// Store a JSON document
    SetJson(SetJsonArgs),
    /// Show a stored JSON document
    GetJson(KeyArgs),
    /// Delete a single key
    Delete(KeyArgs),
    /// Store FIELD=VALUE pairs under a namespace
    SetBatch(SetBatchArgs),
    /// Load FIELD=DEFAULT pairs from a namespace
    GetBatch(GetBatchArgs),
    /// Delete fields from a namespace
    DeleteBatch(DeleteBatchArgs),
    /// List stored keys
    List(ListArgs),
}

#[derive(Args)]
pub struct KeyArgs {
    pub key: String,
}

#[derive(Args)]
pub struct SetArgs {
    pub key: String,
    pub value: String,
    #[arg(long, default_value = "string")]
    pub kind: KindArg,
}

#[derive(Args)]
pub struct SetJsonArgs {
    pub key: String,
    pub json: String,
}

#[derive(Args)]
pub struct SetBatchArgs {
    pub parent: String,
    /// FIELD=VALUE; the value kind is inferred
    #[arg(required = true)]
    pub fields: Vec<String>,
}

#[derive(Args)]
pub struct GetBatchArgs {
    pub parent: String,
    /// FIELD=DEFAULT; the default's inferred kind drives coercion
    #[arg(required = true)]
    pub fields: Vec<String>,
    /// Substitute defaults for missing fields
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct DeleteBatchArgs {
    pub parent: String,
    #[arg(required = true)]
    pub fields: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    pub prefix: Option<String>,
}
