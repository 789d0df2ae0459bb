use std::collections::BTreeMap;

use anyhow::{bail, Context};
use colored::Colorize;
use nsstore_backend::{FileBackend, KvBackend};
use nsstore_core::names::split_key;
use nsstore_core::{BatchValues, FieldDescriptor, FieldKind, FieldValue, NamespacedStore};
use serde_json::{json, Value};

use crate::cli::*;
use crate::config::CliConfig;

/// Result of one command, rendered as text or JSON.
#[derive(Debug, PartialEq)]
pub enum Output {
    Saved { key: String, value: Value },
    Item { key: String, value: Option<Value> },
    Deleted { key: String },
    Batch { parent: String, values: BatchValues },
    BatchDeleted { parent: String, fields: Vec<String> },
    Keys(Vec<(String, String)>),
}

pub async fn run_command(cli: Cli, config: CliConfig) -> anyhow::Result<()> {
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data_dir.clone());
    let backend = FileBackend::open(data_dir.clone())
        .await
        .with_context(|| format!("opening store at {}", data_dir.display()))?;
    let store = NamespacedStore::new(backend);

    let output = execute(&store, cli.command, &config).await?;
    render(&output, cli.format)
}

pub async fn execute(
    store: &NamespacedStore<FileBackend>,
    command: Command,
    config: &CliConfig,
) -> anyhow::Result<Output> {
    match command {
        Command::Set(args) => {
            let kind = FieldKind::from(args.kind);
            let value = FieldValue::parse(kind, &args.value)
                .with_context(|| format!("{:?} is not a valid {kind}", args.value))?;
            let entry = store.set_item(&args.key, value).await?;
            Ok(Output::Saved {
                key: entry.key,
                value: field_json(&entry.value),
            })
        }
        Command::Get(args) => {
            let entry = store.get_item(&args.key).await?;
            Ok(Output::Item {
                key: entry.key,
                value: entry.value.map(Value::String),
            })
        }
        Command::SetJson(args) => {
            let data: Value =
                serde_json::from_str(&args.json).context("argument is not valid JSON")?;
            let entry = store.set_json(&args.key, &data).await?;
            Ok(Output::Saved {
                key: entry.key,
                value: entry.value,
            })
        }
        Command::GetJson(args) => {
            let entry = store.get_json(&args.key).await?;
            Ok(Output::Item {
                key: entry.key,
                value: entry.value,
            })
        }
        Command::Delete(args) => {
            let entry = store.delete_item(&args.key).await?;
            Ok(Output::Deleted { key: entry.key })
        }
        Command::SetBatch(args) => {
            let mut fields = BatchValues::new();
            for arg in &args.fields {
                let (name, value) = parse_assignment(arg)?;
                if fields.insert(name.clone(), value).is_some() {
                    bail!("field {name} given more than once");
                }
            }
            let values = store.set_batch_best_effort(&args.parent, &fields).await?;
            Ok(Output::Batch {
                parent: args.parent,
                values,
            })
        }
        Command::GetBatch(args) => {
            let defaults = args
                .fields
                .iter()
                .map(|arg| {
                    parse_assignment(arg).map(|(name, value)| FieldDescriptor::new(name, value))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let force = args.force || config.force_defaults;
            let values = store.get_batch(&args.parent, &defaults, force).await?;
            Ok(Output::Batch {
                parent: args.parent,
                values,
            })
        }
        Command::DeleteBatch(args) => {
            let fields: BTreeMap<String, ()> =
                args.fields.into_iter().map(|name| (name, ())).collect();
            let deleted = store
                .delete_batch_best_effort(&args.parent, &fields)
                .await?;
            Ok(Output::BatchDeleted {
                parent: args.parent,
                fields: deleted.into_keys().collect(),
            })
        }
        Command::List(args) => {
            let prefix = args.prefix.unwrap_or_default();
            let backend = store.backend();
            let mut rows = Vec::new();
            for key in backend.keys().await? {
                if !key.starts_with(&prefix) {
                    continue;
                }
                // A key deleted between listing and reading is skipped.
                if let Some(value) = backend.get(&key).await? {
                    rows.push((key, value));
                }
            }
            Ok(Output::Keys(rows))
        }
    }
}

/// Split `FIELD=VALUE` and infer the value's kind.
pub fn parse_assignment(arg: &str) -> anyhow::Result<(String, FieldValue)> {
    let Some((name, raw)) = arg.split_once('=') else {
        bail!("expected FIELD=VALUE, got {arg:?}");
    };
    Ok((name.to_string(), infer_value(raw)))
}

/// `true`/`false` are booleans, finite numbers are numbers, JSON objects and
/// arrays are JSON, anything else is a string.
pub fn infer_value(raw: &str) -> FieldValue {
    match raw {
        "true" => return FieldValue::Boolean(true),
        "false" => return FieldValue::Boolean(false),
        _ => {}
    }
    if let Ok(n) = raw.parse::<f64>() {
        if n.is_finite() {
            return FieldValue::Number(n);
        }
    }
    if raw.starts_with('{') || raw.starts_with('[') {
        if let Ok(v) = serde_json::from_str(raw) {
            return FieldValue::Json(v);
        }
    }
    FieldValue::String(raw.to_string())
}

/// JSON form of a field value that agrees with its stored text.
///
/// Integral numbers are emitted as JSON integers and non-finite numbers as
/// their stored strings, since JSON has no `NaN`.
pub fn field_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::String(s) => Value::String(s.clone()),
        FieldValue::Number(n) if !n.is_finite() => Value::String(value.to_stored()),
        FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER => {
            Value::from(*n as i64)
        }
        FieldValue::Number(n) => Value::from(*n),
        FieldValue::Boolean(b) => Value::Bool(*b),
        FieldValue::Json(v) => v.clone(),
    }
}

/// Largest magnitude below which every integral `f64` is exact.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

impl Output {
    pub fn to_json(&self) -> Value {
        match self {
            Output::Saved { key, value } => json!({ "key": key, "value": value }),
            Output::Item { key, value } => json!({ "key": key, "value": value }),
            Output::Deleted { key } => json!({ "key": key, "deleted": true }),
            Output::Batch { parent, values } => {
                let mut map = serde_json::Map::new();
                let fields = values
                    .iter()
                    .map(|(name, value)| (name.clone(), field_json(value)))
                    .collect();
                map.insert(parent.clone(), Value::Object(fields));
                Value::Object(map)
            }
            Output::BatchDeleted { parent, fields } => {
                json!({ "parent": parent, "deleted": fields })
            }
            Output::Keys(rows) => Value::Object(
                rows.iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        }
    }
}

fn render(output: &Output, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&output.to_json())?);
        return Ok(());
    }

    match output {
        Output::Saved { key, value } => {
            println!("{} {} = {}", "✓".green().bold(), key.bold(), value);
        }
        Output::Item { key, value: Some(value) } => match value {
            Value::String(s) => println!("{} = {}", key.bold(), s),
            other => println!("{} = {}", key.bold(), other),
        },
        Output::Item { key, value: None } => {
            println!("{} {}", key.bold(), "(not found)".dimmed());
        }
        Output::Deleted { key } => println!("{} deleted {}", "✓".green().bold(), key.bold()),
        Output::Batch { parent, values } => {
            println!("{}", parent.yellow().bold());
            for (field, value) in values {
                println!("  {} = {}", field.bold(), value);
            }
        }
        Output::BatchDeleted { parent, fields } => {
            println!(
                "{} deleted {} from {}",
                "✓".green().bold(),
                fields.join(", "),
                parent.yellow()
            );
        }
        Output::Keys(rows) if rows.is_empty() => println!("{}", "No keys.".dimmed()),
        Output::Keys(rows) => {
            for (key, value) in rows {
                match split_key(key) {
                    Some((parent, field)) => {
                        println!("{}.{} = {}", parent.dimmed(), field.bold(), value)
                    }
                    None => println!("{} = {}", key.bold(), value),
                }
            }
        }
    }
    Ok(())
}
