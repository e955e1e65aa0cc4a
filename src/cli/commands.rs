use crate::decoder::{BeanDecoder, JsonBeanDecoder};
use crate::mapping::load::load_mapping;
use crate::mapping::{BeanKind, Entity, Invoker, MappingGraph};
use crate::payload;
use crate::runtime_config::RuntimeConfig;
use crate::scope::{MapScope, ScopeType, Scopes};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Command-line interface for Brutos mapping documents
#[derive(Parser, Debug)]
#[command(name = "brutos", version)]
#[command(about = "Validate Brutos mappings and decode payloads", long_about = None)]
pub struct Cli {
    /// Log decoding steps at debug level
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate a mapping document
    Check {
        /// Path to the mapping document (YAML or JSON)
        #[arg(short, long)]
        mapping: PathBuf,
    },
    /// Decode a payload with one bean and print the result as JSON
    Decode {
        /// Path to the mapping document (YAML or JSON)
        #[arg(short, long)]
        mapping: PathBuf,

        /// Bean to decode with
        #[arg(short, long)]
        bean: String,

        /// Decode the sub-object under this name instead of the whole payload
        #[arg(long)]
        param: Option<String>,

        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Bind every parameter of an action and print the arguments as JSON
    Bind {
        /// Path to the mapping document (YAML or JSON)
        #[arg(short, long)]
        mapping: PathBuf,

        /// Action to bind
        #[arg(short, long)]
        action: String,

        #[command(flatten)]
        payload: PayloadArgs,
    },
}

/// Payload and scope inputs shared by `decode` and `bind`.
#[derive(Args, Debug, Clone, Default)]
pub struct PayloadArgs {
    /// Payload file, `-` for stdin; an empty object when omitted
    #[arg(short, long)]
    pub payload: Option<PathBuf>,

    /// Read the payload as application/x-www-form-urlencoded
    #[arg(long, default_value_t = false)]
    pub form: bool,

    /// JSON file mapping scope names to their values
    #[arg(long)]
    pub scopes: Option<PathBuf>,

    /// Override the maximum bean nesting depth
    #[arg(long)]
    pub max_depth: Option<usize>,
}

/// Execute the parsed command, writing results to stdout.
///
/// # Errors
///
/// Returns an error if the mapping document cannot be loaded or validated,
/// the payload cannot be read, or decoding fails.
pub fn run_cli(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &mut out)
}

/// Execute `command`, writing results to `out`.
pub fn execute(command: &Commands, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Check { mapping } => {
            let graph = load_mapping(mapping)?;
            writeln!(out, "mapping {} is valid", mapping.display())?;
            describe_graph(&graph, out)?;
            Ok(())
        }
        Commands::Decode {
            mapping,
            bean,
            param,
            payload,
        } => {
            let graph = Arc::new(load_mapping(mapping)?);
            if graph.bean(bean).is_none() {
                bail!("no bean named {bean} in {}", mapping.display());
            }
            let decoder = decoder(graph, payload);
            let data = read_payload(payload)?;
            let scopes = read_scopes(payload)?;

            let mut entity = Entity::mapping(bean.as_str());
            if let Some(param) = param {
                entity = entity.named(param.as_str());
            }
            let instance = decoder
                .decode(&entity, &data, &scopes)
                .with_context(|| format!("cannot decode bean {bean}"))?;
            info!(bean = %bean, "payload decoded");
            writeln!(out, "{}", serde_json::to_string_pretty(&instance)?)?;
            Ok(())
        }
        Commands::Bind {
            mapping,
            action,
            payload,
        } => {
            let graph = Arc::new(load_mapping(mapping)?);
            let Some(mapping_action) = graph.action(action).cloned() else {
                bail!("no action named {action} in {}", mapping.display());
            };
            let decoder = decoder(graph, payload);
            let data = read_payload(payload)?;
            let scopes = read_scopes(payload)?;

            let args = mapping_action.bind(&decoder, &data, &scopes)?;
            info!(action = %action, arguments = args.len(), "action bound");
            writeln!(out, "{}", serde_json::to_string_pretty(&args)?)?;
            Ok(())
        }
    }
}

fn decoder(graph: Arc<MappingGraph>, args: &PayloadArgs) -> JsonBeanDecoder {
    let mut config = RuntimeConfig::from_env();
    if let Some(depth) = args.max_depth {
        config = config.with_max_decode_depth(depth);
    }
    JsonBeanDecoder::with_config(graph, config)
}

fn read_payload(args: &PayloadArgs) -> Result<Value> {
    let body = match &args.payload {
        None => return Ok(Value::Object(Map::new())),
        Some(path) if path.as_os_str() == "-" => {
            let mut body = Vec::new();
            io::stdin()
                .read_to_end(&mut body)
                .context("cannot read payload from stdin")?;
            body
        }
        Some(path) => {
            fs::read(path).with_context(|| format!("cannot read payload {}", path.display()))?
        }
    };
    let value = if args.form {
        payload::from_form(&body)
    } else {
        payload::from_json(&body)
    };
    value.context("invalid payload")
}

fn read_scopes(args: &PayloadArgs) -> Result<Scopes> {
    let mut scopes = Scopes::new();
    let Some(path) = &args.scopes else {
        return Ok(scopes);
    };
    let value = read_json(path)?;
    let Value::Object(members) = value else {
        bail!("scopes file {} must hold a JSON object", path.display());
    };
    for (name, values) in &members {
        let scope: ScopeType = name.parse().map_err(|e: String| anyhow!(e))?;
        if scope == ScopeType::Param {
            bail!("param values come from the payload, not the scopes file");
        }
        scopes.register(scope, MapScope::from_object(values));
    }
    Ok(scopes)
}

fn read_json(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn describe_graph(graph: &MappingGraph, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "classes: {}", graph.classes().count())?;
    for class in graph.classes() {
        let factories: Vec<&str> = class.factory_methods().map(|f| f.name()).collect();
        write!(out, "  {} ({})", class.name(), class.capability())?;
        if !factories.is_empty() {
            write!(out, " factories: {}", factories.join(", "))?;
        }
        writeln!(out)?;
    }

    writeln!(out, "beans: {}", graph.beans().count())?;
    for bean in graph.beans() {
        let kind = match bean.kind {
            BeanKind::Plain => "",
            BeanKind::Collection { .. } => " [collection]",
            BeanKind::Map { .. } => " [map]",
        };
        writeln!(out, "  {}: {}{kind}", bean.name, bean.class)?;
        if let Invoker::Factory { method, bean: peer } = &bean.constructor.invoker {
            match peer {
                Some(peer) => writeln!(out, "    factory: {peer}.{method}")?,
                None => writeln!(out, "    factory: {}.{method}", bean.class)?,
            }
        }
        for (label, dependency) in bean.dependencies() {
            writeln!(out, "    {label}: {}", dependency.describe())?;
        }
    }

    writeln!(out, "actions: {}", graph.actions().count())?;
    for action in graph.actions() {
        let params: Vec<String> = action.parameters.iter().map(Entity::label).collect();
        writeln!(out, "  {}({})", action.name, params.join(", "))?;
    }
    Ok(())
}
