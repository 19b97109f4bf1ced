//! Command handlers: read the input document, run the core, print the result.

use std::io::Read;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use tmc_core::{Block, Lifecycle, ResourceKind};

use crate::cli::{Command, GlobalOpts, ResourceArgs};
use crate::error::CliError;
use crate::{config, output};

/// Parse a JSON or YAML document into a mapping. YAML is a superset of
/// JSON, so one parser covers both.
pub fn parse_document(path: &str, text: &str) -> Result<Block, CliError> {
    let value: Value = serde_yaml::from_str(text).map_err(|source| CliError::Input {
        path: path.to_owned(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Block::new()),
        other => Err(CliError::Validation {
            field: "input".into(),
            reason: format!("{path} must contain a mapping at the top level, found {other}"),
        }),
    }
}

fn read_document(file: &Path) -> Result<Block, CliError> {
    let (name, text) = if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        ("<stdin>".to_owned(), text)
    } else {
        (file.display().to_string(), std::fs::read_to_string(file)?)
    };
    debug!(input = %name, bytes = text.len(), "read input document");
    parse_document(&name, &text)
}

fn emit<T: serde::Serialize + ?Sized>(global: &GlobalOpts, data: &T) -> Result<(), CliError> {
    output::print_output(&output::render(global.output, data)?);
    Ok(())
}

fn expand(args: &ResourceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let tree = read_document(&args.file)?;
    let object = ResourceKind::from(args.kind).expand(&tree)?;
    emit(global, &object)
}

fn flatten(args: &ResourceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let object = Value::Object(read_document(&args.file)?);
    let tree = ResourceKind::from(args.kind).flatten(object)?;
    emit(global, &tree)
}

async fn lifecycle(command: &Command, global: &GlobalOpts) -> Result<(), CliError> {
    let (Command::Create(args) | Command::Read(args) | Command::Update(args) | Command::Delete(args)) =
        command
    else {
        return Ok(());
    };

    let kind = ResourceKind::from(args.kind);
    let tree = read_document(&args.file)?;
    let (client, poll) = config::connect(global)?;
    let resources = Lifecycle::new(&client).with_poll(poll);
    debug!(%kind, command = ?command, "dispatching lifecycle operation");

    match command {
        Command::Create(_) => emit(global, &resources.create(kind, &tree).await?),
        Command::Read(_) => match resources.read(kind, &tree).await? {
            Some(current) => emit(global, &current),
            None => Err(CliError::NotFound {
                message: format!("{kind} not found"),
            }),
        },
        Command::Update(_) => emit(global, &resources.update(kind, &tree).await?),
        _ => {
            resources.delete(kind, &tree).await?;
            info!(%kind, "deleted");
            Ok(())
        }
    }
}

/// Dispatch a resource command.
pub async fn dispatch(command: &Command, global: &GlobalOpts) -> Result<(), CliError> {
    match command {
        Command::Expand(args) => expand(args, global),
        Command::Flatten(args) => flatten(args, global),
        other => lifecycle(other, global).await,
    }
}
