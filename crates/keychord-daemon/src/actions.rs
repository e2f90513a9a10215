//! Binding actions
//!
//! Turns configured bindings into controller listeners. A match is logged,
//! optionally printed as a JSON line, and optionally runs a shell command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use keychord::{normalize, Combination, Controller, Handler, ListenerOptions};
use keychord_config::Binding;
use serde::Serialize;

/// How matches are reported
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Print each match to stdout as a JSON line
    pub json: bool,
}

/// One line of `--json` output
#[derive(Debug, Serialize)]
struct MatchRecord<'a> {
    binding: &'a str,
    keys: &'a Combination,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<&'a str>,
}

fn match_json(label: &str, combination: &Combination, command: Option<&str>) -> Result<String> {
    let record = MatchRecord {
        binding: label,
        keys: combination,
        command,
    };
    Ok(serde_json::to_string(&record)?)
}

/// Register every binding with the controller. Returns how many were added.
pub fn register_bindings(controller: &Controller, bindings: &[Binding], output: Output) -> usize {
    for binding in bindings {
        let keys: Vec<String> = binding
            .keys
            .iter()
            .map(|key| normalize(key).to_string())
            .collect();
        let options = ListenerOptions {
            clear_stack_after_match: binding.clear_stack,
        };

        controller.add_event_listener(keys, binding_handler(binding, output), options);
        tracing::debug!("Bound [{}] to '{}'", binding.keys.join(", "), binding.label());
    }
    bindings.len()
}

fn binding_handler(binding: &Binding, output: Output) -> Handler {
    let label = binding.label();
    let command = binding.command.clone();
    let cwd = binding.cwd.clone();

    Handler::new(move |combination| {
        tracing::info!("Chord '{}' matched [{}]", label, combination);

        if output.json {
            println!("{}", match_json(&label, combination, command.as_deref())?);
        }

        if let Some(command) = &command {
            spawn_command(&label, command, cwd.as_ref())?;
        }
        Ok(())
    })
}

/// Run `sh -c <command>` without waiting for it; the exit status is logged
/// from a local task.
fn spawn_command(label: &str, command: &str, cwd: Option<&PathBuf>) -> Result<()> {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(command);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to run command for '{}': {}", label, command))?;

    let label = label.to_string();
    tokio::task::spawn_local(async move {
        match child.wait().await {
            Ok(status) if status.success() => {
                tracing::debug!("Command for '{}' finished", label);
            }
            Ok(status) => {
                tracing::warn!("Command for '{}' exited with {}", label, status);
            }
            Err(e) => {
                tracing::warn!("Failed to wait for command of '{}': {}", label, e);
            }
        }
    });

    Ok(())
}
