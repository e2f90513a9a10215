//! KDL configuration parser

use std::path::Path;

use crate::error::ConfigError;
use crate::model::*;

/// Source span of a KDL node's name
fn node_span(node: &kdl::KdlNode) -> miette::SourceSpan {
    // kdl uses an older miette version, so we rebuild the span from offset/len
    let span = node.name().span();
    miette::SourceSpan::from((span.offset(), span.len()))
}

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        let span = miette::SourceSpan::from((e.span.offset(), e.span.len()));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node)?;
            }
            "bindings" => {
                config.bindings.extend(parse_bindings(node, content)?);
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    Ok(config)
}

fn first_value(node: &kdl::KdlNode) -> Option<&kdl::KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .map(|e| e.value())
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "log-level" => {
                    if let Some(val) = first_value(child).and_then(|v| v.as_string()) {
                        global.log_level = val
                            .parse()
                            .map_err(|e| ConfigError::Invalid { message: e })?;
                    }
                }
                "idle-timeout-ms" => {
                    let value = first_value(child).ok_or_else(|| ConfigError::Invalid {
                        message: "idle-timeout-ms needs a value".to_string(),
                    })?;
                    global.idle_timeout_ms = value
                        .as_i64()
                        .and_then(|ms| u64::try_from(ms).ok())
                        .ok_or_else(|| ConfigError::Invalid {
                            message: format!(
                                "idle-timeout-ms must be a non-negative integer, got {}",
                                value
                            ),
                        })?;
                }
                "debug" => {
                    global.debug = match first_value(child) {
                        None => true,
                        Some(value) => value.as_bool().ok_or_else(|| ConfigError::Invalid {
                            message: format!("debug must be true or false, got {}", value),
                        })?,
                    };
                }
                "device" => {
                    global.device = first_value(child)
                        .and_then(|v| v.as_string())
                        .map(|s| s.to_string());
                }
                name => {
                    tracing::warn!("Unknown global config option: {}", name);
                }
            }
        }
    }

    Ok(global)
}

fn parse_bindings(node: &kdl::KdlNode, source: &str) -> Result<Vec<Binding>, ConfigError> {
    let mut bindings = Vec::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "chord" => bindings.push(parse_chord(child, source)?),
                name => {
                    tracing::warn!("Unknown bindings entry: {}", name);
                }
            }
        }
    }

    Ok(bindings)
}

fn parse_chord(node: &kdl::KdlNode, source: &str) -> Result<Binding, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidBinding {
        message,
        src: source.to_string(),
        span: node_span(node),
    };

    let mut binding = Binding {
        keys: Vec::new(),
        clear_stack: false,
        command: None,
        cwd: None,
        name: None,
    };

    for entry in node.entries() {
        let value = entry.value();
        match entry.name().map(|n| n.value()) {
            None => {
                // Bare numbers are accepted so `chord 1 2` works without quotes
                let key = match (value.as_string(), value.as_i64()) {
                    (Some(s), _) => s.to_string(),
                    (None, Some(n)) => n.to_string(),
                    _ => return Err(invalid(format!("key names must be strings, got {}", value))),
                };
                if key.is_empty() {
                    return Err(invalid("empty key name".to_string()));
                }
                binding.keys.push(key);
            }
            Some("clear-stack") => {
                binding.clear_stack = value
                    .as_bool()
                    .ok_or_else(|| invalid(format!("clear-stack must be true or false, got {}", value)))?;
            }
            Some("command") => {
                binding.command = Some(
                    value
                        .as_string()
                        .ok_or_else(|| invalid("command must be a string".to_string()))?
                        .to_string(),
                );
            }
            Some("cwd") => {
                let dir = value
                    .as_string()
                    .ok_or_else(|| invalid("cwd must be a string".to_string()))?;
                binding.cwd = Some(shellexpand::tilde(dir).into_owned().into());
            }
            Some("name") => {
                binding.name = Some(
                    value
                        .as_string()
                        .ok_or_else(|| invalid("name must be a string".to_string()))?
                        .to_string(),
                );
            }
            Some(other) => {
                tracing::warn!("Unknown chord property: {}", other);
            }
        }
    }

    if binding.keys.is_empty() {
        return Err(invalid("a chord needs at least one key".to_string()));
    }

    Ok(binding)
}
