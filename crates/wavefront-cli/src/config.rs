//! KDL configuration for the terminal host.
//!
//! ```kdl
//! tolerance 5.0
//! min-line-height 21
//! line-break "\n"
//! trim "trim-end"
//! columns 72
//! transformer "command"
//! command "my-rewriter --model small"
//! fenced true
//! delay-ms 2000
//! ```
//!
//! Every key is optional. Command-line flags win over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use kdl::{KdlDocument, KdlValue};
use miette::{IntoDiagnostic, Result};
use wavefront_core::{EngineConfig, TrimPolicy};

use crate::transformer::{CliTransformer, ShellCommand, TransformerKind};

/// Row height of the terminal layout, in visual units.
pub const LINE_HEIGHT: f32 = 21.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub engine: EngineConfig,
    pub columns: usize,
    pub transformer: TransformerKind,
    pub command: Option<String>,
    pub fenced: bool,
    pub delay: Duration,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            columns: 80,
            transformer: TransformerKind::default(),
            command: None,
            fenced: false,
            delay: Duration::from_secs(2),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("wavefront").join("config.kdl"))
}

impl CliConfig {
    /// Load `path`, or the default location when `path` is `None`. A missing
    /// default file is not an error; a missing explicit one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match default_config_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };
        if !explicit && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .into_diagnostic()
            .map_err(|e| e.wrap_err(format!("reading config {}", path.display())))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let doc: KdlDocument = text.parse().into_diagnostic()?;
        let mut config = Self::default();

        if let Some(v) = number(&doc, "tolerance")? {
            config.engine.tolerance = v as f32;
        }
        if let Some(v) = number(&doc, "min-line-height")? {
            config.engine.min_line_height = v as f32;
        }
        if let Some(v) = string(&doc, "line-break")? {
            config.engine.line_break = v.to_string();
        }
        if let Some(v) = string(&doc, "trim")? {
            config.engine.trim = v.parse::<TrimPolicy>()?;
        }
        if let Some(v) = number(&doc, "columns")? {
            if v < 1.0 {
                return Err(miette::miette!("columns must be at least 1, got {v}"));
            }
            config.columns = v as usize;
        }
        if let Some(v) = string(&doc, "transformer")? {
            config.transformer = TransformerKind::from_str(v, true)
                .map_err(|e| miette::miette!("unknown transformer `{v}`: {e}"))?;
        }
        if let Some(v) = string(&doc, "command")? {
            config.command = Some(v.to_string());
        }
        if let Some(v) = boolean(&doc, "fenced")? {
            config.fenced = v;
        }
        if let Some(v) = number(&doc, "delay-ms")? {
            config.delay = Duration::from_millis(v.max(0.0) as u64);
        }

        config.engine.validate()?;
        Ok(config)
    }

    /// Build the transformer this configuration selects.
    pub fn transformer(&self) -> Result<CliTransformer> {
        Ok(match self.transformer {
            TransformerKind::Identity => CliTransformer::Delayed {
                delay: self.delay,
                uppercase: false,
            },
            TransformerKind::Uppercase => CliTransformer::Delayed {
                delay: self.delay,
                uppercase: true,
            },
            TransformerKind::Command => {
                let command = self.command.clone().ok_or_else(|| {
                    miette::miette!(
                        help = "set `command \"...\"` in the config file or pass --command",
                        "the command transformer needs a command"
                    )
                })?;
                CliTransformer::Command(ShellCommand {
                    command,
                    fenced: self.fenced,
                })
            }
        })
    }
}

fn first_value<'a>(doc: &'a KdlDocument, key: &str) -> Option<&'a KdlValue> {
    Some(doc.get(key)?.entries().first()?.value())
}

fn number(doc: &KdlDocument, key: &str) -> Result<Option<f64>> {
    let Some(value) = first_value(doc, key) else {
        return Ok(None);
    };
    value
        .as_f64()
        .or_else(|| value.as_i64().map(|v| v as f64))
        .map(Some)
        .ok_or_else(|| miette::miette!("`{key}` must be a number, got {value}"))
}

fn string<'a>(doc: &'a KdlDocument, key: &str) -> Result<Option<&'a str>> {
    let Some(value) = first_value(doc, key) else {
        return Ok(None);
    };
    value
        .as_string()
        .map(Some)
        .ok_or_else(|| miette::miette!("`{key}` must be a string, got {value}"))
}

fn boolean(doc: &KdlDocument, key: &str) -> Result<Option<bool>> {
    let Some(value) = first_value(doc, key) else {
        return Ok(None);
    };
    value
        .as_bool()
        .map(Some)
        .ok_or_else(|| miette::miette!("`{key}` must be true or false, got {value}"))
}
