//! Transformers the terminal host can bind.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use wavefront_core::{TransformError, Transformer};

use crate::fence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TransformerKind {
    /// Echo the span back after a delay
    #[default]
    Identity,
    /// Upper-case the span after a delay
    Uppercase,
    /// Pipe the span through a shell command
    Command,
}

#[derive(Debug, Clone)]
pub enum CliTransformer {
    Delayed { delay: Duration, uppercase: bool },
    Command(ShellCommand),
}

/// External rewriting command. The span is written to its stdin and its
/// stdout is the result.
#[derive(Debug, Clone)]
pub struct ShellCommand {
    pub command: String,
    /// Wrap the span in the fenced prompt and extract the fenced answer.
    pub fenced: bool,
}

impl ShellCommand {
    async fn run(&self, text: String) -> Result<String, TransformError> {
        let input = if self.fenced { fence::wrap(&text) } else { text };

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransformError::Failed("command stdin unavailable".to_string()))?;
        let write = async move {
            stdin.write_all(input.as_bytes()).await?;
            // Closing stdin tells the command the input is complete.
            drop(stdin);
            Ok::<_, std::io::Error>(())
        };
        let ((), output) = tokio::try_join!(write, child.wait_with_output())?;

        if !output.status.success() {
            return Err(TransformError::Command {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| TransformError::Failed(format!("command output is not UTF-8: {e}")))?;
        if self.fenced {
            Ok(fence::extract(&stdout).to_string())
        } else {
            Ok(stdout)
        }
    }
}

impl Transformer for CliTransformer {
    fn transform(
        &self,
        text: String,
    ) -> impl Future<Output = Result<String, TransformError>> + Send {
        async move {
            match self {
                CliTransformer::Delayed { delay, uppercase } => {
                    tokio::time::sleep(*delay).await;
                    if *uppercase {
                        Ok(text.to_uppercase())
                    } else {
                        Ok(text)
                    }
                }
                CliTransformer::Command(command) => command.run(text).await,
            }
        }
    }
}
