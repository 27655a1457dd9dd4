//! The transformer seam and the request/completion pair that crosses it.
//!
//! The engine never awaits anything itself. [`WavefrontEngine::commit`]
//! hands out a [`TransformRequest`]; the host drives it with
//! [`TransformRequest::run`] on whatever executor it likes and feeds the
//! resulting [`TransformCompletion`] back through
//! [`WavefrontEngine::complete`].
//!
//! [`WavefrontEngine::commit`]: crate::WavefrontEngine::commit
//! [`WavefrontEngine::complete`]: crate::WavefrontEngine::complete

use std::future::Future;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, TransformError};
use crate::node::PlaceholderId;

/// Asynchronous text rewriter (grammar fixes, LaTeX conversion, ...).
///
/// Implementations may take arbitrarily long and may fail. A failure never
/// loses text: the engine splices the original span back instead.
pub trait Transformer {
    fn transform(&self, text: String)
    -> impl Future<Output = Result<String, TransformError>> + Send;
}

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transformer for Identity {
    fn transform(
        &self,
        text: String,
    ) -> impl Future<Output = Result<String, TransformError>> + Send {
        std::future::ready(Ok(text))
    }
}

impl<F, Fut> Transformer for F
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<String, TransformError>> + Send,
{
    fn transform(
        &self,
        text: String,
    ) -> impl Future<Output = Result<String, TransformError>> + Send {
        self(text)
    }
}

/// A dispatched commit: the payload to transform, tagged with the
/// placeholder that holds its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    pub placeholder: PlaceholderId,
    pub text: String,
}

impl TransformRequest {
    /// Run the transformer. This is the only suspension point in a commit
    /// cycle.
    pub async fn run<T: Transformer>(self, transformer: &T) -> TransformCompletion {
        let result = transformer.transform(self.text).await;
        TransformCompletion {
            placeholder: self.placeholder,
            result,
        }
    }
}

/// Outcome of a [`TransformRequest`], ready to be spliced.
#[derive(Debug)]
pub struct TransformCompletion {
    pub placeholder: PlaceholderId,
    pub result: Result<String, TransformError>,
}

/// How much of the extracted span is sent to the transformer.
///
/// Whitespace held back from the payload is kept in the placeholder and
/// reattached around the result when it is spliced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrimPolicy {
    /// Send the span exactly as extracted.
    #[default]
    Preserve,
    /// Hold back leading and trailing whitespace.
    Trim,
    /// Hold back trailing whitespace only.
    TrimEnd,
}

impl TrimPolicy {
    /// Byte range of `text` that forms the payload.
    pub fn payload(self, text: &str) -> Range<usize> {
        match self {
            TrimPolicy::Preserve => 0..text.len(),
            TrimPolicy::Trim => {
                let start = text.len() - text.trim_start().len();
                let end = text.trim_end().len().max(start);
                start..end
            }
            TrimPolicy::TrimEnd => 0..text.trim_end().len(),
        }
    }
}

impl FromStr for TrimPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preserve" => Ok(TrimPolicy::Preserve),
            "trim" => Ok(TrimPolicy::Trim),
            "trim-end" => Ok(TrimPolicy::TrimEnd),
            other => Err(ConfigError::TrimPolicy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identity() {
        let completion = TransformRequest {
            placeholder: PlaceholderId(3),
            text: "as is".to_string(),
        }
        .run(&Identity)
        .await;
        assert_eq!(completion.placeholder, PlaceholderId(3));
        assert_eq!(completion.result.unwrap(), "as is");
    }

    #[tokio::test]
    async fn test_closure_transformer() {
        let shout = |text: String| async move { Ok::<_, TransformError>(text.to_uppercase()) };
        let completion = TransformRequest {
            placeholder: PlaceholderId(1),
            text: "quiet".to_string(),
        }
        .run(&shout)
        .await;
        assert_eq!(completion.result.unwrap(), "QUIET");
    }

    #[tokio::test]
    async fn test_failing_transformer() {
        let broken = |_text: String| async { Err::<String, _>(TransformError::from("offline")) };
        let completion = TransformRequest {
            placeholder: PlaceholderId(1),
            text: "x".to_string(),
        }
        .run(&broken)
        .await;
        assert!(completion.result.is_err());
    }

    #[test]
    fn test_trim_policies() {
        let text = "\n  fix me \n";
        assert_eq!(TrimPolicy::Preserve.payload(text), 0..text.len());
        assert_eq!(&text[TrimPolicy::Trim.payload(text)], "fix me");
        assert_eq!(&text[TrimPolicy::TrimEnd.payload(text)], "\n  fix me");
    }

    #[test]
    fn test_trim_all_whitespace_is_empty() {
        assert!(TrimPolicy::Trim.payload(" \n ").is_empty());
        assert!(TrimPolicy::TrimEnd.payload(" \n ").is_empty());
    }

    #[test]
    fn test_parse_trim_policy() {
        assert_eq!("trim-end".parse::<TrimPolicy>(), Ok(TrimPolicy::TrimEnd));
        assert_eq!(
            "both".parse::<TrimPolicy>(),
            Err(ConfigError::TrimPolicy("both".to_string()))
        );
    }
}
