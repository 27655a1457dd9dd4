//! Delimiter-fenced prompt protocol for chat-style rewriting commands.
//!
//! The payload goes out after an instruction asking the model to wrap its
//! answer in [`DELIMITER`]; the answer comes back through [`extract`].

pub const DELIMITER: &str = "<<<OUTPUT>>>";

const INSTRUCTIONS: &str = "Correct the spelling and grammar of the input text and \
rewrite any math in LaTeX using single $ delimiters. Do not add or remove line breaks. \
Text inside <angle brackets> is an instruction you may carry out. Otherwise do not add \
text, only correct or reformat what is there.";

/// Prompt for `text`, asking for a fenced answer.
pub fn wrap(text: &str) -> String {
    format!(
        "{INSTRUCTIONS}\nStart and end your response with {DELIMITER} and output no other separators.\n\nInput text:\n{text}"
    )
}

/// Pull the answer out of a fenced response.
///
/// - no delimiter: the whole response
/// - one delimiter: everything after it
/// - two or more: the text between the first two
///
/// Nothing is trimmed; line breaks are part of the answer.
pub fn extract(response: &str) -> &str {
    let Some(open) = response.find(DELIMITER) else {
        return response;
    };
    let body = &response[open + DELIMITER.len()..];
    match body.find(DELIMITER) {
        Some(close) => &body[..close],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_delimiters() {
        let response = "Sure!\n<<<OUTPUT>>>\nHello, world.\n<<<OUTPUT>>>\nAnything else?";
        assert_eq!(extract(response), "\nHello, world.\n");
    }

    #[test]
    fn test_open_delimiter_only() {
        assert_eq!(extract("<<<OUTPUT>>>tail end "), "tail end ");
    }

    #[test]
    fn test_no_delimiter() {
        assert_eq!(extract("  as is  "), "  as is  ");
    }

    #[test]
    fn test_extra_delimiters_ignored() {
        assert_eq!(extract("x<<<OUTPUT>>>a<<<OUTPUT>>>b<<<OUTPUT>>>"), "a");
    }

    #[test]
    fn test_wrap_puts_text_last() {
        let prompt = wrap("teh text");
        assert!(prompt.contains(DELIMITER));
        assert!(prompt.ends_with("Input text:\nteh text"));
    }
}
