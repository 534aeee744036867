//! Line protocol for the shell: command tokenizing and reply rendering

use std::fmt;

/// Reply to a single command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Status line: OK, inserted, replaced
    Status(String),
    /// Error line, already prefixed with `ERR`
    Error(String),
    /// Count or size: 3
    Integer(usize),
    /// Value or `(nil)`
    Bulk(Option<String>),
    /// Numbered list, `(empty list)` when empty
    List(Vec<String>),
    /// Multi-line text block
    Text(String),
    /// End of session; nothing is printed
    Quit,
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    pub fn error(message: impl fmt::Display) -> Self {
        Reply::Error(format!("ERR {}", message))
    }

    pub fn is_quit(&self) -> bool {
        matches!(self, Reply::Quit)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(s) | Reply::Error(s) | Reply::Text(s) => write!(f, "{}", s),
            Reply::Integer(i) => write!(f, "{}", i),
            Reply::Bulk(Some(value)) => write!(f, "{}", value),
            Reply::Bulk(None) => write!(f, "(nil)"),
            Reply::List(items) if items.is_empty() => write!(f, "(empty list)"),
            Reply::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, item)?;
                }
                Ok(())
            }
            Reply::Quit => Ok(()),
        }
    }
}

/// Split a command line into tokens
///
/// Tokens are separated by whitespace. A double-quoted token may contain
/// spaces; `\"` and `\\` escape inside quotes.
pub fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let Some(&first) = chars.peek() else {
            return Ok(tokens);
        };

        let mut token = String::new();
        if first == '"' {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some(escaped) => token.push(escaped),
                        None => return Err("unterminated escape".to_string()),
                    },
                    Some(c) => token.push(c),
                    None => return Err("unbalanced quotes in request".to_string()),
                }
            }
            if chars.peek().is_some_and(|c| !c.is_whitespace()) {
                return Err("closing quote must be followed by a space".to_string());
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                token.push(c);
            }
        }
        tokens.push(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain() {
        assert_eq!(
            tokenize("  SET key   value "),
            Ok(vec!["SET".to_string(), "key".to_string(), "value".to_string()])
        );
        assert_eq!(tokenize(""), Ok(vec![]));
    }

    #[test]
    fn test_tokenize_quoted() {
        assert_eq!(
            tokenize(r#"SET "my key" "say \"hi\"""#),
            Ok(vec![
                "SET".to_string(),
                "my key".to_string(),
                "say \"hi\"".to_string()
            ])
        );
        assert_eq!(tokenize(r#"GET """#), Ok(vec!["GET".to_string(), String::new()]));
    }

    #[test]
    fn test_tokenize_errors() {
        assert!(tokenize(r#"SET "open"#).is_err());
        assert!(tokenize(r#"SET "a"b"#).is_err());
    }

    #[test]
    fn test_render() {
        assert_eq!(Reply::ok().to_string(), "OK");
        assert_eq!(Reply::error("boom").to_string(), "ERR boom");
        assert_eq!(Reply::Integer(3).to_string(), "3");
        assert_eq!(Reply::Bulk(None).to_string(), "(nil)");
        assert_eq!(Reply::List(vec![]).to_string(), "(empty list)");
        assert_eq!(
            Reply::List(vec!["a".to_string(), "b".to_string()]).to_string(),
            "1) a\n2) b"
        );
        assert_eq!(Reply::Quit.to_string(), "");
    }
}
