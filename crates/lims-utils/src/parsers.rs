use crate::credentials::Credentials;
use crate::errors::{ParseError, Result, UtilsError};

/// Trait for parsing different kinds of text input
pub trait Parser {
    type Output;

    fn parse(&self, input: &str) -> Result<Self::Output>;
}

/// Parser for one `server:::user:::password` credentials line
pub struct CredentialsLineParser;

impl Parser for CredentialsLineParser {
    type Output = Credentials;

    fn parse(&self, line: &str) -> Result<Self::Output> {
        let parts: Vec<&str> = line.trim().split(":::").collect();
        match parts.as_slice() {
            [server, user, password] if !server.is_empty() && !user.is_empty() => {
                Ok(Credentials {
                    server: server.to_string(),
                    user: user.to_string(),
                    password: password.to_string(),
                })
            }
            _ => Err(UtilsError::Parse(ParseError::InvalidFormat(
                "Credentials file must contain only lines of the form \
                 <servername>:::<user>:::<password>"
                    .to_string(),
            ))),
        }
    }
}

/// Shell-style word splitter for command lines.
///
/// Handles whitespace separation, single quotes (literal), double quotes
/// (with `\"`, `\\`, `\$` and `` \` `` escapes) and backslash escapes outside
/// quotes. No expansion of any kind is performed.
pub struct CommandLineParser;

impl Parser for CommandLineParser {
    type Output = Vec<String>;

    fn parse(&self, input: &str) -> Result<Self::Output> {
        let mut words = Vec::new();
        let mut current = String::new();
        let mut in_word = false;
        let mut chars = input.chars();

        while let Some(c) = chars.next() {
            match c {
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                '\'' => {
                    in_word = true;
                    loop {
                        match chars.next() {
                            Some('\'') => break,
                            Some(c) => current.push(c),
                            None => return Err(unterminated(input)),
                        }
                    }
                }
                '"' => {
                    in_word = true;
                    loop {
                        match chars.next() {
                            Some('"') => break,
                            Some('\\') => match chars.next() {
                                Some(e @ ('"' | '\\' | '$' | '`')) => current.push(e),
                                Some(other) => {
                                    current.push('\\');
                                    current.push(other);
                                }
                                None => return Err(unterminated(input)),
                            },
                            Some(c) => current.push(c),
                            None => return Err(unterminated(input)),
                        }
                    }
                }
                '\\' => {
                    in_word = true;
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                }
                c => {
                    in_word = true;
                    current.push(c);
                }
            }
        }

        if in_word {
            words.push(current);
        }
        Ok(words)
    }
}

fn unterminated(input: &str) -> UtilsError {
    UtilsError::Parse(ParseError::UnterminatedQuote(input.to_string()))
}

// Convenience function
pub fn split_command_line(command: &str) -> Result<Vec<String>> {
    CommandLineParser.parse(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_line_parsing() {
        let parser = CredentialsLineParser;

        let creds = parser.parse("myserver:::alice:::secret\n").unwrap();
        assert_eq!(creds.server, "myserver");
        assert_eq!(creds.user, "alice");
        assert_eq!(creds.password, "secret");

        // Invalid format
        assert!(parser.parse("myserver:alice:secret").is_err());
        assert!(parser.parse("a:::b:::c:::d").is_err());
        assert!(parser.parse(":::alice:::secret").is_err());
    }

    #[test]
    fn test_command_line_splitting() {
        let parser = CommandLineParser;

        assert_eq!(
            parser.parse("ls -la  /tmp").unwrap(),
            vec!["ls", "-la", "/tmp"]
        );
        assert_eq!(
            parser.parse(r#"echo 'a b' "c \"d\"" e\ f"#).unwrap(),
            vec!["echo", "a b", "c \"d\"", "e f"]
        );
        assert_eq!(parser.parse("say ''").unwrap(), vec!["say", ""]);
        assert!(parser.parse("").unwrap().is_empty());

        // Unterminated quotes
        assert!(parser.parse("echo 'oops").is_err());
        assert!(parser.parse("echo \"oops").is_err());
    }
}
