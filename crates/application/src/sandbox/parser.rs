//! Script statement parser
//!
//! Scripts are line-oriented: one call per line, `//` or `#` comments,
//! blank lines ignored. Arguments are comma-separated; double-quoted
//! strings may contain commas and escaped quotes.

use thiserror::Error;

/// A parsed script statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `set("name", "value")` or `set("name", "value", "scope")`.
    SetVariable {
        /// Variable name.
        name: String,
        /// Value template.
        value: String,
        /// Optional scope name; defaults to the collection scope.
        scope: Option<String>,
    },
    /// `log("message")`.
    Log {
        /// Message template.
        message: String,
    },
    /// `test("name", <condition>)`.
    Test {
        /// Assertion name.
        name: String,
        /// Condition expression.
        condition: String,
    },
    /// `assertEqual(<left>, <right>)`.
    AssertEqual {
        /// Left operand template.
        left: String,
        /// Right operand template.
        right: String,
    },
    /// `assertTrue(<value>)`.
    AssertTrue {
        /// Operand template.
        value: String,
    },
    /// `assertFalse(<value>)`.
    AssertFalse {
        /// Operand template.
        value: String,
    },
    /// `assertStatus(<code>)`.
    AssertStatus {
        /// Expected status code.
        expected: u16,
    },
}

/// Errors raised while parsing a script.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The line does not look like `name(args)`.
    #[error("line {line}: invalid syntax: {message}")]
    InvalidSyntax {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        message: String,
    },

    /// The command name is not part of the script vocabulary.
    #[error("line {line}: unknown command: {name}")]
    UnknownCommand {
        /// 1-based line number.
        line: usize,
        /// The unknown name.
        name: String,
    },

    /// The command got the wrong number of arguments.
    #[error("line {line}: {command} expects {expected}")]
    MissingArgument {
        /// 1-based line number.
        line: usize,
        /// The command name.
        command: String,
        /// Human description of the expected arguments.
        expected: String,
    },

    /// An argument had the right shape but an invalid value.
    #[error("line {line}: {command}: {message}")]
    InvalidArgument {
        /// 1-based line number.
        line: usize,
        /// The command name.
        command: String,
        /// What was wrong.
        message: String,
    },
}

/// Parses a script into its statements.
pub fn parse_script(content: &str) -> Result<Vec<Command>, ScriptError> {
    let mut commands = Vec::new();

    for (index, raw_line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            continue;
        }
        commands.push(parse_line(line, line_number)?);
    }

    Ok(commands)
}

fn parse_line(line: &str, line_number: usize) -> Result<Command, ScriptError> {
    let open = line.find('(').ok_or_else(|| ScriptError::InvalidSyntax {
        line: line_number,
        message: "expected a call like name(...)".to_string(),
    })?;
    if !line.ends_with(')') {
        return Err(ScriptError::InvalidSyntax {
            line: line_number,
            message: "missing closing parenthesis".to_string(),
        });
    }

    let name = line[..open].trim();
    let args = parse_arguments(&line[open + 1..line.len() - 1]);

    match name {
        "set" => match args.len() {
            2 => Ok(Command::SetVariable {
                name: args[0].clone(),
                value: args[1].clone(),
                scope: None,
            }),
            3 => Ok(Command::SetVariable {
                name: args[0].clone(),
                value: args[1].clone(),
                scope: Some(args[2].clone()),
            }),
            _ => Err(missing(line_number, "set", "a name, a value and an optional scope")),
        },
        "log" => match args.len() {
            1 => Ok(Command::Log {
                message: args[0].clone(),
            }),
            _ => Err(missing(line_number, "log", "a single message")),
        },
        "test" => match args.len() {
            2 => Ok(Command::Test {
                name: args[0].clone(),
                condition: args[1].clone(),
            }),
            _ => Err(missing(line_number, "test", "a name and a condition")),
        },
        "assertEqual" => match args.len() {
            2 => Ok(Command::AssertEqual {
                left: args[0].clone(),
                right: args[1].clone(),
            }),
            _ => Err(missing(line_number, "assertEqual", "two operands")),
        },
        "assertTrue" => match args.len() {
            1 => Ok(Command::AssertTrue {
                value: args[0].clone(),
            }),
            _ => Err(missing(line_number, "assertTrue", "a single operand")),
        },
        "assertFalse" => match args.len() {
            1 => Ok(Command::AssertFalse {
                value: args[0].clone(),
            }),
            _ => Err(missing(line_number, "assertFalse", "a single operand")),
        },
        "assertStatus" => match args.len() {
            1 => {
                let expected =
                    args[0]
                        .parse::<u16>()
                        .map_err(|_| ScriptError::InvalidArgument {
                            line: line_number,
                            command: "assertStatus".to_string(),
                            message: format!("not a status code: {}", args[0]),
                        })?;
                Ok(Command::AssertStatus { expected })
            }
            _ => Err(missing(line_number, "assertStatus", "a status code")),
        },
        other => Err(ScriptError::UnknownCommand {
            line: line_number,
            name: other.to_string(),
        }),
    }
}

fn missing(line: usize, command: &str, expected: &str) -> ScriptError {
    ScriptError::MissingArgument {
        line,
        command: command.to_string(),
        expected: expected.to_string(),
    }
}

/// Splits an argument list on commas, honoring double-quoted strings and
/// `\"` escapes. An argument that is one whole quoted string becomes
/// exactly the quoted content, padding around the quotes dropped; bare
/// arguments are trimmed and keep embedded quotes literally.
fn parse_arguments(input: &str) -> Vec<String> {
    split_on_top_level_commas(input)
        .into_iter()
        .map(|raw| {
            let trimmed = raw.trim();
            unquote_argument(trimmed).unwrap_or_else(|| trimmed.to_string())
        })
        .collect()
}

/// Splits on commas that are not inside a double-quoted string.
fn split_on_top_level_commas(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push_str("\\\"");
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push('"');
            }
            ',' if !in_quotes => parts.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }

    parts
}

/// Returns the unescaped content when the whole argument is one quoted
/// string, `None` when it is bare (e.g. a condition with an embedded
/// quoted operand).
fn unquote_argument(arg: &str) -> Option<String> {
    let inner = arg.strip_prefix('"')?;
    let mut content = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'"') => {
                chars.next();
                content.push('"');
            }
            '"' => return chars.next().is_none().then_some(content),
            _ => content.push(ch),
        }
    }
    // Unterminated; treated as bare.
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_set_two_args() {
        let commands = parse_script(r#"set("token", "abc")"#).unwrap();
        assert_eq!(
            commands,
            vec![Command::SetVariable {
                name: "token".to_string(),
                value: "abc".to_string(),
                scope: None,
            }]
        );
    }

    #[test]
    fn test_parse_set_with_scope() {
        let commands = parse_script(r#"set("token", "abc", "environment")"#).unwrap();
        let Command::SetVariable { scope, .. } = &commands[0] else {
            unreachable!("Expected set command");
        };
        assert_eq!(scope.as_deref(), Some("environment"));
    }

    #[test]
    fn test_parse_test_with_bare_condition() {
        let commands = parse_script(r#"test("status ok", {{$status}} == 200)"#).unwrap();
        assert_eq!(
            commands,
            vec![Command::Test {
                name: "status ok".to_string(),
                condition: "{{$status}} == 200".to_string(),
            }]
        );
    }

    #[test]
    fn test_padding_around_quoted_arguments_dropped() {
        let commands = parse_script(r#"set( "token" ,   "abc"  )"#).unwrap();
        assert_eq!(
            commands,
            vec![Command::SetVariable {
                name: "token".to_string(),
                value: "abc".to_string(),
                scope: None,
            }]
        );
    }

    #[test]
    fn test_quoted_argument_keeps_inner_whitespace() {
        let commands = parse_script(r#"log("  padded  ")"#).unwrap();
        assert_eq!(
            commands,
            vec![Command::Log {
                message: "  padded  ".to_string()
            }]
        );
    }

    #[test]
    fn test_quotes_inside_bare_condition_kept() {
        let commands = parse_script(r#"test("eq", {{$body}} == "a, b")"#).unwrap();
        assert_eq!(
            commands,
            vec![Command::Test {
                name: "eq".to_string(),
                condition: r#"{{$body}} == "a, b""#.to_string(),
            }]
        );
    }

    #[test]
    fn test_quoted_left_operand_in_condition_kept() {
        let commands = parse_script(r#"test("eq", "active" == {{state}})"#).unwrap();
        assert_eq!(
            commands,
            vec![Command::Test {
                name: "eq".to_string(),
                condition: r#""active" == {{state}}"#.to_string(),
            }]
        );
    }

    #[test]
    fn test_quoted_argument_keeps_comma() {
        let commands = parse_script(r#"log("a, b, c")"#).unwrap();
        assert_eq!(
            commands,
            vec![Command::Log {
                message: "a, b, c".to_string()
            }]
        );
    }

    #[test]
    fn test_escaped_quote() {
        let commands = parse_script(r#"log("say \"hi\"")"#).unwrap();
        assert_eq!(
            commands,
            vec![Command::Log {
                message: "say \"hi\"".to_string()
            }]
        );
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let script = "\n// setup\n# also a comment\nlog(\"ready\")\n";
        let commands = parse_script(script).unwrap();
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_script("explode()").unwrap_err();
        assert_eq!(
            err,
            ScriptError::UnknownCommand {
                line: 1,
                name: "explode".to_string()
            }
        );
    }

    #[test]
    fn test_missing_paren() {
        let err = parse_script("log(\"x\"").unwrap_err();
        assert!(matches!(err, ScriptError::InvalidSyntax { line: 1, .. }));
    }

    #[test]
    fn test_wrong_arity() {
        let err = parse_script("set(\"only-name\")").unwrap_err();
        assert!(matches!(err, ScriptError::MissingArgument { .. }));
    }

    #[test]
    fn test_assert_status_parses_code() {
        let commands = parse_script("assertStatus(204)").unwrap();
        assert_eq!(commands, vec![Command::AssertStatus { expected: 204 }]);
    }

    #[test]
    fn test_assert_status_rejects_garbage() {
        let err = parse_script("assertStatus(ok)").unwrap_err();
        assert!(matches!(err, ScriptError::InvalidArgument { .. }));
    }

    #[test]
    fn test_line_numbers_skip_comments() {
        let script = "// one\nlog(\"two\")\nbroken";
        let err = parse_script(script).unwrap_err();
        assert!(matches!(err, ScriptError::InvalidSyntax { line: 3, .. }));
    }
}
