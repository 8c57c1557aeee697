//! Conditional-compilation directives for WGSL sources.
//!
//! WGSL has no preprocessor, but the fragment shader needs one source that
//! covers every pixel format and display mode. Before a source reaches the
//! backend, [`expand`] resolves a small C-style directive set:
//!
//! | Directive              | Effect                                        |
//! |------------------------|-----------------------------------------------|
//! | `#define NAME [VALUE]` | define a macro (value optional)               |
//! | `#undef NAME`          | remove a macro                                |
//! | `#ifdef` / `#ifndef`   | test whether a macro is defined               |
//! | `#if EXPR`, `#elif`    | `NAME == N`, `NAME != N`, `defined(NAME)`, `N` |
//! | `#else`, `#endif`      | close a branch                                |
//!
//! Directive lines and inactive lines become blank lines, so line numbers in
//! compiler diagnostics still point at the original source. Macros are not
//! substituted into shader code; they only steer the conditionals.

use std::collections::HashMap;
use std::fmt;

/// A malformed directive, with the 1-based line it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for DirectiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for DirectiveError {}

/// One open `#if`/`#ifdef` block.
struct Branch {
    /// Whether the enclosing block is emitting lines.
    parent_active: bool,
    /// Whether any branch of this block has been taken yet.
    taken: bool,
    /// Whether the current branch is emitting lines.
    active: bool,
    seen_else: bool,
}

/// Resolve every directive in `source`.
pub fn expand(source: &str) -> Result<String, DirectiveError> {
    let mut defines: HashMap<String, Option<String>> = HashMap::new();
    let mut stack: Vec<Branch> = Vec::new();
    let mut out = String::with_capacity(source.len());

    for (index, line) in source.lines().enumerate() {
        let number = index + 1;
        let err = |message: String| DirectiveError {
            line: number,
            message,
        };
        let active = stack.last().is_none_or(|b| b.active);

        let Some(directive) = line.trim_start().strip_prefix('#') else {
            if active {
                out.push_str(line);
            }
            out.push('\n');
            continue;
        };

        let directive = directive.trim();
        let (word, rest) = match directive.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (directive, ""),
        };

        match word {
            "define" => {
                if active {
                    let (name, value) = match rest.split_once(char::is_whitespace) {
                        Some((name, value)) => (name, Some(value.trim().to_owned())),
                        None => (rest, None),
                    };
                    if !is_identifier(name) {
                        return Err(err(format!("bad macro name \"{name}\"")));
                    }
                    defines.insert(name.to_owned(), value);
                }
            }
            "undef" => {
                if active {
                    defines.remove(rest);
                }
            }
            "ifdef" | "ifndef" | "if" => {
                let cond = if active {
                    match word {
                        "ifdef" => defines.contains_key(rest),
                        "ifndef" => !defines.contains_key(rest),
                        _ => evaluate(rest, &defines).map_err(err)?,
                    }
                } else {
                    false
                };
                stack.push(Branch {
                    parent_active: active,
                    taken: cond,
                    active: active && cond,
                    seen_else: false,
                });
            }
            "elif" => {
                let Some(branch) = stack.last_mut() else {
                    return Err(err("#elif without #if".into()));
                };
                if branch.seen_else {
                    return Err(err("#elif after #else".into()));
                }
                if branch.taken || !branch.parent_active {
                    branch.active = false;
                } else {
                    let cond = evaluate(rest, &defines).map_err(err)?;
                    branch.active = cond;
                    branch.taken = cond;
                }
            }
            "else" => {
                let Some(branch) = stack.last_mut() else {
                    return Err(err("#else without #if".into()));
                };
                if branch.seen_else {
                    return Err(err("duplicate #else".into()));
                }
                branch.active = branch.parent_active && !branch.taken;
                branch.taken = true;
                branch.seen_else = true;
            }
            "endif" => {
                if stack.pop().is_none() {
                    return Err(err("#endif without #if".into()));
                }
            }
            other => return Err(err(format!("unknown directive #{other}"))),
        }
        out.push('\n');
    }

    if !stack.is_empty() {
        return Err(DirectiveError {
            line: source.lines().count(),
            message: format!("{} unterminated #if block(s)", stack.len()),
        });
    }

    Ok(out)
}

/// Evaluate an `#if` expression.
fn evaluate(expr: &str, defines: &HashMap<String, Option<String>>) -> Result<bool, String> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err("empty #if expression".into());
    }

    if let Some(inner) = expr
        .strip_prefix("defined(")
        .and_then(|s| s.strip_suffix(')'))
    {
        return Ok(defines.contains_key(inner.trim()));
    }

    if let Some((lhs, rhs)) = expr.split_once("==") {
        return Ok(operand(lhs, defines)? == operand(rhs, defines)?);
    }
    if let Some((lhs, rhs)) = expr.split_once("!=") {
        return Ok(operand(lhs, defines)? != operand(rhs, defines)?);
    }

    Ok(operand(expr, defines)? != 0)
}

/// A number literal or a macro whose value is a number.
fn operand(token: &str, defines: &HashMap<String, Option<String>>) -> Result<i64, String> {
    let token = token.trim();
    if let Ok(n) = token.parse::<i64>() {
        return Ok(n);
    }
    match defines.get(token) {
        Some(Some(value)) => value
            .parse()
            .map_err(|_| format!("macro {token} = \"{value}\" is not a number")),
        Some(None) => Err(format!("macro {token} has no value")),
        None => Err(format!("undefined macro {token}")),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
