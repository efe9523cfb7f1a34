//! Template checks
//!
//! Light structural validation of generated HCL before it is written to disk

use crate::utils::error::{helpers::template_error, AppResult};

const BLOCK_KEYWORDS: &[&str] = &[
    "resource", "provider", "terraform", "variable", "data", "module", "output", "locals", "moved", "import", "check",
];

/// Strip surrounding whitespace and an enclosing Markdown code fence
pub fn extract_template(completion: &str) -> String {
    let trimmed = completion.trim();

    let Some(start) = trimmed.find("```") else {
        return trimmed.to_string();
    };

    // skip the fence and its language tag
    let after_fence = &trimmed[start + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(after_fence.len());
    let body = &after_fence[body_start..];

    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };

    body.trim().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Frame {
    Delim(char),
    Str,
    Interp,
}

/// Check that `content` looks like a Terraform template
///
/// Requires at least one top-level block keyword and balanced braces,
/// brackets and parentheses outside strings, comments and heredocs.
pub fn validate_template(content: &str) -> AppResult<()> {
    if content.trim().is_empty() {
        return Err(template_error("template is empty"));
    }

    let has_block = content.lines().any(|line| {
        let line = line.trim_start();
        BLOCK_KEYWORDS.iter().any(|kw| {
            line.strip_prefix(kw)
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c == ' ' || c == '{' || c == '"' || c == '\t')
        })
    });
    if !has_block {
        return Err(template_error("no Terraform block found"));
    }

    check_balanced(content)
}

fn check_balanced(content: &str) -> AppResult<()> {
    let chars: Vec<char> = content.chars().collect();
    let mut stack: Vec<Frame> = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        if c == '\n' {
            line += 1;
        }

        if stack.last() == Some(&Frame::Str) {
            match (c, next) {
                ('\\', _) => i += 1,
                ('"', _) => {
                    stack.pop();
                }
                ('$', Some('{')) | ('%', Some('{')) => {
                    stack.push(Frame::Interp);
                    i += 1;
                }
                ('\n', _) => return Err(template_error(format!("unterminated string on line {}", line - 1))),
                _ => {}
            }
            i += 1;
            continue;
        }

        match (c, next) {
            ('"', _) => stack.push(Frame::Str),
            ('#', _) | ('/', Some('/')) => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            ('/', Some('*')) => {
                let start_line = line;
                i += 2;
                loop {
                    match (chars.get(i), chars.get(i + 1)) {
                        (Some('*'), Some('/')) => break,
                        (Some('\n'), _) => line += 1,
                        (None, _) => return Err(template_error(format!("unterminated comment starting on line {}", start_line))),
                        _ => {}
                    }
                    i += 1;
                }
                i += 1;
            }
            ('<', Some('<')) => {
                let start_line = line;
                let mut j = i + 2;
                if chars.get(j) == Some(&'-') {
                    j += 1;
                }
                let ident: String = chars[j..]
                    .iter()
                    .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
                    .collect();

                if !ident.is_empty() {
                    // skip heredoc body up to the closing identifier line
                    let rest: String = chars[j + ident.chars().count()..].iter().collect();
                    let mut consumed = 0;
                    let mut closed = false;
                    for (n, body_line) in rest.split_inclusive('\n').enumerate() {
                        consumed += body_line.chars().count();
                        line += body_line.matches('\n').count();
                        if n > 0 && body_line.trim() == ident {
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(template_error(format!("unterminated heredoc starting on line {}", start_line)));
                    }
                    i = j + ident.chars().count() + consumed;
                    continue;
                }
            }
            ('{', _) => stack.push(Frame::Delim('}')),
            ('(', _) => stack.push(Frame::Delim(')')),
            ('[', _) => stack.push(Frame::Delim(']')),
            ('}', _) | (')', _) | (']', _) => match stack.pop() {
                Some(Frame::Delim(expected)) if expected == c => {}
                Some(Frame::Interp) if c == '}' => {}
                _ => return Err(template_error(format!("unexpected '{}' on line {}", c, line))),
            },
            _ => {}
        }
        i += 1;
    }

    match stack.last() {
        None => Ok(()),
        Some(Frame::Str) => Err(template_error("unterminated string")),
        Some(_) => Err(template_error("unclosed block at end of template")),
    }
}
