//! Glob pattern matching (spec §6.5): `?` one non-separator character, `*`
//! zero or more non-separator characters, `**` any characters (crossing
//! separators), `[...]` a character class intersected with non-separator,
//! `{a,b,c}` alternation (no nesting), `\` escapes the following
//! character.
//!
//! Patterns compile to a small token list and match by backtracking.

use crate::error::{FsError, FsResult};

#[derive(Debug, Clone)]
enum Token {
    Char(char),
    AnyChar,
    Star,
    GlobStar,
    Class { negate: bool, singles: Vec<char>, ranges: Vec<(char, char)> },
}

impl Token {
    fn class_matches(&self, c: char) -> bool {
        match self {
            Token::Class { negate, singles, ranges } => {
                let hit = singles.contains(&c) || ranges.iter().any(|&(lo, hi)| c >= lo && c <= hi);
                hit != *negate
            }
            _ => false,
        }
    }
}

/// A compiled glob pattern: one token sequence per brace alternative.
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    separator: char,
    alternatives: Vec<Vec<Token>>,
}

impl GlobMatcher {
    pub fn compile(pattern: &str, separator: char) -> FsResult<Self> {
        let expanded = expand_braces(pattern)?;
        let alternatives = expanded.iter().map(|alt| compile_tokens(alt)).collect::<FsResult<Vec<_>>>()?;
        Ok(GlobMatcher { separator, alternatives })
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        let chars: Vec<char> = candidate.chars().collect();
        self.alternatives.iter().any(|tokens| match_here(tokens, 0, &chars, 0, self.separator))
    }
}

fn expand_braces(pattern: &str) -> FsResult<Vec<String>> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    let mut escaped_positions = vec![false; chars.len()];
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() {
            escaped_positions[i + 1] = true;
            i += 2;
        } else {
            i += 1;
        }
    }

    let open = (0..chars.len()).find(|&i| chars[i] == '{' && !escaped_positions[i]);
    let Some(open) = open else {
        return Ok(vec![pattern.to_string()]);
    };
    let mut depth = 1;
    let mut close = None;
    let mut j = open + 1;
    while j < chars.len() {
        if chars[j] == '{' && !escaped_positions[j] {
            depth += 1;
        } else if chars[j] == '}' && !escaped_positions[j] {
            depth -= 1;
            if depth == 0 {
                close = Some(j);
                break;
            }
        }
        j += 1;
    }
    let Some(close) = close else {
        return Err(FsError::PathSyntaxInvalid { path: pattern.to_string(), reason: "unmatched `{` in glob pattern" });
    };

    let prefix: String = chars[..open].iter().collect();
    let body: String = chars[open + 1..close].iter().collect();
    let suffix: String = chars[close + 1..].iter().collect();

    if body.contains('{') {
        return Err(FsError::PathSyntaxInvalid { path: pattern.to_string(), reason: "nested `{...}` alternation is not supported" });
    }

    let mut out = Vec::new();
    for alt in body.split(',') {
        out.push(format!("{prefix}{alt}{suffix}"));
    }
    // Alternatives may themselves contain further (non-nested) groups.
    let mut result = Vec::new();
    for alt in out {
        result.extend(expand_braces(&alt)?);
    }
    Ok(result)
}

fn compile_tokens(pattern: &str) -> FsResult<Vec<Token>> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let next = chars.get(i + 1).copied().ok_or(FsError::PathSyntaxInvalid {
                    path: pattern.to_string(),
                    reason: "trailing `\\` escape in glob pattern",
                })?;
                tokens.push(Token::Char(next));
                i += 2;
            }
            '?' => {
                tokens.push(Token::AnyChar);
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::GlobStar);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '[' => {
                let (token, consumed) = compile_class(&chars[i..], pattern)?;
                tokens.push(token);
                i += consumed;
            }
            c => {
                tokens.push(Token::Char(c));
                i += 1;
            }
        }
    }
    Ok(tokens)
}

fn compile_class(rest: &[char], pattern: &str) -> FsResult<(Token, usize)> {
    let mut i = 1; // skip '['
    let negate = rest.get(i) == Some(&'!');
    if negate {
        i += 1;
    }
    let mut singles = Vec::new();
    let mut ranges = Vec::new();
    let start = i;
    while i < rest.len() && rest[i] != ']' {
        if rest[i + 1..].first() == Some(&'-') && rest.get(i + 2).is_some() && rest[i + 2] != ']' {
            ranges.push((rest[i], rest[i + 2]));
            i += 3;
        } else {
            singles.push(rest[i]);
            i += 1;
        }
    }
    if i >= rest.len() {
        return Err(FsError::PathSyntaxInvalid { path: pattern.to_string(), reason: "unmatched `[` in glob pattern" });
    }
    if i == start {
        return Err(FsError::PathSyntaxInvalid { path: pattern.to_string(), reason: "empty `[...]` character class" });
    }
    Ok((Token::Class { negate, singles, ranges }, i + 1))
}

fn match_here(tokens: &[Token], ti: usize, text: &[char], pi: usize, sep: char) -> bool {
    if ti == tokens.len() {
        return pi == text.len();
    }
    match &tokens[ti] {
        Token::Char(c) => pi < text.len() && text[pi] == *c && match_here(tokens, ti + 1, text, pi + 1, sep),
        Token::AnyChar => pi < text.len() && text[pi] != sep && match_here(tokens, ti + 1, text, pi + 1, sep),
        Token::Class { .. } => {
            pi < text.len() && text[pi] != sep && tokens[ti].class_matches(text[pi]) && match_here(tokens, ti + 1, text, pi + 1, sep)
        }
        Token::Star => {
            let mut end = pi;
            loop {
                if match_here(tokens, ti + 1, text, end, sep) {
                    return true;
                }
                if end >= text.len() || text[end] == sep {
                    return false;
                }
                end += 1;
            }
        }
        Token::GlobStar => {
            for end in pi..=text.len() {
                if match_here(tokens, ti + 1, text, end, sep) {
                    return true;
                }
            }
            false
        }
    }
}
