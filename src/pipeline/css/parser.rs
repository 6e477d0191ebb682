// src/pipeline/css/parser.rs

//! Small CSS parser: rules, declarations and at-rules, with nesting.
//!
//! Comments are dropped. Whitespace in selectors and values is collapsed
//! to single spaces outside of strings. Each node remembers the origin of
//! the line it started on.

use crate::errors::{BuildError, Result};
use crate::pipeline::{Origin, SourceFile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Rule(Rule),
    Decl(Decl),
    AtRule(AtRule),
}

impl Node {
    pub fn origin(&self) -> Option<&Origin> {
        match self {
            Node::Rule(r) => r.origin.as_ref(),
            Node::Decl(d) => d.origin.as_ref(),
            Node::AtRule(a) => a.origin.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selectors: Vec<String>,
    pub children: Vec<Node>,
    pub origin: Option<Origin>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub prop: String,
    pub value: String,
    pub origin: Option<Origin>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    /// `None` for statements such as `@import url(x.css);`.
    pub block: Option<Vec<Node>>,
    pub origin: Option<Origin>,
}

impl AtRule {
    pub fn is_keyframes(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with("keyframes")
    }
}

/// Parse a whole file.
pub fn parse(file: &SourceFile) -> Result<Vec<Node>> {
    Parser::new(file).parse_block(None)
}

struct Parser<'a> {
    file: &'a SourceFile,
    chars: Vec<char>,
    line_of: Vec<usize>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(file: &'a SourceFile) -> Self {
        let mut chars = Vec::new();
        let mut line_of = Vec::new();
        for (idx, line) in file.lines.iter().enumerate() {
            for c in line.text.chars() {
                chars.push(c);
                line_of.push(idx);
            }
            chars.push('\n');
            line_of.push(idx);
        }
        Self {
            file,
            chars,
            line_of,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn origin_at(&self, pos: usize) -> Option<Origin> {
        let idx = self.line_of.get(pos).copied()?;
        self.file.origin_of(idx)
    }

    fn error(&self, pos: usize, message: &str) -> BuildError {
        let location = match self.origin_at(pos) {
            Some(o) => format!("{}:{}", o.source, o.line + 1),
            None => format!(
                "line {}",
                self.line_of.get(pos).copied().unwrap_or_default() + 1
            ),
        };
        BuildError::transform("css", &self.file.path, format!("{message} at {location}"))
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.pos += 1,
                Some('/') if self.peek_at(1) == Some('*') => self.skip_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 2;
        while self.pos < self.chars.len() {
            if self.chars[self.pos] == '*' && self.peek_at(1) == Some('/') {
                self.pos += 2;
                return Ok(());
            }
            self.pos += 1;
        }
        Err(self.error(start, "unterminated comment"))
    }

    /// `open` is the position of the `{` that opened this block.
    fn parse_block(&mut self, open: Option<usize>) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();

        loop {
            self.skip_trivia()?;
            let Some(c) = self.peek() else {
                return match open {
                    Some(pos) => Err(self.error(pos, "unclosed block")),
                    None => Ok(nodes),
                };
            };

            match c {
                '}' => {
                    if open.is_some() {
                        self.pos += 1;
                        return Ok(nodes);
                    }
                    return Err(self.error(self.pos, "unexpected '}'"));
                }
                ';' => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            let start = self.pos;
            let (prelude, term) = self.read_prelude()?;
            let origin = self.origin_at(start);

            if term == Some('{') {
                let brace = self.pos;
                self.pos += 1;
                let children = self.parse_block(Some(brace))?;
                if let Some(at) = prelude.strip_prefix('@') {
                    let (name, params) = split_at_rule(at);
                    nodes.push(Node::AtRule(AtRule {
                        name,
                        params,
                        block: Some(children),
                        origin,
                    }));
                } else {
                    let selectors = split_top_level(&prelude, ',');
                    if selectors.is_empty() {
                        return Err(self.error(start, "rule without selector"));
                    }
                    nodes.push(Node::Rule(Rule {
                        selectors,
                        children,
                        origin,
                    }));
                }
                continue;
            }

            // Terminated by ';', by the closing '}' or by end of input.
            if term == Some(';') {
                self.pos += 1;
            }
            if prelude.is_empty() {
                continue;
            }

            if let Some(at) = prelude.strip_prefix('@') {
                let (name, params) = split_at_rule(at);
                nodes.push(Node::AtRule(AtRule {
                    name,
                    params,
                    block: None,
                    origin,
                }));
                continue;
            }

            if open.is_none() {
                return Err(self.error(start, "declaration outside of a rule"));
            }
            let Some((prop, value)) = split_declaration(&prelude) else {
                return Err(self.error(start, &format!("declaration without ':' ('{prelude}')")));
            };
            nodes.push(Node::Decl(Decl {
                prop,
                value,
                origin,
            }));
        }
    }

    /// Read up to (not including) the next top-level `{`, `;` or `}`.
    fn read_prelude(&mut self) -> Result<(String, Option<char>)> {
        let start = self.pos;
        let mut out = String::new();
        let mut depth: i32 = 0;
        let mut pending_space = false;

        while let Some(c) = self.peek() {
            match c {
                '{' | ';' | '}' if depth == 0 => {
                    return Ok((out, Some(c)));
                }
                '/' if self.peek_at(1) == Some('*') => {
                    self.skip_comment()?;
                    pending_space = true;
                    continue;
                }
                '"' | '\'' => {
                    push_pending(&mut out, &mut pending_space);
                    self.read_string(c, &mut out)?;
                    continue;
                }
                c if c.is_whitespace() => {
                    pending_space = true;
                }
                '(' | '[' => {
                    depth += 1;
                    push_pending(&mut out, &mut pending_space);
                    out.push(c);
                }
                ')' | ']' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(self.error(self.pos, &format!("unbalanced '{c}'")));
                    }
                    push_pending(&mut out, &mut pending_space);
                    out.push(c);
                }
                _ => {
                    push_pending(&mut out, &mut pending_space);
                    out.push(c);
                }
            }
            self.pos += 1;
        }

        if depth > 0 {
            return Err(self.error(start, "unbalanced '(' or '['"));
        }
        Ok((out, None))
    }

    fn read_string(&mut self, quote: char, out: &mut String) -> Result<()> {
        let start = self.pos;
        out.push(quote);
        self.pos += 1;
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    out.push(c);
                    if let Some(next) = self.peek_at(1) {
                        out.push(next);
                    }
                    self.pos += 2;
                }
                '\n' => break,
                c if c == quote => {
                    out.push(c);
                    self.pos += 1;
                    return Ok(());
                }
                _ => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
        Err(self.error(start, "unterminated string"))
    }
}

fn push_pending(out: &mut String, pending_space: &mut bool) {
    if *pending_space && !out.is_empty() {
        out.push(' ');
    }
    *pending_space = false;
}

fn split_at_rule(at: &str) -> (String, String) {
    let end = at
        .find(|c: char| c.is_whitespace() || c == '(' || c == '"' || c == '\'')
        .unwrap_or(at.len());
    (at[..end].to_string(), at[end..].trim().to_string())
}

/// `prop: value` split at the first top-level colon.
fn split_declaration(text: &str) -> Option<(String, String)> {
    let idx = find_top_level(text, ':')?;
    let prop = text[..idx].trim();
    if prop.is_empty() {
        return None;
    }
    Some((prop.to_string(), text[idx + 1..].trim().to_string()))
}

fn find_top_level(text: &str, needle: char) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            c if c == needle && depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Split on `sep` outside parentheses, brackets and strings.
pub fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(idx) = find_top_level(rest, sep) {
        parts.push(rest[..idx].trim().to_string());
        rest = &rest[idx + sep.len_utf8()..];
    }
    parts.push(rest.trim().to_string());
    parts.retain(|p| !p.is_empty());
    parts
}
