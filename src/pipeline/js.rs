// src/pipeline/js.rs

//! Line-preserving script minifier and the balance check used by the
//! built-in script linter.
//!
//! The lexer only knows enough JavaScript to tell code from comments and
//! literals (strings, template literals, regular expressions). Lines are
//! never joined, so automatic semicolon insertion behaves exactly as in the
//! input.

use crate::pipeline::{map_files, Line, SourceFile, Stage, StageFuture};

/// Keywords after which a `/` starts a regular expression.
const REGEX_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// Inside a `${ ... }` of a template; counts nested braces.
    TemplateExpr(u32),
    Template,
    BlockComment,
    /// String continued onto the next line with a trailing backslash.
    StringCont(char),
}

/// Problem found by [`check_balance`]; `line` and `col` are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceIssue {
    pub line: usize,
    pub col: usize,
    pub message: String,
}

#[derive(Debug, Default)]
struct Lexer {
    frames: Vec<Frame>,
    /// Open brackets with their position, for the balance check.
    open: Vec<(char, usize, usize)>,
    issues: Vec<BalanceIssue>,
}

fn is_ident(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || !c.is_ascii()
}

impl Lexer {
    fn in_template(&self) -> bool {
        matches!(self.frames.last(), Some(Frame::Template))
    }

    fn issue(&mut self, line: usize, col: usize, message: impl Into<String>) {
        self.issues.push(BalanceIssue {
            line: line + 1,
            col: col + 1,
            message: message.into(),
        });
    }

    /// Minify one line into `out`. `line_no` is zero-based.
    fn line(&mut self, text: &str, line_no: usize, out: &mut String) {
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;
        let mut pending_space = false;

        while i < chars.len() {
            let c = chars[i];

            match self.frames.last().copied() {
                Some(Frame::BlockComment) => {
                    if c == '*' && chars.get(i + 1) == Some(&'/') {
                        self.frames.pop();
                        pending_space = true;
                        i += 2;
                    } else {
                        i += 1;
                    }
                    continue;
                }
                Some(Frame::StringCont(quote)) => {
                    self.frames.pop();
                    i = self.copy_string(&chars, i, quote, false, line_no, out);
                    continue;
                }
                Some(Frame::Template) => {
                    out.push(c);
                    match c {
                        '\\' => {
                            if let Some(&next) = chars.get(i + 1) {
                                out.push(next);
                            }
                            i += 2;
                        }
                        '`' => {
                            self.frames.pop();
                            i += 1;
                        }
                        '$' if chars.get(i + 1) == Some(&'{') => {
                            out.push('{');
                            self.frames.push(Frame::TemplateExpr(0));
                            i += 2;
                        }
                        _ => i += 1,
                    }
                    continue;
                }
                _ => {}
            }

            // Code, possibly inside a template expression.
            if c.is_whitespace() {
                pending_space = true;
                i += 1;
                continue;
            }

            if c == '/' && chars.get(i + 1) == Some(&'/') {
                break;
            }
            if c == '/' && chars.get(i + 1) == Some(&'*') {
                self.frames.push(Frame::BlockComment);
                pending_space = true;
                i += 2;
                continue;
            }

            if pending_space {
                if let Some(prev) = out.chars().last() {
                    if needs_space(prev, c) {
                        out.push(' ');
                    }
                }
                pending_space = false;
            }

            match c {
                '"' | '\'' => {
                    i = self.copy_string(&chars, i, c, true, line_no, out);
                }
                '`' => {
                    out.push(c);
                    self.frames.push(Frame::Template);
                    i += 1;
                }
                '/' if regex_allowed(out) => {
                    i = self.copy_regex(&chars, i, line_no, out);
                }
                '{' => {
                    if let Some(Frame::TemplateExpr(depth)) = self.frames.last_mut() {
                        *depth += 1;
                    }
                    self.open.push((c, line_no, i));
                    out.push(c);
                    i += 1;
                }
                '}' => {
                    if let Some(Frame::TemplateExpr(depth)) = self.frames.last_mut() {
                        if *depth == 0 {
                            self.frames.pop();
                            out.push(c);
                            i += 1;
                            continue;
                        }
                        *depth -= 1;
                    }
                    self.close(c, line_no, i);
                    out.push(c);
                    i += 1;
                }
                '(' | '[' => {
                    self.open.push((c, line_no, i));
                    out.push(c);
                    i += 1;
                }
                ')' | ']' => {
                    self.close(c, line_no, i);
                    out.push(c);
                    i += 1;
                }
                _ => {
                    out.push(c);
                    i += 1;
                }
            }
        }
    }

    fn close(&mut self, c: char, line_no: usize, col: usize) {
        let expected = match c {
            ')' => '(',
            ']' => '[',
            _ => '{',
        };
        match self.open.pop() {
            Some((open, _, _)) if open == expected => {}
            Some((open, l, cl)) => {
                self.issue(line_no, col, format!("'{c}' does not match '{open}' opened at {}:{}", l + 1, cl + 1));
            }
            None => self.issue(line_no, col, format!("unmatched '{c}'")),
        }
    }

    fn copy_string(
        &mut self,
        chars: &[char],
        start: usize,
        quote: char,
        opening: bool,
        line_no: usize,
        out: &mut String,
    ) -> usize {
        // Without `opening`, `start` is the first char of a continued line.
        let mut i = start;
        if opening {
            out.push(quote);
            i += 1;
        }
        while i < chars.len() {
            let c = chars[i];
            out.push(c);
            if c == '\\' {
                match chars.get(i + 1) {
                    Some(&next) => {
                        out.push(next);
                        i += 2;
                        continue;
                    }
                    None => {
                        self.frames.push(Frame::StringCont(quote));
                        return chars.len();
                    }
                }
            }
            i += 1;
            if c == quote {
                return i;
            }
        }
        self.issue(line_no, start, "unterminated string literal");
        i
    }

    fn copy_regex(&mut self, chars: &[char], start: usize, line_no: usize, out: &mut String) -> usize {
        let mut i = start;
        let mut in_class = false;
        out.push('/');
        i += 1;
        while i < chars.len() {
            let c = chars[i];
            out.push(c);
            i += 1;
            match c {
                '\\' => {
                    if let Some(&next) = chars.get(i) {
                        out.push(next);
                        i += 1;
                    }
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => return i,
                _ => {}
            }
        }
        self.issue(line_no, start, "unterminated regular expression");
        i
    }

    fn finish(&mut self, last_line: usize) {
        match self.frames.last() {
            Some(Frame::BlockComment) => self.issue(last_line, 0, "unterminated comment"),
            Some(Frame::Template) | Some(Frame::TemplateExpr(_)) => {
                self.issue(last_line, 0, "unterminated template literal")
            }
            Some(Frame::StringCont(_)) => self.issue(last_line, 0, "unterminated string literal"),
            None => {}
        }
        let open = std::mem::take(&mut self.open);
        for (c, line, col) in open {
            self.issue(line, col, format!("unclosed '{c}'"));
        }
    }
}

fn needs_space(prev: char, next: char) -> bool {
    (is_ident(prev) && is_ident(next))
        || (prev.is_ascii_digit() && next == '.')
        || (prev == next && matches!(prev, '+' | '-' | '/'))
        || (prev == '+' && next == '+')
        || (prev == '-' && next == '-')
}

/// Whether a `/` at this point starts a regex rather than a division.
fn regex_allowed(out: &str) -> bool {
    let trimmed = out.trim_end();
    let Some(prev) = trimmed.chars().last() else {
        return true;
    };
    // Postfix increment or decrement ends an operand.
    if trimmed.ends_with("++") || trimmed.ends_with("--") {
        return false;
    }
    if "(,=:[!&|?{};+-*%<>~^".contains(prev) {
        return true;
    }
    if is_ident(prev) {
        let word: String = trimmed
            .chars()
            .rev()
            .take_while(|c| is_ident(*c))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return REGEX_KEYWORDS.contains(&word.as_str());
    }
    false
}

/// Minify script lines. Lines that end up empty are dropped unless they
/// are part of a template literal.
pub fn minify(file: &SourceFile) -> Vec<Line> {
    let mut lexer = Lexer::default();
    let mut out = Vec::with_capacity(file.lines.len());

    for (idx, line) in file.lines.iter().enumerate() {
        let started_in_template = lexer.in_template();
        let mut text = String::new();
        lexer.line(&line.text, idx, &mut text);
        if !text.is_empty() || started_in_template || lexer.in_template() {
            out.push(Line::new(text, line.origin.clone()));
        }
    }
    out
}

/// Report unbalanced brackets and unterminated literals or comments.
pub fn check_balance(text: &str) -> Vec<BalanceIssue> {
    let mut lexer = Lexer::default();
    let mut sink = String::new();
    let mut last = 0;
    for (idx, line) in text.lines().enumerate() {
        sink.clear();
        lexer.line(line, idx, &mut sink);
        last = idx;
    }
    lexer.finish(last);
    lexer.issues
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsMinify;

impl Stage for JsMinify {
    fn name(&self) -> &str {
        "js-minify"
    }

    fn apply(&self, files: Vec<SourceFile>) -> StageFuture<'_> {
        Box::pin(async move { map_files(files, |file| Ok(file.with_lines(minify(&file)))) })
    }
}
