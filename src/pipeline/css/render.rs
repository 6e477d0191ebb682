// src/pipeline/css/render.rs

use crate::pipeline::css::parser::{AtRule, Node};
use crate::pipeline::Line;

/// Two-space indented output, one declaration per line.
pub fn render_pretty(nodes: &[Node]) -> Vec<Line> {
    let mut out = Vec::new();
    write_pretty(nodes, 0, &mut out);
    out
}

fn write_pretty(nodes: &[Node], depth: usize, out: &mut Vec<Line>) {
    let pad = "  ".repeat(depth);
    for node in nodes {
        match node {
            Node::Rule(rule) => {
                if rule.children.is_empty() {
                    continue;
                }
                out.push(Line::new(
                    format!("{pad}{} {{", rule.selectors.join(", ")),
                    rule.origin.clone(),
                ));
                write_pretty(&rule.children, depth + 1, out);
                out.push(Line::new(format!("{pad}}}"), rule.origin.clone()));
            }
            Node::Decl(decl) => out.push(Line::new(
                format!("{pad}{}: {};", decl.prop, decl.value),
                decl.origin.clone(),
            )),
            Node::AtRule(at) => {
                let head = at_rule_head(at, " ");
                match &at.block {
                    None => out.push(Line::new(format!("{pad}{head};"), at.origin.clone())),
                    Some(children) => {
                        out.push(Line::new(format!("{pad}{head} {{"), at.origin.clone()));
                        write_pretty(children, depth + 1, out);
                        out.push(Line::new(format!("{pad}}}"), at.origin.clone()));
                    }
                }
            }
        }
    }
}

/// One line per top-level node, no optional whitespace.
pub fn render_compressed(nodes: &[Node]) -> Vec<Line> {
    nodes
        .iter()
        .filter_map(|node| {
            let mut text = String::new();
            write_compact(node, &mut text);
            if text.is_empty() {
                None
            } else {
                Some(Line::new(text, node.origin().cloned()))
            }
        })
        .collect()
}

fn write_compact(node: &Node, out: &mut String) {
    match node {
        Node::Rule(rule) => {
            if rule.children.is_empty() {
                return;
            }
            let selectors: Vec<String> = rule
                .selectors
                .iter()
                .map(|s| squeeze(s, &['>', '+', '~', ',']))
                .collect();
            out.push_str(&selectors.join(","));
            write_compact_block(&rule.children, out);
        }
        Node::Decl(decl) => {
            out.push_str(&decl.prop);
            out.push(':');
            out.push_str(&squeeze(&decl.value, &[',']));
        }
        Node::AtRule(at) => {
            let params = squeeze(&at.params, &[',', ':']);
            out.push('@');
            out.push_str(&at.name);
            if !params.is_empty() {
                out.push(' ');
                out.push_str(&params);
            }
            match &at.block {
                None => out.push(';'),
                Some(children) => write_compact_block(children, out),
            }
        }
    }
}

fn write_compact_block(children: &[Node], out: &mut String) {
    out.push('{');
    let mut need_separator = false;
    for child in children {
        if need_separator {
            out.push(';');
        }
        write_compact(child, out);
        need_separator = matches!(child, Node::Decl(_));
    }
    out.push('}');
}

fn at_rule_head(at: &AtRule, sep: &str) -> String {
    if at.params.is_empty() {
        format!("@{}", at.name)
    } else {
        format!("@{}{sep}{}", at.name, at.params)
    }
}

/// Collapse whitespace outside strings and drop it next to `tight` chars.
fn squeeze(text: &str, tight: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut pending_space = false;

    for c in text.chars() {
        if let Some(q) = quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        if c.is_whitespace() {
            pending_space = true;
            continue;
        }

        if pending_space {
            let after_tight = out.chars().last().is_some_and(|p| tight.contains(&p));
            if !out.is_empty() && !after_tight && !tight.contains(&c) {
                out.push(' ');
            }
            pending_space = false;
        }

        if c == '"' || c == '\'' {
            quote = Some(c);
        }
        out.push(c);
    }
    out
}
