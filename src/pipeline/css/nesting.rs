// src/pipeline/css/nesting.rs

//! Flatten nested rules into plain CSS.

use std::mem;

use crate::pipeline::css::parser::{AtRule, Node, Rule};
use crate::pipeline::Origin;

/// At-rules that wrap the resolved rule when nested inside one.
const CONDITIONAL_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "container",
    "layer",
    "document",
    "-moz-document",
    "scope",
    "starting-style",
];

pub fn flatten(nodes: Vec<Node>) -> Vec<Node> {
    flatten_block(nodes, None, None)
}

/// Flatten the children of a block whose resolved selectors are `parent`.
///
/// Declarations are grouped into runs; a nested rule or at-rule ends the
/// current run, so declaration order relative to nested rules is kept.
fn flatten_block(nodes: Vec<Node>, parent: Option<&[String]>, origin: Option<Origin>) -> Vec<Node> {
    let mut out = Vec::new();
    let mut decls = Vec::new();

    for node in nodes {
        match node {
            Node::Decl(_) => decls.push(node),
            Node::Rule(rule) => {
                flush(&mut out, &mut decls, parent, &origin);
                let selectors = match parent {
                    Some(p) => combine(p, &rule.selectors),
                    None => rule.selectors,
                };
                out.extend(flatten_block(rule.children, Some(&selectors), rule.origin));
            }
            Node::AtRule(at) => {
                flush(&mut out, &mut decls, parent, &origin);
                out.push(flatten_at_rule(at, parent));
            }
        }
    }

    flush(&mut out, &mut decls, parent, &origin);
    out
}

fn flatten_at_rule(at: AtRule, parent: Option<&[String]>) -> Node {
    let AtRule {
        name,
        params,
        block,
        origin,
    } = at;

    let block = match block {
        None => None,
        Some(children) if name.to_ascii_lowercase().ends_with("keyframes") => Some(children),
        Some(children) => {
            let lower = name.to_ascii_lowercase();
            let scope = if CONDITIONAL_AT_RULES.contains(&lower.as_str()) {
                parent
            } else {
                None
            };
            Some(flatten_block(children, scope, origin.clone()))
        }
    };

    Node::AtRule(AtRule {
        name,
        params,
        block,
        origin,
    })
}

fn flush(out: &mut Vec<Node>, decls: &mut Vec<Node>, parent: Option<&[String]>, origin: &Option<Origin>) {
    if decls.is_empty() {
        return;
    }
    let children = mem::take(decls);
    match parent {
        Some(selectors) => out.push(Node::Rule(Rule {
            selectors: selectors.to_vec(),
            children,
            origin: origin.clone(),
        })),
        None => out.extend(children),
    }
}

/// Every parent selector combined with every child selector.
fn combine(parents: &[String], children: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(parents.len() * children.len());
    for parent in parents {
        for child in children {
            if child.contains('&') {
                out.push(child.replace('&', parent));
            } else {
                out.push(format!("{parent} {child}"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::css::parser::parse;
    use crate::pipeline::css::render::render_compressed;
    use crate::pipeline::SourceFile;

    fn flat(css: &str) -> String {
        let nodes = parse(&SourceFile::from_text("t.css", css)).unwrap();
        render_compressed(&flatten(nodes))
            .into_iter()
            .map(|l| l.text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn descendant_nesting() {
        assert_eq!(flat(".x{.y{color:red}}"), ".x .y{color:red}");
    }

    #[test]
    fn ampersand_and_selector_lists() {
        assert_eq!(
            flat(".a,.b{&:hover,.c{d:e}}"),
            ".a:hover,.a .c,.b:hover,.b .c{d:e}"
        );
    }

    #[test]
    fn declarations_keep_their_order_around_nested_rules() {
        assert_eq!(
            flat(".a{x:1;.b{y:2}z:3}"),
            ".a{x:1}\n.a .b{y:2}\n.a{z:3}"
        );
    }

    #[test]
    fn media_bubbles_and_keyframes_stay_put() {
        assert_eq!(
            flat(".a{color:red;@media (x){color:blue}}"),
            ".a{color:red}\n@media (x){.a{color:blue}}"
        );
        assert_eq!(
            flat(".a{@keyframes spin{from{b:c}}}"),
            "@keyframes spin{from{b:c}}"
        );
    }
}
