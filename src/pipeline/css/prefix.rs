// src/pipeline/css/prefix.rs

//! Vendor prefixes for properties that still need them in current
//! browser releases.

use crate::pipeline::css::parser::{AtRule, Decl, Node, Rule};

fn prefixes_for(prop: &str) -> &'static [&'static str] {
    match prop {
        "appearance" => &["-webkit-", "-moz-"],
        "user-select" => &["-webkit-", "-moz-", "-ms-"],
        "text-size-adjust" => &["-webkit-", "-moz-", "-ms-"],
        "hyphens" => &["-webkit-", "-ms-"],
        "backdrop-filter" | "mask" | "mask-image" | "box-decoration-break" | "clip-path" => {
            &["-webkit-"]
        }
        "tab-size" => &["-moz-"],
        _ => &[],
    }
}

pub fn autoprefix(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let existing: Vec<(String, String)> = nodes
        .iter()
        .filter_map(|n| match n {
            Node::Decl(d) => Some((d.prop.to_ascii_lowercase(), d.value.trim().to_string())),
            _ => None,
        })
        .collect();
    let has = |prop: &str, value: Option<&str>| {
        existing
            .iter()
            .any(|(p, v)| p == prop && value.is_none_or(|want| v == want))
    };

    for node in nodes {
        match node {
            Node::Decl(decl) => {
                let prop = decl.prop.to_ascii_lowercase();
                for prefix in prefixes_for(&prop) {
                    let prefixed = format!("{prefix}{prop}");
                    if !has(&prefixed, None) {
                        out.push(Node::Decl(Decl {
                            prop: prefixed,
                            value: decl.value.clone(),
                            origin: decl.origin.clone(),
                        }));
                    }
                }
                if prop == "position"
                    && decl.value.trim().eq_ignore_ascii_case("sticky")
                    && !has("position", Some("-webkit-sticky"))
                {
                    out.push(Node::Decl(Decl {
                        prop: decl.prop.clone(),
                        value: "-webkit-sticky".to_string(),
                        origin: decl.origin.clone(),
                    }));
                }
                out.push(Node::Decl(decl));
            }
            Node::Rule(rule) => out.push(Node::Rule(Rule {
                children: autoprefix(rule.children),
                ..rule
            })),
            Node::AtRule(at) => out.push(Node::AtRule(AtRule {
                block: at.block.map(autoprefix),
                ..at
            })),
        }
    }
    out
}
