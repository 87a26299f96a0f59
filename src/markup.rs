//! Path queries over message markup
//!
//! Wraps a parsed XML tree and answers the small family of path lookups the
//! extractors use: `/a/b/c`, `/a/b/@attr`, `//name` and `//@attr`.

use crate::error::Result;
use roxmltree::{Document, Node};

/// A parsed markup payload
pub struct Markup<'input> {
    doc: Document<'input>,
}

/// Result of a path lookup
#[derive(Debug, Clone, Copy)]
pub enum Found<'a, 'input> {
    Element(Node<'a, 'input>),
    Attribute(&'a str),
}

impl Found<'_, '_> {
    /// Concatenated text of the element's subtree, or the attribute value
    pub fn inner_text(&self) -> String {
        match self {
            Found::Element(node) => node
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect(),
            Found::Attribute(value) => value.to_string(),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Step<'p> {
    Child(&'p str),
    Descendant(&'p str),
    Attribute(&'p str),
    DescendantAttribute(&'p str),
}

/// Split a path expression into steps. Returns None for anything outside
/// the supported grammar.
fn parse_path(path: &str) -> Option<Vec<Step<'_>>> {
    let mut steps = Vec::new();
    let mut rest = path;

    while !rest.is_empty() {
        let (descendant, tail) = if let Some(t) = rest.strip_prefix("//") {
            (true, t)
        } else if let Some(t) = rest.strip_prefix('/') {
            (false, t)
        } else {
            return None;
        };

        let end = tail.find('/').unwrap_or(tail.len());
        let segment = &tail[..end];
        rest = &tail[end..];

        if segment.is_empty() || segment == "@" {
            return None;
        }

        let step = match (segment.strip_prefix('@'), descendant) {
            (Some(attr), false) => Step::Attribute(attr),
            (Some(attr), true) => Step::DescendantAttribute(attr),
            (None, false) => Step::Child(segment),
            (None, true) => Step::Descendant(segment),
        };

        // Attributes terminate a path
        if matches!(step, Step::Attribute(_) | Step::DescendantAttribute(_)) && !rest.is_empty() {
            return None;
        }
        steps.push(step);
    }

    if steps.is_empty() {
        None
    } else {
        Some(steps)
    }
}

fn is_named(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

impl<'input> Markup<'input> {
    pub fn parse(text: &'input str) -> Result<Self> {
        let doc = Document::parse(text)?;
        Ok(Self { doc })
    }

    /// First match of `path` in document order
    pub fn find_first<'a>(&'a self, path: &str) -> Option<Found<'a, 'input>> {
        let steps = parse_path(path)?;
        let mut context = vec![self.doc.root()];

        for step in steps {
            match step {
                Step::Child(name) => {
                    context = context
                        .iter()
                        .flat_map(|n| n.children())
                        .filter(|n| is_named(n, name))
                        .collect();
                }
                Step::Descendant(name) => {
                    context = context
                        .iter()
                        .flat_map(|n| n.descendants())
                        .filter(|n| is_named(n, name))
                        .collect();
                }
                Step::Attribute(attr) => {
                    return context
                        .iter()
                        .find_map(|n| n.attribute(attr))
                        .map(Found::Attribute);
                }
                Step::DescendantAttribute(attr) => {
                    return context
                        .iter()
                        .flat_map(|n| n.descendants())
                        .find_map(|n| n.attribute(attr))
                        .map(Found::Attribute);
                }
            }

            if context.is_empty() {
                return None;
            }
        }

        context.first().copied().map(Found::Element)
    }

    /// Inner text at `path`, with empty text treated as missing
    pub fn text(&self, path: &str) -> Option<String> {
        self.find_first(path)
            .map(|found| found.inner_text())
            .filter(|text| !text.is_empty())
    }

    /// Inner text at `path`, or an empty string when the node is absent
    pub fn text_or_default(&self, path: &str) -> String {
        self.find_first(path)
            .map(|found| found.inner_text())
            .unwrap_or_default()
    }
}
