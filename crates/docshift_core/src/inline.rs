use crate::block::{Formatting, Run};
use crate::config::LinksConfig;
use crate::markup::{MarkupNode, Tag};

/// Flatten inline markup into formatted runs, in document order.
///
/// Formatting flags accumulate from `context` down through emphasis-family
/// elements. Unrecognized elements are transparent so their text survives.
pub fn accumulate(node: &MarkupNode, context: Formatting, links: &LinksConfig) -> Vec<Run> {
    let mut runs = Vec::new();
    accumulate_into(node, context, links, &mut runs);
    runs
}

/// Accumulate over a sequence of sibling nodes.
pub fn accumulate_all(
    nodes: &[MarkupNode],
    context: Formatting,
    links: &LinksConfig,
) -> Vec<Run> {
    let mut runs = Vec::new();
    for node in nodes {
        accumulate_into(node, context, links, &mut runs);
    }
    runs
}

fn accumulate_into(
    node: &MarkupNode,
    context: Formatting,
    links: &LinksConfig,
    runs: &mut Vec<Run>,
) {
    match node {
        MarkupNode::Text(text) => {
            // Whitespace-only text still separates adjacent words.
            if !text.is_empty() {
                runs.push(Run::text(text.as_str(), context));
            }
        }
        MarkupNode::Element { tag, children } => {
            let context = match tag {
                Tag::LineBreak => {
                    runs.push(Run::LineBreak);
                    return;
                }
                Tag::Strong => context.with_bold(),
                Tag::Emphasis => context.with_italic(),
                Tag::Underline => context.with_underline(),
                Tag::Strike => context.with_strike(),
                Tag::Code => context.with_code(),
                Tag::Link => context.with_link(links.color, links.underline),
                _ => context,
            };
            for child in children {
                accumulate_into(child, context, links, runs);
            }
        }
    }
}
