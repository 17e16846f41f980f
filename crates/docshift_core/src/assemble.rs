use tracing::debug;

use crate::block::{Block, Document};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::list::ListNesting;
use crate::markup::MarkupNode;

/// Assemble top-level markup nodes into a document using default config.
pub fn assemble(nodes: &[MarkupNode]) -> Document {
    assemble_with_config(nodes, &Config::compiled_default())
}

/// Assemble top-level markup nodes into a document.
///
/// The result always holds at least one block: an input that produces
/// nothing yields a single padding paragraph.
pub fn assemble_with_config(nodes: &[MarkupNode], config: &Config) -> Document {
    let dispatcher = Dispatcher::new(config);
    let mut blocks: Vec<Block> = Vec::new();

    for node in nodes {
        dispatcher.dispatch(node, ListNesting::top(), &mut blocks);
    }

    if blocks.is_empty() {
        debug!(nodes = nodes.len(), "markup produced no blocks, padding document");
    }
    debug!(blocks = blocks.len(), "assembled document");
    Document::new(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{ListKind, Run};
    use crate::markup::Tag;
    use pretty_assertions::assert_eq;

    fn el(tag: Tag, children: Vec<MarkupNode>) -> MarkupNode {
        MarkupNode::element(tag, children)
    }

    #[test]
    fn empty_tree_yields_single_padding_paragraph() {
        let doc = assemble(&[]);
        assert_eq!(doc.blocks(), &[Block::padding_paragraph()]);
    }

    #[test]
    fn whitespace_only_tree_is_padded() {
        let doc = assemble(&[MarkupNode::text("\n  \n")]);
        assert_eq!(doc.len(), 1);
        assert!(doc.blocks()[0].runs()[0].is_padding());
    }

    #[test]
    fn preserves_top_level_order() {
        let nodes = vec![
            el(Tag::Heading(1), vec![MarkupNode::text("Title")]),
            MarkupNode::text("\n"),
            el(Tag::Paragraph, vec![MarkupNode::text("Intro")]),
            MarkupNode::text("\n"),
            el(
                Tag::OrderedList,
                vec![
                    el(Tag::ListItem, vec![MarkupNode::text("one")]),
                    el(Tag::ListItem, vec![MarkupNode::text("two")]),
                ],
            ),
        ];
        let doc = assemble(&nodes);
        assert_eq!(
            doc.into_blocks(),
            vec![
                Block::Heading {
                    level: 1,
                    runs: vec![Run::plain("Title")],
                },
                Block::Paragraph {
                    runs: vec![Run::plain("Intro")],
                },
                Block::ListItem {
                    runs: vec![Run::plain("one")],
                    level: 0,
                    kind: ListKind::Ordered,
                },
                Block::ListItem {
                    runs: vec![Run::plain("two")],
                    level: 0,
                    kind: ListKind::Ordered,
                },
            ]
        );
    }

    #[test]
    fn top_level_lists_restart_at_level_zero() {
        let list = |kind_tag: Tag| {
            el(
                kind_tag,
                vec![el(
                    Tag::ListItem,
                    vec![
                        MarkupNode::text("a"),
                        el(
                            Tag::UnorderedList,
                            vec![el(Tag::ListItem, vec![MarkupNode::text("b")])],
                        ),
                    ],
                )],
            )
        };
        let doc = assemble(&[list(Tag::OrderedList), list(Tag::UnorderedList)]);
        let levels: Vec<usize> = doc
            .blocks()
            .iter()
            .filter_map(|block| match block {
                Block::ListItem { level, .. } => Some(*level),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![0, 1, 0, 1]);
    }

    #[test]
    fn link_color_comes_from_config() {
        let mut config = Config::default();
        config.links.color = crate::block::Rgb(0x12, 0x34, 0x56);
        let nodes = vec![el(
            Tag::Paragraph,
            vec![el(Tag::Link, vec![MarkupNode::text("site")])],
        )];
        let doc = assemble_with_config(&nodes, &config);
        let Run::Text { formatting, .. } = &doc.blocks()[0].runs()[0] else {
            panic!("expected text run");
        };
        assert_eq!(formatting.color, Some(config.links.color));
    }
}
