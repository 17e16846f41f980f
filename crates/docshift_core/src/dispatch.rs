use tracing::trace;

use crate::block::{padded, Block, Formatting, ListKind, Run};
use crate::config::Config;
use crate::inline::{accumulate, accumulate_all};
use crate::list::ListNesting;
use crate::markup::{MarkupNode, Tag};

/// Turns markup elements into document blocks.
///
/// Never fails: unrecognized elements fall back to a paragraph of their
/// inline text, or contribute nothing.
pub struct Dispatcher<'c> {
    config: &'c Config,
}

impl<'c> Dispatcher<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    /// Dispatch a single node outside of any list and collect its blocks.
    pub fn blocks_for(&self, node: &MarkupNode) -> Vec<Block> {
        let mut blocks = Vec::new();
        self.dispatch(node, ListNesting::top(), &mut blocks);
        blocks
    }

    /// Append the blocks produced by `node` to `blocks`.
    pub fn dispatch(&self, node: &MarkupNode, nesting: ListNesting, blocks: &mut Vec<Block>) {
        let (tag, children) = match node {
            MarkupNode::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    blocks.push(Block::Paragraph {
                        runs: vec![Run::plain(text)],
                    });
                }
                return;
            }
            MarkupNode::Element { tag, children } => (tag, children),
        };

        match tag {
            Tag::Heading(level) => blocks.push(Block::Heading {
                level: *level,
                runs: padded(self.inline(children)),
            }),
            Tag::Paragraph => blocks.push(Block::paragraph(self.inline(children))),
            Tag::Pre => self.code_block(node, blocks),
            Tag::Blockquote => self.blockquote(children, blocks),
            Tag::UnorderedList => self.list(children, nesting.enter(ListKind::Unordered), blocks),
            Tag::OrderedList => self.list(children, nesting.enter(ListKind::Ordered), blocks),
            Tag::Rule => blocks.push(Block::Rule {
                separator: Run::plain(self.config.rule_separator()),
            }),
            Tag::Container => {
                for child in children {
                    self.dispatch(child, nesting, blocks);
                }
            }
            Tag::Table => blocks.push(Block::TablePlaceholder),
            _ => {
                let runs = self.inline(children);
                if runs.is_empty() {
                    trace!(?tag, "element produced no inline content, skipping");
                } else {
                    trace!(?tag, "unrecognized block element, emitting paragraph");
                    blocks.push(Block::Paragraph { runs });
                }
            }
        }
    }

    fn inline(&self, nodes: &[MarkupNode]) -> Vec<Run> {
        accumulate_all(nodes, Formatting::default(), &self.config.links)
    }

    fn code_block(&self, pre: &MarkupNode, blocks: &mut Vec<Block>) {
        let source = pre.find_descendant(&Tag::Code).unwrap_or(pre);
        let text = source.text_content();

        let before = blocks.len();
        blocks.extend(text.lines().map(Block::code_line));
        if blocks.len() == before {
            blocks.push(Block::code_line(""));
        }

        // Separates the code from whatever follows.
        blocks.push(Block::padding_paragraph());
    }

    fn blockquote(&self, children: &[MarkupNode], blocks: &mut Vec<Block>) {
        let mut inline_start: Option<usize> = None;
        for (index, child) in children.iter().enumerate() {
            match child {
                MarkupNode::Text(_) => {
                    inline_start.get_or_insert(index);
                }
                MarkupNode::Element { tag, .. } if tag.is_inline() => {
                    inline_start.get_or_insert(index);
                }
                MarkupNode::Element { children: inner, .. } => {
                    if let Some(start) = inline_start.take() {
                        self.quote_inline(&children[start..index], blocks);
                    }
                    let runs = self.inline(inner);
                    if !runs.is_empty() {
                        blocks.push(Block::Quote { runs });
                    }
                }
            }
        }
        if let Some(start) = inline_start {
            self.quote_inline(&children[start..], blocks);
        }
    }

    /// One quote for a stretch of bare text and inline elements.
    fn quote_inline(&self, nodes: &[MarkupNode], blocks: &mut Vec<Block>) {
        let mut runs = self.inline(nodes);
        for run in runs.iter_mut() {
            let Run::Text { text, .. } = run else { break };
            *text = text.trim_start().to_string();
            if !text.is_empty() {
                break;
            }
        }
        for run in runs.iter_mut().rev() {
            let Run::Text { text, .. } = run else { break };
            *text = text.trim_end().to_string();
            if !text.is_empty() {
                break;
            }
        }
        runs.retain(|run| !matches!(run, Run::Text { text, .. } if text.is_empty()));
        if runs.iter().any(|run| !run.as_str().trim().is_empty()) {
            blocks.push(Block::Quote { runs });
        }
    }

    /// Items of a list whose nesting has already been entered.
    fn list(&self, children: &[MarkupNode], nesting: ListNesting, blocks: &mut Vec<Block>) {
        let (Some(level), Some(kind)) = (nesting.level(), nesting.kind()) else {
            return;
        };

        for child in children {
            match child.tag() {
                Some(Tag::ListItem) => {
                    let (sublists, content): (Vec<&MarkupNode>, Vec<&MarkupNode>) = child
                        .children()
                        .iter()
                        .partition(|node| node.tag().is_some_and(Tag::is_list));

                    let runs = content
                        .into_iter()
                        .flat_map(|node| {
                            accumulate(node, Formatting::default(), &self.config.links)
                        })
                        .collect();
                    blocks.push(Block::ListItem {
                        runs: padded(runs),
                        level,
                        kind,
                    });

                    for sublist in sublists {
                        self.dispatch(sublist, nesting, blocks);
                    }
                }
                Some(tag) if tag.is_list() => self.dispatch(child, nesting, blocks),
                _ => {}
            }
        }
    }
}
