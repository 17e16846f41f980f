//! Markdown → markup tree.
//!
//! The markdown is rendered to HTML with pulldown-cmark, then parsed back as
//! an HTML document with html5ever so that raw HTML embedded in the markdown
//! ends up in the same tree as the rendered constructs.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use pulldown_cmark::{html, Options, Parser};
use tracing::debug;

use crate::error::ConversionFailure;
use crate::markup::{MarkupNode, Tag};

/// Strip YAML frontmatter from the beginning of markdown content
fn strip_frontmatter(markdown: &str) -> &str {
    if !markdown.starts_with("---") {
        return markdown;
    }
    // Find the closing ---
    if let Some(end) = markdown[3..].find("\n---") {
        // Skip past the closing --- and any trailing newline
        let after_frontmatter = &markdown[3 + end + 4..];
        after_frontmatter.trim_start_matches('\n')
    } else {
        markdown
    }
}

/// Render markdown to HTML.
pub fn markdown_to_html(markdown: &str) -> String {
    let markdown = strip_frontmatter(markdown);
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(markdown, options);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Parse an HTML document and return the children of its `<body>`.
pub fn parse_html(html: &str) -> Result<Vec<MarkupNode>, ConversionFailure> {
    let dom = parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| ConversionFailure::Render(e.to_string()))?;

    let nodes = match find_body(&dom.document) {
        Some(body) => convert_children(&body),
        None => Vec::new(),
    };
    Ok(nodes)
}

/// Render markdown into the top-level markup nodes of its HTML body.
pub fn render_markdown(markdown: &str) -> Result<Vec<MarkupNode>, ConversionFailure> {
    let html = markdown_to_html(markdown);
    let nodes = parse_html(&html)?;
    debug!(
        html_len = html.len(),
        nodes = nodes.len(),
        "rendered markdown to markup"
    );
    Ok(nodes)
}

fn find_body(handle: &Handle) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &handle.data {
        if &*name.local == "body" {
            return Some(handle.clone());
        }
    }
    handle.children.borrow().iter().find_map(find_body)
}

fn convert_children(handle: &Handle) -> Vec<MarkupNode> {
    handle
        .children
        .borrow()
        .iter()
        .filter_map(convert_node)
        .collect()
}

fn convert_node(handle: &Handle) -> Option<MarkupNode> {
    match &handle.data {
        NodeData::Text { contents } => Some(MarkupNode::Text(contents.borrow().to_string())),
        NodeData::Element { name, .. } => Some(MarkupNode::Element {
            tag: Tag::from_name(&name.local),
            children: convert_children(handle),
        }),
        // Comments, doctypes and processing instructions carry no content.
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn el(tag: Tag, children: Vec<MarkupNode>) -> MarkupNode {
        MarkupNode::element(tag, children)
    }

    fn elements(nodes: Vec<MarkupNode>) -> Vec<MarkupNode> {
        nodes
            .into_iter()
            .filter(|node| matches!(node, MarkupNode::Element { .. }))
            .collect()
    }

    #[test]
    fn strips_frontmatter() {
        assert_eq!(strip_frontmatter("---\ntitle: x\n---\n\n# Hi"), "# Hi");
        assert_eq!(strip_frontmatter("# Hi"), "# Hi");
        assert_eq!(strip_frontmatter("---\nunterminated"), "---\nunterminated");
    }

    #[test]
    fn renders_heading_and_emphasis() {
        let nodes = elements(render_markdown("# Title\n\nSome *text*.").unwrap());
        assert_eq!(
            nodes,
            vec![
                el(Tag::Heading(1), vec![MarkupNode::text("Title")]),
                el(
                    Tag::Paragraph,
                    vec![
                        MarkupNode::text("Some "),
                        el(Tag::Emphasis, vec![MarkupNode::text("text")]),
                        MarkupNode::text("."),
                    ]
                ),
            ]
        );
    }

    #[test]
    fn renders_code_block_inside_pre() {
        let nodes = elements(render_markdown("```\nlet x = 1;\n```").unwrap());
        assert_eq!(
            nodes,
            vec![el(
                Tag::Pre,
                vec![el(Tag::Code, vec![MarkupNode::text("let x = 1;\n")])]
            )]
        );
    }

    #[test]
    fn renders_strikethrough_as_strike() {
        let nodes = elements(render_markdown("~~gone~~").unwrap());
        assert_eq!(
            nodes,
            vec![el(
                Tag::Paragraph,
                vec![el(Tag::Strike, vec![MarkupNode::text("gone")])]
            )]
        );
    }

    #[test]
    fn raw_html_becomes_markup() {
        let nodes = elements(parse_html("<div><u>under</u><!-- note --></div>").unwrap());
        assert_eq!(
            nodes,
            vec![el(
                Tag::Container,
                vec![el(Tag::Underline, vec![MarkupNode::text("under")])]
            )]
        );
    }

    #[test]
    fn empty_markdown_has_no_nodes() {
        assert!(render_markdown("").unwrap().is_empty());
    }
}
