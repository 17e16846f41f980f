//! The tagged markup tree consumed by the conversion engine.

/// Tag identity of a markup element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Heading(u8),
    Paragraph,
    UnorderedList,
    OrderedList,
    ListItem,
    Blockquote,
    /// Preformatted code block.
    Pre,
    Strong,
    Emphasis,
    Underline,
    Strike,
    Code,
    Link,
    LineBreak,
    Rule,
    /// div, section, article, main
    Container,
    Table,
    Other(String),
}

impl Tag {
    /// Map an HTML element name (case-insensitive) to a tag.
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "h1" => Tag::Heading(1),
            "h2" => Tag::Heading(2),
            "h3" => Tag::Heading(3),
            "h4" => Tag::Heading(4),
            "h5" => Tag::Heading(5),
            "h6" => Tag::Heading(6),
            "p" => Tag::Paragraph,
            "ul" => Tag::UnorderedList,
            "ol" => Tag::OrderedList,
            "li" => Tag::ListItem,
            "blockquote" => Tag::Blockquote,
            "pre" => Tag::Pre,
            "strong" | "b" => Tag::Strong,
            "em" | "i" => Tag::Emphasis,
            "u" => Tag::Underline,
            "del" | "s" | "strike" => Tag::Strike,
            "code" => Tag::Code,
            "a" => Tag::Link,
            "br" => Tag::LineBreak,
            "hr" => Tag::Rule,
            "div" | "section" | "article" | "main" => Tag::Container,
            "table" => Tag::Table,
            _ => Tag::Other(name),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Tag::UnorderedList | Tag::OrderedList)
    }

    /// Phrasing content that flows inside a block rather than forming one.
    pub fn is_inline(&self) -> bool {
        match self {
            Tag::Strong
            | Tag::Emphasis
            | Tag::Underline
            | Tag::Strike
            | Tag::Code
            | Tag::Link
            | Tag::LineBreak => true,
            Tag::Other(name) => matches!(
                name.as_str(),
                "span"
                    | "sup"
                    | "sub"
                    | "mark"
                    | "small"
                    | "abbr"
                    | "kbd"
                    | "samp"
                    | "var"
                    | "cite"
                    | "q"
                    | "ins"
                    | "img"
                    | "time"
                    | "label"
            ),
            _ => false,
        }
    }
}

/// A node of the markup tree: literal text or an element with children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Text(String),
    Element { tag: Tag, children: Vec<MarkupNode> },
}

impl MarkupNode {
    pub fn text(text: impl Into<String>) -> Self {
        MarkupNode::Text(text.into())
    }

    pub fn element(tag: Tag, children: Vec<MarkupNode>) -> Self {
        MarkupNode::Element { tag, children }
    }

    pub fn tag(&self) -> Option<&Tag> {
        match self {
            MarkupNode::Element { tag, .. } => Some(tag),
            MarkupNode::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[MarkupNode] {
        match self {
            MarkupNode::Element { children, .. } => children,
            MarkupNode::Text(_) => &[],
        }
    }

    /// Concatenated text of this node and all its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            MarkupNode::Text(text) => out.push_str(text),
            MarkupNode::Element { children, .. } => {
                for child in children {
                    child.push_text(out);
                }
            }
        }
    }

    /// First descendant element (depth-first, document order) with `tag`.
    pub fn find_descendant(&self, tag: &Tag) -> Option<&MarkupNode> {
        self.children().iter().find_map(|child| {
            if child.tag() == Some(tag) {
                Some(child)
            } else {
                child.find_descendant(tag)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("H3", Tag::Heading(3))]
    #[case("b", Tag::Strong)]
    #[case("i", Tag::Emphasis)]
    #[case("strike", Tag::Strike)]
    #[case("section", Tag::Container)]
    #[case("figure", Tag::Other("figure".into()))]
    fn maps_html_names(#[case] name: &str, #[case] expected: Tag) {
        assert_eq!(Tag::from_name(name), expected);
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let node = MarkupNode::element(
            Tag::Pre,
            vec![MarkupNode::element(
                Tag::Code,
                vec![MarkupNode::text("a\n"), MarkupNode::text("b")],
            )],
        );
        assert_eq!(node.text_content(), "a\nb");
        let code = node.find_descendant(&Tag::Code).map(MarkupNode::text_content);
        assert_eq!(code.as_deref(), Some("a\nb"));
    }
}
