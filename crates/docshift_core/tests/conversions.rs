use std::io::{Cursor, Read};

use docshift_core::{
    parse, parse_html, Block, Config, ConvertOptions, Document, Formatting, ListKind, Rgb, Run,
};
use pretty_assertions::assert_eq;

fn levels(document: &Document) -> Vec<(usize, ListKind, String)> {
    document
        .blocks()
        .iter()
        .filter_map(|block| match block {
            Block::ListItem { runs, level, kind } => {
                let text: String = runs.iter().map(Run::as_str).collect();
                Some((*level, *kind, text.trim().to_string()))
            }
            _ => None,
        })
        .collect()
}

fn document_xml(docx: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

#[test]
fn blocks_follow_source_order() {
    let document = parse("# One\n\npara\n\n> quoted\n\n---\n\n## Two").unwrap();
    let kinds: Vec<&str> = document
        .blocks()
        .iter()
        .map(|block| match block {
            Block::Heading { .. } => "heading",
            Block::Paragraph { .. } => "paragraph",
            Block::Quote { .. } => "quote",
            Block::Rule { .. } => "rule",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["heading", "paragraph", "quote", "rule", "heading"]);
}

#[test]
fn nested_list_levels() {
    let document = parse("- a\n  - b\n- c").unwrap();
    assert_eq!(
        levels(&document),
        vec![
            (0, ListKind::Unordered, "a".to_string()),
            (1, ListKind::Unordered, "b".to_string()),
            (0, ListKind::Unordered, "c".to_string()),
        ]
    );
}

#[test]
fn ordered_inside_unordered() {
    let document = parse("- a\n  1. b\n  2. c").unwrap();
    assert_eq!(
        levels(&document),
        vec![
            (0, ListKind::Unordered, "a".to_string()),
            (1, ListKind::Ordered, "b".to_string()),
            (1, ListKind::Ordered, "c".to_string()),
        ]
    );
}

#[test]
fn code_block_lines_and_trailer() {
    let document = parse("```\na\n\nb\n```").unwrap();
    assert_eq!(
        document.blocks(),
        &[
            Block::CodeLine { text: "a".into() },
            Block::CodeLine { text: " ".into() },
            Block::CodeLine { text: "b".into() },
            Block::padding_paragraph(),
        ]
    );
}

#[test]
fn empty_source_yields_single_padding_paragraph() {
    let document = parse("").unwrap();
    assert_eq!(document.blocks(), &[Block::padding_paragraph()]);
}

#[test]
fn emphasis_accumulates_into_link() {
    let document = parse("**bold [*link*](https://x.y)**").unwrap();
    let expected = Formatting::default()
        .with_bold()
        .with_link(Rgb(0, 0, 255), true)
        .with_italic();
    assert_eq!(
        document.blocks()[0].runs(),
        &[Run::text("bold ", Formatting::default().with_bold()), Run::text("link", expected)]
    );
}

#[test]
fn unknown_element_falls_back_to_paragraph() {
    let nodes = parse_html("<figure><figcaption>caption <b>bold</b></figcaption></figure>").unwrap();
    let document = docshift_core::assemble(&nodes);
    assert_eq!(
        document.blocks(),
        &[Block::Paragraph {
            runs: vec![
                Run::plain("caption "),
                Run::text("bold", Formatting::default().with_bold()),
            ],
        }]
    );
}

#[test]
fn table_becomes_placeholder() {
    let document = parse("| a | b |\n|---|---|\n| 1 | 2 |").unwrap();
    assert_eq!(document.blocks(), &[Block::TablePlaceholder]);
}

#[test]
fn custom_config_reaches_docx() {
    let config: Config = toml::from_str(
        "[links]\ncolor = \"336699\"\nunderline = false\n\n[table]\nplaceholder = \"(table)\"\n",
    )
    .unwrap();
    let docx = docshift_core::markdown_to_docx_with_config(
        b"[site](https://example.com)\n\n| a |\n|---|\n| 1 |",
        &config,
    )
    .unwrap();
    let xml = document_xml(&docx);
    assert!(xml.contains(r#"<w:color w:val="336699"/>"#));
    assert!(!xml.contains(r#"<w:u w:val="single"/>"#));
    assert!(xml.contains("(table)"));
}

#[test]
fn txt_to_markdown_via_file_dispatch() {
    let converted = docshift_core::convert_file(
        "notes.txt",
        b"\xEF\xBB\xBFfirst\n\n\nsecond",
        "md",
        &ConvertOptions::default(),
        &Config::default(),
    )
    .unwrap();
    assert_eq!(converted.bytes, b"first\n\nsecond");
    assert_eq!(converted.mime_type, "text/markdown");
}

#[test]
fn blockquote_with_inline_markup_is_one_quote() {
    let nodes = parse_html("<blockquote>some <b>bold</b> text</blockquote>").unwrap();
    let document = docshift_core::assemble(&nodes);
    assert_eq!(
        document.blocks(),
        &[Block::Quote {
            runs: vec![
                Run::plain("some "),
                Run::text("bold", Formatting::default().with_bold()),
                Run::plain(" text"),
            ],
        }]
    );
}

#[test]
fn hostile_list_level_does_not_abort_extraction() {
    let docx = docshift_core::markdown_to_docx(b"- item").unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(docx.as_slice())).unwrap();
    let mut out = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for index in 0..archive.len() {
        let mut part = archive.by_index(index).unwrap();
        let name = part.name().to_string();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        if name == "word/document.xml" {
            xml = xml.replace(
                r#"<w:ilvl w:val="0"/>"#,
                r#"<w:ilvl w:val="18446744073709551615"/>"#,
            );
        }
        out.start_file(name, zip::write::SimpleFileOptions::default())
            .unwrap();
        std::io::Write::write_all(&mut out, xml.as_bytes()).unwrap();
    }
    let hostile = out.finish().unwrap().into_inner();

    let markdown = docshift_core::docx_to_markdown(&hostile).unwrap();
    assert_eq!(markdown.trim_start(), "- item\n");
}
