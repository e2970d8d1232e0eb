use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Parser, TagEnd};
use regex::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static EXTRA_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

enum BlockEnd {
    Line,
    Paragraph,
}

fn block_end(tag: &TagEnd) -> Option<BlockEnd> {
    match tag {
        TagEnd::Item | TagEnd::TableRow | TagEnd::TableHead => Some(BlockEnd::Line),
        TagEnd::Paragraph
        | TagEnd::Heading(..)
        | TagEnd::CodeBlock
        | TagEnd::BlockQuote(..)
        | TagEnd::HtmlBlock
        | TagEnd::List(..)
        | TagEnd::Table => Some(BlockEnd::Paragraph),
        _ => None,
    }
}

/// Renders Markdown as plain text. Markup and HTML tags are dropped but the
/// text inside them is kept; paragraphs stay separated by a blank line.
pub fn to_plain_text(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());
    for event in Parser::new(markdown) {
        match event {
            Event::Text(s) | Event::Code(s) => text.push_str(&s),
            Event::Html(s) | Event::InlineHtml(s) => text.push_str(&HTML_TAG.replace_all(&s, "")),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(tag) => match block_end(&tag) {
                Some(BlockEnd::Line) if !text.ends_with('\n') => text.push('\n'),
                Some(BlockEnd::Paragraph) => {
                    if !text.ends_with('\n') {
                        text.push('\n');
                    }
                    text.push('\n');
                }
                _ => {}
            },
            _ => {}
        }
    }
    EXTRA_BLANK_LINES
        .replace_all(text.trim(), "\n\n")
        .into_owned()
}
