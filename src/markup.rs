// Markup serializer and parser.
// The wire form is line-oriented tagged text: blocks separated by `<br>`,
// inline marks as `<b>`/`<i>`/`<u>` nested in canonical order (bold
// outermost, then italic, then underline), and non-default alignment as a
// `<div align="...">` container wrapping the whole line. Serialization is
// deterministic; parsing restores the canonical merged document form.

use logos::Logos;
use tracing::trace;

use crate::document::{Alignment, Block, Document, StyleSet, TextRun};
use crate::error::{EditResult, EditorError};

/// Render the document as markup. A new empty document yields the empty
/// string; the final block carries no trailing break marker.
pub fn serialize(document: &Document) -> String {
    let mut out = String::new();

    for (i, block) in document.blocks().iter().enumerate() {
        if i > 0 {
            out.push_str("<br>");
        }
        if block.alignment == Alignment::Left {
            serialize_runs(block, &mut out);
        } else {
            out.push_str("<div align=\"");
            out.push_str(block.alignment.as_str());
            out.push_str("\">");
            serialize_runs(block, &mut out);
            out.push_str("</div>");
        }
    }

    out
}

fn serialize_runs(block: &Block, out: &mut String) {
    for run in &block.runs {
        if run.is_empty() {
            continue;
        }
        // wrap innermost-first so bold ends up outermost
        let mut piece = escape(&run.text);
        if run.style.underline {
            piece = format!("<u>{piece}</u>");
        }
        if run.style.italic {
            piece = format!("<i>{piece}</i>");
        }
        if run.style.bold {
            piece = format!("<b>{piece}</b>");
        }
        out.push_str(&piece);
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        if let Some(r) = rest.strip_prefix("&amp;") {
            out.push('&');
            rest = r;
        } else if let Some(r) = rest.strip_prefix("&lt;") {
            out.push('<');
            rest = r;
        } else if let Some(r) = rest.strip_prefix("&gt;") {
            out.push('>');
            rest = r;
        } else {
            // not an entity we emit; keep the ampersand literal
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

#[derive(Logos, Debug, Clone, PartialEq)]
enum Token<'src> {
    #[token("<b>")]
    BoldOpen,
    #[token("</b>")]
    BoldClose,
    #[token("<i>")]
    ItalicOpen,
    #[token("</i>")]
    ItalicClose,
    #[token("<u>")]
    UnderlineOpen,
    #[token("</u>")]
    UnderlineClose,
    #[token("<br>")]
    Break,
    #[regex(r#"<div align="[a-z]+">"#, |lex| {
        let s = lex.slice();
        &s[12..s.len() - 2]
    })]
    DivOpen(&'src str),
    #[token("</div>")]
    DivClose,
    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Parse markup back into a document.
///
/// Only the fixed tag vocabulary is accepted; anything else fails with
/// `MalformedMarkup` and no partially built document escapes. Parsing the
/// empty string yields the single-empty-block document.
pub fn parse(markup: &str) -> EditResult<Document> {
    let mut blocks = Vec::new();
    let mut line = LineBuilder::default();

    for (token, span) in Token::lexer(markup).spanned() {
        let token = token.map_err(|()| {
            EditorError::malformed_markup(span.start, "unrecognized tag or character")
        })?;
        match token {
            Token::Text(text) => line.push_text(&unescape(text), span.start)?,
            Token::BoldOpen => line.open(StyleFlag::Bold, span.start)?,
            Token::BoldClose => line.close(StyleFlag::Bold, span.start)?,
            Token::ItalicOpen => line.open(StyleFlag::Italic, span.start)?,
            Token::ItalicClose => line.close(StyleFlag::Italic, span.start)?,
            Token::UnderlineOpen => line.open(StyleFlag::Underline, span.start)?,
            Token::UnderlineClose => line.close(StyleFlag::Underline, span.start)?,
            Token::DivOpen(value) => line.open_container(value, span.start)?,
            Token::DivClose => line.close_container(span.start)?,
            Token::Break => blocks.push(std::mem::take(&mut line).finish(span.start)?),
        }
    }
    blocks.push(line.finish(markup.len())?);

    trace!(blocks = blocks.len(), "parsed markup");
    Ok(Document::from_blocks(blocks))
}

#[derive(Debug, Clone, Copy)]
enum StyleFlag {
    Bold,
    Italic,
    Underline,
}

impl StyleFlag {
    fn name(self) -> &'static str {
        match self {
            StyleFlag::Bold => "b",
            StyleFlag::Italic => "i",
            StyleFlag::Underline => "u",
        }
    }
}

#[derive(Debug, Default)]
enum ContainerState {
    #[default]
    None,
    Open,
    Closed,
}

/// Accumulates one line (block) of parsed markup. Style tags are tracked
/// as nesting depths, so a redundant re-open is harmless; the document
/// form is canonicalized on finish.
#[derive(Debug, Default)]
struct LineBuilder {
    alignment: Alignment,
    runs: Vec<TextRun>,
    bold: usize,
    italic: usize,
    underline: usize,
    container: ContainerState,
    started: bool,
}

impl LineBuilder {
    fn style(&self) -> StyleSet {
        StyleSet {
            bold: self.bold > 0,
            italic: self.italic > 0,
            underline: self.underline > 0,
        }
    }

    fn check_open_for_content(&self, offset: usize) -> EditResult<()> {
        if matches!(self.container, ContainerState::Closed) {
            return Err(EditorError::malformed_markup(
                offset,
                "content after closed alignment container",
            ));
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str, offset: usize) -> EditResult<()> {
        self.check_open_for_content(offset)?;
        self.started = true;
        self.runs.push(TextRun::new(text, self.style()));
        Ok(())
    }

    fn open(&mut self, flag: StyleFlag, offset: usize) -> EditResult<()> {
        self.check_open_for_content(offset)?;
        self.started = true;
        match flag {
            StyleFlag::Bold => self.bold += 1,
            StyleFlag::Italic => self.italic += 1,
            StyleFlag::Underline => self.underline += 1,
        }
        Ok(())
    }

    fn close(&mut self, flag: StyleFlag, offset: usize) -> EditResult<()> {
        self.check_open_for_content(offset)?;
        let depth = match flag {
            StyleFlag::Bold => &mut self.bold,
            StyleFlag::Italic => &mut self.italic,
            StyleFlag::Underline => &mut self.underline,
        };
        if *depth == 0 {
            return Err(EditorError::malformed_markup(
                offset,
                format!("closing </{}> without opener", flag.name()),
            ));
        }
        *depth -= 1;
        Ok(())
    }

    fn open_container(&mut self, value: &str, offset: usize) -> EditResult<()> {
        if self.started || !matches!(self.container, ContainerState::None) {
            return Err(EditorError::malformed_markup(
                offset,
                "alignment container must wrap a whole line",
            ));
        }
        self.alignment = parse_alignment(value).ok_or_else(|| {
            EditorError::malformed_markup(offset, format!("unknown alignment {value:?}"))
        })?;
        self.container = ContainerState::Open;
        self.started = true;
        Ok(())
    }

    fn close_container(&mut self, offset: usize) -> EditResult<()> {
        if !matches!(self.container, ContainerState::Open) {
            return Err(EditorError::malformed_markup(
                offset,
                "closing </div> without opener",
            ));
        }
        if self.bold + self.italic + self.underline > 0 {
            return Err(EditorError::malformed_markup(
                offset,
                "style tag crosses alignment container boundary",
            ));
        }
        self.container = ContainerState::Closed;
        Ok(())
    }

    fn finish(self, offset: usize) -> EditResult<Block> {
        if self.bold + self.italic + self.underline > 0 {
            return Err(EditorError::malformed_markup(offset, "unclosed style tag"));
        }
        if matches!(self.container, ContainerState::Open) {
            return Err(EditorError::malformed_markup(
                offset,
                "unclosed alignment container",
            ));
        }
        Ok(Block {
            alignment: self.alignment,
            runs: self.runs,
        })
    }
}

fn parse_alignment(value: &str) -> Option<Alignment> {
    match value {
        "left" => Some(Alignment::Left),
        "center" => Some(Alignment::Center),
        "right" => Some(Alignment::Right),
        "justify" => Some(Alignment::Justify),
        _ => None,
    }
}
