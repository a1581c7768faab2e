// Document model for the authoring core.
// Blocks carry an alignment, runs carry text with a uniform style set;
// markup is only a storage/display format produced from this tree.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{EditResult, EditorError};

/// A boolean inline style attachable to a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mark {
    Bold,
    Italic,
    Underline,
}

/// The set of marks carried by a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StyleSet {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl StyleSet {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn bold() -> Self {
        StyleSet {
            bold: true,
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        StyleSet {
            italic: true,
            ..Default::default()
        }
    }

    pub fn underline() -> Self {
        StyleSet {
            underline: true,
            ..Default::default()
        }
    }

    pub fn contains(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Underline => self.underline,
        }
    }

    pub fn set(&mut self, mark: Mark, on: bool) {
        match mark {
            Mark::Bold => self.bold = on,
            Mark::Italic => self.italic = on,
            Mark::Underline => self.underline = on,
        }
    }

    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.underline
    }
}

/// Block-level text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A run of styled text (a contiguous piece of text with uniform styling)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextRun {
    pub text: String,
    pub style: StyleSet,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: StyleSet) -> Self {
        TextRun {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, StyleSet::plain())
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split this run at the given byte offset, preserving the style on
    /// both halves. Returns (left_run, right_run).
    pub fn split_at(&self, offset: usize) -> (TextRun, TextRun) {
        let (left, right) = self.text.split_at(offset);
        (
            TextRun::new(left, self.style),
            TextRun::new(right, self.style),
        )
    }
}

/// One paragraph/line unit carrying an alignment attribute
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Block {
    pub alignment: Alignment,
    pub runs: Vec<TextRun>,
}

impl Block {
    /// An empty block: default alignment, single empty placeholder run
    pub fn empty() -> Self {
        Block {
            alignment: Alignment::default(),
            runs: vec![TextRun::plain("")],
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Block {
            alignment: Alignment::default(),
            runs: vec![TextRun::plain(text)],
        }
    }

    pub fn with_run(mut self, text: impl Into<String>, style: StyleSet) -> Self {
        self.runs.push(TextRun::new(text, style));
        self.normalize();
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Total byte length of this block's concatenated text
    pub fn text_len(&self) -> usize {
        self.runs.iter().map(|r| r.len()).sum()
    }

    pub fn to_plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.is_empty())
    }

    /// True when `offset` lies within the block's text on a char boundary
    pub fn is_valid_offset(&self, offset: usize) -> bool {
        let mut pos = 0;
        for run in &self.runs {
            if offset <= pos + run.len() {
                return run.text.is_char_boundary(offset - pos);
            }
            pos += run.len();
        }
        false
    }

    /// Find the run containing the given block offset.
    /// Returns (run index, offset within that run); an offset on a run
    /// boundary belongs to the run ending there, so an insertion at the
    /// boundary extends that run's style.
    pub fn run_at_offset(&self, offset: usize) -> (usize, usize) {
        let mut pos = 0;
        for (idx, run) in self.runs.iter().enumerate() {
            if pos + run.len() >= offset {
                return (idx, offset - pos);
            }
            pos += run.len();
        }
        (self.runs.len(), 0)
    }

    /// Split the run list at a flattened byte offset.
    /// Returns (left, right); the boundary always falls between runs.
    pub fn split_runs_at(&self, offset: usize) -> (Vec<TextRun>, Vec<TextRun>) {
        split_runs(&self.runs, offset)
    }

    /// Restore the run invariant: no empty runs alongside text, no two
    /// adjacent runs with equal style sets, and a single plain placeholder
    /// run when the block has no text at all.
    pub fn normalize(&mut self) {
        let mut merged: Vec<TextRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.style == run.style => last.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        if merged.is_empty() {
            merged.push(TextRun::plain(""));
        }
        self.runs = merged;
    }
}

/// Split a run sequence at a flattened byte offset, cutting the run the
/// offset falls inside. Both halves of a cut run keep its style.
fn split_runs(runs: &[TextRun], offset: usize) -> (Vec<TextRun>, Vec<TextRun>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut pos = 0;

    for run in runs {
        let len = run.len();
        if pos + len <= offset {
            left.push(run.clone());
        } else if pos >= offset {
            right.push(run.clone());
        } else {
            let (l, r) = run.split_at(offset - pos);
            left.push(l);
            right.push(r);
        }
        pos += len;
    }

    (left, right)
}

/// A logical cursor position: block index plus byte offset into the
/// block's concatenated text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub block: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(block: usize, offset: usize) -> Self {
        Position { block, offset }
    }

    pub fn start() -> Self {
        Position::new(0, 0)
    }
}

/// An anchor/focus position pair identifying a range within the document.
/// The anchor is where the selection began, the focus where it currently
/// ends; either may come first in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Selection { anchor, focus }
    }

    /// A collapsed selection (caret) at the given position
    pub fn caret(position: Position) -> Self {
        Selection {
            anchor: position,
            focus: position,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Anchor and focus reordered into document order: (start, end)
    pub fn normalized(&self) -> (Position, Position) {
        let a = (self.anchor.block, self.anchor.offset);
        let b = (self.focus.block, self.focus.offset);
        if b < a {
            (self.focus, self.anchor)
        } else {
            (self.anchor, self.focus)
        }
    }
}

/// The document: an ordered, never-empty sequence of blocks
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// A new document holds a single empty block
    pub fn new() -> Self {
        Document {
            blocks: vec![Block::empty()],
        }
    }

    /// Build a document from blocks, normalizing each and restoring the
    /// never-empty invariant
    pub fn from_blocks(mut blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            blocks.push(Block::empty());
        }
        for block in &mut blocks {
            block.normalize();
        }
        Document { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn to_plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.to_plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check a position against the document: the block index must exist and
    /// the offset must be in bounds on a char boundary. Out-of-range input is
    /// a caller contract violation, not something to silently clamp.
    pub fn validate_position(&self, pos: Position) -> EditResult<()> {
        let Some(block) = self.blocks.get(pos.block) else {
            return Err(EditorError::invalid_selection(format!(
                "block index {} out of bounds ({} blocks)",
                pos.block,
                self.blocks.len()
            )));
        };
        if !block.is_valid_offset(pos.offset) {
            return Err(EditorError::invalid_selection(format!(
                "offset {} invalid in block {} (length {})",
                pos.offset,
                pos.block,
                block.text_len()
            )));
        }
        Ok(())
    }

    pub fn validate_selection(&self, selection: Selection) -> EditResult<()> {
        self.validate_position(selection.anchor)?;
        self.validate_position(selection.focus)
    }

    /// Delete `[start, end)`. A cross-block range merges the end block's tail
    /// into the start block and drops the fully covered blocks in between.
    /// Positions must be validated and in document order.
    pub fn delete_range(&mut self, start: Position, end: Position) {
        if start == end {
            return;
        }

        if start.block == end.block {
            let block = &mut self.blocks[start.block];
            let (mut kept, covered) = block.split_runs_at(start.offset);
            let (_, tail) = split_runs(&covered, end.offset - start.offset);
            kept.extend(tail);
            block.runs = kept;
            block.normalize();
            return;
        }

        let (_, tail) = self.blocks[end.block].split_runs_at(end.offset);
        let (head, _) = self.blocks[start.block].split_runs_at(start.offset);
        let block = &mut self.blocks[start.block];
        block.runs = head;
        block.runs.extend(tail);
        block.normalize();
        self.blocks.drain(start.block + 1..=end.block);
    }

    /// Split the block at `pos` in two; the new block keeps the alignment of
    /// the one it was split from.
    pub fn split_block_at(&mut self, pos: Position) {
        let block = &mut self.blocks[pos.block];
        let (left, right) = block.split_runs_at(pos.offset);
        let alignment = block.alignment;
        block.runs = left;
        block.normalize();
        let mut new_block = Block {
            alignment,
            runs: right,
        };
        new_block.normalize();
        self.blocks.insert(pos.block + 1, new_block);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Document ({} blocks):", self.blocks.len())?;
        for (i, block) in self.blocks.iter().enumerate() {
            writeln!(
                f,
                "  [{}] {} ({} runs): {:?}",
                i,
                block.alignment,
                block.runs.len(),
                block.to_plain_text()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_split() {
        let run = TextRun::new("hello world", StyleSet::bold());
        let (left, right) = run.split_at(5);
        assert_eq!(left.text, "hello");
        assert_eq!(right.text, " world");
        assert!(left.style.bold && right.style.bold);
    }

    #[test]
    fn test_block_text_len() {
        let block = Block::plain("hello").with_run(" world", StyleSet::bold());
        assert_eq!(block.text_len(), 11);
        assert_eq!(block.to_plain_text(), "hello world");
    }

    #[test]
    fn test_normalize_merges_adjacent_equal_styles() {
        let mut block = Block {
            alignment: Alignment::Left,
            runs: vec![
                TextRun::plain("Hel"),
                TextRun::plain("lo "),
                TextRun::new("world", StyleSet::bold()),
                TextRun::plain(""),
            ],
        };
        block.normalize();
        assert_eq!(block.runs.len(), 2);
        assert_eq!(block.runs[0].text, "Hello ");
        assert_eq!(block.runs[1].text, "world");
    }

    #[test]
    fn test_normalize_keeps_placeholder_run() {
        let mut block = Block {
            alignment: Alignment::Center,
            runs: vec![TextRun::new("", StyleSet::bold())],
        };
        block.normalize();
        assert_eq!(block.runs, vec![TextRun::plain("")]);
    }

    #[test]
    fn test_split_runs_on_boundary() {
        let block = Block::plain("ab").with_run("cd", StyleSet::italic());
        let (left, right) = block.split_runs_at(2);
        assert_eq!(left, vec![TextRun::plain("ab")]);
        assert_eq!(right, vec![TextRun::new("cd", StyleSet::italic())]);
    }

    #[test]
    fn test_validate_position_rejects_out_of_bounds() {
        let doc = Document::new();
        assert!(doc.validate_position(Position::new(1, 0)).is_err());
        assert!(doc.validate_position(Position::new(0, 1)).is_err());
        assert!(doc.validate_position(Position::new(0, 0)).is_ok());
    }

    #[test]
    fn test_validate_position_rejects_mid_char_offset() {
        let doc = Document::from_blocks(vec![Block::plain("héllo")]);
        // 'é' occupies bytes 1..3
        assert!(doc.validate_position(Position::new(0, 2)).is_err());
        assert!(doc.validate_position(Position::new(0, 3)).is_ok());
    }

    #[test]
    fn test_selection_normalized() {
        let sel = Selection::new(Position::new(1, 2), Position::new(0, 4));
        let (start, end) = sel.normalized();
        assert_eq!(start, Position::new(0, 4));
        assert_eq!(end, Position::new(1, 2));
    }

    #[test]
    fn test_delete_range_within_block() {
        let mut doc = Document::from_blocks(vec![Block::plain("Hello world")]);
        doc.delete_range(Position::new(0, 5), Position::new(0, 11));
        assert_eq!(doc.blocks()[0].to_plain_text(), "Hello");
    }

    #[test]
    fn test_delete_range_across_blocks_merges() {
        let mut doc = Document::from_blocks(vec![
            Block::plain("First para"),
            Block::plain("Second"),
            Block::plain("Third para"),
        ]);
        doc.delete_range(Position::new(0, 3), Position::new(2, 2));
        assert_eq!(doc.block_count(), 1);
        assert_eq!(doc.blocks()[0].to_plain_text(), "Firird para");
    }

    #[test]
    fn test_delete_range_remerges_runs_across_seam() {
        let mut doc = Document::from_blocks(vec![
            Block::plain("aa").with_run("bb", StyleSet::bold()),
            Block {
                alignment: Alignment::Left,
                runs: vec![TextRun::new("cc", StyleSet::bold()), TextRun::plain("dd")],
            },
        ]);
        // removes "bb" tail and "cc" head, leaving "aa" + "dd" with equal styles
        doc.delete_range(Position::new(0, 2), Position::new(1, 2));
        assert_eq!(doc.block_count(), 1);
        assert_eq!(doc.blocks()[0].runs, vec![TextRun::plain("aadd")]);
    }

    #[test]
    fn test_split_block_keeps_alignment() {
        let mut doc =
            Document::from_blocks(vec![
                Block::plain("Hello world").with_alignment(Alignment::Center)
            ]);
        doc.split_block_at(Position::new(0, 5));
        assert_eq!(doc.block_count(), 2);
        assert_eq!(doc.blocks()[0].to_plain_text(), "Hello");
        assert_eq!(doc.blocks()[1].to_plain_text(), " world");
        assert_eq!(doc.blocks()[1].alignment, Alignment::Center);
    }
}
