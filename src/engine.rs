// Formatting engine: toggle operations on a resolved span, block alignment,
// and the editing primitives the host wires to typing, Enter and Backspace.
// Every operation takes the explicitly owned document plus a caller-supplied
// selection; nothing here caches selection state across actions.

use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::document::{Alignment, Block, Document, Mark, Position, Selection, TextRun};
use crate::error::EditResult;
use crate::resolver::{SpanSegment, resolve};

/// Toggle an inline mark on the selected span.
///
/// The span counts as "already marked" only when every covered run carries
/// the mark; a mixed selection therefore toggles to all-marked first.
/// A collapsed selection is a silent no-op. Returns whether the document
/// changed.
pub fn toggle_mark(document: &mut Document, selection: Selection, mark: Mark) -> EditResult<bool> {
    let Some(span) = resolve(document, selection)? else {
        return Ok(false);
    };
    if span.is_empty() {
        return Ok(false);
    }

    let marked = span
        .segments
        .iter()
        .all(|seg| document.blocks()[seg.block].runs[seg.run].style.contains(mark));
    let enable = !marked;

    for block_index in span.blocks() {
        let segments: Vec<&SpanSegment> = span
            .segments
            .iter()
            .filter(|seg| seg.block == block_index)
            .collect();
        apply_mark_in_block(
            &mut document.blocks_mut()[block_index],
            &segments,
            mark,
            enable,
        );
    }

    debug!(?mark, enable, "toggled inline mark");
    Ok(true)
}

/// Rebuild one block's run sequence with the covered sub-ranges split out
/// and the mark applied, then merge adjacent equal-style runs back together.
/// The new sequence replaces the old one in a single assignment, so the
/// block is never observable half-updated.
fn apply_mark_in_block(block: &mut Block, segments: &[&SpanSegment], mark: Mark, enable: bool) {
    let mut runs = Vec::with_capacity(block.runs.len() + 2);

    for (run_index, run) in block.runs.iter().enumerate() {
        match segments.iter().find(|seg| seg.run == run_index) {
            None => runs.push(run.clone()),
            Some(seg) => {
                let (left, rest) = run.split_at(seg.range.start);
                let (mut covered, right) = rest.split_at(seg.range.end - seg.range.start);
                covered.style.set(mark, enable);
                for piece in [left, covered, right] {
                    if !piece.is_empty() {
                        runs.push(piece);
                    }
                }
            }
        }
    }

    block.runs = runs;
    block.normalize();
}

/// Set the alignment of every block the selection touches, including
/// partially covered ones. A collapsed selection still aligns its
/// containing block, so this queries block containment directly instead of
/// going through the span resolver. Returns whether anything changed.
pub fn set_alignment(
    document: &mut Document,
    selection: Selection,
    alignment: Alignment,
) -> EditResult<bool> {
    document.validate_selection(selection)?;
    let (start, end) = selection.normalized();

    let mut changed = false;
    for block in &mut document.blocks_mut()[start.block..=end.block] {
        if block.alignment != alignment {
            block.alignment = alignment;
            changed = true;
        }
    }

    if changed {
        debug!(%alignment, from = start.block, to = end.block, "set block alignment");
    }
    Ok(changed)
}

/// Insert text at the selection, replacing it first when non-collapsed.
/// Text landing in a run inherits that run's style set; embedded newlines
/// split the block, one new block per line break. Returns the caret
/// position after the inserted text.
pub fn insert_text(document: &mut Document, selection: Selection, text: &str) -> EditResult<Position> {
    document.validate_selection(selection)?;
    let (start, end) = selection.normalized();
    if start != end {
        document.delete_range(start, end);
    }

    let mut caret = start;
    let mut lines = text.split('\n');
    caret = insert_in_block(document, caret, lines.next().unwrap_or(""));
    for line in lines {
        document.split_block_at(caret);
        caret = insert_in_block(document, Position::new(caret.block + 1, 0), line);
    }

    debug!(bytes = text.len(), "inserted text");
    Ok(caret)
}

/// Insert a single-line piece of text at a position within one block
fn insert_in_block(document: &mut Document, pos: Position, text: &str) -> Position {
    if text.is_empty() {
        return pos;
    }
    let block = &mut document.blocks_mut()[pos.block];
    let (run_index, local) = block.run_at_offset(pos.offset);
    match block.runs.get_mut(run_index) {
        Some(run) => run.text.insert_str(local, text),
        None => block.runs.push(TextRun::plain(text)),
    }
    block.normalize();
    Position::new(pos.block, pos.offset + text.len())
}

/// Split the containing block at the caret, ending the line there.
/// Equivalent to inserting `"\n"`.
pub fn insert_newline(document: &mut Document, selection: Selection) -> EditResult<Position> {
    insert_text(document, selection, "\n")
}

/// Backspace: delete the selection when non-collapsed, otherwise remove the
/// char before the caret, merging the block into its predecessor when the
/// caret sits at offset 0. A caret at the very start of the document is a
/// no-op. Returns the new caret position.
pub fn delete_backward(document: &mut Document, selection: Selection) -> EditResult<Position> {
    document.validate_selection(selection)?;
    let (start, end) = selection.normalized();

    if start != end {
        document.delete_range(start, end);
        debug!("deleted selection");
        return Ok(start);
    }

    let caret = start;
    if caret.offset == 0 {
        if caret.block == 0 {
            return Ok(caret);
        }
        let prev_len = document.blocks()[caret.block - 1].text_len();
        document.delete_range(Position::new(caret.block - 1, prev_len), caret);
        debug!(block = caret.block, "merged block into predecessor");
        return Ok(Position::new(caret.block - 1, prev_len));
    }

    let text = document.blocks()[caret.block].to_plain_text();
    let prev = text[..caret.offset]
        .chars()
        .next_back()
        .map(|c| caret.offset - c.len_utf8())
        .unwrap_or(0);
    document.delete_range(Position::new(caret.block, prev), caret);
    Ok(Position::new(caret.block, prev))
}

/// The selection spanning the word under `position`, for hosts implementing
/// double-click selection. `None` when the position sits past the block's
/// text (nothing under it).
pub fn word_selection_at(document: &Document, position: Position) -> EditResult<Option<Selection>> {
    document.validate_position(position)?;
    let text = document.blocks()[position.block].to_plain_text();
    if position.offset >= text.len() {
        return Ok(None);
    }

    for (start, word) in text.split_word_bound_indices() {
        let end = start + word.len();
        if position.offset >= start && position.offset < end {
            return Ok(Some(Selection::new(
                Position::new(position.block, start),
                Position::new(position.block, end),
            )));
        }
    }
    Ok(None)
}

/// The selection spanning the whole block under `position`, for hosts
/// implementing triple-click selection
pub fn line_selection_at(document: &Document, position: Position) -> EditResult<Selection> {
    document.validate_position(position)?;
    let block = &document.blocks()[position.block];
    Ok(Selection::new(
        Position::new(position.block, 0),
        Position::new(position.block, block.text_len()),
    ))
}
