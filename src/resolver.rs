// Range resolver: maps an anchor/focus selection onto the run structure.
// Resolution only describes where span boundaries fall; it never mutates
// the document. The formatting engine applies the splits when it commits.

use std::ops::Range;

use tracing::trace;

use crate::document::{Block, Document, Selection};
use crate::error::EditResult;

/// One (block, run, sub-range) element of a resolved span.
/// `range` is a byte range within the run's own text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanSegment {
    pub block: usize,
    pub run: usize,
    pub range: Range<usize>,
}

/// A boundary-aligned description of the selected span: the ordered
/// segments exactly covering `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedSpan {
    pub segments: Vec<SpanSegment>,
}

impl ResolvedSpan {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Block indices touched by the span, in order, deduplicated
    pub fn blocks(&self) -> Vec<usize> {
        let mut blocks: Vec<usize> = Vec::new();
        for seg in &self.segments {
            if blocks.last() != Some(&seg.block) {
                blocks.push(seg.block);
            }
        }
        blocks
    }
}

/// Resolve a selection into a span description.
///
/// Fails with `InvalidSelection` on out-of-bounds positions; a collapsed
/// selection resolves to `None` since no span operation is meaningful on it.
pub fn resolve(document: &Document, selection: Selection) -> EditResult<Option<ResolvedSpan>> {
    document.validate_selection(selection)?;

    if selection.is_collapsed() {
        return Ok(None);
    }

    let (start, end) = selection.normalized();
    let mut segments = Vec::new();

    for block_index in start.block..=end.block {
        let block = &document.blocks()[block_index];
        let span_start = if block_index == start.block {
            start.offset
        } else {
            0
        };
        let span_end = if block_index == end.block {
            end.offset
        } else {
            block.text_len()
        };
        collect_segments(block, block_index, span_start, span_end, &mut segments);
    }

    trace!(count = segments.len(), "resolved selection into segments");
    Ok(Some(ResolvedSpan { segments }))
}

/// Collect the run sub-ranges of one block that intersect
/// `[span_start, span_end)`. Zero-length intersections (including empty
/// placeholder runs) produce no segment.
fn collect_segments(
    block: &Block,
    block_index: usize,
    span_start: usize,
    span_end: usize,
    out: &mut Vec<SpanSegment>,
) {
    let mut pos = 0;
    for (run_index, run) in block.runs.iter().enumerate() {
        let run_start = pos;
        let run_end = pos + run.len();
        pos = run_end;

        let from = span_start.max(run_start);
        let to = span_end.min(run_end);
        if from >= to {
            continue;
        }
        out.push(SpanSegment {
            block: block_index,
            run: run_index,
            range: from - run_start..to - run_start,
        });
    }
}
