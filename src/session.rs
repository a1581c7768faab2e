// Host-facing surface: the selection provider and render sink seams, and
// the edit session tying them to an owned document. Actions take no
// document positions; each one reads the live selection from the provider
// at the moment it runs.

use tracing::debug;

use crate::document::{Alignment, Document, Mark, Position, Selection};
use crate::engine;
use crate::error::EditResult;
use crate::markup;

/// Supplies the host's live cursor/selection state at the moment an action
/// is invoked. The session never caches the result across actions.
pub trait SelectionProvider {
    fn current_selection(&self) -> Selection;
}

/// Receives the serialized markup whenever the document changes.
/// Display-only; a sink has no write access back into the document.
pub trait RenderSink {
    fn render(&mut self, markup: &str);
}

/// One editing session: an owned document plus the provider/sink pair.
/// Created once at session start with a single empty block; dropped when
/// the session ends.
pub struct EditSession<P, S> {
    document: Document,
    provider: P,
    sink: S,
}

impl<P: SelectionProvider, S: RenderSink> EditSession<P, S> {
    pub fn new(provider: P, sink: S) -> Self {
        Self::with_document(Document::new(), provider, sink)
    }

    pub fn with_document(document: Document, provider: P, sink: S) -> Self {
        EditSession {
            document,
            provider,
            sink,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Toggle an inline mark on the current selection
    pub fn toggle_mark(&mut self, mark: Mark) -> EditResult<()> {
        let selection = self.provider.current_selection();
        if engine::toggle_mark(&mut self.document, selection, mark)? {
            self.publish();
        }
        Ok(())
    }

    /// Set the alignment of every block the current selection touches
    pub fn set_alignment(&mut self, alignment: Alignment) -> EditResult<()> {
        let selection = self.provider.current_selection();
        if engine::set_alignment(&mut self.document, selection, alignment)? {
            self.publish();
        }
        Ok(())
    }

    /// Insert text at the current selection, replacing it when non-collapsed
    pub fn insert_text(&mut self, text: &str) -> EditResult<Position> {
        let selection = self.provider.current_selection();
        let caret = engine::insert_text(&mut self.document, selection, text)?;
        if self.edit_changed(selection, caret) {
            self.publish();
        }
        Ok(caret)
    }

    /// End the current line at the caret
    pub fn insert_newline(&mut self) -> EditResult<Position> {
        let selection = self.provider.current_selection();
        let caret = engine::insert_newline(&mut self.document, selection)?;
        if self.edit_changed(selection, caret) {
            self.publish();
        }
        Ok(caret)
    }

    /// Backspace at the current selection
    pub fn delete_backward(&mut self) -> EditResult<Position> {
        let selection = self.provider.current_selection();
        let caret = engine::delete_backward(&mut self.document, selection)?;
        if self.edit_changed(selection, caret) {
            self.publish();
        }
        Ok(caret)
    }

    // An editing action changed the document exactly when it consumed a
    // selection or moved the caret off the selection start.
    fn edit_changed(&self, selection: Selection, caret: Position) -> bool {
        !selection.is_collapsed() || caret != selection.normalized().0
    }

    fn publish(&mut self) {
        let markup = markup::serialize(&self.document);
        debug!(bytes = markup.len(), "publishing markup to render sink");
        self.sink.render(&markup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Test provider returning whatever selection was last set
    struct FixedSelection(Rc<Cell<Selection>>);

    impl SelectionProvider for FixedSelection {
        fn current_selection(&self) -> Selection {
            self.0.get()
        }
    }

    /// Test sink recording every published markup string
    #[derive(Clone, Default)]
    struct RecordingSink(Rc<RefCell<Vec<String>>>);

    impl RecordingSink {
        fn published(&self) -> Vec<String> {
            self.0.borrow().clone()
        }
    }

    impl RenderSink for RecordingSink {
        fn render(&mut self, markup: &str) {
            self.0.borrow_mut().push(markup.to_string());
        }
    }

    fn session_with(
        selection: &Rc<Cell<Selection>>,
        sink: &RecordingSink,
    ) -> EditSession<FixedSelection, RecordingSink> {
        EditSession::new(FixedSelection(selection.clone()), sink.clone())
    }

    #[test]
    fn test_actions_read_live_selection_and_publish() {
        let selection = Rc::new(Cell::new(Selection::caret(Position::start())));
        let sink = RecordingSink::default();
        let mut session = session_with(&selection, &sink);

        session.insert_text("Hello world").unwrap();
        selection.set(Selection::new(Position::new(0, 0), Position::new(0, 5)));
        session.toggle_mark(Mark::Bold).unwrap();

        assert_eq!(sink.published(), vec!["Hello world", "<b>Hello</b> world"]);
    }

    #[test]
    fn test_collapsed_toggle_publishes_nothing() {
        let selection = Rc::new(Cell::new(Selection::caret(Position::start())));
        let sink = RecordingSink::default();
        let mut session = session_with(&selection, &sink);

        session.toggle_mark(Mark::Italic).unwrap();
        assert!(sink.published().is_empty());
    }

    #[test]
    fn test_alignment_on_collapsed_cursor_publishes_once() {
        let selection = Rc::new(Cell::new(Selection::caret(Position::start())));
        let sink = RecordingSink::default();
        let mut session = session_with(&selection, &sink);

        session.insert_text("centered").unwrap();
        selection.set(Selection::caret(Position::new(0, 3)));
        session.set_alignment(Alignment::Center).unwrap();
        // re-applying the same alignment changes nothing and publishes nothing
        session.set_alignment(Alignment::Center).unwrap();

        assert_eq!(
            sink.published(),
            vec!["centered", "<div align=\"center\">centered</div>"]
        );
    }

    #[test]
    fn test_invalid_selection_leaves_document_untouched() {
        let selection = Rc::new(Cell::new(Selection::caret(Position::new(3, 0))));
        let sink = RecordingSink::default();
        let mut session = session_with(&selection, &sink);

        assert!(session.set_alignment(Alignment::Right).is_err());
        assert_eq!(session.document(), &Document::new());
        assert!(sink.published().is_empty());
    }

    #[test]
    fn test_backspace_at_start_publishes_nothing() {
        let selection = Rc::new(Cell::new(Selection::caret(Position::start())));
        let sink = RecordingSink::default();
        let mut session = session_with(&selection, &sink);

        let caret = session.delete_backward().unwrap();
        assert_eq!(caret, Position::start());
        assert!(sink.published().is_empty());
    }
}
