//! Rich-text engine seam.
//!
//! The real engine (rendering, input, schema) lives outside this crate. The
//! editor state only moves whole block-documents in and out of it, so the
//! trait exposes exactly those operations.

use std::collections::VecDeque;

use crate::{Block, BlockDocument, BlockId, Selection};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("engine rejected operation: {0}")]
    Rejected(String),
    #[error("block not found in document: {0}")]
    UnknownBlock(String),
}

/// The single live editing surface shared by every sheet.
///
/// Change notification is push-based on the host side: whenever the live
/// document mutates, the host forwards the new document to
/// [`EditorSession::on_external_change`](crate::EditorSession::on_external_change).
pub trait RichTextEngine {
    /// Current live document.
    fn document(&self) -> BlockDocument;

    /// Replace the whole document. Engines may reject an empty replacement.
    fn replace_all(&mut self, blocks: BlockDocument) -> Result<(), EngineError>;

    /// Insert blocks before `anchor`, or at the end when `anchor` is `None`.
    fn insert_at(&mut self, blocks: BlockDocument, anchor: Option<&BlockId>)
        -> Result<(), EngineError>;

    /// Remove every block.
    fn remove_all(&mut self) -> Result<(), EngineError>;

    fn selection(&self) -> Option<Selection>;

    /// Place the text cursor in the given block.
    fn set_cursor(&mut self, block: &BlockId) -> Result<(), EngineError>;
}

/// Headless engine that keeps the document in memory.
///
/// Every mutation queues the resulting document as a change event; the host
/// drains them with [`MemoryEngine::drain_changes`] and forwards them to the
/// session, the same way a real engine's change callback would fire.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    document: BlockDocument,
    cursor: Option<BlockId>,
    changes: VecDeque<BlockDocument>,
    reject_replace: bool,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `replace_all` fail, to exercise the clear-then-insert fallback.
    pub fn set_reject_replace(&mut self, reject: bool) {
        self.reject_replace = reject;
    }

    /// Simulate the user typing a new paragraph at the end of the document.
    pub fn type_paragraph(&mut self, text: &str) -> Block {
        let block = Block::paragraph(text);
        self.cursor = block.id();
        self.document.push(block.clone());
        self.emit();
        block
    }

    /// Simulate an arbitrary user edit.
    pub fn edit(&mut self, f: impl FnOnce(&mut BlockDocument)) {
        f(&mut self.document);
        self.emit();
    }

    pub fn cursor(&self) -> Option<&BlockId> {
        self.cursor.as_ref()
    }

    pub fn pending_changes(&self) -> usize {
        self.changes.len()
    }

    /// Take every queued change event, oldest first.
    pub fn drain_changes(&mut self) -> Vec<BlockDocument> {
        self.changes.drain(..).collect()
    }

    fn emit(&mut self) {
        self.changes.push_back(self.document.clone());
    }

    fn position_of(&self, id: &BlockId) -> Option<usize> {
        self.document
            .iter()
            .position(|b| b.id().as_ref() == Some(id))
    }
}

impl RichTextEngine for MemoryEngine {
    fn document(&self) -> BlockDocument {
        self.document.clone()
    }

    fn replace_all(&mut self, blocks: BlockDocument) -> Result<(), EngineError> {
        if blocks.is_empty() {
            return Err(EngineError::Rejected(
                "cannot replace with an empty document".into(),
            ));
        }
        if self.reject_replace {
            return Err(EngineError::Rejected("replace disabled".into()));
        }
        self.document = blocks;
        self.cursor = None;
        self.emit();
        Ok(())
    }

    fn insert_at(
        &mut self,
        blocks: BlockDocument,
        anchor: Option<&BlockId>,
    ) -> Result<(), EngineError> {
        let at = match anchor {
            Some(id) => self
                .position_of(id)
                .ok_or_else(|| EngineError::UnknownBlock(id.0.clone()))?,
            None => self.document.len(),
        };
        self.document.splice(at..at, blocks);
        self.emit();
        Ok(())
    }

    fn remove_all(&mut self) -> Result<(), EngineError> {
        self.document.clear();
        self.cursor = None;
        self.emit();
        Ok(())
    }

    fn selection(&self) -> Option<Selection> {
        self.cursor.clone().map(|id| Selection { blocks: vec![id] })
    }

    fn set_cursor(&mut self, block: &BlockId) -> Result<(), EngineError> {
        if self.position_of(block).is_none() {
            return Err(EngineError::UnknownBlock(block.0.clone()));
        }
        self.cursor = Some(block.clone());
        Ok(())
    }
}
