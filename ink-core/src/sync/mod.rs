//! Sheet synchronizer.
//!
//! Bridges the one live rich-text engine and the per-sheet buffers.
//!
//! ```text
//!            begin_switch(to)                  commit_switch(ticket)
//!   Idle ─────────────────────▸ Switching{from,to} ─────────────────────▸ Idle
//!          capture(from)                          restore(to)
//!          current = to                           set_cursor (best effort)
//! ```
//!
//! While `Switching`, change events from the engine describe a document in
//! transit and are dropped. The synchronizer never interprets blocks; it
//! moves whole documents and compares them structurally.

use log::{debug, warn};

use crate::engine::RichTextEngine;
use crate::error::SessionError;
use crate::{Block, BlockDocument, Selection, Sheet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Switching { from: usize, to: usize },
}

/// Proof that phase one of a switch ran; redeemed by `commit_switch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchTicket {
    from: usize,
    to: usize,
    generation: u64,
}

impl SwitchTicket {
    pub fn from(&self) -> usize {
        self.from
    }

    pub fn to(&self) -> usize {
        self.to
    }
}

#[derive(Debug)]
pub struct SheetSynchronizer {
    state: SyncState,
    /// Set once the first sheet has been loaded into the engine.
    initialized: bool,
    /// Bumped on every `begin_switch`; older tickets become stale.
    generation: u64,
}

impl Default for SheetSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetSynchronizer {
    pub fn new() -> Self {
        Self {
            state: SyncState::Idle,
            initialized: false,
            generation: 0,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_switching(&self) -> bool {
        matches!(self.state, SyncState::Switching { .. })
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Load the first sheet into a freshly mounted engine.
    ///
    /// Runs at most once per synchronizer; later calls return `false`.
    pub fn load_initial<E: RichTextEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        sheets: &[Sheet],
    ) -> bool {
        if self.initialized {
            return false;
        }
        self.initialized = true;

        let Some(first) = sheets.first() else {
            return false;
        };
        let content = first.buffered();
        if content.is_empty() {
            debug!("[init] no initial content for sheet {}", first.id);
            return false;
        }

        let anchor = engine.document().first().and_then(Block::id);
        match engine.insert_at(content.clone(), anchor.as_ref()) {
            Ok(()) => {
                debug!("[init] loaded {} blocks for sheet {}", content.len(), first.id);
                true
            }
            Err(e) => {
                warn!("[init] failed to load sheet {}: {e}", first.id);
                false
            }
        }
    }

    /// Record a live-document change into the active sheet's buffer.
    ///
    /// Returns whether the buffer changed. Dropped while switching.
    pub fn on_external_change<E: RichTextEngine + ?Sized>(
        &self,
        engine: &E,
        active: &mut Sheet,
        new_content: BlockDocument,
    ) -> bool {
        if self.is_switching() {
            debug!("[change] ignored while switching sheets");
            return false;
        }
        if *active.buffered() == new_content {
            return false;
        }
        debug!("[change] sheet {} now has {} blocks", active.id, new_content.len());
        active.set_buffer(new_content, engine.selection());
        active.is_saved = false;
        true
    }

    /// Phase one: snapshot the outgoing sheet and move the active index.
    ///
    /// Returns `None` when `target` is already active. A switch still
    /// pending from an earlier call is completed first.
    pub fn begin_switch<E: RichTextEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        sheets: &mut [Sheet],
        current: &mut usize,
        target: usize,
    ) -> Result<Option<SwitchTicket>, SessionError> {
        if target >= sheets.len() {
            return Err(SessionError::IndexOutOfRange {
                index: target,
                len: sheets.len(),
            });
        }
        self.settle(engine, sheets);
        if target == *current {
            return Ok(None);
        }

        let from = *current;
        self.generation += 1;
        self.state = SyncState::Switching { from, to: target };
        debug!("[switch] {from} -> {target}");

        Self::capture(engine, &mut sheets[from]);
        *current = target;

        Ok(Some(SwitchTicket {
            from,
            to: target,
            generation: self.generation,
        }))
    }

    /// Phase two: push the target sheet into the engine and go idle.
    pub fn commit_switch<E: RichTextEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        sheets: &[Sheet],
        ticket: SwitchTicket,
    ) -> Result<(), SessionError> {
        let current = SyncState::Switching {
            from: ticket.from,
            to: ticket.to,
        };
        if self.state != current || self.generation != ticket.generation {
            return Err(SessionError::StaleSwitch {
                from: ticket.from,
                to: ticket.to,
            });
        }

        if let Some(sheet) = sheets.get(ticket.to) {
            Self::restore(engine, sheet);
        }
        self.state = SyncState::Idle;
        debug!("[switch] complete, active sheet {}", ticket.to);
        Ok(())
    }

    /// Finish a pending switch, if any.
    pub fn settle<E: RichTextEngine + ?Sized>(&mut self, engine: &mut E, sheets: &[Sheet]) {
        if let SyncState::Switching { to, .. } = self.state {
            debug!("[switch] completing pending switch to {to}");
            if let Some(sheet) = sheets.get(to) {
                Self::restore(engine, sheet);
            }
            self.state = SyncState::Idle;
        }
    }

    /// Drop any pending switch without touching the engine.
    ///
    /// Returns the outgoing index of a cleared switch: the engine still
    /// shows that sheet, so the caller must make it active again.
    pub fn teardown(&mut self) -> Option<usize> {
        let pending = match self.state {
            SyncState::Switching { from, .. } => {
                debug!("[switch] cleared by teardown, engine still on {from}");
                Some(from)
            }
            SyncState::Idle => None,
        };
        self.state = SyncState::Idle;
        pending
    }

    /// Copy the live document and selection into `sheet`'s buffer.
    ///
    /// Marks the sheet dirty when the content differs from its buffer.
    pub fn capture<E: RichTextEngine + ?Sized>(engine: &E, sheet: &mut Sheet) -> bool {
        let live = engine.document();
        let selection = engine.selection();
        if *sheet.buffered() == live {
            sheet.editor_state.selection = selection;
            return false;
        }
        sheet.set_buffer(live, selection);
        sheet.is_saved = false;
        true
    }

    /// Replace the live document with `sheet`'s buffer and restore its cursor.
    ///
    /// Never fails: a rejected replace falls back to clear-then-insert, and a
    /// stale selection leaves the cursor wherever the engine put it.
    pub fn restore<E: RichTextEngine + ?Sized>(engine: &mut E, sheet: &Sheet) {
        let content = sheet.buffered();
        let live = engine.document();

        if content.is_empty() {
            // An empty replace may be rejected by the engine; clear instead.
            if !live.is_empty() {
                if let Err(e) = engine.remove_all() {
                    warn!("[restore] failed to clear editor for sheet {}: {e}", sheet.id);
                }
            }
        } else if live != *content {
            if let Err(e) = engine.replace_all(content.clone()) {
                warn!("[restore] replace rejected for sheet {}: {e}; clearing and inserting", sheet.id);
                Self::clear_then_insert(engine, sheet, content.clone());
            }
        }

        if let Some(anchor) = sheet.editor_state.selection.as_ref().and_then(Selection::anchor) {
            if let Err(e) = engine.set_cursor(anchor) {
                debug!("[restore] could not restore selection for sheet {}: {e}", sheet.id);
            }
        }
    }

    fn clear_then_insert<E: RichTextEngine + ?Sized>(
        engine: &mut E,
        sheet: &Sheet,
        content: BlockDocument,
    ) {
        if let Err(e) = engine.remove_all() {
            warn!("[restore] fallback clear failed for sheet {}: {e}", sheet.id);
            return;
        }
        if let Err(e) = engine.insert_at(content, None) {
            warn!("[restore] fallback insert failed for sheet {}: {e}", sheet.id);
        }
    }
}
