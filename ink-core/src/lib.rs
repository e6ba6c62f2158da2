//! # ink-core: story model and editor state for Ink
//!
//! A story is a sequence of sheets. The editor shows one sheet at a time
//! through a single shared rich-text engine; every sheet keeps its own
//! buffered block-document so switching never loses in-flight edits.
//!
//! ```text
//!   RichTextEngine ──change──▸ SheetSynchronizer ──▸ Sheet buffers
//!         ▲                          │
//!         └────── restore ───────────┘  (on switch / delete / load)
//! ```
//!
//! ## Modules
//!
//! - [`engine`]: the rich-text engine seam and a headless implementation
//! - [`sync`]: sheet synchronizer (capture, restore, switch state machine)
//! - [`session`]: sheet lifecycle and the editing session that owns it all
//! - [`shortcut`]: save shortcut matching
//! - [`notice`]: user-facing notices queued by the session

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::SystemTime;
use uuid::Uuid;

pub mod engine;
pub mod error;
pub mod notice;
pub mod session;
pub mod shortcut;
pub mod sync;

pub use engine::{EngineError, MemoryEngine, RichTextEngine};
pub use error::SessionError;
pub use notice::{Notice, NoticeLevel};
pub use session::{DragState, EditorSession, RenameDraft};
pub use shortcut::{match_shortcut, KeyPress, Shortcut};
pub use sync::{SheetSynchronizer, SwitchTicket, SyncState};

/// Cover image assigned to every saved story until uploads exist.
pub const DEFAULT_COVER_IMAGE: &str = "/assets/cover-image.png";

/// Title given to a story whose first sheet has none.
pub const UNTITLED_STORY: &str = "Untitled Story";

/// Id of the sheet every fresh session starts with.
pub const FIRST_SHEET_ID: &str = "sheet_1";

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Identifier of a block inside a block-document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl BlockId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One opaque rich-text block node.
///
/// The editor state never interprets block contents; the only field it
/// reads is an optional string `"id"`, used to place the cursor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block(pub Value);

impl Block {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// A paragraph block with a fresh id.
    pub fn paragraph(text: &str) -> Self {
        Self(serde_json::json!({
            "id": Uuid::new_v4().to_string(),
            "type": "paragraph",
            "content": text,
        }))
    }

    pub fn id(&self) -> Option<BlockId> {
        self.0
            .get("id")
            .and_then(Value::as_str)
            .map(|s| BlockId(s.to_string()))
    }
}

/// Ordered sequence of blocks; the unit exchanged between buffer and engine.
pub type BlockDocument = Vec<Block>;

/// Last known cursor/selection, by block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub blocks: Vec<BlockId>,
}

impl Selection {
    pub fn anchor(&self) -> Option<&BlockId> {
        self.blocks.first()
    }
}

/// Buffered content plus the selection needed to restore the cursor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorState {
    #[serde(default)]
    pub content: BlockDocument,
    #[serde(default)]
    pub selection: Option<Selection>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetId(pub String);

impl SheetId {
    /// A fresh id that is never reused within a story.
    pub fn generate() -> Self {
        Self(format!("sheet_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SheetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SheetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub String);

impl StoryId {
    pub fn generate() -> Self {
        Self(format!("story_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

fn saved_by_default() -> bool {
    true
}

/// One section of a story.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub id: SheetId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub content: BlockDocument,
    #[serde(default)]
    pub editor_state: EditorState,
    #[serde(default = "saved_by_default")]
    pub is_saved: bool,
}

impl Sheet {
    /// An empty, saved sheet.
    pub fn new(id: SheetId) -> Self {
        Self {
            id,
            title: String::new(),
            subtitle: String::new(),
            tags: Vec::new(),
            content: Vec::new(),
            editor_state: EditorState::default(),
            is_saved: true,
        }
    }

    /// The content the editor should show for this sheet.
    pub fn buffered(&self) -> &BlockDocument {
        &self.editor_state.content
    }

    /// Replace the buffer (and its legacy `content` mirror).
    pub fn set_buffer(&mut self, content: BlockDocument, selection: Option<Selection>) {
        self.content = content.clone();
        self.editor_state = EditorState { content, selection };
    }

    /// Normalize a sheet read from storage: the buffer falls back to
    /// `content` and the sheet counts as saved.
    fn loaded(mut self) -> Self {
        if self.editor_state.content.is_empty() && !self.content.is_empty() {
            self.editor_state.content = self.content.clone();
        } else {
            self.content = self.editor_state.content.clone();
        }
        self.is_saved = true;
        self
    }
}

/// Display title for a sheet: its own title, or `"Sheet N"` by position.
pub fn display_title(sheet: &Sheet, index: usize) -> String {
    if sheet.title.is_empty() {
        format!("Sheet {}", index + 1)
    } else {
        sheet.title.clone()
    }
}

/// The persisted aggregate.
///
/// `title`, `subtitle`, `tags` and `content` duplicate the first sheet so
/// single-sheet readers keep working.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub content: BlockDocument,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Story {
    /// Sheets to edit when this story is opened.
    ///
    /// A story stored before sheets existed becomes a single sheet carrying
    /// the story's own summary fields.
    pub fn editing_sheets(&self) -> Vec<Sheet> {
        if self.sheets.is_empty() {
            let mut sheet = Sheet::new(SheetId::from(FIRST_SHEET_ID));
            sheet.title = self.title.clone();
            sheet.subtitle = self.subtitle.clone();
            sheet.tags = self.tags.clone();
            sheet.set_buffer(self.content.clone(), None);
            return vec![sheet];
        }
        self.sheets.iter().cloned().map(Sheet::loaded).collect()
    }
}
