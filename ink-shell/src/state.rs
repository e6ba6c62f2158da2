//! Shell state: owns the editing session, the story repository and the tab
//! strip, and applies parsed commands to them.
//!
//! ```text
//!   Command ──▶ ShellState::execute ──▶ EditorSession ◀── engine events
//!                    │                       │              (pump)
//!                    ▼                       ▼
//!               TabStrip              StoryRepository ──▶ ContentStore
//! ```
//!
//! After every command the engine's queued change events are pumped into
//! the session, the tab strip is refreshed, and queued notices are printed.

use ink_core::{
    match_shortcut, EditorSession, MemoryEngine, Notice, RichTextEngine, SessionError, Shortcut,
    StoryId,
};
use ink_layout::TabStrip;
use ink_store::{ContentStore, StoreError, StoryRepository, RECENT_LIMIT};
use log::{debug, info};

use crate::command::{Command, HELP};

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no story with id {0}")]
    UnknownStory(String),
}

pub struct ShellState<S: ContentStore> {
    pub session: EditorSession<MemoryEngine>,
    pub repo: StoryRepository<S>,
    pub tabs: TabStrip,
    toolbar_width: f32,
}

impl<S: ContentStore> ShellState<S> {
    pub fn new(repo: StoryRepository<S>, tabs: TabStrip, toolbar_width: f32) -> Self {
        let mut state = Self {
            session: fresh_session(),
            repo,
            tabs,
            toolbar_width,
        };
        state.refresh_tabs();
        state
    }

    /// Apply one command. Returns lines to print.
    pub fn execute(&mut self, command: Command) -> Result<Vec<String>, ShellError> {
        debug!("execute {command:?}");
        let result = self.apply(command);
        self.pump();
        self.refresh_tabs();
        result
    }

    fn apply(&mut self, command: Command) -> Result<Vec<String>, ShellError> {
        let mut out = Vec::new();
        match command {
            Command::Help => out.push(HELP.to_string()),
            Command::List => out.extend(self.list_stories()?),
            Command::New => {
                self.session.teardown();
                self.session = fresh_session();
                out.push("new story".into());
            }
            Command::Open(id) => {
                let story = self
                    .repo
                    .get(&StoryId::from(id.as_str()))?
                    .ok_or(ShellError::UnknownStory(id))?;
                self.session.load_story(&story);
                out.push(format!("opened {} ({} sheets)", story.id, self.session.sheet_count()));
            }
            Command::Write(text) => {
                self.session.engine_mut().type_paragraph(&text);
            }
            Command::Show => out.extend(self.show_sheet()),
            Command::Tabs => out.push(self.render_tabs()),
            Command::Width(width) => {
                self.toolbar_width = width;
                let metrics = self.tabs.metrics();
                out.push(format!(
                    "toolbar width {width}: {} tabs of {}px fit",
                    metrics.max_visible(width),
                    metrics.tab_width()
                ));
            }
            Command::AddSheet => {
                self.session.add_sheet();
            }
            Command::DeleteSheet(index) => {
                let id = self
                    .session
                    .sheets()
                    .get(index)
                    .map(|s| s.id.clone())
                    .ok_or(SessionError::IndexOutOfRange {
                        index,
                        len: self.session.sheet_count(),
                    })?;
                // The last-sheet refusal is reported through a notice.
                if let Err(e) = self.session.delete_sheet(&id) {
                    debug!("sheet delete refused: {e}");
                }
            }
            Command::MoveSheet { from, to } => self.session.reorder_sheet(from, to)?,
            Command::Drag { from, to } => {
                self.session.drag_start(from);
                self.session.drag_over(to);
                let result = self.session.drop_on(to);
                self.session.drag_end();
                result?;
            }
            Command::RenameSheet { index, name } => {
                self.session.begin_rename(index)?;
                self.session.edit_rename(&name)?;
                self.session.commit_rename()?;
            }
            Command::Switch(index) => self.session.switch_to_sheet(index)?,
            Command::Title(title) => self.session.set_title(&title),
            Command::Subtitle(subtitle) => self.session.set_subtitle(&subtitle),
            Command::Tags(tags) => self.session.set_tags(tags),
            Command::Save => self.save(),
            Command::Key(press) => {
                let shortcut = match_shortcut(&press);
                if let Some(Shortcut::Save) = shortcut {
                    self.save();
                }
                // Keys the editor does not claim fall through to the default handling.
                if !shortcut.is_some_and(Shortcut::prevent_default) {
                    out.push(format!("{} is not bound", press.key));
                }
            }
            Command::DeleteStory(target) => {
                let open = self.session.story_id().map(StoryId::to_string);
                match target {
                    Some(id) if open.as_deref() != Some(id.as_str()) => self.delete_stored(id)?,
                    _ => self.delete_open()?,
                }
            }
            Command::Quit => {}
        }
        Ok(out)
    }

    /// Delete the open story and start a fresh one in its place.
    fn delete_open(&mut self) -> Result<(), ShellError> {
        if !self.repo.delete(&mut self.session)? {
            self.session.push_notice(Notice::info("Story was never saved"));
            return Ok(());
        }
        let notices = self.session.drain_notices();
        self.session.teardown();
        self.session = fresh_session();
        for notice in notices {
            self.session.push_notice(notice);
        }
        Ok(())
    }

    /// Delete a stored story other than the open one, as from the story list.
    fn delete_stored(&mut self, id: String) -> Result<(), ShellError> {
        if !self.repo.remove(&StoryId::from(id.as_str()))? {
            return Err(ShellError::UnknownStory(id));
        }
        info!("deleted story {id}");
        self.session.push_notice(
            Notice::success("Story deleted").with_description("Your story has been deleted."),
        );
        Ok(())
    }

    /// Save failures are reported through the session's notice queue.
    fn save(&mut self) {
        if let Ok(story) = self.repo.save(&mut self.session) {
            info!("story {} saved at {}", story.id, story.updated_at);
        }
    }

    /// Forward queued engine events to the session.
    pub fn pump(&mut self) {
        for change in self.session.engine_mut().drain_changes() {
            self.session.on_external_change(change);
        }
    }

    fn refresh_tabs(&mut self) {
        self.tabs
            .update(self.session.sheet_count(), self.toolbar_width);
    }

    /// Queued notices, formatted for printing.
    pub fn take_notices(&mut self) -> Vec<String> {
        self.session
            .drain_notices()
            .into_iter()
            .map(|n| n.to_string())
            .collect()
    }

    fn list_stories(&self) -> Result<Vec<String>, ShellError> {
        let stories = self.repo.recent(RECENT_LIMIT)?;
        if stories.is_empty() {
            return Ok(vec!["no stories yet".into()]);
        }
        Ok(stories
            .iter()
            .map(|s| format!("{}  {}  ({} sheets)", s.id, s.title, s.sheets.len().max(1)))
            .collect())
    }

    fn show_sheet(&self) -> Vec<String> {
        let index = self.session.current_index();
        let sheet = self.session.current_sheet();
        let mut lines = vec![format!(
            "{}{}",
            self.session.display_title(index).unwrap_or_default(),
            if sheet.is_saved { "" } else { " (unsaved)" }
        )];
        if !sheet.subtitle.is_empty() {
            lines.push(format!("  {}", sheet.subtitle));
        }
        if !sheet.tags.is_empty() {
            lines.push(format!("  tags: {}", sheet.tags.join(", ")));
        }
        for block in self.session.engine().document() {
            let text = match block.0.get("content").and_then(|c| c.as_str()) {
                Some(text) => text.to_string(),
                None => block.0.to_string(),
            };
            lines.push(format!("  | {text}"));
        }
        lines
    }

    /// One line: inline tabs, then the overflow menu if any.
    pub fn render_tabs(&self) -> String {
        let current = self.session.current_index();
        let label = |i: usize| {
            let title = self.session.display_title(i).unwrap_or_default();
            if i == current {
                format!("[*{title}*]")
            } else {
                format!("[{title}]")
            }
        };

        let layout = self.tabs.layout();
        let mut line: Vec<String> = layout.visible.iter().map(|&i| label(i)).collect();
        if layout.has_overflow() {
            let hidden: Vec<String> = layout.overflow.iter().map(|&i| label(i)).collect();
            line.push(format!("+{} more: {}", hidden.len(), hidden.join(" ")));
        }
        line.push("[+]".into());
        line.join(" ")
    }
}

fn fresh_session() -> EditorSession<MemoryEngine> {
    let mut session = EditorSession::new(MemoryEngine::new());
    session.mount();
    session
}
