//! Ink shell: a line-driven host for the story editor.
//!
//! Wires an `EditorSession` over the headless `MemoryEngine` to a
//! file-backed story repository and a toolbar tab strip, then reads
//! commands from stdin until `quit` or end of input. `RUST_LOG` controls
//! log verbosity (default `info`).

mod command;
mod config;
mod state;

use ink_layout::TabStrip;
use ink_store::{FileStore, StoryRepository};
use log::{error, info};
use std::io::{self, BufRead, Write};

use command::Command;
use config::ShellConfig;
use state::ShellState;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ShellConfig::from_env();
    info!("Starting Ink shell: toolbar {}px", config.toolbar_width);

    let store = match FileStore::open(config.store.clone()) {
        Ok(store) => store,
        Err(e) => {
            error!("cannot open story store: {e}");
            std::process::exit(1);
        }
    };
    info!("story store at {}", store.path().display());
    let mut state = ShellState::new(
        StoryRepository::new(store),
        TabStrip::default(),
        config.toolbar_width,
    );

    if let Err(e) = run(&mut state, io::stdin().lock(), io::stdout().lock()) {
        error!("shell I/O failed: {e}");
        std::process::exit(1);
    }
    state.session.teardown();
    info!("Ink shell stopped");
}

fn run<S, R, W>(state: &mut ShellState<S>, input: R, mut output: W) -> io::Result<()>
where
    S: ink_store::ContentStore,
    R: BufRead,
    W: Write,
{
    writeln!(output, "{}", state.render_tabs())?;
    for line in input.lines() {
        let line = line?;
        let command = match command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(output, "{message}")?;
                continue;
            }
        };
        if command == Command::Quit {
            if state.session.is_dirty() {
                writeln!(output, "leaving with unsaved changes")?;
            }
            break;
        }

        match state.execute(command) {
            Ok(lines) => {
                for line in lines {
                    writeln!(output, "{line}")?;
                }
            }
            Err(e) => writeln!(output, "error: {e}")?,
        }
        for notice in state.take_notices() {
            writeln!(output, "{notice}")?;
        }
        output.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ink_store::{MemoryStore, StoreConfig};
    use tempfile::tempdir;

    fn transcript<S: ink_store::ContentStore>(state: &mut ShellState<S>, script: &str) -> String {
        let mut out = Vec::new();
        run(state, script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_script_with_errors_keeps_going() {
        let mut state = ShellState::new(
            StoryRepository::new(MemoryStore::new()),
            TabStrip::default(),
            800.0,
        );
        let out = transcript(&mut state, "bogus\nsheet switch 9\nsheet add\ntabs\nquit\nsheet add\n");

        assert!(out.contains("unknown command"));
        assert!(out.contains("error: sheet index 8 out of range"));
        assert!(out.contains("[ok] New sheet added"));
        assert!(out.contains("[Sheet 1] [*Sheet 2*] [+]"));
        // Nothing after quit runs.
        assert_eq!(state.session.sheet_count(), 2);
    }

    #[test]
    fn test_saved_story_survives_restart() {
        let dir = tempdir().unwrap();
        let open = || {
            let store = FileStore::open(StoreConfig::for_testing(dir.path())).unwrap();
            ShellState::new(StoryRepository::new(store), TabStrip::default(), 800.0)
        };

        let mut first = open();
        let out = transcript(&mut first, "title Harbour\nwrite Gulls circled.\nkey cmd+s\n");
        assert!(out.contains("[ok] Story saved successfully!"));

        let mut second = open();
        let out = transcript(&mut second, "list\n");
        assert!(out.contains("Harbour  (1 sheets)"));
    }
}
