//! Command-line grammar for the shell.
//!
//! Sheet positions are 1-based on the command line and 0-based everywhere
//! else; the parser converts.

use ink_core::KeyPress;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    /// Most recently updated stories
    List,
    New,
    Open(String),
    /// Append a paragraph to the active sheet
    Write(String),
    Show,
    Tabs,
    /// Simulate a toolbar resize
    Width(f32),
    AddSheet,
    DeleteSheet(usize),
    MoveSheet { from: usize, to: usize },
    /// Reorder through the drag-and-drop gesture
    Drag { from: usize, to: usize },
    RenameSheet { index: usize, name: String },
    Switch(usize),
    Title(String),
    Subtitle(String),
    Tags(Vec<String>),
    Save,
    Key(KeyPress),
    /// Delete a stored story by id, or the open one when `None`
    DeleteStory(Option<String>),
    Quit,
}

pub const HELP: &str = "\
commands:
  list                     recent stories
  new                      start an unsaved story
  open <story-id>          open a stored story
  write <text>             append a paragraph to the active sheet
  show                     print the active sheet
  tabs                     print the sheet tabs
  width <px>               resize the toolbar
  sheet add | rm <n> | mv <from> <to> | drag <from> <to>
  sheet rename <n> <name> | switch <n>
  title <text> | subtitle <text> | tags <a,b,...>
  save                     save the story
  key <combo>              press a key, e.g. ctrl+s
  delete [story-id]        delete the open story, or a stored one
  quit";

/// Parse one input line. Blank lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = split_word(line);

    let command = match word {
        "help" | "?" => Command::Help,
        "list" | "ls" => Command::List,
        "new" => Command::New,
        "open" => Command::Open(required(rest, "open <story-id>")?.to_string()),
        "write" | "w" => Command::Write(required(rest, "write <text>")?.to_string()),
        "show" => Command::Show,
        "tabs" => Command::Tabs,
        "width" => Command::Width(parse_width(rest)?),
        "sheet" => parse_sheet(rest)?,
        "title" => Command::Title(rest.to_string()),
        "subtitle" => Command::Subtitle(rest.to_string()),
        "tags" => Command::Tags(parse_tags(rest)),
        "save" => Command::Save,
        "key" => Command::Key(parse_key(required(rest, "key <combo>")?)?),
        "delete" => Command::DeleteStory((!rest.is_empty()).then(|| rest.to_string())),
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command {other:?}, try `help`")),
    };
    Ok(Some(command))
}

fn parse_sheet(args: &str) -> Result<Command, String> {
    let (action, rest) = split_word(args);
    match action {
        "add" => Ok(Command::AddSheet),
        "rm" => Ok(Command::DeleteSheet(position(rest)?)),
        "switch" => Ok(Command::Switch(position(rest)?)),
        "mv" | "drag" => {
            let (a, b) = split_word(rest);
            let (from, to) = (position(a)?, position(b)?);
            Ok(if action == "mv" {
                Command::MoveSheet { from, to }
            } else {
                Command::Drag { from, to }
            })
        }
        "rename" => {
            let (n, name) = split_word(rest);
            Ok(Command::RenameSheet {
                index: position(n)?,
                name: name.to_string(),
            })
        }
        "" => Err("usage: sheet add | rm | mv | drag | rename | switch".into()),
        other => Err(format!("unknown sheet action {other:?}")),
    }
}

/// `ctrl+s`, `cmd+S`, `meta+s`, or a bare key.
fn parse_key(combo: &str) -> Result<KeyPress, String> {
    let mut parts: Vec<&str> = combo.split('+').map(str::trim).collect();
    let key = match parts.pop() {
        Some(k) if !k.is_empty() => k,
        _ => return Err(format!("bad key combo {combo:?}")),
    };
    let mut press = KeyPress::new(key);
    for modifier in parts {
        press = match modifier.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => press.ctrl(),
            "cmd" | "meta" | "super" => press.meta(),
            other => return Err(format!("unknown modifier {other:?}")),
        };
    }
    Ok(press)
}

fn parse_tags(args: &str) -> Vec<String> {
    args.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn parse_width(args: &str) -> Result<f32, String> {
    match args.trim().parse::<f32>() {
        Ok(w) if w.is_finite() && w >= 0.0 => Ok(w),
        _ => Err(format!("bad width {args:?}")),
    }
}

/// 1-based position on the command line to a 0-based index.
fn position(arg: &str) -> Result<usize, String> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("bad sheet position {arg:?}, positions start at 1")),
    }
}

fn required<'a>(arg: &'a str, usage: &str) -> Result<&'a str, String> {
    if arg.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(arg)
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim()),
        None => (s, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line_is_none() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn test_write_keeps_text() {
        assert_eq!(
            parse("write  It was a dark night.").unwrap(),
            Some(Command::Write("It was a dark night.".into()))
        );
    }

    #[test]
    fn test_sheet_positions_are_one_based() {
        assert_eq!(parse("sheet switch 3").unwrap(), Some(Command::Switch(2)));
        assert_eq!(
            parse("sheet mv 1 4").unwrap(),
            Some(Command::MoveSheet { from: 0, to: 3 })
        );
        assert_eq!(
            parse("sheet rename 2 The Storm").unwrap(),
            Some(Command::RenameSheet {
                index: 1,
                name: "The Storm".into()
            })
        );
        assert!(parse("sheet rm 0").is_err());
    }

    #[test]
    fn test_key_combos() {
        assert_eq!(
            parse("key ctrl+s").unwrap(),
            Some(Command::Key(KeyPress::new("s").ctrl()))
        );
        assert_eq!(
            parse("key Cmd+S").unwrap(),
            Some(Command::Key(KeyPress::new("S").meta()))
        );
        assert!(parse("key hyper+s").is_err());
        assert!(parse("key ctrl+").is_err());
    }

    #[test]
    fn test_tags_split_on_commas() {
        assert_eq!(
            parse("tags  mystery, draft ,,").unwrap(),
            Some(Command::Tags(vec!["mystery".into(), "draft".into()]))
        );
        assert_eq!(parse("tags").unwrap(), Some(Command::Tags(vec![])));
    }

    #[test]
    fn test_delete_with_and_without_id() {
        assert_eq!(parse("delete").unwrap(), Some(Command::DeleteStory(None)));
        assert_eq!(
            parse("delete story_abc").unwrap(),
            Some(Command::DeleteStory(Some("story_abc".into())))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse("frobnicate").is_err());
        assert!(parse("width -5").is_err());
    }
}
