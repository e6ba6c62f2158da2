use crate::SheetId;

/// Errors returned by editing-session operations.
///
/// None of these are fatal; the session is left unchanged when one is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("cannot delete the last sheet")]
    LastSheet,
    #[error("sheet not found: {0}")]
    SheetNotFound(SheetId),
    #[error("sheet index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("switch ticket {from}->{to} is stale")]
    StaleSwitch { from: usize, to: usize },
    #[error("no rename in progress")]
    NoRename,
}
