use crate::{Error, Result};

/// A positioned cursor over a sorted key-value store.
///
/// The cursor is either positioned on a live entry (`valid()` is true)
/// or invalid: before the first key, past the last key, or stopped by an
/// error. Keys are ordered byte-lexicographically.
///
/// `key()` and `value()` borrow from the cursor, so the borrow checker
/// guarantees they are copied out before the next step.
pub trait Cursor {
    fn valid(&self) -> bool;

    /// Only meaningful when `valid()` is true.
    fn key(&self) -> &[u8];
    /// Only meaningful when `valid()` is true.
    fn value(&self) -> &[u8];

    fn next(&mut self);
    fn prev(&mut self);

    /// seek the cursor to the first entry whose key >= target
    fn seek(&mut self, target: &[u8]);
    /// seek the cursor to the last entry whose key <= target
    fn seek_for_prev(&mut self, target: &[u8]);
    fn seek_to_first(&mut self);
    fn seek_to_last(&mut self);

    /// Non-fatal error accumulated while scanning. A cursor that hit an
    /// error also reports `valid() == false`, so a scan loop cannot tell
    /// "ran out of keys" from "failed"; callers must ask here.
    fn error(&self) -> Option<Error>;

    fn status(&self) -> Result<()> {
        match self.error() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// valid and the current key starts with `prefix`
    fn valid_for_prefix(&self, prefix: &[u8]) -> bool {
        self.valid() && self.key().starts_with(prefix)
    }
}
