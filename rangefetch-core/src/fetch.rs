use log::trace;

use crate::cursor::Cursor;
use crate::page::{ResultPage, DEFAULT_PAGE_SIZE};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn from_reverse(reverse: bool) -> Self {
        if reverse {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }

    pub(crate) fn step<C: Cursor + ?Sized>(self, cursor: &mut C) {
        match self {
            Direction::Forward => cursor.next(),
            Direction::Backward => cursor.prev(),
        }
    }
}

/// Which keys a fetch keeps scanning over.
///
/// An empty `prefix` or `end` puts no constraint on that axis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyFilter<'a> {
    /// continue while the key starts with it
    pub prefix: &'a [u8],
    /// exclusive bound: continue while the key is strictly before it in
    /// scan direction
    pub end: &'a [u8],
}

impl<'a> KeyFilter<'a> {
    pub fn new(prefix: Option<&'a [u8]>, end: Option<&'a [u8]>) -> Self {
        Self {
            prefix: prefix.unwrap_or_default(),
            end: end.unwrap_or_default(),
        }
    }

    pub fn prefix(prefix: &'a [u8]) -> Self {
        Self { prefix, end: &[] }
    }

    pub fn end(end: &'a [u8]) -> Self {
        Self { prefix: &[], end }
    }

    /// Whether `key` may be consumed by a scan going in `direction`.
    ///
    /// The end bound is checked before the prefix.
    pub fn accepts(&self, key: &[u8], direction: Direction) -> bool {
        if !self.end.is_empty() {
            let passed_end = match direction {
                Direction::Forward => key >= self.end,
                Direction::Backward => key <= self.end,
            };
            if passed_end {
                return false;
            }
        }
        self.prefix.is_empty() || key.starts_with(self.prefix)
    }
}

// initial entry capacity: the page size, but no more than a positive limit
fn initial_capacity(limit: i64, page_size: usize) -> usize {
    let size = if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };
    match usize::try_from(limit) {
        Ok(limit) if limit > 0 && limit < size => limit,
        _ => size,
    }
}

/// Collect up to `limit` entries starting at the cursor's current position.
///
/// `limit <= 0` means no count limit: the scan only ends on a key the
/// `filter` rejects or when the cursor becomes invalid.
///
/// When this returns, the cursor is either invalid or sits on the first key
/// that was *not* taken (rejected by the filter, or one past the limit).
/// Calling again with the same arguments therefore resumes the scan, and
/// once the filter fails every further call returns an empty page after a
/// single probe.
///
/// Errors raised by the cursor are not looked at here. A failing cursor
/// just turns invalid, which ends the scan like running out of keys, so
/// check [`Cursor::status`] after a scanning sequence.
pub fn bounded_fetch<C: Cursor + ?Sized>(
    cursor: &mut C,
    direction: Direction,
    limit: i64,
    filter: &KeyFilter<'_>,
    page_size: usize,
) -> ResultPage {
    let max = usize::try_from(limit).ok().filter(|l| *l > 0);
    let mut page = ResultPage::with_capacity(initial_capacity(limit, page_size));

    while cursor.valid() {
        if max.is_some_and(|max| page.found() >= max) {
            break;
        }
        let key = cursor.key();
        if !filter.accepts(key, direction) {
            break;
        }
        page.append(key, cursor.value());
        direction.step(cursor);
    }

    trace!(
        "bounded fetch {:?} limit {} found {} (cursor valid: {})",
        direction,
        limit,
        page.found(),
        cursor.valid()
    );
    page
}

/// Batch reads on any [`Cursor`], using the default page size.
pub trait CursorExt: Cursor {
    /// Fetch forward from the current position. Empty `prefix` / `end`
    /// disable that filter.
    fn next_many(&mut self, limit: i64, prefix: &[u8], end: &[u8]) -> ResultPage {
        let filter = KeyFilter { prefix, end };
        bounded_fetch(self, Direction::Forward, limit, &filter, DEFAULT_PAGE_SIZE)
    }

    /// Fetch backward from the current position. `end` is still exclusive:
    /// keys <= `end` stop the scan.
    fn prev_many(&mut self, limit: i64, prefix: &[u8], end: &[u8]) -> ResultPage {
        let filter = KeyFilter { prefix, end };
        bounded_fetch(self, Direction::Backward, limit, &filter, DEFAULT_PAGE_SIZE)
    }
}

impl<C: Cursor + ?Sized> CursorExt for C {}
