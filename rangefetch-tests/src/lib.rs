use log::debug;
use rangefetch_core::{Cursor, Error, MemStore};

/// Build a store whose value for every key is `val_<key>`.
pub fn store_with(keys: &[&str]) -> MemStore {
    keys.iter().map(|k| (*k, format!("val_{k}"))).collect()
}

pub fn to_strings<'a>(keys: impl IntoIterator<Item = &'a [u8]>) -> Vec<String> {
    keys.into_iter()
        .map(|k| String::from_utf8_lossy(k).into_owned())
        .collect()
}

/// A cursor that breaks after a fixed number of steps, the way a storage
/// engine cursor does when it hits a corrupt block: it turns invalid and
/// reports the failure only through `error()`.
///
/// The failure fires once. A later seek clears it and the cursor works
/// normally from then on.
pub struct FaultyCursor<C> {
    inner: C,
    steps_left: Option<usize>,
    failed: Option<Error>,
}

impl<C: Cursor> FaultyCursor<C> {
    pub fn new(inner: C, fail_after_steps: usize) -> Self {
        Self {
            inner,
            steps_left: Some(fail_after_steps),
            failed: None,
        }
    }

    fn step(&mut self, forward: bool) {
        match self.steps_left {
            Some(0) => {
                debug!("faulty cursor fails at {:?}", self.inner.key());
                self.steps_left = None;
                self.failed = Some(Error::Cursor("injected corruption".to_owned()));
            }
            Some(n) => {
                self.steps_left = Some(n - 1);
                self.move_inner(forward);
            }
            None => self.move_inner(forward),
        }
    }

    fn move_inner(&mut self, forward: bool) {
        if forward {
            self.inner.next()
        } else {
            self.inner.prev()
        }
    }
}

impl<C: Cursor> Cursor for FaultyCursor<C> {
    fn valid(&self) -> bool {
        self.failed.is_none() && self.inner.valid()
    }

    fn key(&self) -> &[u8] {
        self.inner.key()
    }

    fn value(&self) -> &[u8] {
        self.inner.value()
    }

    fn next(&mut self) {
        self.step(true)
    }

    fn prev(&mut self) {
        self.step(false)
    }

    fn seek(&mut self, target: &[u8]) {
        self.failed = None;
        self.inner.seek(target)
    }

    fn seek_for_prev(&mut self, target: &[u8]) {
        self.failed = None;
        self.inner.seek_for_prev(target)
    }

    fn seek_to_first(&mut self) {
        self.failed = None;
        self.inner.seek_to_first()
    }

    fn seek_to_last(&mut self) {
        self.failed = None;
        self.inner.seek_to_last()
    }

    fn error(&self) -> Option<Error> {
        self.failed.clone()
    }
}
