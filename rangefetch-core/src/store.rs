use log::debug;

use crate::batch::{OpType, WriteBatch};
use crate::cursor::Cursor;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included, Unbounded};

/// An in memory sorted key-value store.
///
/// Deletes remove the key outright; there is nothing older underneath that
/// a tombstone would need to shadow.
#[derive(Default, Debug, Clone)]
pub struct MemStore {
    table: BTreeMap<Vec<u8>, Vec<u8>>,
    // approx size in bytes
    approx_size: usize,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            table: BTreeMap::new(),
            approx_size: 0,
        }
    }

    /// Open a cursor over the store. It starts out invalid; position it
    /// with one of the seek methods.
    pub fn cursor(&self) -> MemCursor<'_> {
        MemCursor {
            table: &self.table,
            current: None,
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.table.get(key).map(|v| v.as_slice())
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.insert(key.to_vec(), value.to_vec());
    }

    pub fn del(&mut self, key: &[u8]) {
        if let Some(old) = self.table.remove(key) {
            self.approx_size -= key.len() + old.len();
        }
    }

    /// Apply every operation of `batch`.
    ///
    /// The batch is fully decoded before anything is applied, so a corrupt
    /// batch leaves the store untouched.
    pub fn write_batch(&mut self, batch: &WriteBatch) -> Result<()> {
        // the header count is untrusted until every op has decoded
        let mut ops = Vec::new();
        let mut batch_iter = batch.iter()?;
        while let Some(op) = batch_iter.next()? {
            ops.push(op);
        }
        debug!("apply write batch of {} ops", ops.len());

        for (op, k, v) in ops {
            match op {
                OpType::Put => self.insert(k.to_vec(), v.to_vec()),
                OpType::Del => self.del(k),
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Sum of key and value lengths currently held.
    pub fn approx_size(&self) -> usize {
        self.approx_size
    }

    fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) {
        let key_len = key.len();
        self.approx_size += key_len + value.len();
        if let Some(old) = self.table.insert(key, value) {
            self.approx_size -= key_len + old.len();
        }
    }
}

impl<K, V> FromIterator<(K, V)> for MemStore
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = MemStore::new();
        for (k, v) in iter {
            store.put(k.as_ref(), v.as_ref());
        }
        store
    }
}

/// Bidirectional cursor over a [`MemStore`].
///
/// Every step is a fresh range lookup from the current key, so moving in
/// either direction costs O(log n).
pub struct MemCursor<'a> {
    table: &'a BTreeMap<Vec<u8>, Vec<u8>>,
    current: Option<(&'a [u8], &'a [u8])>,
}

impl<'a> MemCursor<'a> {
    fn set_current(&mut self, entry: Option<(&'a Vec<u8>, &'a Vec<u8>)>) {
        self.current = entry.map(|(k, v)| (k.as_slice(), v.as_slice()));
    }

    fn current(&self) -> (&'a [u8], &'a [u8]) {
        match self.current {
            Some(entry) => entry,
            None => panic!("access to key/value of an invalid cursor"),
        }
    }
}

impl<'a> Cursor for MemCursor<'a> {
    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        self.current().0
    }

    fn value(&self) -> &[u8] {
        self.current().1
    }

    fn next(&mut self) {
        let (key, _) = self.current();
        let entry = self
            .table
            .range::<[u8], _>((Excluded(key), Unbounded))
            .next();
        self.set_current(entry);
    }

    fn prev(&mut self) {
        let (key, _) = self.current();
        let entry = self
            .table
            .range::<[u8], _>((Unbounded, Excluded(key)))
            .next_back();
        self.set_current(entry);
    }

    fn seek(&mut self, target: &[u8]) {
        let entry = self
            .table
            .range::<[u8], _>((Included(target), Unbounded))
            .next();
        self.set_current(entry);
    }

    fn seek_for_prev(&mut self, target: &[u8]) {
        let entry = self
            .table
            .range::<[u8], _>((Unbounded, Included(target)))
            .next_back();
        self.set_current(entry);
    }

    fn seek_to_first(&mut self) {
        let entry = self.table.iter().next();
        self.set_current(entry);
    }

    fn seek_to_last(&mut self) {
        let entry = self.table.iter().next_back();
        self.set_current(entry);
    }

    fn error(&self) -> Option<Error> {
        None
    }
}
