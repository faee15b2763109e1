use std::ops::Range;

/// Entry capacity of a fresh page when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 512;

// most entry slots reserved up front; past this the slot table grows as
// entries arrive
const MAX_PREALLOC_SLOTS: usize = 4096;

// offsets of one entry inside `ResultPage::data`
#[derive(Debug, Clone, Copy)]
struct Slot {
    key_off: usize,
    key_len: usize,
    value_len: usize,
}

impl Slot {
    fn key(&self) -> Range<usize> {
        self.key_off..self.key_off + self.key_len
    }

    fn value(&self) -> Range<usize> {
        let value_off = self.key_off + self.key_len;
        value_off..value_off + self.value_len
    }
}

/// The (key, value) pairs matched by one fetch call, in scan order.
///
/// Keys and values are copied out of the cursor into one contiguous
/// buffer owned by the page; each entry only records offsets into it. The
/// entry table has an explicit `capacity` that starts at the requested
/// page size and doubles whenever it fills up.
///
/// A page never borrows from the cursor or from another page, so it can be
/// kept, dropped or [released](ResultPage::release) independently of any
/// later fetch on the same cursor.
#[derive(Debug, Clone)]
pub struct ResultPage {
    data: Vec<u8>,
    slots: Vec<Slot>,
    capacity: usize,
}

impl Default for ResultPage {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_PAGE_SIZE)
    }
}

impl ResultPage {
    /// `page_size == 0` falls back to [`DEFAULT_PAGE_SIZE`].
    pub fn with_capacity(page_size: usize) -> Self {
        let capacity = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        Self {
            data: Vec::new(),
            slots: Vec::with_capacity(capacity.min(MAX_PREALLOC_SLOTS)),
            capacity,
        }
    }

    /// copy `key` and `value` to the end of the page
    pub fn append(&mut self, key: &[u8], value: &[u8]) {
        if self.slots.len() == self.capacity {
            self.grow();
        }
        let key_off = self.data.len();
        self.data.reserve(key.len() + value.len());
        self.data.extend_from_slice(key);
        self.data.extend_from_slice(value);
        self.slots.push(Slot {
            key_off,
            key_len: key.len(),
            value_len: value.len(),
        });
    }

    fn grow(&mut self) {
        self.capacity = self.capacity.saturating_mul(2);
        self.slots.reserve_exact(self.capacity - self.slots.len());
    }

    /// number of entries appended so far
    pub fn found(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// current entry capacity; doubles each time it is exceeded
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> Option<(&[u8], &[u8])> {
        self.slots.get(index).map(|slot| self.entry(slot))
    }

    pub fn keys(&self) -> Vec<&[u8]> {
        self.slots.iter().map(|slot| &self.data[slot.key()]).collect()
    }

    pub fn values(&self) -> Vec<&[u8]> {
        self.slots
            .iter()
            .map(|slot| &self.data[slot.value()])
            .collect()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            page: self,
            slots: self.slots.iter(),
        }
    }

    /// Visit `(index, key, value)` in order until `visitor` returns false.
    ///
    /// Returns true only if every entry was visited.
    pub fn for_each<F>(&self, mut visitor: F) -> bool
    where
        F: FnMut(usize, &[u8], &[u8]) -> bool,
    {
        for (i, (key, value)) in self.iter().enumerate() {
            if !visitor(i, key, value) {
                return false;
            }
        }
        true
    }

    pub fn into_entries(self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.iter().map(|(k, v)| (k.to_vec(), v.to_vec())).collect()
    }

    /// Free the page's storage. The page is consumed, so nothing can read
    /// it afterwards.
    pub fn release(self) {
        drop(self)
    }

    fn entry(&self, slot: &Slot) -> (&[u8], &[u8]) {
        (&self.data[slot.key()], &self.data[slot.value()])
    }
}

pub struct Iter<'a> {
    page: &'a ResultPage,
    slots: std::slice::Iter<'a, Slot>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let page = self.page;
        self.slots.next().map(|slot| page.entry(slot))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<'a> DoubleEndedIterator for Iter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let page = self.page;
        self.slots.next_back().map(|slot| page.entry(slot))
    }
}

impl<'a> ExactSizeIterator for Iter<'a> {}

impl<'a> IntoIterator for &'a ResultPage {
    type Item = (&'a [u8], &'a [u8]);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
