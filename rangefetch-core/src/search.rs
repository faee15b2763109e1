use std::ops::Index;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::{ErrorPolicy, FetchConfig};
use crate::cursor::Cursor;
use crate::fetch::{bounded_fetch, Direction, KeyFilter};
use crate::page::ResultPage;
use crate::Error;

/// One independent sub-range query of a [`multi_range_search`].
///
/// An absent or empty `from` starts at the first key (or the last one when
/// `reverse`). Empty `prefix` / `end` do not constrain the scan, and
/// `limit <= 0` means no count limit.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RangeSpec {
    #[serde(with = "opt_bytes")]
    pub from: Option<Vec<u8>>,
    #[serde(with = "opt_bytes")]
    pub prefix: Option<Vec<u8>>,
    #[serde(with = "opt_bytes")]
    pub end: Option<Vec<u8>>,
    pub limit: i64,
    pub reverse: bool,
    /// skip `from` itself when the seek lands exactly on it
    pub exclude_from: bool,
}

impl RangeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_from(mut self, from: impl Into<Vec<u8>>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_end(mut self, end: impl Into<Vec<u8>>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn excluding_from(mut self, exclude_from: bool) -> Self {
        self.exclude_from = exclude_from;
        self
    }

    pub fn direction(&self) -> Direction {
        Direction::from_reverse(self.reverse)
    }

    fn from_key(&self) -> Option<&[u8]> {
        self.from.as_deref().filter(|f| !f.is_empty())
    }

    pub fn filter(&self) -> KeyFilter<'_> {
        KeyFilter::new(self.prefix.as_deref(), self.end.as_deref())
    }

    /// Put `cursor` where this spec's scan begins.
    pub fn position<C: Cursor + ?Sized>(&self, cursor: &mut C) {
        let direction = self.direction();
        let from = match self.from_key() {
            Some(from) => from,
            None => {
                match direction {
                    Direction::Forward => cursor.seek_to_first(),
                    Direction::Backward => cursor.seek_to_last(),
                }
                return;
            }
        };
        match direction {
            Direction::Forward => cursor.seek(from),
            Direction::Backward => cursor.seek_for_prev(from),
        }
        if self.exclude_from && cursor.valid() && cursor.key() == from {
            direction.step(cursor);
        }
    }
}

/// The pages of one [`multi_range_search`], one per spec and in spec order.
#[derive(Debug, Default)]
pub struct PageSet {
    pages: Vec<ResultPage>,
    error: Option<(usize, Error)>,
}

impl PageSet {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResultPage> {
        self.pages.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultPage> {
        self.pages.iter()
    }

    /// First error the cursor reported during the search, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref().map(|(_, e)| e)
    }

    /// Index of the spec after which that error was seen.
    pub fn failed_at(&self) -> Option<usize> {
        self.error.as_ref().map(|(i, _)| *i)
    }

    pub fn into_pages(self) -> Vec<ResultPage> {
        self.pages
    }

    /// Free every page at once.
    pub fn release(self) {
        for page in self.pages {
            page.release();
        }
    }
}

impl Index<usize> for PageSet {
    type Output = ResultPage;

    fn index(&self, index: usize) -> &Self::Output {
        &self.pages[index]
    }
}

impl IntoIterator for PageSet {
    type Item = ResultPage;
    type IntoIter = std::vec::IntoIter<ResultPage>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.into_iter()
    }
}

impl<'a> IntoIterator for &'a PageSet {
    type Item = &'a ResultPage;
    type IntoIter = std::slice::Iter<'a, ResultPage>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

/// Run every [`RangeSpec`] against one shared cursor.
///
/// Specs run one after another in input order; each one repositions the
/// cursor first, so a spec's result never depends on the specs before it.
/// An empty range is a normal empty page.
///
/// After each spec the cursor's error is checked. What happens next is
/// decided by [`FetchConfig::error_policy`]; either way the returned set has
/// exactly one page per spec and pages computed before the error stay
/// intact.
pub fn multi_range_search<C: Cursor + ?Sized>(
    cursor: &mut C,
    specs: &[RangeSpec],
    config: &FetchConfig,
) -> PageSet {
    let mut pages = Vec::with_capacity(specs.len());
    let mut error = None;

    for (i, spec) in specs.iter().enumerate() {
        spec.position(cursor);
        debug!(
            "search {i}: {:?} from {:?}, cursor valid: {}",
            spec.direction(),
            spec.from_key(),
            cursor.valid()
        );
        let page = bounded_fetch(
            cursor,
            spec.direction(),
            spec.limit,
            &spec.filter(),
            config.page_size(),
        );
        pages.push(page);

        if let Some(e) = cursor.error() {
            warn!("cursor failed while running search {i}: {e}");
            if error.is_none() {
                error = Some((i, e));
            }
            if config.error_policy() == ErrorPolicy::Abort {
                break;
            }
        }
    }

    // aborted early: the rest get empty pages
    pages.resize_with(specs.len(), || ResultPage::with_capacity(config.page_size()));
    PageSet { pages, error }
}

// `Option<Vec<u8>>` as either a JSON string or an array of byte values
mod opt_bytes {
    use serde::de::{self, SeqAccess, Visitor};
    use serde::{Deserializer, Serialize, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        value.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        d.deserialize_option(OptBytesVisitor)
    }

    struct OptBytesVisitor;

    impl<'de> Visitor<'de> for OptBytesVisitor {
        type Value = Option<Vec<u8>>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string, a byte array or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.as_bytes().to_vec()))
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
            Ok(Some(v.to_vec()))
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(b) = seq.next_element::<u8>()? {
                bytes.push(b);
            }
            Ok(Some(bytes))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::MemStore;

    fn store_with(keys: &[&str]) -> MemStore {
        keys.iter().map(|k| (*k, format!("val_{k}"))).collect()
    }

    fn keys_of(page: &ResultPage) -> Vec<String> {
        page.keys()
            .into_iter()
            .map(|k| String::from_utf8(k.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn search_keys() {
        let store = store_with(&["A", "B", "C", "D", "E", "F"]);
        let mut cursor = store.cursor();
        let specs = [
            RangeSpec::new().with_from("A").with_limit(1000),
            RangeSpec::new().with_from("D").with_limit(1000),
            RangeSpec::new().with_from("Z").with_limit(1000),
        ];
        let result = multi_range_search(&mut cursor, &specs, &FetchConfig::default());
        assert_eq!(result.len(), specs.len());
        assert!(result.error().is_none());
        assert_eq!(result[0].found(), 6);
        assert_eq!(keys_of(&result[0]), ["A", "B", "C", "D", "E", "F"]);
        assert_eq!(result[0].get(5), Some((&b"F"[..], &b"val_F"[..])));
        assert_eq!(keys_of(&result[1]), ["D", "E", "F"]);
        assert_eq!(result[2].found(), 0);
        assert!(result[2].values().is_empty());
        result.release();
    }

    #[test]
    fn search_order_independent() {
        let store = store_with(&["A", "B", "C", "D", "E", "F"]);
        let mut cursor = store.cursor();
        let specs = [
            RangeSpec::new().with_from("Z"),
            RangeSpec::new().with_from("D"),
            RangeSpec::new().with_from("A"),
        ];
        let result = multi_range_search(&mut cursor, &specs, &FetchConfig::default());
        let keys: Vec<_> = result.iter().map(keys_of).collect();
        assert_eq!(
            keys,
            vec![
                vec![],
                vec!["D", "E", "F"],
                vec!["A", "B", "C", "D", "E", "F"]
            ]
        );
    }

    #[test]
    fn search_with_prefix() {
        let store = store_with(&["A1", "A2", "B1", "C1", "D1", "D2"]);
        let mut cursor = store.cursor();
        let specs: Vec<_> = ["A", "B", "D", "Z"]
            .into_iter()
            .map(|p| RangeSpec::new().with_from(p).with_prefix(p).with_limit(1000))
            .collect();
        let result = multi_range_search(&mut cursor, &specs, &FetchConfig::default());
        let keys: Vec<_> = result.iter().map(keys_of).collect();
        assert_eq!(
            keys,
            vec![vec!["A1", "A2"], vec!["B1"], vec!["D1", "D2"], vec![]]
        );
    }

    #[test]
    fn search_with_end() {
        let store = store_with(&["A1", "A2", "A3", "B1", "B2", "B3"]);
        let mut cursor = store.cursor();
        let specs = [
            RangeSpec::new().with_from("A").with_end("A3"),
            RangeSpec::new().with_from("B").with_end("B2"),
        ];
        let result = multi_range_search(&mut cursor, &specs, &FetchConfig::default());
        assert_eq!(keys_of(&result[0]), ["A1", "A2"]);
        assert_eq!(keys_of(&result[1]), ["B1"]);
    }

    #[test]
    fn search_with_prefix_and_end() {
        let store = store_with(&["keyC", "keyC0", "keyC1"]);
        let mut cursor = store.cursor();
        let specs = [
            RangeSpec::new()
                .with_from("keyC0")
                .with_prefix("keyC")
                .with_end("keyC1"),
            RangeSpec::new()
                .with_from("k")
                .with_prefix("keyC")
                .with_end("keyC1"),
        ];
        let result = multi_range_search(&mut cursor, &specs, &FetchConfig::default());
        assert_eq!(keys_of(&result[0]), ["keyC0"]);
        assert_eq!(keys_of(&result[1]), ["keyC", "keyC0"]);
    }

    #[test]
    fn search_exclude_from() {
        let store = store_with(&["A", "B", "C", "D", "E", "F"]);
        let mut cursor = store.cursor();
        let specs = [
            RangeSpec::new().with_from("A").excluding_from(true),
            RangeSpec::new().with_from("A").excluding_from(false),
            // not an exact hit: nothing to skip
            RangeSpec::new().with_from("BB").excluding_from(true),
            RangeSpec::new().with_from("D").excluding_from(true).reversed(true),
            // no `from`: exclusion does nothing
            RangeSpec::new().excluding_from(true).with_limit(2),
        ];
        let result = multi_range_search(&mut cursor, &specs, &FetchConfig::default());
        assert_eq!(keys_of(&result[0]), ["B", "C", "D", "E", "F"]);
        assert_eq!(keys_of(&result[1]), ["A", "B", "C", "D", "E", "F"]);
        assert_eq!(keys_of(&result[2]), ["C", "D", "E", "F"]);
        assert_eq!(keys_of(&result[3]), ["C", "B", "A"]);
        assert_eq!(keys_of(&result[4]), ["A", "B"]);
    }

    #[test]
    fn search_reverse() {
        let store = store_with(&["A", "B", "C", "C11", "C12", "D"]);
        let mut cursor = store.cursor();
        let specs = [
            RangeSpec::new().reversed(true).with_end("C1"),
            RangeSpec::new().reversed(true).with_from("C2").with_limit(2),
            RangeSpec::new().reversed(true).with_from("0"),
        ];
        let result = multi_range_search(&mut cursor, &specs, &FetchConfig::default());
        assert_eq!(keys_of(&result[0]), ["D", "C12", "C11"]);
        assert_eq!(keys_of(&result[1]), ["C12", "C11"]);
        assert_eq!(result[2].found(), 0);
    }

    #[test]
    fn search_empty_from_means_absent() {
        let store = store_with(&["A", "B"]);
        let mut cursor = store.cursor();
        let specs = [RangeSpec::new().with_from("").excluding_from(true)];
        let result = multi_range_search(&mut cursor, &specs, &FetchConfig::default());
        assert_eq!(keys_of(&result[0]), ["A", "B"]);
    }

    #[test]
    fn search_no_specs() {
        let store = store_with(&["A"]);
        let mut cursor = store.cursor();
        let result = multi_range_search(&mut cursor, &[], &FetchConfig::default());
        assert!(result.is_empty());
        assert!(result.into_pages().is_empty());
    }

    #[test]
    fn range_spec_json() {
        let spec: RangeSpec = serde_json::from_str(
            r#"{"from": "keyC0", "prefix": [107, 101, 121], "end": null, "limit": 10, "reverse": true}"#,
        )
        .unwrap();
        assert_eq!(spec.from.as_deref(), Some(&b"keyC0"[..]));
        assert_eq!(spec.prefix.as_deref(), Some(&b"key"[..]));
        assert_eq!(spec.end, None);
        assert_eq!(spec.limit, 10);
        assert_eq!(spec.direction(), Direction::Backward);
        assert!(!spec.exclude_from);

        let spec: RangeSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec, RangeSpec::default());

        let spec = RangeSpec::new().with_from("a").with_end(vec![0xff_u8]);
        let json = serde_json::to_string(&spec).unwrap();
        let back: RangeSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);

        assert!(serde_json::from_str::<RangeSpec>(r#"{"from": 12}"#).is_err());
    }
}
