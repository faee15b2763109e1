#![allow(dead_code)]

use rand::prelude::StdRng;
use rand::{Rng, SeedableRng};
use rangefetch_core::{MemStore, ResultPage};
use std::collections::BTreeSet;

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn keys_of(page: &ResultPage) -> Vec<String> {
    rangefetch_tests::to_strings(page.keys())
}

/// `n` random keys over the alphabet `abcd` so that many share prefixes,
/// stored with value `val_<key>`. Returns the store and its sorted keys.
pub fn random_store(seed: u64, n: usize) -> (MemStore, Vec<String>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut store = MemStore::new();
    let mut keys = BTreeSet::new();
    for _ in 0..n {
        let len = rng.gen_range(1..6);
        let key: String = (0..len)
            .map(|_| char::from(b'a' + rng.gen_range(0..4)))
            .collect();
        store.put(key.as_bytes(), format!("val_{key}").as_bytes());
        keys.insert(key);
    }
    (store, keys.into_iter().collect())
}
