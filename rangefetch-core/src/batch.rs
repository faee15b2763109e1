use crate::Error;
use crate::Result;

const U32_LEN: usize = std::mem::size_of::<u32>();

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum OpType {
    Put = 1,
    Del,
}

// keys and values are length-prefixed with a u32
fn check_len(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| Error::Internal(format!("{len} bytes is too long for a write batch entry")))
}

fn encode_bytes(src: &[u8], length: u32, target: &mut Vec<u8>) {
    target.extend_from_slice(&length.to_le_bytes());
    target.extend_from_slice(src);
}

fn decode_u32(src: &[u8]) -> Result<u32> {
    match src.get(..U32_LEN) {
        Some(b) => Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(Error::Corrupt("buf length not enough for u32".to_owned())),
    }
}

// decode a byte array from src, return (decoded bytes, consumed byte size)
fn decode_bytes(src: &[u8]) -> Result<(&[u8], usize)> {
    let length = decode_u32(src)? as usize;
    match src.get(U32_LEN..U32_LEN + length) {
        Some(bytes) => Ok((bytes, U32_LEN + length)),
        None => Err(Error::Corrupt(format!(
            "buf length not enough for {length} bytes"
        ))),
    }
}

impl OpType {
    pub fn encode(self, buf: &mut Vec<u8>) {
        buf.push(self as u8);
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        match buf.first() {
            Some(1) => Ok(Self::Put),
            Some(2) => Ok(Self::Del),
            Some(val) => Err(Error::Corrupt(format!("Unknown op type: {val}"))),
            None => Err(Error::Corrupt(
                "buf length not enough for OpType".to_owned(),
            )),
        }
    }
}

// each entry in batch is
// [OpType: 1B] [Key length 4B] [Key] [Value length 4B] [Value]
// (deletes carry no value part) and the whole batch is:
// [Entry Num: 4B] [Entry1] [Entry2] ... [Entryn]

/// A batch of put / delete operations applied to a
/// [`MemStore`](crate::MemStore) all at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    data: Vec<u8>,
}

impl Default for WriteBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteBatch {
    pub fn new() -> Self {
        Self {
            data: vec![0_u8; U32_LEN],
        }
    }

    /// Keys and values longer than `u32::MAX` bytes are rejected and leave
    /// the batch unchanged.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let count = self.next_count()?;
        let key_len = check_len(key.len())?;
        let value_len = check_len(value.len())?;

        OpType::Put.encode(&mut self.data);
        encode_bytes(key, key_len, &mut self.data);
        encode_bytes(value, value_len, &mut self.data);
        self.set_count(count);
        Ok(())
    }

    /// Append one put per (key, value) pair.
    ///
    /// Fails without touching the batch when the two slices differ in length
    /// or any entry is too long.
    pub fn put_many<K, V>(&mut self, keys: &[K], values: &[V]) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        if keys.len() != values.len() {
            return Err(Error::Internal(format!(
                "put_many got {} keys but {} values",
                keys.len(),
                values.len()
            )));
        }
        for (key, value) in keys.iter().zip(values) {
            check_len(key.as_ref().len())?;
            check_len(value.as_ref().len())?;
        }
        let total = u32::try_from(keys.len())
            .ok()
            .and_then(|n| self.count().checked_add(n));
        if total.is_none() {
            return Err(Error::Internal("too many operations in write batch".to_owned()));
        }
        for (key, value) in keys.iter().zip(values) {
            self.put(key.as_ref(), value.as_ref())?;
        }
        Ok(())
    }

    pub fn del(&mut self, key: &[u8]) -> Result<()> {
        let count = self.next_count()?;
        let key_len = check_len(key.len())?;

        OpType::Del.encode(&mut self.data);
        encode_bytes(key, key_len, &mut self.data);
        self.set_count(count);
        Ok(())
    }

    fn next_count(&self) -> Result<u32> {
        self.count()
            .checked_add(1)
            .ok_or_else(|| Error::Internal("too many operations in write batch".to_owned()))
    }

    /// number of operations in the batch
    pub fn count(&self) -> u32 {
        decode_u32(&self.data).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn clear(&mut self) {
        self.data.truncate(U32_LEN);
        self.set_count(0);
    }

    fn set_count(&mut self, num: u32) {
        if self.data.len() < U32_LEN {
            self.data.resize(U32_LEN, 0);
        }
        self.data[..U32_LEN].copy_from_slice(&num.to_le_bytes());
    }

    pub(crate) fn iter(&self) -> Result<WriteBatchIter<'_>> {
        let total = decode_u32(&self.data)?;
        Ok(WriteBatchIter {
            data: &self.data[U32_LEN..],
            pos: 0,
            total,
        })
    }

    /// return the raw bytes of WriteBatch
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Wrap bytes produced by [`WriteBatch::data`]. They are validated when
    /// the batch is applied.
    pub fn from_raw(data: Vec<u8>) -> Self {
        Self { data }
    }
}

pub(crate) struct WriteBatchIter<'a> {
    data: &'a [u8],
    pos: u32,
    total: u32,
}

impl<'a> WriteBatchIter<'a> {
    /// return (op_type, key, value)
    pub fn next(&mut self) -> Result<Option<(OpType, &'a [u8], &'a [u8])>> {
        if self.pos >= self.total {
            return Ok(None);
        }

        let data = self.data;
        match OpType::decode(data)? {
            OpType::Put => {
                let (key, consume_size) = decode_bytes(&data[1..])?;
                let rest = &data[1 + consume_size..];
                let (value, consume_size) = decode_bytes(rest)?;
                self.data = &rest[consume_size..];

                self.pos += 1;
                Ok(Some((OpType::Put, key, value)))
            }
            OpType::Del => {
                let (key, consume_size) = decode_bytes(&data[1..])?;
                self.data = &data[1 + consume_size..];
                self.pos += 1;
                Ok(Some((OpType::Del, key, &[])))
            }
        }
    }
}
