use std::io;
use std::sync::Arc;

#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error("io error: {0}")]
    IO(Arc<io::Error>),
    #[error("data corrupt: {0}")]
    Corrupt(String),
    #[error("config error: {0}")]
    Config(String),
    /// reported by a store cursor through `Cursor::error()`
    #[error("cursor error: {0}")]
    Cursor(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::IO(Arc::new(value))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! map_io_res {
    ($result:expr) => {
        match $result {
            Ok(v) => Ok(v),
            Err(e) => Err(Error::IO(std::sync::Arc::new(e))),
        }
    };
}
