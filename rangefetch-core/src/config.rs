use crate::page::DEFAULT_PAGE_SIZE;

/// Largest `page_size` a loaded config may ask for.
pub const MAX_PAGE_SIZE: usize = 1 << 20;
use crate::{Error, Result};
use log::debug;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// What a multi-range search does once the cursor reports an error.
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// record the first error and keep running the remaining specs
    #[default]
    Continue,
    /// stop; remaining specs get empty pages
    Abort,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// initial entry capacity of every result page
    pub page_size: usize,
    pub error_policy: ErrorPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl FetchConfig {
    pub fn from_slice(buf: &[u8]) -> Result<Self> {
        let config: FetchConfig = serde_json::from_slice(buf)
            .map_err(|e| Error::Config(format!("cannot deserialize FetchConfig: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader<R: Read>(mut r: R) -> Result<Self> {
        let mut buf = vec![];
        map_io_res!(r.read_to_end(&mut buf))?;
        Self::from_slice(&buf)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = map_io_res!(File::open(path.as_ref()))?;
        let config = Self::from_reader(f)?;
        debug!("load fetch config from {:?}: {config:?}", path.as_ref());
        Ok(config)
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be positive".to_owned()));
        }
        if self.page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "page_size {} exceeds the maximum of {MAX_PAGE_SIZE}",
                self.page_size
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[inline]
    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }
}
