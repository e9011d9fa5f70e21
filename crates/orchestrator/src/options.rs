use platform_core::Selectors;

use crate::error::Result;

/// Options for a single orchestrator invocation.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Maximum number of items processed at once; values below 1 mean 1.
    pub concurrency: i64,
    /// Criteria narrowing the collection; empty selects everything.
    pub selectors: Selectors,
    /// Log per-item and aggregate timings at INFO instead of DEBUG.
    pub verbose: bool,
}

impl ExecuteOptions {
    pub fn new(concurrency: i64) -> Self {
        Self {
            concurrency,
            selectors: Selectors::default(),
            verbose: false,
        }
    }

    pub fn with_concurrency(mut self, concurrency: i64) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Parse raw criteria into the selector set.
    pub fn with_selector_strs<I, S>(self, raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selectors = Selectors::parse(raw)?;
        Ok(self.with_selectors(selectors))
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The effective concurrency limit.
    pub fn limit(&self) -> usize {
        usize::try_from(self.concurrency.max(1)).unwrap_or(usize::MAX)
    }
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(i64::try_from(parallelism).unwrap_or(1))
    }
}
