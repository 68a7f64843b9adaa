//! # Task options.
//!
//! [`TaskOptions`] configures one controller: the admission mode and the
//! concurrency bound.
//!
//! ## Sentinel values
//! - `max_concurrency = Some(0)` means explicitly unbounded.
//! - With a mode set and no explicit bound, the bound defaults to 1 (the
//!   policy modes only make sense against a saturation point).
//! - With neither set, the queue is unbounded and admission is plain FIFO.

use super::admission::AdmissionMode;

/// Admission configuration for a [`TaskController`](crate::TaskController).
///
/// Prefer the accessors over reading fields: they resolve the sentinel
/// defaults documented above.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskOptions {
    /// Admission mode; `None` falls back to [`AdmissionMode::Enqueue`].
    pub mode: Option<AdmissionMode>,

    /// Concurrency bound; `None` derives from `mode` (see module docs),
    /// `Some(0)` is explicitly unbounded.
    pub max_concurrency: Option<usize>,
}

impl TaskOptions {
    /// Options with the given mode and the default bound for it.
    pub fn new(mode: AdmissionMode) -> Self {
        Self {
            mode: Some(mode),
            max_concurrency: None,
        }
    }

    /// Overrides the concurrency bound (`0` = unbounded).
    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    /// The admission mode to apply.
    #[inline]
    pub fn effective_mode(&self) -> AdmissionMode {
        self.mode.unwrap_or_default()
    }

    /// The queue bound to construct (`0` = unbounded).
    ///
    /// An explicit bound always wins; otherwise a configured mode forces a
    /// bound of 1, and a fully default configuration is unbounded.
    #[inline]
    pub fn effective_limit(&self) -> usize {
        match (self.max_concurrency, self.mode) {
            (Some(limit), _) => limit,
            (None, Some(_)) => 1,
            (None, None) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded_enqueue() {
        let opts = TaskOptions::default();
        assert_eq!(opts.effective_mode(), AdmissionMode::Enqueue);
        assert_eq!(opts.effective_limit(), 0);
    }

    #[test]
    fn test_mode_forces_bound_of_one() {
        let opts = TaskOptions::new(AdmissionMode::Restartable);
        assert_eq!(opts.effective_mode(), AdmissionMode::Restartable);
        assert_eq!(opts.effective_limit(), 1);
    }

    #[test]
    fn test_explicit_bound_wins() {
        let opts = TaskOptions::new(AdmissionMode::Enqueue).max_concurrency(4);
        assert_eq!(opts.effective_limit(), 4);

        let unbounded = TaskOptions::new(AdmissionMode::Drop).max_concurrency(0);
        assert_eq!(unbounded.effective_limit(), 0);
    }
}
