use std::fmt;
use std::path::PathBuf;

use crate::error::CallbackError;
use crate::stack::DirStack;

/// Running totals of a walk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WalkStats {
    /// Items yielded so far, directories included.
    pub count: u64,
    /// Sum of the sizes of yielded non-directories.
    pub bytes: u64,
    /// Directory holding the most recently yielded item.
    pub current_dir: PathBuf,
    /// Entries that could not be opened, inspected or listed.
    pub errors: u64,
}

/// Progress callback invoked with the walker's position and totals.
///
/// Caller state travels in the closure's captures.
pub type ProgressCallback = Box<dyn FnMut(&DirStack, &WalkStats) -> Result<(), CallbackError> + Send>;

pub(crate) struct Reporting {
    increment: u64,
    callback: ProgressCallback,
}

impl Reporting {
    pub(crate) fn new(increment: u64, callback: ProgressCallback) -> Self {
        Self {
            increment,
            callback,
        }
    }

    /// Returns `true` when the periodic call is due for `count` items.
    pub(crate) const fn is_due(&self, count: u64) -> bool {
        self.increment != 0 && count % self.increment == 0
    }

    pub(crate) fn call(&mut self, stack: &DirStack, stats: &WalkStats) -> Result<(), CallbackError> {
        (self.callback)(stack, stats)
    }
}

impl fmt::Debug for Reporting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporting")
            .field("increment", &self.increment)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_increment_disables_periodic_calls() {
        let reporting = Reporting::new(0, Box::new(|_, _| Ok(())));
        assert!(!reporting.is_due(0));
        assert!(!reporting.is_due(10));
    }

    #[test]
    fn periodic_calls_fire_on_multiples() {
        let reporting = Reporting::new(3, Box::new(|_, _| Ok(())));
        let due: Vec<u64> = (1..=7).filter(|&count| reporting.is_due(count)).collect();
        assert_eq!(due, vec![3, 6]);
    }

    #[test]
    fn call_forwards_callback_errors() {
        let mut reporting = Reporting::new(1, Box::new(|_, stats| {
            if stats.count > 1 {
                Err("too many".into())
            } else {
                Ok(())
            }
        }));
        let mut stats = WalkStats {
            count: 1,
            ..WalkStats::default()
        };
        assert!(reporting.call(&DirStack::default(), &stats).is_ok());
        stats.count = 2;
        let error = reporting.call(&DirStack::default(), &stats).expect_err("callback error");
        assert_eq!(error.to_string(), "too many");
    }
}
