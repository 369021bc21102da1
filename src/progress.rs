//! Progress reporting for nestarc commands.
//!
//! Commands run single-threaded and report per-entry progress through a
//! caller-supplied synchronous callback. The callback is side-effect-only:
//! nothing in a command's control flow depends on what the sink does.

/// Why a callback is being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackReason {
    /// An entry is about to be processed.
    Progress,
}

/// A progress-report value delivered once per processed entry.
#[derive(Debug, Clone)]
pub struct CallbackFacts {
    pub reason: CallbackReason,
    /// Full path of the entry being processed.
    pub path: String,
    /// The owning container's directory separator.
    pub separator: char,
    /// Completion percentage, 0..=100.
    pub percent: u32,
}

impl CallbackFacts {
    pub fn progress(path: &str, separator: char, percent: u32) -> Self {
        Self {
            reason: CallbackReason::Progress,
            path: path.to_string(),
            separator,
            percent,
        }
    }
}

/// Progress callback function type.
pub type ProgressSink<'a> = dyn Fn(&CallbackFacts) + 'a;
