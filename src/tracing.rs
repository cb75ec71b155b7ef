/// Optional record of what the matcher decided and where. Compiled in
/// only under the `tracing` feature; without it `record` is a no-op the
/// optimiser deletes, so the matcher can call it unconditionally.
/// The log is process-wide; `take_log` hands the accumulated steps over
/// and clears it.

/// One decision point in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A focus was consumed and the whole pattern discharged; the
    /// leftover heap had this many spatial conjuncts.
    Commit { leftover : usize },
    /// A possibly-empty pattern segment collapsed against nothing.
    EmptyCollapse,
    /// A pattern segment was unfolded into its parameter body, minting
    /// this many fresh existentials.
    Unfold { fresh_evars : usize },
    /// A consumed-focus branch failed and the search moved the focus on.
    Backtrack,
}

#[cfg(feature = "tracing")]
pub use self::enabled::{ record, take_log };

#[cfg(feature = "tracing")]
mod enabled {
    use super::Step;

    use once_cell::sync::Lazy;
    use parking_lot::RwLock;

    pub static MATCH_LOG : Lazy<RwLock<Vec<Step>>> = Lazy::new(|| {
        RwLock::new(Vec::with_capacity(256))
    });

    pub fn record(step : Step) {
        MATCH_LOG.write().push(step);
    }

    /// Hands over everything recorded so far and resets the log.
    pub fn take_log() -> Vec<Step> {
        std::mem::replace(&mut *MATCH_LOG.write(), Vec::new())
    }
}

#[cfg(not(feature = "tracing"))]
pub fn record(_step : Step) {}
