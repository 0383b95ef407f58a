//! Session replay: rebuilds an ordered timeline, page-by-page journey, and
//! engagement summary from one session's raw events.

pub mod reconstructor;

pub use reconstructor::{
    PageJourneyEntry, SessionEngagement, SessionReconstructor, SessionReplay, TimelineEvent,
};
