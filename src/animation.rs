//! Terminal typing animation.
//!
//! The pieces are pure state machines that produce display frames and
//! waits; `player` drives them against the clock and pushes frames to a
//! client. Nothing here knows about HTML or ANSI.

pub mod cycler;
pub mod player;
pub mod reveal;
pub mod skip;

pub use cycler::{CyclePhase, CycleStep, CycleStyle, CycleTiming, InterestCycler, InterestRotation};
pub use reveal::RevealScheduler;
pub use skip::{RevealPlan, SkipController, SkipPreference, SkipTransition};

use serde::Serialize;
use std::time::Duration;

/// A display change. Block and segment numbers refer to the page's
/// document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Block becomes visible with empty text. `cursor` is set when the
    /// block shows the typing cursor while it is being revealed.
    BlockStart { block: usize, cursor: bool },
    /// Current prefix of one segment of the active block
    Segment { block: usize, segment: usize, text: String },
    /// Block reached its full text; its typing cursor goes away
    BlockDone { block: usize },
    /// Block rendered at full text in one go, no cursor
    Full { block: usize, segments: Vec<String> },
    /// All blocks are shown. `cursor_block` gets the blinking cursor.
    Finished { cursor_block: Option<usize> },
    /// Cycler display state for the slot at `(block, segment)`
    Word {
        block: usize,
        segment: usize,
        text: String,
        phase: CyclePhase,
    },
}

/// One step of a reveal: either show something right now or wait one
/// character delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Frame(Frame),
    Tick,
}

/// Timings for a page view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationConfig {
    /// Delay after each revealed character
    pub char_delay: Duration,
    pub cycle_style: CycleStyle,
    pub cycle: CycleTiming,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            char_delay: Duration::from_millis(5),
            cycle_style: CycleStyle::Fade,
            cycle: CycleTiming::for_style(CycleStyle::Fade),
        }
    }
}
