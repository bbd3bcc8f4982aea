use crate::animation::reveal::RevealScheduler;
use crate::animation::{Frame, Step};
use crate::models::ContentBlock;
use serde::{Deserialize, Serialize};

/// The `skipTyping` flag. Clients persist it (cookie, session) and hand
/// it back on every page view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkipPreference(bool);

impl SkipPreference {
    pub const fn new(skip: bool) -> Self {
        Self(skip)
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.0
    }

    pub fn toggled(self) -> Self {
        Self(!self.0)
    }

    /// Read a stored value. Only the literal `true` turns skipping on.
    pub fn from_stored(value: Option<&str>) -> Self {
        Self(matches!(value.map(str::trim), Some("true")))
    }

    pub fn as_stored(&self) -> &'static str {
        if self.0 { "true" } else { "false" }
    }
}

/// What a page view runs before the cycler takes over.
#[derive(Debug)]
pub enum RevealPlan {
    Animate(RevealScheduler),
    Instant(std::vec::IntoIter<Frame>),
}

impl Iterator for RevealPlan {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        match self {
            RevealPlan::Animate(sched) => sched.next(),
            RevealPlan::Instant(frames) => frames.next().map(Step::Frame),
        }
    }
}

/// Outcome of flipping the preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipTransition {
    /// Skipping was switched on: show these frames now and hand over to the cycler
    RenderAll(Vec<Frame>),
    /// Skipping was switched off: start the page view again from the first block
    Restart,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SkipController {
    pref: SkipPreference,
}

impl SkipController {
    pub fn new(pref: SkipPreference) -> Self {
        Self { pref }
    }

    pub fn preference(&self) -> SkipPreference {
        self.pref
    }

    /// Decide once per page view whether the reveal runs at all.
    pub fn plan(&self, blocks: &[ContentBlock]) -> RevealPlan {
        if self.pref.is_on() {
            RevealPlan::Instant(render_all(blocks).into_iter())
        } else {
            RevealPlan::Animate(RevealScheduler::new(blocks))
        }
    }

    pub fn toggle(&mut self, blocks: &[ContentBlock]) -> SkipTransition {
        self.pref = self.pref.toggled();
        if self.pref.is_on() {
            SkipTransition::RenderAll(render_all(blocks))
        } else {
            SkipTransition::Restart
        }
    }
}

/// Every block at full text, no intermediate state, no typing cursor.
pub fn render_all(blocks: &[ContentBlock]) -> Vec<Frame> {
    let mut sorted: Vec<&ContentBlock> = blocks.iter().collect();
    sorted.sort_by_key(|b| b.order);

    let cursor_block = sorted.last().filter(|b| b.is_prompt()).map(|b| b.order);

    let mut frames: Vec<Frame> = sorted
        .into_iter()
        .map(|b| Frame::Full {
            block: b.order,
            segments: b.segments.iter().map(|s| s.text.clone()).collect(),
        })
        .collect();
    frames.push(Frame::Finished { cursor_block });
    frames
}
