use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::str::FromStr;
use std::time::Duration;

/// Fixed cyclic word list with a cursor that only moves forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestRotation {
    words: Vec<String>,
    current: usize,
}

impl InterestRotation {
    /// `None` for an empty list; there is nothing to cycle through.
    pub fn new(words: Vec<String>) -> Option<Self> {
        Self::starting_at(words, 0)
    }

    pub fn starting_at(words: Vec<String>, index: usize) -> Option<Self> {
        if words.is_empty() {
            return None;
        }
        let current = index % words.len();
        Some(Self { words, current })
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &str {
        &self.words[self.current]
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Move to the next word, wrapping at the end.
    pub fn advance(&mut self) -> &str {
        self.current = (self.current + 1) % self.words.len();
        self.current()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStyle {
    /// Fade the word out, swap, fade in
    #[default]
    Fade,
    /// Delete the word character by character, type the next one
    Type,
}

impl FromStr for CycleStyle {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fade" => Ok(CycleStyle::Fade),
            "type" | "typed" => Ok(CycleStyle::Type),
            other => Err(AppError::Validation {
                field: "cycle_style",
                message: format!("expected fade or type, got {other:?}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Shown,
    FadeOut,
    FadeIn,
    Typing,
    Deleting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    /// Time a word stays fully visible
    pub dwell: Duration,
    /// Fade out duration before the swap
    pub fade: Duration,
    pub type_delay: Duration,
    pub delete_delay: Duration,
    /// Pause between the deleted word and the next one
    pub gap: Duration,
}

impl CycleTiming {
    pub fn for_style(style: CycleStyle) -> Self {
        let dwell = match style {
            // 3s interval, of which 500ms is spent fading
            CycleStyle::Fade => Duration::from_millis(2500),
            CycleStyle::Type => Duration::from_millis(2000),
        };
        Self {
            dwell,
            fade: Duration::from_millis(500),
            type_delay: Duration::from_millis(100),
            delete_delay: Duration::from_millis(50),
            gap: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleStep {
    Show { word: String, phase: CyclePhase },
    Wait(Duration),
}

/// Never-ending sequence of word display states.
///
/// The first item shows the current word as is (the reveal already typed
/// it); every following round moves the rotation forward exactly once.
#[derive(Debug, Clone)]
pub struct InterestCycler {
    rotation: InterestRotation,
    style: CycleStyle,
    timing: CycleTiming,
    queue: VecDeque<CycleStep>,
    started: bool,
}

impl InterestCycler {
    pub fn new(rotation: InterestRotation, style: CycleStyle, timing: CycleTiming) -> Self {
        Self {
            rotation,
            style,
            timing,
            queue: VecDeque::new(),
            started: false,
        }
    }

    pub fn rotation(&self) -> &InterestRotation {
        &self.rotation
    }

    fn refill(&mut self) {
        let show = |word: String, phase| CycleStep::Show { word, phase };

        if !self.started {
            self.started = true;
            self.queue.push_back(show(self.rotation.current().to_string(), CyclePhase::Shown));
            self.queue.push_back(CycleStep::Wait(self.timing.dwell));
            if self.style == CycleStyle::Type {
                self.push_delete_and_advance();
            }
            return;
        }

        match self.style {
            CycleStyle::Fade => {
                self.queue.push_back(show(self.rotation.current().to_string(), CyclePhase::FadeOut));
                self.queue.push_back(CycleStep::Wait(self.timing.fade));
                let next = self.rotation.advance().to_string();
                self.queue.push_back(show(next, CyclePhase::FadeIn));
                self.queue.push_back(CycleStep::Wait(self.timing.dwell));
            }
            CycleStyle::Type => {
                let chars: Vec<char> = self.rotation.current().chars().collect();
                for i in 1..=chars.len() {
                    self.queue.push_back(show(chars[..i].iter().collect(), CyclePhase::Typing));
                    self.queue.push_back(CycleStep::Wait(self.timing.type_delay));
                }
                self.queue.push_back(CycleStep::Wait(self.timing.dwell));
                self.push_delete_and_advance();
            }
        }
    }

    fn push_delete_and_advance(&mut self) {
        let chars: Vec<char> = self.rotation.current().chars().collect();
        for i in (0..chars.len()).rev() {
            self.queue.push_back(CycleStep::Show {
                word: chars[..i].iter().collect(),
                phase: CyclePhase::Deleting,
            });
            self.queue.push_back(CycleStep::Wait(self.timing.delete_delay));
        }
        self.queue.push_back(CycleStep::Wait(self.timing.gap));
        self.rotation.advance();
    }
}

impl Iterator for InterestCycler {
    type Item = CycleStep;

    fn next(&mut self) -> Option<CycleStep> {
        if self.queue.is_empty() {
            self.refill();
        }
        self.queue.pop_front()
    }
}
