use crate::animation::{Frame, Step};
use crate::models::ContentBlock;

/// Reveals blocks one character at a time, one block at a time.
///
/// Each block is a list of segments. Every segment has its own character
/// cursor but segments are walked in document order, so the visible text
/// of a block grows as one continuous string. A block whose text is empty
/// completes without consuming a tick.
#[derive(Debug, Clone)]
pub struct RevealScheduler {
    blocks: Vec<BlockChars>,
    /// Characters shown per segment; `None` until the block has started
    shown: Vec<Option<Vec<usize>>>,
    state: State,
}

#[derive(Debug, Clone)]
struct BlockChars {
    order: usize,
    prompt: bool,
    segments: Vec<Vec<char>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Begin(usize),
    Typing { block: usize, segment: usize, chars: usize },
    Wait { block: usize, segment: usize, chars: usize },
    EndBlock(usize),
    Finish,
    Done,
}

impl RevealScheduler {
    pub fn new(blocks: &[ContentBlock]) -> Self {
        let mut sorted: Vec<&ContentBlock> = blocks.iter().collect();
        sorted.sort_by_key(|b| b.order);

        let blocks: Vec<BlockChars> = sorted
            .into_iter()
            .map(|b| BlockChars {
                order: b.order,
                prompt: b.is_prompt(),
                segments: b.segments.iter().map(|s| s.text.chars().collect()).collect(),
            })
            .collect();

        Self {
            shown: vec![None; blocks.len()],
            blocks,
            state: State::Begin(0),
        }
    }

    /// Order number of the block being revealed right now.
    pub fn active(&self) -> Option<usize> {
        match self.state {
            State::Typing { block, .. } | State::Wait { block, .. } | State::EndBlock(block) => {
                Some(self.blocks[block].order)
            }
            _ => None,
        }
    }

    /// Text currently on display for the block with this order number,
    /// `None` while the block has not been rendered at all.
    pub fn revealed(&self, order: usize) -> Option<String> {
        let idx = self.blocks.iter().position(|b| b.order == order)?;
        let counts = self.shown[idx].as_ref()?;
        Some(
            self.blocks[idx]
                .segments
                .iter()
                .zip(counts)
                .flat_map(|(chars, n)| chars[..*n].iter())
                .collect(),
        )
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    fn final_cursor(&self) -> Option<usize> {
        self.blocks.last().filter(|b| b.prompt).map(|b| b.order)
    }
}

impl Iterator for RevealScheduler {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        loop {
            match self.state {
                State::Begin(block) => {
                    if block >= self.blocks.len() {
                        self.state = State::Finish;
                        continue;
                    }
                    let b = &self.blocks[block];
                    self.shown[block] = Some(vec![0; b.segments.len()]);
                    self.state = State::Typing { block, segment: 0, chars: 0 };
                    return Some(Step::Frame(Frame::BlockStart {
                        block: b.order,
                        cursor: !b.prompt,
                    }));
                }
                State::Typing { block, segment, chars } => {
                    let b = &self.blocks[block];
                    let Some(seg) = b.segments.get(segment) else {
                        self.state = State::EndBlock(block);
                        continue;
                    };
                    if chars >= seg.len() {
                        self.state = State::Typing { block, segment: segment + 1, chars: 0 };
                        continue;
                    }

                    let text: String = seg[..=chars].iter().collect();
                    let order = b.order;
                    if let Some(counts) = self.shown[block].as_mut() {
                        counts[segment] = chars + 1;
                    }
                    self.state = State::Wait { block, segment, chars: chars + 1 };
                    return Some(Step::Frame(Frame::Segment { block: order, segment, text }));
                }
                State::Wait { block, segment, chars } => {
                    self.state = State::Typing { block, segment, chars };
                    return Some(Step::Tick);
                }
                State::EndBlock(block) => {
                    self.state = State::Begin(block + 1);
                    return Some(Step::Frame(Frame::BlockDone {
                        block: self.blocks[block].order,
                    }));
                }
                State::Finish => {
                    self.state = State::Done;
                    return Some(Step::Frame(Frame::Finished {
                        cursor_block: self.final_cursor(),
                    }));
                }
                State::Done => return None,
            }
        }
    }
}
