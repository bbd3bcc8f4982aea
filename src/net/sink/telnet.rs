use crate::animation::{CyclePhase, Frame};
use crate::models::{BlockStyle, Page, SegmentKind};
use crate::net::output::OutFrame;
use crate::net::sink::ClientSink;
use crate::renderer::ansi::{
    CLEAR_SCREEN, RESET, RESTORE_CURSOR, SAVE_CURSOR, compose_sgr, goto, render_bsod, styled, visible_len,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

const DEFAULT_COLS: usize = 80;

/// Where the cycling word sits on screen, in rows since the last clear.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    row: usize,
    col: usize,
    /// Widest word drawn here so far; shorter words are padded over it
    width: usize,
}

/// Renders frames as ANSI text. Tracks the cursor position so the
/// cycling word can be redrawn in place while the user types below it.
///
/// `col` is where the next char lands. It may sit one past the right edge,
/// the terminal's pending wrap, until the next char moves to a new row.
pub struct TelnetSink<W> {
    writer: W,
    page: Option<Arc<Page>>,
    row: usize,
    col: usize,
    /// An SGR run left open for the segment being typed
    style_open: bool,
    cols: Option<u16>,
    rows: Option<u16>,
    typing: Option<(usize, usize)>,
    typed: usize,
    anchors: HashMap<(usize, usize), Anchor>,
}

impl<W> TelnetSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            page: None,
            row: 1,
            col: 1,
            style_open: false,
            cols: None,
            rows: None,
            typing: None,
            typed: 0,
            anchors: HashMap::new(),
        }
    }

    fn segment_kind(&self, block: usize, segment: usize) -> SegmentKind {
        self.page
            .as_ref()
            .and_then(|p| p.block(block))
            .and_then(|b| b.segments.get(segment))
            .map(|s| s.kind)
            .unwrap_or_default()
    }

    fn style_for(&self, block: usize, segment: usize) -> String {
        let block_style = self
            .page
            .as_ref()
            .and_then(|p| p.block(block))
            .map(|b| b.style)
            .unwrap_or_default();

        match (self.segment_kind(block, segment), block_style) {
            (SegmentKind::Heart, _) => compose_sgr(Some("bright_magenta"), None, &[]),
            (SegmentKind::Link, _) => compose_sgr(Some("bright_green"), None, &["underline"]),
            (SegmentKind::Cycle, _) => compose_sgr(Some("bright_green"), None, &["bold"]),
            (SegmentKind::Text, BlockStyle::Title | BlockStyle::Prompt) => compose_sgr(None, None, &["bold"]),
            (SegmentKind::Text, BlockStyle::Text) => String::new(),
        }
    }

    fn width(&self) -> usize {
        self.cols.map(usize::from).filter(|c| *c > 0).unwrap_or(DEFAULT_COLS)
    }

    /// Move the tracked cursor over `chars` printed chars, wrapping at the
    /// window width.
    fn advance(&mut self, chars: usize) {
        let width = self.width();
        for _ in 0..chars {
            if self.col > width {
                self.row += 1;
                self.col = 1;
            }
            self.col += 1;
        }
    }

    /// Where the next char will actually appear.
    fn next_cell(&self) -> (usize, usize) {
        if self.col > self.width() {
            (self.row + 1, 1)
        } else {
            (self.row, self.col)
        }
    }

    fn remember_anchor(&mut self, block: usize, segment: usize, initial: &str) {
        if self.segment_kind(block, segment) == SegmentKind::Cycle {
            let (row, col) = self.next_cell();
            self.anchors.insert(
                (block, segment),
                Anchor {
                    row,
                    col,
                    width: initial.chars().count(),
                },
            );
        }
    }

    /// Screen row of a logical row, accounting for scrolling once the
    /// output runs past the bottom of the window.
    fn screen_row(&self, row: usize) -> Option<usize> {
        let offset = self.rows.map(|r| self.row.saturating_sub(r as usize)).unwrap_or(0);
        row.checked_sub(offset).filter(|r| *r >= 1)
    }

    fn reset_screen(&mut self) {
        self.row = 1;
        self.col = 1;
        self.style_open = false;
        self.typing = None;
        self.anchors.clear();
    }
}

impl<W> TelnetSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn put(&mut self, text: &str, sgr: &str) -> anyhow::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.writer.write_all(styled(text, sgr).as_bytes()).await?;
        self.advance(text.chars().count());
        Ok(())
    }

    /// Start the style of a segment that is typed in several frames. It
    /// stays on until `end_style`.
    async fn begin_style(&mut self, sgr: &str) -> anyhow::Result<()> {
        if !sgr.is_empty() {
            self.writer.write_all(sgr.as_bytes()).await?;
            self.style_open = true;
        }
        Ok(())
    }

    async fn end_style(&mut self) -> anyhow::Result<()> {
        if std::mem::take(&mut self.style_open) {
            self.writer.write_all(RESET.as_bytes()).await?;
        }
        Ok(())
    }

    async fn newline(&mut self) -> anyhow::Result<()> {
        self.writer.write_all(b"\n").await?;
        self.row += 1;
        self.col = 1;
        Ok(())
    }

    async fn fresh_line(&mut self) -> anyhow::Result<()> {
        if self.col != 1 {
            self.newline().await?;
        }
        Ok(())
    }

    async fn write_lines(&mut self, text: &str, sgr: &str) -> anyhow::Result<()> {
        self.fresh_line().await?;
        for line in text.trim_end_matches('\n').split('\n') {
            self.writer.write_all(styled(line, sgr).as_bytes()).await?;
            self.advance(visible_len(line));
            self.newline().await?;
        }
        Ok(())
    }

    async fn clear_screen(&mut self) -> anyhow::Result<()> {
        self.writer.write_all(CLEAR_SCREEN.as_bytes()).await?;
        self.reset_screen();
        Ok(())
    }

    async fn anim(&mut self, frame: Frame) -> anyhow::Result<()> {
        match frame {
            Frame::BlockStart { .. } => {
                self.fresh_line().await?;
                self.typing = None;
            }
            Frame::Segment { block, segment, text } => {
                if self.typing != Some((block, segment)) {
                    self.typing = Some((block, segment));
                    self.typed = 0;
                    self.remember_anchor(block, segment, &text);
                    self.end_style().await?;
                }
                if !self.style_open {
                    let sgr = self.style_for(block, segment);
                    self.begin_style(&sgr).await?;
                }
                let delta: String = text.chars().skip(self.typed).collect();
                let n = delta.chars().count();
                self.typed += n;
                if let Some(anchor) = self.anchors.get_mut(&(block, segment)) {
                    anchor.width = anchor.width.max(self.typed);
                }
                self.writer.write_all(delta.as_bytes()).await?;
                self.advance(n);
            }
            Frame::BlockDone { .. } => {
                self.typing = None;
            }
            Frame::Full { block, segments } => {
                self.fresh_line().await?;
                for (segment, text) in segments.iter().enumerate() {
                    self.remember_anchor(block, segment, text);
                    let sgr = self.style_for(block, segment);
                    self.put(text, &sgr).await?;
                }
            }
            Frame::Finished { cursor_block } => {
                if cursor_block.is_none() {
                    self.fresh_line().await?;
                    self.put("> ", "").await?;
                }
            }
            Frame::Word { block, segment, text, phase } => {
                let Some(anchor) = self.anchors.get(&(block, segment)).copied() else {
                    return Ok(());
                };
                let Some(row) = self.screen_row(anchor.row) else {
                    return Ok(());
                };

                let len = text.chars().count();
                let width = anchor.width.max(len);
                let sgr = if phase == CyclePhase::FadeOut {
                    compose_sgr(Some("green"), None, &["dim"])
                } else {
                    self.style_for(block, segment)
                };

                let mut out = String::from(SAVE_CURSOR);
                out.push_str(&goto(row, anchor.col));
                out.push_str(&styled(&text, &sgr));
                out.push_str(&" ".repeat(width - len));
                out.push_str(RESTORE_CURSOR);
                self.writer.write_all(out.as_bytes()).await?;

                if let Some(a) = self.anchors.get_mut(&(block, segment)) {
                    a.width = width;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<W> ClientSink for TelnetSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_frame(&mut self, frame: OutFrame, _seq: u64) -> anyhow::Result<()> {
        if !matches!(frame, OutFrame::Anim(Frame::Segment { .. })) {
            self.end_style().await?;
        }

        match frame {
            OutFrame::Anim(f) => self.anim(f).await?,
            OutFrame::PageView { page, clear } => {
                if clear {
                    self.clear_screen().await?;
                } else {
                    self.fresh_line().await?;
                    self.typing = None;
                    self.anchors.clear();
                }
                self.page = Some(page);
            }
            OutFrame::Line(s) => self.write_lines(&s, "").await?,
            OutFrame::System(s) => {
                let sgr = compose_sgr(Some("yellow"), None, &[]);
                self.write_lines(&s, &sgr).await?;
            }
            OutFrame::Prompt(s) => {
                self.fresh_line().await?;
                let sgr = compose_sgr(None, None, &["bold"]);
                self.put(&s, &sgr).await?;
            }
            OutFrame::Restart => {}
            OutFrame::Bsod => {
                let cols = self.width();
                self.writer.write_all(render_bsod(cols).as_bytes()).await?;
                self.reset_screen();
                self.page = None;
            }
            OutFrame::InputEcho => {
                self.row += 1;
                self.col = 1;
            }
            OutFrame::Resize { cols, rows } => {
                self.cols = Some(cols);
                self.rows = Some(rows);
            }
            OutFrame::ClearScreen => self.clear_screen().await?,
            OutFrame::Raw(bytes) => self.writer.write_all(&bytes).await?,
        }

        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
