use crate::animation::cycler::{CycleStep, InterestCycler, InterestRotation};
use crate::animation::skip::RevealPlan;
use crate::animation::{AnimationConfig, Frame, Step};
use crate::models::Page;
use crate::net::output::OutputHandle;
use std::time::Duration;
use tokio::sync::{Notify, watch};
use tokio::time::sleep;

/// Shared between a running page view and its owner. The owner can ask the
/// reveal to finish at once and wait until every block is on screen.
#[derive(Debug)]
pub struct RevealControl {
    hurry: Notify,
    revealed: watch::Sender<bool>,
}

impl RevealControl {
    pub fn new() -> Self {
        Self {
            hurry: Notify::new(),
            revealed: watch::Sender::new(false),
        }
    }

    pub fn is_revealed(&self) -> bool {
        *self.revealed.borrow()
    }

    pub fn mark_revealed(&self) {
        self.revealed.send_replace(true);
    }

    /// Drop the remaining delays and wait for the last block.
    pub async fn finish(&self) {
        self.hurry.notify_one();
        let mut rx = self.revealed.subscribe();
        // Only errors once the sender is gone, which means nothing is left to wait for
        let _ = rx.wait_for(|done| *done).await;
    }
}

impl Default for RevealControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one page view: the reveal plan, then the interest cycler forever.
///
/// Only returns when the client output goes away. Callers spawn this and
/// abort the task to leave the page.
pub async fn play(
    plan: RevealPlan,
    page: &Page,
    rotation: Option<InterestRotation>,
    cfg: &AnimationConfig,
    out: &OutputHandle,
    control: &RevealControl,
) -> anyhow::Result<()> {
    let revealed = run_reveal(plan, cfg.char_delay, out, &control.hurry).await;
    control.mark_revealed();
    revealed?;
    run_cycler(page, rotation, cfg, out).await
}

/// Sends the frames of a reveal, sleeping `char_delay` per tick. Once
/// `hurry` fires the ticks are dropped and only the last text of each
/// segment is sent.
pub async fn run_reveal<I>(steps: I, char_delay: Duration, out: &OutputHandle, hurry: &Notify) -> anyhow::Result<()>
where
    I: Iterator<Item = Step>,
{
    let mut hurried = false;
    let mut pending: Option<Frame> = None;

    for step in steps {
        match step {
            Step::Tick if hurried => {}
            Step::Tick => {
                tokio::select! {
                    _ = sleep(char_delay) => {}
                    _ = hurry.notified() => {
                        tracing::trace!("reveal hurried");
                        hurried = true;
                    }
                }
            }
            Step::Frame(frame) if hurried => {
                if let Some(prev) = pending.take()
                    && !same_segment(&prev, &frame)
                {
                    out.anim(prev).await?;
                }
                if matches!(frame, Frame::Segment { .. }) {
                    pending = Some(frame);
                } else {
                    out.anim(frame).await?;
                }
            }
            Step::Frame(frame) => out.anim(frame).await?,
        }
    }

    if let Some(prev) = pending {
        out.anim(prev).await?;
    }
    Ok(())
}

fn same_segment(a: &Frame, b: &Frame) -> bool {
    matches!(
        (a, b),
        (Frame::Segment { block: b1, segment: s1, .. }, Frame::Segment { block: b2, segment: s2, .. })
            if b1 == b2 && s1 == s2
    )
}

/// No-op when the page has no cycling slot or there are no words.
pub async fn run_cycler(
    page: &Page,
    rotation: Option<InterestRotation>,
    cfg: &AnimationConfig,
    out: &OutputHandle,
) -> anyhow::Result<()> {
    let Some((block, segment)) = page.cycle_anchor() else {
        return Ok(());
    };
    let Some(rotation) = rotation else {
        return Ok(());
    };

    tracing::trace!(page = %page.id, "starting interest cycler");
    let cycler = InterestCycler::new(rotation, cfg.cycle_style, cfg.cycle);
    for step in cycler {
        match step {
            CycleStep::Show { word, phase } => {
                out.anim(Frame::Word {
                    block,
                    segment,
                    text: word,
                    phase,
                })
                .await?
            }
            CycleStep::Wait(d) => sleep(d).await,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::skip::{SkipController, SkipPreference};
    use crate::animation::{CyclePhase, CycleStyle, CycleTiming};
    use crate::models::{BlockStyle, ContentBlock, PageId, Segment};
    use crate::net::output::{OutEvent, OutFrame};
    use tokio::sync::mpsc;

    fn page() -> Page {
        Page {
            id: PageId::Home,
            cwd: "~".into(),
            blocks: vec![
                ContentBlock::plain(0, "HI!"),
                ContentBlock::new(
                    1,
                    BlockStyle::Text,
                    vec![Segment::text("I "), Segment::heart(), Segment::text(" "), Segment::cycle("A")],
                ),
            ],
        }
    }

    fn cfg() -> AnimationConfig {
        AnimationConfig {
            char_delay: Duration::from_millis(10),
            cycle_style: CycleStyle::Fade,
            cycle: CycleTiming::for_style(CycleStyle::Fade),
        }
    }

    async fn next_frame(rx: &mut mpsc::Receiver<OutEvent>) -> Frame {
        match rx.recv().await {
            Some(OutEvent::Frame(OutFrame::Anim(f), _)) => f,
            _ => panic!("expected an animation frame"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reveal_waits_between_chars() {
        let (tx, mut rx) = mpsc::channel(256);
        let out = OutputHandle::new(tx);
        let blocks = vec![ContentBlock::plain(0, "HI!")];
        let plan = SkipController::default().plan(&blocks);

        let started = tokio::time::Instant::now();
        run_reveal(plan, Duration::from_millis(10), &out, &Notify::new()).await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(30));

        drop(out);
        let mut frames = Vec::new();
        while let Some(OutEvent::Frame(OutFrame::Anim(f), _)) = rx.recv().await {
            frames.push(f);
        }
        assert_eq!(frames.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn skipped_page_starts_cycling_without_delay() {
        let (tx, mut rx) = mpsc::channel(256);
        let out = OutputHandle::new(tx);
        let page = page();
        let rotation = InterestRotation::new(vec!["A".into(), "B".into()]);
        let plan = SkipController::new(SkipPreference::new(true)).plan(&page.blocks);

        let task = tokio::spawn(async move { play(plan, &page, rotation, &cfg(), &out, &RevealControl::new()).await });

        let started = tokio::time::Instant::now();
        assert!(matches!(next_frame(&mut rx).await, Frame::Full { block: 0, .. }));
        assert!(matches!(next_frame(&mut rx).await, Frame::Full { block: 1, .. }));
        assert!(matches!(next_frame(&mut rx).await, Frame::Finished { .. }));
        assert_eq!(
            next_frame(&mut rx).await,
            Frame::Word { block: 1, segment: 3, text: "A".into(), phase: CyclePhase::Shown }
        );
        assert_eq!(started.elapsed(), Duration::ZERO);

        assert_eq!(
            next_frame(&mut rx).await,
            Frame::Word { block: 1, segment: 3, text: "A".into(), phase: CyclePhase::FadeOut }
        );
        assert_eq!(
            next_frame(&mut rx).await,
            Frame::Word { block: 1, segment: 3, text: "B".into(), phase: CyclePhase::FadeIn }
        );
        assert_eq!(started.elapsed(), Duration::from_millis(3000));

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn cycler_is_noop_without_slot() {
        let (tx, _rx) = mpsc::channel(4);
        let out = OutputHandle::new(tx);
        let page = Page {
            id: PageId::About,
            cwd: "~/about".into(),
            blocks: vec![ContentBlock::plain(0, "ABOUT ME:")],
        };
        let rotation = InterestRotation::new(vec!["A".into()]);

        run_cycler(&page, rotation, &cfg(), &out).await.unwrap();
        run_cycler(&self::page(), None, &cfg(), &out).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn player_stops_when_client_is_gone() {
        let (tx, rx) = mpsc::channel(4);
        let out = OutputHandle::new(tx);
        drop(rx);

        let page = page();
        let plan = SkipController::default().plan(&page.blocks);
        let control = RevealControl::new();
        let res = play(plan, &page, InterestRotation::new(vec!["A".into()]), &cfg(), &out, &control).await;
        assert!(res.is_err());
        assert!(control.is_revealed());
    }

    #[tokio::test(start_paused = true)]
    async fn hurried_reveal_sends_whole_segments() {
        let (tx, mut rx) = mpsc::channel(256);
        let out = OutputHandle::new(tx);
        let page = page();
        let plan = SkipController::default().plan(&page.blocks);
        let control = std::sync::Arc::new(RevealControl::new());

        let ctl = control.clone();
        let task = tokio::spawn(async move {
            run_reveal(plan, Duration::from_secs(60), &out, &ctl.hurry).await.unwrap();
            ctl.mark_revealed();
        });

        assert!(matches!(next_frame(&mut rx).await, Frame::BlockStart { block: 0, .. }));
        assert_eq!(next_frame(&mut rx).await, Frame::Segment { block: 0, segment: 0, text: "H".into() });

        let started = tokio::time::Instant::now();
        control.finish().await;
        assert!(started.elapsed() < Duration::from_secs(60));
        task.await.unwrap();

        let mut rest = Vec::new();
        while let Ok(OutEvent::Frame(OutFrame::Anim(f), _)) = rx.try_recv() {
            rest.push(f);
        }
        assert_eq!(
            rest,
            vec![
                Frame::Segment { block: 0, segment: 0, text: "HI!".into() },
                Frame::BlockDone { block: 0 },
                Frame::BlockStart { block: 1, cursor: true },
                Frame::Segment { block: 1, segment: 0, text: "I ".into() },
                Frame::Segment { block: 1, segment: 1, text: "❤".into() },
                Frame::Segment { block: 1, segment: 2, text: " ".into() },
                Frame::Segment { block: 1, segment: 3, text: "A".into() },
                Frame::BlockDone { block: 1 },
                Frame::Finished { cursor_block: None },
            ]
        );
    }
}
