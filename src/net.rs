use crate::Registry;
use crate::Session;
use crate::animation::player::{RevealControl, play};
use crate::animation::{RevealPlan, SkipTransition};
use crate::error::{AppError, AppResult};
use crate::models::{Page, PageId};
use crate::net::output::OutputHandle;
use crate::state::session::Protocol;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub mod http;
pub mod output;
pub mod sink;
pub mod telnet;

#[derive(Clone)]
struct AppCtx {
    output: OutputHandle,
    registry: Arc<Registry>,
    sess: Arc<RwLock<Session>>,
}

impl AppCtx {
    fn page(&self, id: PageId) -> AppResult<Arc<Page>> {
        self.registry
            .site
            .page(id)
            .cloned()
            .map(Arc::new)
            .ok_or_else(|| AppError::UnknownPage(id.to_string()))
    }
}

/// The animation task of the page view on screen. At most one runs per
/// connection; starting a new view or dropping this stops the old one.
#[derive(Default)]
struct PageTask {
    handle: Option<JoinHandle<()>>,
    control: Option<Arc<RevealControl>>,
}

impl PageTask {
    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.control = None;
    }

    /// Put the rest of the reveal on screen now, so output written after
    /// this lands below the page instead of inside a half typed block.
    async fn finish_reveal(&self) {
        let Some(control) = &self.control else {
            return;
        };
        if !control.is_revealed() {
            control.finish().await;
        }
    }

    /// Show the session's current page from the start.
    async fn open(&mut self, ctx: &AppCtx, clear: bool) -> AppResult<()> {
        let (id, controller) = {
            let s = ctx.sess.read();
            (s.page, s.skip)
        };
        let page = ctx.page(id)?;
        let plan = controller.plan(&page.blocks);
        self.run(ctx, page, plan, clear).await;
        Ok(())
    }

    /// Flip the skip preference of the session and act on it.
    async fn toggle_skip(&mut self, ctx: &AppCtx) -> AppResult<()> {
        let (id, protocol, transition) = {
            let mut s = ctx.sess.write();
            let id = s.page;
            let page = ctx.page(id)?;
            let transition = s.skip.toggle(&page.blocks);
            (id, s.protocol, transition)
        };
        tracing::debug!(page = %id, ?protocol, on = matches!(transition, SkipTransition::RenderAll(_)), "skip toggled");

        match (transition, protocol) {
            (SkipTransition::RenderAll(frames), _) => {
                let page = ctx.page(id)?;
                self.run(ctx, page, RevealPlan::Instant(frames.into_iter()), true).await;
            }
            // The browser reloads, which opens a fresh socket
            (SkipTransition::Restart, Protocol::WebSocket) => {
                self.stop();
                ctx.output.restart().await;
            }
            (SkipTransition::Restart, Protocol::Telnet) => self.open(ctx, true).await?,
        }
        Ok(())
    }

    async fn run(&mut self, ctx: &AppCtx, page: Arc<Page>, plan: RevealPlan, clear: bool) {
        self.stop();
        ctx.output.page_view(page.clone(), clear).await;

        let output = ctx.output.clone();
        let cfg = ctx.registry.animation;
        let rotation = ctx.registry.site.rotation();
        let control = Arc::new(RevealControl::new());
        self.control = Some(control.clone());
        self.handle = Some(tokio::spawn(async move {
            if let Err(e) = play(plan, &page, rotation, &cfg, &output, &control).await {
                tracing::trace!(page = %page.id, error = %e, "page view ended");
            }
        }));
    }
}

impl Drop for PageTask {
    fn drop(&mut self) {
        self.stop();
    }
}
