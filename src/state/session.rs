use crate::animation::{SkipController, SkipPreference};
use crate::models::PageId;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Telnet,
    WebSocket,
}

#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    /// When is the session started/created
    pub session_started: std::time::Instant,
    pub protocol: Protocol,
    /// Page currently on screen
    pub page: PageId,
    /// Page to go back to from the blue screen
    pub previous: Option<PageId>,
    pub skip: SkipController,
    pub tty_cols: Option<usize>,
    pub tty_rows: Option<usize>,
}

impl Session {
    pub fn new(protocol: Protocol, page: PageId, skip: SkipPreference) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_started: std::time::Instant::now(),
            protocol,
            page,
            previous: None,
            skip: SkipController::new(skip),
            tty_cols: None,
            tty_rows: None,
        }
    }

    pub fn in_bsod(&self) -> bool {
        self.page == PageId::Bsod
    }

    /// Switch pages, remembering where we came from.
    pub fn navigate(&mut self, page: PageId) {
        if page != self.page {
            self.previous = Some(self.page);
            self.page = page;
        }
    }

    /// Leave the blue screen for the page that was open before it.
    pub fn go_back(&mut self) -> PageId {
        let back = self.previous.take().unwrap_or(PageId::Home);
        self.page = back;
        back
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bsod_returns_to_previous_page() {
        let mut sess = Session::new(Protocol::Telnet, PageId::Home, SkipPreference::default());
        sess.navigate(PageId::About);
        sess.navigate(PageId::Bsod);
        assert!(sess.in_bsod());
        assert_eq!(sess.go_back(), PageId::About);
        assert!(!sess.in_bsod());
    }

    #[test]
    fn go_back_defaults_to_home() {
        let mut sess = Session::new(Protocol::WebSocket, PageId::Bsod, SkipPreference::default());
        assert_eq!(sess.go_back(), PageId::Home);
    }
}
