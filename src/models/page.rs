use crate::error::AppError;
use crate::models::block::ContentBlock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageId {
    Home,
    Projects,
    About,
    Contact,
    /// The blue screen behind the close button
    Bsod,
}

impl PageId {
    /// Pages that show up as tabs, in tab order.
    pub const TABS: [PageId; 4] = [PageId::Home, PageId::Projects, PageId::About, PageId::Contact];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageId::Home => "home",
            PageId::Projects => "projects",
            PageId::About => "about",
            PageId::Contact => "contact",
            PageId::Bsod => "bsod",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            PageId::Home => "/",
            PageId::Projects => "/projects",
            PageId::About => "/about",
            PageId::Contact => "/contact",
            PageId::Bsod => "/bsod",
        }
    }

    /// Tab caption in the navigation bar.
    pub fn tab(&self) -> &'static str {
        match self {
            PageId::Home => "~",
            PageId::Bsod => "/bsod",
            other => other.path(),
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Some(PageId::Home);
        }
        [PageId::Projects, PageId::About, PageId::Contact, PageId::Bsod]
            .into_iter()
            .find(|p| p.path() == trimmed)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().trim_start_matches('/').to_ascii_lowercase();
        match key.as_str() {
            "home" | "~" | "" => Ok(PageId::Home),
            "projects" => Ok(PageId::Projects),
            "about" => Ok(PageId::About),
            "contact" => Ok(PageId::Contact),
            "bsod" => Ok(PageId::Bsod),
            _ => Err(AppError::UnknownPage(s.to_string())),
        }
    }
}

/// A page of terminal content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    /// Working directory shown in the prompt, e.g. `~/projects`
    pub cwd: String,
    pub blocks: Vec<ContentBlock>,
}

impl Page {
    /// Locate the cycler's display slot as `(block, segment)`.
    pub fn cycle_anchor(&self) -> Option<(usize, usize)> {
        self.blocks
            .iter()
            .find_map(|b| b.cycle_segment().map(|s| (b.order, s)))
    }

    pub fn block(&self, order: usize) -> Option<&ContentBlock> {
        self.blocks.get(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_page_names() {
        assert_eq!("about".parse::<PageId>().unwrap(), PageId::About);
        assert_eq!("/projects".parse::<PageId>().unwrap(), PageId::Projects);
        assert_eq!("~".parse::<PageId>().unwrap(), PageId::Home);
        assert_eq!("CONTACT".parse::<PageId>().unwrap(), PageId::Contact);
        assert!(matches!("nope".parse::<PageId>(), Err(AppError::UnknownPage(_))));
    }

    #[test]
    fn paths_round_trip() {
        for id in PageId::TABS {
            assert_eq!(PageId::from_path(id.path()), Some(id));
        }
        assert_eq!(PageId::from_path("/about/"), Some(PageId::About));
        assert_eq!(PageId::from_path("/etc/passwd"), None);
    }
}
