//! Site content: the pages and the interest words, read from YAML.

use crate::animation::InterestRotation;
use crate::error::{AppError, AppResult};
use crate::models::{Page, PageId, SegmentKind};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::Path;

const EMBEDDED_SITE: &str = include_str!("../content/site.yaml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    /// `user@host` part of the prompt
    pub host: String,
    #[serde(default)]
    pub interests: Vec<String>,
    /// Shuffle the interests once at load time
    #[serde(default)]
    pub shuffle: bool,
    pub pages: Vec<Page>,
}

impl Site {
    /// The content shipped with the binary.
    pub fn embedded() -> AppResult<Self> {
        Self::from_yaml(EMBEDDED_SITE)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(src: &str) -> AppResult<Self> {
        let mut rng = rand::rng();
        Self::from_yaml_with_rng(src, &mut rng)
    }

    pub fn from_yaml_with_rng<R: Rng + ?Sized>(src: &str, rng: &mut R) -> AppResult<Self> {
        let mut site: Site = serde_yaml::from_str(src)?;
        site.validate()?;
        site.prepare(rng);
        Ok(site)
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    /// A fresh rotation for one page view, `None` without interests.
    pub fn rotation(&self) -> Option<InterestRotation> {
        InterestRotation::new(self.interests.clone())
    }

    fn validate(&self) -> AppResult<()> {
        for id in PageId::TABS {
            match self.pages.iter().filter(|p| p.id == id).count() {
                1 => {}
                0 => return Err(AppError::InvalidContent(format!("page {id} is missing"))),
                _ => return Err(AppError::InvalidContent(format!("page {id} is defined more than once"))),
            }
        }

        if self.pages.iter().any(|p| p.id == PageId::Bsod) {
            return Err(AppError::Validation {
                field: "pages",
                message: "the bsod page is built in and cannot be defined".into(),
            });
        }

        for page in &self.pages {
            let cycles = page
                .blocks
                .iter()
                .flat_map(|b| b.segments.iter())
                .filter(|s| s.kind == SegmentKind::Cycle)
                .count();
            if cycles > 1 {
                return Err(AppError::Validation {
                    field: "segments",
                    message: format!("page {} has {cycles} cycling segments, at most one is allowed", page.id),
                });
            }

            let unlinked = page
                .blocks
                .iter()
                .flat_map(|b| b.segments.iter())
                .any(|s| s.kind == SegmentKind::Link && s.href.as_deref().is_none_or(str::is_empty));
            if unlinked {
                return Err(AppError::Validation {
                    field: "href",
                    message: format!("page {} has a link segment without href", page.id),
                });
            }
        }

        Ok(())
    }

    fn prepare<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.interests.retain(|w| !w.trim().is_empty());
        if self.shuffle {
            self.interests.shuffle(rng);
        }
        let first = self.interests.first().cloned().unwrap_or_default();

        for page in &mut self.pages {
            for (order, block) in page.blocks.iter_mut().enumerate() {
                block.order = order;
                for seg in &mut block.segments {
                    if seg.kind == SegmentKind::Cycle && seg.text.is_empty() {
                        seg.text = first.clone();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const MINIMAL: &str = r#"
host: test@localhost
interests: [A, B, C, "  "]
pages:
  - id: home
    cwd: "~"
    blocks:
      - segments: [{ text: "I " }, { kind: cycle }]
  - { id: projects, cwd: "~/projects", blocks: [] }
  - { id: about, cwd: "~/about", blocks: [] }
  - { id: contact, cwd: "~/contact", blocks: [] }
"#;

    #[test]
    fn embedded_site_loads() {
        let site = Site::embedded().unwrap();
        assert_eq!(site.pages.len(), 4);
        assert_eq!(site.interests, vec!["CI/CD", "DEVOPS", "PYTHON", "AUTOMATION"]);

        let home = site.page(PageId::Home).unwrap();
        assert_eq!(home.cycle_anchor(), Some((3, 3)));
        assert_eq!(home.blocks[3].target_text(), "I ❤ CI/CD");
        assert!(home.blocks.last().unwrap().is_prompt());
        for (i, b) in home.blocks.iter().enumerate() {
            assert_eq!(b.order, i);
        }

        assert!(site.page(PageId::About).unwrap().cycle_anchor().is_none());
        assert!(site.page(PageId::Bsod).is_none());
    }

    #[test]
    fn blank_interests_are_dropped() {
        let site = Site::from_yaml(MINIMAL).unwrap();
        assert_eq!(site.interests, vec!["A", "B", "C"]);
        assert_eq!(site.page(PageId::Home).unwrap().blocks[0].target_text(), "I A");
        assert_eq!(site.rotation().unwrap().len(), 3);
    }

    #[test]
    fn shuffle_keeps_every_word() {
        let src = MINIMAL.replace("host: test@localhost", "host: test@localhost\nshuffle: true");
        let mut rng = StdRng::seed_from_u64(7);
        let site = Site::from_yaml_with_rng(&src, &mut rng).unwrap();

        let mut words = site.interests.clone();
        words.sort();
        assert_eq!(words, vec!["A", "B", "C"]);
        let home = site.page(PageId::Home).unwrap();
        assert_eq!(home.blocks[0].segments[1].text, site.interests[0]);
    }

    #[test]
    fn missing_page_is_rejected() {
        let src = MINIMAL.replace("  - { id: about, cwd: \"~/about\", blocks: [] }\n", "");
        assert!(matches!(Site::from_yaml(&src), Err(AppError::InvalidContent(_))));
    }

    #[test]
    fn bsod_page_is_rejected() {
        let src = format!("{MINIMAL}  - {{ id: bsod, cwd: \"/\", blocks: [] }}\n");
        assert!(matches!(Site::from_yaml(&src), Err(AppError::Validation { field: "pages", .. })));
    }

    #[test]
    fn link_needs_href() {
        let src = MINIMAL.replace("{ kind: cycle }", "{ kind: link, text: x }");
        assert!(matches!(Site::from_yaml(&src), Err(AppError::Validation { field: "href", .. })));
    }

    #[test]
    fn empty_rotation_when_no_interests() {
        let src = MINIMAL.replace("interests: [A, B, C, \"  \"]", "interests: []");
        let site = Site::from_yaml(&src).unwrap();
        assert!(site.rotation().is_none());
        assert_eq!(site.page(PageId::Home).unwrap().blocks[0].target_text(), "I ");
    }
}
