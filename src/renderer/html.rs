//! HTML for the portfolio pages.
//!
//! Every block is rendered with its full text in `data-content`. When the
//! visitor skips typing the text is in the markup right away; otherwise
//! the block is emitted empty and hidden and the page script fills it in
//! from the server's frames.

use crate::animation::SkipPreference;
use crate::banner::{BSOD_LINES, BSOD_TITLE};
use crate::content::Site;
use crate::models::{BlockStyle, ContentBlock, Page, PageId, Segment, SegmentKind};
use std::fmt::Write;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn document(title: &str, body_attrs: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{title}</title>
  <link rel="stylesheet" href="/assets/terminal.css" />
</head>
<body{body_attrs}>
{body}
<script src="/assets/terminal.js"></script>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn nav(active: PageId) -> String {
    let mut links = String::new();
    for id in PageId::TABS {
        let cls = if id == active { r#" class="active""# } else { "" };
        let _ = write!(links, r#"<a href="{}"{cls}>{}</a>"#, id.path(), escape(id.tab()));
    }

    format!(
        r##"<nav class="nav">
  <div class="nav-links">{links}</div>
  <div class="window-controls">
    <form method="post" action="/skip" class="skip-form">
      <button type="submit" class="window-btn minimize-btn" id="minimize-btn" title="skip typing">-</button>
    </form>
    <a href="#" class="window-btn maximize-btn" id="maximize-btn" title="fullscreen">□</a>
    <a href="/bsod" class="window-btn close-btn" title="close">X</a>
  </div>
</nav>"##
    )
}

fn segment(seg: &Segment, index: usize, show: bool) -> String {
    let text = if show { escape(&seg.text) } else { String::new() };
    match seg.kind {
        SegmentKind::Text => format!(r#"<span data-seg="{index}">{text}</span>"#),
        SegmentKind::Heart => format!(r#"<span data-seg="{index}" class="heart">{text}</span>"#),
        SegmentKind::Link => format!(
            r#"<a data-seg="{index}" href="{}">{text}</a>"#,
            escape(seg.href.as_deref().unwrap_or("#"))
        ),
        SegmentKind::Cycle => format!(r#"<span data-seg="{index}" id="cycling-text">{text}</span>"#),
    }
}

fn block(b: &ContentBlock, show: bool, last: bool) -> String {
    let mut classes = Vec::new();
    match b.style {
        BlockStyle::Title => classes.push("title"),
        BlockStyle::Prompt => classes.push("prompt"),
        BlockStyle::Text => {}
    }
    if show && last && b.is_prompt() {
        classes.push("typing-cursor");
    }

    let class_attr = if classes.is_empty() {
        String::new()
    } else {
        format!(r#" class="{}""#, classes.join(" "))
    };
    let hidden = if show { "" } else { " hidden" };
    let inner: String = b
        .segments
        .iter()
        .enumerate()
        .map(|(i, s)| segment(s, i, show))
        .collect();

    format!(
        r#"<p data-order="{}" data-content="{}"{class_attr}{hidden}>{inner}</p>"#,
        b.order,
        escape(&b.target_text()),
    )
}

/// A terminal page. With `skip` on every block is rendered in full.
pub fn render_page(site: &Site, page: &Page, skip: SkipPreference) -> String {
    let show = skip.is_on();
    let count = page.blocks.len();
    let blocks: Vec<String> = page
        .blocks
        .iter()
        .enumerate()
        .map(|(i, b)| block(b, show, i + 1 == count))
        .collect();

    let body = format!(
        r#"<article>
{nav}
<div class="terminal-content terminal-effect" id="terminal-content">
{blocks}
</div>
</article>"#,
        nav = nav(page.id),
        blocks = blocks.join("\n"),
    );
    let attrs = format!(r#" data-page="{}" data-skip="{}""#, page.id, skip.as_stored());

    document(&format!("{}:{}", site.host, page.cwd), &attrs, &body)
}

pub fn render_bsod() -> String {
    let mut body = format!(r#"<div class="bsod" id="bsod"><h1>{}</h1>"#, escape(BSOD_TITLE));
    for line in BSOD_LINES {
        let _ = write!(body, "<p>{}</p>", escape(line));
    }
    body.push_str("</div>");

    document("A fatal error has occurred", r#" data-page="bsod""#, &body)
}
