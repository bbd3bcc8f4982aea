use crate::banner::{BSOD_LINES, BSOD_TITLE};
use once_cell::sync::Lazy;
use regex::Regex;

pub const RESET: &str = "\x1b[0m";
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
pub const SAVE_CURSOR: &str = "\x1b7";
pub const RESTORE_CURSOR: &str = "\x1b8";

static ANSI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]|\x1b[78]").unwrap());

/// Build an ANSI SGR sequence given fg/bg names and attributes.
/// Unknown names are ignored; if nothing maps, returns "".
pub fn compose_sgr(fg: Option<&str>, bg: Option<&str>, attrs: &[&str]) -> String {
    let mut codes: Vec<&'static str> = Vec::new();

    if let Some(name) = fg
        && let Some(code) = fg_code(name)
    {
        codes.push(code);
    }
    if let Some(name) = bg
        && let Some(code) = bg_code(name)
    {
        codes.push(code);
    }
    for a in attrs {
        if let Some(code) = attr_code(a) {
            codes.push(code);
        }
    }

    if codes.is_empty() {
        return String::new();
    }

    format!("\x1b[{}m", codes.join(";"))
}

/// Move the cursor to a 1-based screen position.
pub fn goto(row: usize, col: usize) -> String {
    format!("\x1b[{row};{col}H")
}

/// Wrap `text` in an SGR sequence, or return it as is for an empty style.
pub fn styled(text: &str, sgr: &str) -> String {
    if sgr.is_empty() {
        text.to_string()
    } else {
        format!("{sgr}{text}{RESET}")
    }
}

/// Compute visible length ignoring ANSI escape codes
pub fn visible_len(s: &str) -> usize {
    ANSI_RE.replace_all(s, "").chars().count()
}

fn center(line: &str, width: usize) -> String {
    let len = visible_len(line);
    let pad = width.saturating_sub(len) / 2;
    let mut out = " ".repeat(pad);
    out.push_str(line);
    out.push_str(&" ".repeat(width.saturating_sub(pad + len)));
    out
}

/// Full-screen blue screen for a terminal `cols` wide.
pub fn render_bsod(cols: usize) -> String {
    let width = cols.max(BSOD_LINES.iter().map(|l| l.len()).max().unwrap_or(0) + 4);
    let sgr = compose_sgr(Some("bright_white"), Some("blue"), &[]);
    let blank = " ".repeat(width);

    let mut lines: Vec<String> = vec![blank.clone(); 3];
    lines.push(center(BSOD_TITLE, width));
    lines.push(blank.clone());
    for l in BSOD_LINES {
        lines.push(center(l, width));
        lines.push(blank.clone());
    }
    lines.push(blank);

    let mut out = String::from(CLEAR_SCREEN);
    for l in lines {
        out.push_str(&sgr);
        out.push_str(&l);
        out.push_str(RESET);
        out.push('\n');
    }
    out
}

fn fg_code(name: &str) -> Option<&'static str> {
    match norm(name).as_str() {
        "black" => Some("30"),
        "red" => Some("31"),
        "green" => Some("32"),
        "yellow" => Some("33"),
        "blue" => Some("34"),
        "magenta" => Some("35"),
        "cyan" => Some("36"),
        "white" => Some("37"),
        "gray" | "grey" => Some("90"),
        "bright_green" => Some("92"),
        "bright_magenta" => Some("95"),
        "bright_white" => Some("97"),
        "default" | "reset" => Some("39"),
        _ => None,
    }
}

fn bg_code(name: &str) -> Option<&'static str> {
    match norm(name).as_str() {
        "black" => Some("40"),
        "red" => Some("41"),
        "blue" => Some("44"),
        "default" | "reset" => Some("49"),
        _ => None,
    }
}

fn attr_code(name: &str) -> Option<&'static str> {
    match norm(name).as_str() {
        "bold" => Some("1"),
        "dim" => Some("2"),
        "underline" => Some("4"),
        "blink" => Some("5"),
        _ => None,
    }
}

fn norm(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}
