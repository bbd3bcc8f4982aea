//! Parser for the telnet shell commands.
//!
//! Examples:
//!   "ls"                 -> Command::List
//!   "cd projects"        -> Command::Go(PageId::Projects)
//!   "cd ~/about"         -> Command::Go(PageId::About)
//!   "about"              -> Command::Go(PageId::About)
//!   "contact"            -> Command::Cat(PageId::Contact)
//!   "cd .."              -> Command::Go(PageId::Home)
//!   "skip"               -> Command::Skip
//!   "cat contact.txt"    -> Command::Cat(PageId::Contact)
//!   "rm -rf /"           -> Command::Rm

use crate::models::PageId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a page
    Go(PageId),
    /// `cd` to something that is not a page
    NoSuchPage(String),
    List,
    Skip,
    Clear,
    Help,
    Who,
    /// The window's close button: blue screen
    Close,
    Exit,
    Whoami,
    Date,
    /// Print a page's text without animation
    Cat(PageId),
    NoSuchFile(String),
    Neofetch,
    Sudo,
    Rm,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn as_str(&self) -> &str {
        match self {
            Command::Go(_) | Command::NoSuchPage(_) => "cd",
            Command::List => "ls",
            Command::Skip => "skip",
            Command::Clear => "clear",
            Command::Help => "help",
            Command::Who => "who",
            Command::Close => "close",
            Command::Exit => "exit",
            Command::Whoami => "whoami",
            Command::Date => "date",
            Command::Cat(_) | Command::NoSuchFile(_) => "cat",
            Command::Neofetch => "neofetch",
            Command::Sudo => "sudo",
            Command::Rm => "rm",
            Command::Empty => "",
            Command::Unknown(s) => s.as_str(),
        }
    }
}

pub fn parse_command(input: &str) -> Command {
    let normalized = normalize(input);
    let mut tokens = normalized.split_whitespace();

    let Some(verb) = tokens.next() else {
        return Command::Empty;
    };
    let arg = tokens.next();

    match verb {
        "ls" | "dir" => Command::List,
        "skip" => Command::Skip,
        "clear" | "cls" => Command::Clear,
        "help" | "?" => Command::Help,
        "who" => Command::Who,
        "close" => Command::Close,
        "exit" | "quit" | "logout" => Command::Exit,
        "whoami" => Command::Whoami,
        "date" => Command::Date,
        "neofetch" => Command::Neofetch,
        "sudo" => Command::Sudo,
        "rm" => Command::Rm,
        "contact" if arg.is_none() => Command::Cat(PageId::Contact),
        "cat" => match arg {
            None => Command::NoSuchFile(String::new()),
            Some(file) => text_file(file).map_or_else(|| Command::NoSuchFile(file.to_string()), Command::Cat),
        },
        "cd" | "open" => match arg {
            None => Command::Go(PageId::Home),
            Some(target) => page_target(target).map_or_else(|| Command::NoSuchPage(target.to_string()), Command::Go),
        },
        // A bare page name works as a shortcut
        other => page_target(other)
            .filter(|p| *p != PageId::Bsod)
            .map_or_else(|| Command::Unknown(other.to_string()), Command::Go),
    }
}

fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// Accepts `projects`, `/projects`, `~/projects`, `./projects/`, `~` and `..`.
fn page_target(raw: &str) -> Option<PageId> {
    if raw == ".." {
        return Some(PageId::Home);
    }
    let name = raw.trim_start_matches('~').trim_start_matches('.').trim_matches('/');
    name.parse().ok()
}

/// `contact.txt` and friends; only the tab pages have one.
fn text_file(raw: &str) -> Option<PageId> {
    let stem = raw.trim_start_matches("./").strip_suffix(".txt")?;
    if stem.is_empty() || stem.starts_with('~') {
        return None;
    }
    stem.parse().ok().filter(|p| PageId::TABS.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_simple_verbs() {
        assert_eq!(parse_command("ls"), Command::List);
        assert_eq!(parse_command("  SKIP "), Command::Skip);
        assert_eq!(parse_command("clear"), Command::Clear);
        assert_eq!(parse_command("help"), Command::Help);
        assert_eq!(parse_command("close"), Command::Close);
        assert_eq!(parse_command("exit"), Command::Exit);
        assert_eq!(parse_command("quit"), Command::Exit);
    }

    #[test]
    fn t_cd_forms() {
        assert_eq!(parse_command("cd projects"), Command::Go(PageId::Projects));
        assert_eq!(parse_command("cd ~/about"), Command::Go(PageId::About));
        assert_eq!(parse_command("cd ./contact/"), Command::Go(PageId::Contact));
        assert_eq!(parse_command("cd /contact"), Command::Go(PageId::Contact));
        assert_eq!(parse_command("cd ~"), Command::Go(PageId::Home));
        assert_eq!(parse_command("cd .."), Command::Go(PageId::Home));
        assert_eq!(parse_command("cd"), Command::Go(PageId::Home));
    }

    #[test]
    fn t_cd_unknown() {
        assert_eq!(parse_command("cd games"), Command::NoSuchPage("games".into()));
    }

    #[test]
    fn t_bare_page_name() {
        assert_eq!(parse_command("about"), Command::Go(PageId::About));
        assert_eq!(parse_command("~"), Command::Go(PageId::Home));
        assert_eq!(parse_command("bsod"), Command::Unknown("bsod".into()));
    }

    #[test]
    fn t_blank_and_unknown() {
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(parse_command("   \t"), Command::Empty);
        assert_eq!(parse_command("snake"), Command::Unknown("snake".into()));
    }

    #[test]
    fn t_shell_extras() {
        assert_eq!(parse_command("whoami"), Command::Whoami);
        assert_eq!(parse_command("date"), Command::Date);
        assert_eq!(parse_command("neofetch"), Command::Neofetch);
        assert_eq!(parse_command("sudo rm -rf /"), Command::Sudo);
        for rm in ["rm", "rm -rf", "rm -rf /", "RM -RF /*"] {
            assert_eq!(parse_command(rm), Command::Rm, "{rm}");
        }
    }

    #[test]
    fn t_cat_files() {
        assert_eq!(parse_command("contact"), Command::Cat(PageId::Contact));
        assert_eq!(parse_command("cat contact.txt"), Command::Cat(PageId::Contact));
        assert_eq!(parse_command("cat ./about.txt"), Command::Cat(PageId::About));
        assert_eq!(parse_command("cat home.txt"), Command::Cat(PageId::Home));
        assert_eq!(parse_command("cat bsod.txt"), Command::NoSuchFile("bsod.txt".into()));
        assert_eq!(parse_command("cat cv.txt"), Command::NoSuchFile("cv.txt".into()));
        assert_eq!(parse_command("cat"), Command::NoSuchFile(String::new()));
    }

    #[test]
    fn t_control_bytes_are_dropped() {
        assert_eq!(parse_command("l\u{7}s\r"), Command::List);
    }
}
