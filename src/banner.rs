pub const BANNER: &str = r#"     _                                 _
    (_) ___   ___  ___ _____      __  (_)_ __
    | |/ _ \ / _ \/ __/ _ \ \ /\ / /  | | '_ \
    | | (_) |  __/ (_| (_) \ V  V /  _| | | | |
   _/ |\___/ \___|\___\___/ \_/\_/  (_)_|_| |_|
  |__/
"#;

pub const ENTRY: &str = r#"
Welcome to joecow.in
Type `help` for the list of commands.
------------------------------------------------
"#;

pub const HELP: &str = r#"Commands:
  ls                 list pages
  cd <page>          open a page (~, projects, about, contact)
  skip               toggle the typing animation
  clear              clear the screen
  who                show who else is looking
  cat <page>.txt     print a page without typing (contact: cat contact.txt)
  whoami             display current user
  date               display current date and time
  close              close the window
  exit               disconnect
"#;

pub const BSOD_TITLE: &str = "A fatal error has occurred";

pub const BSOD_LINES: [&str; 4] = [
    "Your PC ran into a problem and needs to restart.",
    "Error code: 0x000000EF",
    "* Press any key to return to the previous page",
    "* Press CTRL+ALT+DEL to restart your computer",
];
