use crate::banner::HELP;
use crate::error::AppResult;
use crate::input::parser::{Command, parse_command};
use crate::models::{Page, PageId};
use crate::net::{AppCtx, PageTask};
use crate::state::session::{Protocol, Session};
use crate::util::telnet::{TelnetIn, TelnetMachine};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

/// Longest line we keep; the rest is dropped
const MAX_LINE: usize = 256;

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Disconnect,
}

/// Collects data bytes into lines. Accepts CR, LF, CR LF and CR NUL as
/// line ends.
#[derive(Debug, Default)]
struct LineBuffer {
    buf: Vec<u8>,
    last_cr: bool,
}

impl LineBuffer {
    fn push(&mut self, b: u8) -> Option<String> {
        let after_cr = std::mem::replace(&mut self.last_cr, b == b'\r');
        match b {
            b'\n' | b'\0' if after_cr => None,
            b'\r' | b'\n' => {
                let line = String::from_utf8_lossy(&self.buf).into_owned();
                self.buf.clear();
                Some(line)
            }
            // Backspace / DEL
            0x08 | 0x7f => {
                self.buf.pop();
                None
            }
            _ => {
                if self.buf.len() < MAX_LINE {
                    self.buf.push(b);
                }
                None
            }
        }
    }
}

pub async fn handle_connection<R>(read_half: R, ctx: AppCtx, telnet: &mut TelnetMachine) -> AppResult<()>
where
    R: AsyncRead + Unpin,
{
    let session_id = ctx.sess.read().id;
    ctx.registry.set_online(session_id, Protocol::Telnet, true);

    let mut task = PageTask::default();
    let result = match task.open(&ctx, false).await {
        Ok(()) => read_loop(read_half, telnet, &mut task, &ctx).await,
        Err(e) => Err(e),
    };

    task.stop();
    ctx.registry.set_online(session_id, Protocol::Telnet, false);
    result
}

async fn read_loop<R>(read_half: R, telnet: &mut TelnetMachine, task: &mut PageTask, ctx: &AppCtx) -> AppResult<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(read_half);
    let mut lines = LineBuffer::default();
    let mut one = [0u8; 1];

    loop {
        let n = reader.read(&mut one).await?;
        if n == 0 {
            break; // disconnect
        }

        let response = telnet.push(one[0]);

        if let Some(bytes) = response.response {
            ctx.output.raw(bytes).await;
        }

        match response.event {
            Some(TelnetIn::Data(b)) => {
                let Some(line) = lines.push(b) else {
                    continue;
                };
                if handle_line(&line, task, ctx).await? == Flow::Disconnect {
                    break;
                }
            }
            Some(TelnetIn::Naws { cols, rows }) => handle_naws(cols, rows, ctx).await,
            None => {}
        }
    }
    Ok(())
}

async fn handle_naws(cols: u16, rows: u16, ctx: &AppCtx) {
    {
        let mut s = ctx.sess.write();
        s.tty_cols = Some(cols as usize);
        s.tty_rows = Some(rows as usize);
    }
    ctx.output.resize(cols, rows).await;
}

async fn handle_line(line: &str, task: &mut PageTask, ctx: &AppCtx) -> AppResult<Flow> {
    let cmd = parse_command(line);
    tracing::trace!(cmd = cmd.as_str(), "telnet command");

    // Anything we print goes below the page, never inside a block still typing
    if !replaces_page(&cmd) {
        task.finish_reveal().await;
    }

    // The client echoed the line and moved to the next row
    ctx.output.input_echo().await;

    // Any input leaves the blue screen
    let in_bsod = ctx.sess.read().in_bsod();
    if in_bsod {
        let back = ctx.sess.write().go_back();
        tracing::debug!(page = %back, "leaving blue screen");
        task.open(ctx, true).await?;
        return Ok(Flow::Continue);
    }

    match cmd {
        Command::Go(PageId::Bsod) | Command::Close => {
            show_bsod(task, ctx).await;
            return Ok(Flow::Continue);
        }
        Command::Rm => {
            ctx.output.system("I don't think so...").await;
            show_bsod(task, ctx).await;
            return Ok(Flow::Continue);
        }
        Command::Go(id) => {
            ctx.sess.write().navigate(id);
            task.open(ctx, true).await?;
            return Ok(Flow::Continue);
        }
        Command::Skip => {
            task.toggle_skip(ctx).await?;
            return Ok(Flow::Continue);
        }
        Command::Exit => {
            task.stop();
            ctx.output.system("Goodbye!").await;
            return Ok(Flow::Disconnect);
        }
        Command::Clear => {
            task.stop();
            ctx.output.clear().await;
        }
        Command::List => {
            let current = ctx.sess.read().page;
            ctx.output.line(page_list(current)).await;
        }
        Command::Help => ctx.output.system(HELP).await,
        Command::Who => {
            let (telnet, web) = ctx.registry.who();
            ctx.output
                .system(format!("{telnet} on telnet, {web} in a browser"))
                .await;
        }
        Command::Whoami => ctx.output.line("joe").await,
        Command::Date => {
            let now = chrono::Local::now();
            ctx.output.line(now.format("%a %b %e %H:%M:%S %Y").to_string()).await;
        }
        Command::Cat(id) => {
            let page = ctx.page(id)?;
            ctx.output.line(page_text(&page)).await;
        }
        Command::NoSuchFile(file) if file.is_empty() => ctx.output.system("cat: missing file operand").await,
        Command::NoSuchFile(file) => ctx.output.system(format!("cat: {file}: No such file")).await,
        Command::Neofetch => {
            let info = neofetch(&ctx.sess.read());
            ctx.output.line(info).await;
        }
        Command::Sudo => ctx.output.system("Nice try! ;)").await,
        Command::NoSuchPage(target) => ctx.output.system(format!("cd: no such page: {target}")).await,
        Command::Unknown(verb) => ctx.output.system(format!("{verb}: command not found")).await,
        Command::Empty => {}
    }

    ctx.output.prompt(prompt(ctx)).await;
    Ok(Flow::Continue)
}

/// Commands that stop the page view before printing anything.
fn replaces_page(cmd: &Command) -> bool {
    matches!(
        cmd,
        Command::Go(_) | Command::Close | Command::Skip | Command::Exit | Command::Clear
    )
}

async fn show_bsod(task: &mut PageTask, ctx: &AppCtx) {
    task.stop();
    ctx.sess.write().navigate(PageId::Bsod);
    ctx.output.bsod().await;
}

fn page_list(current: PageId) -> String {
    PageId::TABS
        .iter()
        .map(|id| {
            let marker = if *id == current { "*" } else { " " };
            format!("{marker} {:<10}{}", id.as_str(), id.path())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn page_text(page: &Page) -> String {
    page.blocks
        .iter()
        .map(|b| b.target_text())
        .collect::<Vec<_>>()
        .join("\n")
}

fn neofetch(sess: &Session) -> String {
    let resolution = match (sess.tty_cols, sess.tty_rows) {
        (Some(cols), Some(rows)) => format!("{cols}x{rows}"),
        _ => "unknown".to_string(),
    };
    format!(
        "joe@joecow.in\n\
         ─────────────\n\
         OS:         joecow.in Terminal\n\
         Shell:      telnet\n\
         Resolution: {resolution}\n\
         Uptime:     {}",
        uptime(sess.session_started.elapsed())
    )
}

fn uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m {s}s"),
        _ => format!("{h}h {m}m"),
    }
}

fn prompt(ctx: &AppCtx) -> String {
    let id = ctx.sess.read().page;
    let cwd = ctx
        .registry
        .site
        .page(id)
        .map_or("~", |p| p.cwd.as_str());
    format!("{}:{}$ ", ctx.registry.site.host, cwd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationConfig, SkipPreference};
    use crate::content::Site;
    use crate::net::output::init_session_for_telnet;
    use crate::state::registry::Registry;
    use crate::renderer::ansi::CLEAR_SCREEN;
    use parking_lot::RwLock;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

    #[test]
    fn line_ends() {
        let mut lb = LineBuffer::default();
        let mut got = Vec::new();
        for b in b"ls\r\ncd about\rhelp\nx\r\0" {
            if let Some(line) = lb.push(*b) {
                got.push(line);
            }
        }
        assert_eq!(got, vec!["ls", "cd about", "help", "x"]);
    }

    #[test]
    fn backspace_edits_the_line() {
        let mut lb = LineBuffer::default();
        for b in b"lx\x7fs" {
            assert!(lb.push(*b).is_none());
        }
        assert_eq!(lb.push(b'\n').as_deref(), Some("ls"));
    }

    #[test]
    fn page_list_marks_current() {
        let list = page_list(PageId::About);
        assert!(list.contains("* about"));
        assert!(list.contains("  projects"));
    }

    struct Harness {
        client_in: DuplexStream,
        client_out: DuplexStream,
        ctx: AppCtx,
    }

    fn harness(skip: bool) -> (Harness, DuplexStream) {
        harness_with_delay(skip, Duration::ZERO)
    }

    fn harness_with_delay(skip: bool, char_delay: Duration) -> (Harness, DuplexStream) {
        let registry = Arc::new(Registry::new(
            Site::embedded().unwrap(),
            AnimationConfig {
                char_delay,
                ..AnimationConfig::default()
            },
            SkipPreference::new(skip),
        ));
        let (client_in, server_read) = duplex(1024);
        let (server_write, client_out) = duplex(64 * 1024);
        let sess = Arc::new(RwLock::new(Session::new(
            Protocol::Telnet,
            PageId::Home,
            registry.default_skip,
        )));
        let ctx = AppCtx {
            output: init_session_for_telnet(server_write),
            registry,
            sess,
        };
        (
            Harness {
                client_in,
                client_out,
                ctx,
            },
            server_read,
        )
    }

    async fn read_until(out: &mut DuplexStream, needle: &str) -> String {
        let mut seen = Vec::new();
        let mut buf = [0u8; 1024];
        let found = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let n = out.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before {needle:?}");
                seen.extend_from_slice(&buf[..n]);
                if String::from_utf8_lossy(&seen).contains(needle) {
                    break;
                }
            }
        })
        .await;
        assert!(found.is_ok(), "timed out waiting for {needle:?}");
        String::from_utf8_lossy(&seen).into_owned()
    }

    #[tokio::test]
    async fn navigates_and_exits() {
        let (mut h, server_read) = harness(true);
        let ctx = h.ctx.clone();
        let conn = tokio::spawn(async move {
            let mut telnet = TelnetMachine::new();
            handle_connection(server_read, ctx, &mut telnet).await
        });

        read_until(&mut h.client_out, "MY NAME IS JOSEPH COWIN").await;

        h.client_in.write_all(b"cd projects\r\n").await.unwrap();
        read_until(&mut h.client_out, "PERSONAL PROJECTS:").await;
        assert_eq!(h.ctx.sess.read().page, PageId::Projects);

        h.client_in.write_all(b"ls\r\n").await.unwrap();
        read_until(&mut h.client_out, "* projects").await;

        h.client_in.write_all(b"exit\r\n").await.unwrap();
        read_until(&mut h.client_out, "Goodbye!").await;
        conn.await.unwrap().unwrap();
        assert_eq!(h.ctx.registry.who(), (0, 0));
    }

    #[tokio::test]
    async fn close_shows_blue_screen_until_input() {
        let (mut h, server_read) = harness(true);
        let ctx = h.ctx.clone();
        tokio::spawn(async move {
            let mut telnet = TelnetMachine::new();
            handle_connection(server_read, ctx, &mut telnet).await
        });
        read_until(&mut h.client_out, "MY NAME IS JOSEPH COWIN").await;

        h.client_in.write_all(b"cd about\r\n").await.unwrap();
        read_until(&mut h.client_out, "ABOUT ME:").await;

        h.client_in.write_all(b"close\r\n").await.unwrap();
        read_until(&mut h.client_out, "A fatal error has occurred").await;
        assert!(h.ctx.sess.read().in_bsod());

        h.client_in.write_all(b"\r\n").await.unwrap();
        read_until(&mut h.client_out, "ABOUT ME:").await;
        assert_eq!(h.ctx.sess.read().page, PageId::About);
    }

    #[tokio::test]
    async fn unknown_command_is_reported() {
        let (mut h, server_read) = harness(true);
        let ctx = h.ctx.clone();
        tokio::spawn(async move {
            let mut telnet = TelnetMachine::new();
            handle_connection(server_read, ctx, &mut telnet).await
        });

        h.client_in.write_all(b"snake\r\n").await.unwrap();
        read_until(&mut h.client_out, "snake: command not found").await;
    }

    fn spawn_connection(h: &Harness, server_read: DuplexStream) -> tokio::task::JoinHandle<AppResult<()>> {
        let ctx = h.ctx.clone();
        tokio::spawn(async move {
            let mut telnet = TelnetMachine::new();
            handle_connection(server_read, ctx, &mut telnet).await
        })
    }

    #[tokio::test]
    async fn command_output_waits_for_the_page() {
        let (mut h, server_read) = harness_with_delay(false, Duration::from_millis(20));
        spawn_connection(&h, server_read);

        let mut seen = read_until(&mut h.client_out, "MY N").await;
        h.client_in.write_all(b"help\r\n").await.unwrap();
        seen.push_str(&read_until(&mut h.client_out, "Commands:").await);

        assert!(seen.contains("MY NAME IS JOSEPH COWIN"));
        let word = seen.find("CI/CD").expect("cycling word typed");
        assert!(word < seen.find("Commands:").unwrap());
    }

    #[tokio::test]
    async fn skip_mid_page_then_replay() {
        let (mut h, server_read) = harness_with_delay(false, Duration::from_millis(20));
        spawn_connection(&h, server_read);

        read_until(&mut h.client_out, "HI").await;
        h.client_in.write_all(b"skip\r\n").await.unwrap();
        let full = read_until(&mut h.client_out, "CI/CD").await;
        let after_clear = &full[full.find(CLEAR_SCREEN).expect("screen cleared")..];
        assert!(after_clear.contains("HI!"));
        assert!(after_clear.contains("MY NAME IS JOSEPH COWIN"));
        assert!(h.ctx.sess.read().skip.preference().is_on());

        h.client_in.write_all(b"skip\r\n").await.unwrap();
        read_until(&mut h.client_out, CLEAR_SCREEN).await;
        let replay = read_until(&mut h.client_out, "MY NAME IS").await;
        assert!(replay.find("HI!").unwrap() < replay.find("MY NAME IS").unwrap());
        assert!(!h.ctx.sess.read().skip.preference().is_on());
    }

    #[tokio::test]
    async fn shell_extras() {
        let (mut h, server_read) = harness(true);
        spawn_connection(&h, server_read);
        read_until(&mut h.client_out, "MY NAME IS JOSEPH COWIN").await;

        h.client_in.write_all(b"whoami\r\n").await.unwrap();
        read_until(&mut h.client_out, "joe\n").await;

        h.client_in.write_all(b"sudo su\r\n").await.unwrap();
        read_until(&mut h.client_out, "Nice try! ;)").await;

        h.client_in.write_all(b"cat contact.txt\r\n").await.unwrap();
        read_until(&mut h.client_out, "CONTACT").await;
        assert_eq!(h.ctx.sess.read().page, PageId::Home);

        h.client_in.write_all(b"cat cv.txt\r\n").await.unwrap();
        read_until(&mut h.client_out, "cat: cv.txt: No such file").await;

        h.client_in
            .write_all(&[255, 250, 31, 0, 90, 0, 30, 255, 240])
            .await
            .unwrap();
        h.client_in.write_all(b"neofetch\r\n").await.unwrap();
        let info = read_until(&mut h.client_out, "Uptime:").await;
        assert!(info.contains("joe@joecow.in"));
        assert!(info.contains("Resolution: 90x30"));

        h.client_in.write_all(b"rm -rf /\r\n").await.unwrap();
        read_until(&mut h.client_out, "I don't think so...").await;
        read_until(&mut h.client_out, "A fatal error has occurred").await;
        assert!(h.ctx.sess.read().in_bsod());
    }

    #[test]
    fn uptime_reads_like_a_clock() {
        assert_eq!(uptime(Duration::from_secs(42)), "42s");
        assert_eq!(uptime(Duration::from_secs(125)), "2m 5s");
        assert_eq!(uptime(Duration::from_secs(3 * 3600 + 61)), "3h 1m");
    }

    #[tokio::test]
    async fn naws_updates_session() {
        let (mut h, server_read) = harness(true);
        let ctx = h.ctx.clone();
        tokio::spawn(async move {
            let mut telnet = TelnetMachine::new();
            handle_connection(server_read, ctx, &mut telnet).await
        });

        // IAC SB NAWS 0 100 0 40 IAC SE, then a line so we know it was read
        h.client_in
            .write_all(&[255, 250, 31, 0, 100, 0, 40, 255, 240])
            .await
            .unwrap();
        h.client_in.write_all(b"help\r\n").await.unwrap();
        read_until(&mut h.client_out, "Commands:").await;

        let s = h.ctx.sess.read();
        assert_eq!((s.tty_cols, s.tty_rows), (Some(100), Some(40)));
    }
}
