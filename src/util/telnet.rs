use tokio::io::{AsyncWrite, AsyncWriteExt};

const IAC: u8 = 255; // Interpret As Command
const WILL: u8 = 251; // I will do option
const WONT: u8 = 252; // I won't do option
const DO: u8 = 253; // Please, you do option
const DONT: u8 = 254; // Please, you don't do option
const SB: u8 = 250; // Subnegotiation begin
const SE: u8 = 240; // Subnegotiation end

const ECHO: u8 = 1; // Who echoes
const SGA: u8 = 3; // Suppress Go-Ahead
const NAWS: u8 = 31; // Negotiate About Window Size

#[derive(Debug, PartialEq, Eq)]
pub enum TelnetIn {
    /// Regular data byte
    Data(u8),
    /// Client resized terminal; cols and rows in characters
    Naws { cols: u16, rows: u16 },
}

#[derive(Debug, Default)]
pub struct TelnetResponse {
    /// Event to be processed (if any)
    pub event: Option<TelnetIn>,
    /// IAC response bytes to send back to client (if any)
    pub response: Option<Vec<u8>>,
}

impl TelnetResponse {
    fn none() -> Self {
        Self::default()
    }

    fn event(evt: TelnetIn) -> Self {
        Self {
            event: Some(evt),
            response: None,
        }
    }
}

/// Strips IAC sequences from the input stream and answers option
/// negotiation. The client keeps line editing and local echo: the page
/// animation owns the screen, so the server never echoes input.
pub struct TelnetMachine {
    /// Are we in an IAC sequence?
    in_iac: bool,
    /// If in_iac, which command are we processing (WILL/WONT/DO/DONT/SB)
    in_cmd: Option<u8>,
    /// Are we inside a subnegotiation (after SB, before IAC SE)?
    in_sb: bool,
    /// If in_sb, which option are we negotiating?
    sb_opt: u8,
    /// If in_sb, buffer of data bytes collected so far
    sb_buf: Vec<u8>,
}

impl Default for TelnetMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TelnetMachine {
    pub fn new() -> Self {
        Self {
            in_iac: false,
            in_cmd: None,
            in_sb: false,
            sb_opt: 0,
            sb_buf: Vec::with_capacity(16),
        }
    }

    /// Ask for the window size and suppress go-ahead; leave echo to the client.
    pub async fn start_negotiation<W: AsyncWrite + Unpin>(&mut self, w: &mut W) -> std::io::Result<()> {
        send3(w, IAC, WILL, SGA).await?;
        send3(w, IAC, WONT, ECHO).await?;
        send3(w, IAC, DO, NAWS).await?;
        Ok(())
    }

    /// Feed one byte.
    pub fn push(&mut self, b: u8) -> TelnetResponse {
        if !self.in_iac {
            if b == IAC {
                self.in_iac = true;
                return TelnetResponse::none();
            }
            if self.in_sb {
                // Inside SB: collect until IAC SE
                self.sb_buf.push(b);
                return TelnetResponse::none();
            }
            return TelnetResponse::event(TelnetIn::Data(b));
        }

        // We are after an IAC
        self.in_iac = false;

        match b {
            IAC if self.in_cmd.is_none() => {
                // Escaped 0xFF
                if self.in_sb {
                    self.sb_buf.push(IAC);
                    TelnetResponse::none()
                } else {
                    TelnetResponse::event(TelnetIn::Data(IAC))
                }
            }
            DO | DONT | WILL | WONT if self.in_cmd.is_none() => {
                self.in_cmd = Some(b);
                self.in_iac = true; // expect option next
                TelnetResponse::none()
            }
            SB if self.in_cmd.is_none() => {
                self.in_sb = true;
                self.sb_buf.clear();
                self.in_iac = true; // next should be the option byte
                self.in_cmd = Some(SB);
                TelnetResponse::none()
            }
            SE if self.in_cmd.is_none() => {
                if !self.in_sb {
                    return TelnetResponse::none();
                }
                let opt = self.sb_opt;
                let data = std::mem::take(&mut self.sb_buf);
                self.in_sb = false;
                // NAWS: cols_hi, cols_lo, rows_hi, rows_lo
                if opt == NAWS && data.len() >= 4 {
                    let cols = u16::from_be_bytes([data[0], data[1]]);
                    let rows = u16::from_be_bytes([data[2], data[3]]);
                    return TelnetResponse::event(TelnetIn::Naws { cols, rows });
                }
                TelnetResponse::none()
            }
            opt => {
                let Some(cmd) = self.in_cmd.take() else {
                    return TelnetResponse::none();
                };
                let response = match cmd {
                    DO => match opt {
                        SGA => None, // already offered
                        _ => Some(vec![IAC, WONT, opt]),
                    },
                    WILL => match opt {
                        NAWS => None, // requested at connect
                        _ => Some(vec![IAC, DONT, opt]),
                    },
                    DONT | WONT => None,
                    SB => {
                        self.sb_opt = opt;
                        None
                    }
                    _ => None,
                };
                TelnetResponse { event: None, response }
            }
        }
    }
}

async fn send3<W: AsyncWrite + Unpin>(w: &mut W, a: u8, b: u8, c: u8) -> std::io::Result<()> {
    w.write_all(&[a, b, c]).await
}
