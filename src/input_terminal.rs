//! A crossterm-backed `InputProcessor`. Raw-mode, event-driven line/char
//! reading with an optional timer interrupt, grounded on the same
//! non-blocking `crossterm::event::poll`/`read` approach the teacher's
//! input handling used, but reshaped around this crate's suspend/resume
//! split: `start_line_input`/`start_char_input` just record what's being
//! collected, and `read_response` (called by the host's own loop once it
//! sees `RunResult::AwaitingInput`) does the actual blocking-with-timeout
//! wait and hands back an `InputResponse`.

use crate::input::{InputProcessor, InputRequest, InputResponse};
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal::{self, DisableLineWrap, EnableLineWrap};
use crossterm::execute;
use std::io::{self, Write};
use std::time::{Duration, Instant};

pub struct TerminalInputProcessor {
    pending: Option<InputRequest>,
}

impl TerminalInputProcessor {
    pub fn new() -> Self {
        TerminalInputProcessor { pending: None }
    }

    /// Block (with an optional timer interrupt) until the request armed by
    /// the last `start_line_input`/`start_char_input` call is satisfied.
    pub fn read_response(&mut self) -> Result<InputResponse, String> {
        let request = self.pending.take().ok_or("no input request is outstanding")?;
        match request {
            InputRequest::Line { time, .. } => self.read_line(time),
            InputRequest::Char { time, .. } => self.read_char(time),
        }
    }

    fn read_line(&mut self, time_tenths: u16) -> Result<InputResponse, String> {
        if !atty::is(atty::Stream::Stdin) {
            let mut line = String::new();
            io::stdin()
                .read_line(&mut line)
                .map_err(|e| format!("Failed to read input: {e}"))?;
            return Ok(InputResponse::Line(trim_newline(line)));
        }

        terminal::enable_raw_mode().map_err(|e| format!("Failed to enable raw mode: {e}"))?;
        execute!(io::stdout(), DisableLineWrap).map_err(|e| format!("Failed to disable line wrap: {e}"))?;
        let result = self.poll_line(time_tenths);
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), EnableLineWrap);
        println!();
        io::stdout().flush().ok();
        result
    }

    fn poll_line(&mut self, time_tenths: u16) -> Result<InputResponse, String> {
        let mut buffer = String::new();
        let timeout = (time_tenths > 0).then(|| Duration::from_millis(time_tenths as u64 * 100));
        let start = Instant::now();

        loop {
            if let Some(timeout) = timeout {
                if start.elapsed() >= timeout {
                    return Ok(InputResponse::TimedOut);
                }
            }
            let poll_timeout = timeout.map_or(Duration::from_secs(3600), |_| Duration::from_millis(100));
            if !event::poll(poll_timeout).map_err(|e| format!("Event poll error: {e}"))? {
                continue;
            }
            match event::read().map_err(|e| format!("Event read error: {e}"))? {
                Event::Key(key) => match key.code {
                    KeyCode::Enter => return Ok(InputResponse::Line(buffer)),
                    KeyCode::Char(c) => {
                        if key.modifiers.contains(KeyModifiers::CONTROL) && c == 'c' {
                            return Err("interrupted by Ctrl+C".to_string());
                        }
                        buffer.push(c);
                        print!("{c}");
                        io::stdout().flush().ok();
                    }
                    KeyCode::Backspace => {
                        if buffer.pop().is_some() {
                            print!("\x08 \x08");
                            io::stdout().flush().ok();
                        }
                    }
                    _ => {}
                },
                Event::Paste(text) => {
                    buffer.push_str(&text);
                    print!("{text}");
                    io::stdout().flush().ok();
                }
                _ => {}
            }
        }
    }

    fn read_char(&mut self, time_tenths: u16) -> Result<InputResponse, String> {
        if !atty::is(atty::Stream::Stdin) {
            let mut line = String::new();
            io::stdin().read_line(&mut line).map_err(|e| format!("Failed to read input: {e}"))?;
            return Ok(InputResponse::Char(line.chars().next().unwrap_or('\n')));
        }

        terminal::enable_raw_mode().map_err(|e| format!("Failed to enable raw mode: {e}"))?;
        let result = self.poll_char(time_tenths);
        let _ = terminal::disable_raw_mode();
        result
    }

    fn poll_char(&mut self, time_tenths: u16) -> Result<InputResponse, String> {
        let timeout = (time_tenths > 0).then(|| Duration::from_millis(time_tenths as u64 * 100));
        let start = Instant::now();
        loop {
            if let Some(timeout) = timeout {
                if start.elapsed() >= timeout {
                    return Ok(InputResponse::TimedOut);
                }
            }
            let poll_timeout = timeout.map_or(Duration::from_secs(3600), |_| Duration::from_millis(100));
            if !event::poll(poll_timeout).map_err(|e| format!("Event poll error: {e}"))? {
                continue;
            }
            if let Event::Key(key) = event::read().map_err(|e| format!("Event read error: {e}"))? {
                match key.code {
                    KeyCode::Char(c) => {
                        if key.modifiers.contains(KeyModifiers::CONTROL) && c == 'c' {
                            return Err("interrupted by Ctrl+C".to_string());
                        }
                        return Ok(InputResponse::Char(c));
                    }
                    KeyCode::Enter => return Ok(InputResponse::Char('\n')),
                    _ => {}
                }
            }
        }
    }
}

impl Default for TerminalInputProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl InputProcessor for TerminalInputProcessor {
    fn start_line_input(&mut self, request: &InputRequest) {
        self.pending = Some(request.clone());
    }

    fn start_char_input(&mut self, request: &InputRequest) {
        self.pending = Some(request.clone());
    }

    fn cancel_input(&mut self) {
        self.pending = None;
    }
}

fn trim_newline(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
    s
}
