//! A crossterm-backed `ZMachineDisplay`: raw mode, an alternate screen, and
//! the lower/upper window split Z-Machine games expect. The lower window
//! scrolls character by character like a terminal; the upper window is an
//! absolute-positioned, non-scrolling status/menu area redrawn from its own
//! buffer whenever the game switches back to the lower window.

use crate::display_trait::{DisplayError, ZMachineDisplay};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, ScrollUp};
use crossterm::{execute, queue};
use log::debug;
use std::io::{Stdout, Write};

pub struct TerminalDisplay {
    stdout: Stdout,
    cursor_row: u16,
    cursor_col: u16,
    terminal_width: u16,
    terminal_height: u16,
    /// Difference between crossterm's reported height and the terminal's
    /// actual visible height; some terminals report scrollback-inclusive
    /// height through crossterm, so every row we move to gets this added.
    coordinate_offset: u16,
    upper_window_lines: u16,
    current_window: u8,
    upper_cursor_row: u16,
    upper_cursor_col: u16,
    upper_window_content: Vec<Vec<char>>,
    reverse_video: bool,
}

impl TerminalDisplay {
    pub fn new() -> Result<Self, DisplayError> {
        let mut stdout = std::io::stdout();
        execute!(stdout, Hide, Clear(ClearType::All), MoveTo(0, 0))?;
        terminal::enable_raw_mode()
            .map_err(|e| DisplayError::new(format!("Failed to enable raw mode: {}", e)))?;

        let (width, reported_height) = terminal::size()
            .map_err(|e| DisplayError::new(format!("Failed to query terminal size: {}", e)))?;
        let actual_height = Self::visible_rows().unwrap_or(reported_height);
        let coordinate_offset = reported_height.saturating_sub(actual_height);

        Ok(Self {
            stdout,
            cursor_row: coordinate_offset,
            cursor_col: 0,
            terminal_width: width,
            terminal_height: actual_height,
            coordinate_offset,
            upper_window_lines: 0,
            current_window: 0,
            upper_cursor_row: 0,
            upper_cursor_col: 0,
            upper_window_content: Vec::new(),
            reverse_video: false,
        })
    }

    /// crossterm occasionally reports the scrollback-inclusive height
    /// rather than the visible one; `stty size` gives us the real answer
    /// when it's available.
    fn visible_rows() -> Option<u16> {
        let output = std::process::Command::new("stty").arg("size").output().ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8(output.stdout).ok()?;
        let rows: u16 = text.split_whitespace().next()?.parse().ok()?;
        Some(rows)
    }

    fn move_to_visible(&mut self, col: u16, row: u16) -> Result<(), String> {
        let visible_row = row + self.coordinate_offset;
        queue!(self.stdout, MoveTo(col, visible_row)).map_err(|e| format!("Failed to move cursor: {}", e))
    }

    fn print_char_at_cursor(&mut self, ch: char) -> Result<(), String> {
        if self.current_window == 0 {
            self.print_char_lower_window(ch)
        } else {
            self.print_char_upper_window(ch)
        }
    }

    fn print_char_lower_window(&mut self, ch: char) -> Result<(), String> {
        match ch {
            '\n' => {
                self.cursor_col = 0;
                self.cursor_row += 1;
                if self.cursor_row >= self.terminal_height - self.upper_window_lines {
                    self.scroll_lower_window_up(1)?;
                    self.cursor_row = self.terminal_height - self.upper_window_lines - 1;
                }
                self.move_to_visible(self.cursor_col, self.cursor_row)?;
            }
            '\x08' => {
                if self.cursor_col > 0 {
                    self.cursor_col -= 1;
                    self.move_to_visible(self.cursor_col, self.cursor_row)?;
                    queue!(self.stdout, Print(' ')).map_err(|e| format!("Failed to print space: {}", e))?;
                    self.move_to_visible(self.cursor_col, self.cursor_row)?;
                }
            }
            _ => {
                self.set_style_colors()?;
                self.move_to_visible(self.cursor_col, self.cursor_row)?;
                queue!(self.stdout, Print(ch)).map_err(|e| format!("Failed to print character: {}", e))?;
                queue!(self.stdout, ResetColor).map_err(|e| format!("Failed to reset colors: {}", e))?;

                self.cursor_col += 1;
                if self.cursor_col >= self.terminal_width {
                    self.cursor_col = 0;
                    self.cursor_row += 1;
                    if self.cursor_row >= self.terminal_height - self.upper_window_lines {
                        self.scroll_lower_window_up(1)?;
                        self.cursor_row = self.terminal_height - self.upper_window_lines - 1;
                    }
                }
            }
        }
        self.stdout.flush().map_err(|e| format!("Failed to flush output: {}", e))
    }

    fn print_char_upper_window(&mut self, ch: char) -> Result<(), String> {
        if self.upper_window_lines == 0 {
            debug!("print to upper window with no upper window open: '{}'", ch);
            return Ok(());
        }
        match ch {
            '\n' => {
                self.upper_cursor_col = 0;
                if self.upper_cursor_row + 1 < self.upper_window_lines {
                    self.upper_cursor_row += 1;
                }
            }
            '\x08' => {
                if self.upper_cursor_col > 0 {
                    self.upper_cursor_col -= 1;
                    if let Some(line) = self.upper_window_content.get_mut(self.upper_cursor_row as usize) {
                        if let Some(slot) = line.get_mut(self.upper_cursor_col as usize) {
                            *slot = ' ';
                        }
                    }
                    self.move_to_visible(self.upper_cursor_col, self.upper_cursor_row)?;
                    queue!(self.stdout, Print(' ')).map_err(|e| format!("Failed to print space: {}", e))?;
                }
            }
            _ => {
                while self.upper_window_content.len() <= self.upper_cursor_row as usize {
                    self.upper_window_content.push(vec![' '; self.terminal_width as usize]);
                }
                if let Some(slot) = self.upper_window_content[self.upper_cursor_row as usize]
                    .get_mut(self.upper_cursor_col as usize)
                {
                    *slot = ch;
                }
                self.set_style_colors()?;
                self.move_to_visible(self.upper_cursor_col, self.upper_cursor_row)?;
                queue!(self.stdout, Print(ch)).map_err(|e| format!("Failed to print character: {}", e))?;
                queue!(self.stdout, ResetColor).map_err(|e| format!("Failed to reset colors: {}", e))?;

                self.upper_cursor_col += 1;
                if self.upper_cursor_col >= self.terminal_width {
                    // No auto-wrap in the upper window.
                    self.upper_cursor_col = self.terminal_width - 1;
                }
            }
        }
        self.stdout.flush().map_err(|e| format!("Failed to flush output: {}", e))
    }

    fn set_style_colors(&mut self) -> Result<(), String> {
        if self.reverse_video {
            queue!(self.stdout, SetBackgroundColor(Color::White), SetForegroundColor(Color::Black))
        } else {
            queue!(self.stdout, SetBackgroundColor(Color::Black), SetForegroundColor(Color::White))
        }
        .map_err(|e| format!("Failed to set colors: {}", e))
    }

    fn redraw_upper_window(&mut self) -> Result<(), String> {
        if self.upper_window_lines == 0 {
            return Ok(());
        }
        let lines_to_draw = self.upper_window_lines.min(self.upper_window_content.len() as u16);
        for row in 0..lines_to_draw {
            self.move_to_visible(0, row)?;
            queue!(self.stdout, SetBackgroundColor(Color::White), SetForegroundColor(Color::Black))
                .map_err(|e| format!("Failed to set reverse video: {}", e))?;
            if let Some(line) = self.upper_window_content.get(row as usize) {
                for &ch in line.iter() {
                    queue!(self.stdout, Print(ch)).map_err(|e| format!("Failed to print character: {}", e))?;
                }
            }
            queue!(self.stdout, ResetColor).map_err(|e| format!("Failed to reset colors: {}", e))?;
        }
        self.stdout.flush().map_err(|e| format!("Failed to flush upper window redraw: {}", e))
    }

    fn scroll_lower_window_up(&mut self, lines: u16) -> Result<(), String> {
        let scroll_bottom = self.terminal_height - 1;
        for _ in 0..lines {
            self.move_to_visible(0, scroll_bottom)?;
            queue!(self.stdout, ScrollUp(1)).map_err(|e| format!("Failed to scroll up: {}", e))?;
        }
        self.stdout.flush().map_err(|e| format!("Failed to flush after scroll: {}", e))
    }
}

impl ZMachineDisplay for TerminalDisplay {
    fn clear_screen(&mut self) -> Result<(), DisplayError> {
        execute!(self.stdout, Clear(ClearType::All))
            .map_err(|e| DisplayError::new(format!("Failed to clear screen: {}", e)))?;
        self.upper_window_lines = 0;
        self.upper_window_content.clear();
        self.upper_cursor_row = 0;
        self.upper_cursor_col = 0;
        self.current_window = 0;
        self.cursor_row = 0;
        self.cursor_col = 0;
        self.move_to_visible(self.cursor_col, self.cursor_row)
            .map_err(DisplayError::new)?;
        Ok(())
    }

    fn split_window(&mut self, lines: u16) -> Result<(), DisplayError> {
        self.upper_window_lines = lines;
        for row in 0..lines {
            self.move_to_visible(0, row).map_err(DisplayError::new)?;
            queue!(self.stdout, Clear(ClearType::CurrentLine))
                .map_err(|e| DisplayError::new(format!("Failed to clear line: {}", e)))?;
        }
        self.upper_window_content.clear();
        for _ in 0..lines {
            self.upper_window_content.push(vec![' '; self.terminal_width as usize]);
        }
        self.upper_cursor_row = 0;
        self.upper_cursor_col = 0;
        if self.cursor_row < self.upper_window_lines {
            self.cursor_row = self.upper_window_lines;
            self.cursor_col = 0;
        }
        self.stdout
            .flush()
            .map_err(|e| DisplayError::new(format!("Failed to flush: {}", e)))?;
        Ok(())
    }

    fn set_window(&mut self, window: u8) -> Result<(), DisplayError> {
        let old_window = self.current_window;
        self.current_window = window;
        if old_window == 1 && window == 0 && self.upper_window_lines > 0 {
            self.redraw_upper_window().map_err(DisplayError::new)?;
        }
        Ok(())
    }

    fn set_cursor(&mut self, line: u16, column: u16) -> Result<(), DisplayError> {
        if self.current_window == 1 {
            self.upper_cursor_row = (line.max(1) - 1).min(self.upper_window_lines.saturating_sub(1));
            self.upper_cursor_col = (column.max(1) - 1).min(self.terminal_width - 1);
        }
        Ok(())
    }

    fn print(&mut self, text: &str) -> Result<(), DisplayError> {
        for ch in text.chars() {
            self.print_char_at_cursor(ch).map_err(DisplayError::new)?;
        }
        Ok(())
    }

    fn print_char(&mut self, ch: char) -> Result<(), DisplayError> {
        self.print_char_at_cursor(ch).map_err(DisplayError::new)
    }

    fn erase_window(&mut self, window: i16) -> Result<(), DisplayError> {
        match window {
            -1 => {
                execute!(self.stdout, Clear(ClearType::All))
                    .map_err(|e| DisplayError::new(format!("Failed to clear screen: {}", e)))?;
                for line in &mut self.upper_window_content {
                    line.fill(' ');
                }
                self.upper_cursor_row = 0;
                self.upper_cursor_col = 0;
                self.cursor_row = self.terminal_height - 1;
                self.cursor_col = 0;
                self.current_window = 0;
                self.move_to_visible(self.cursor_col, self.cursor_row)
                    .map_err(DisplayError::new)?;
            }
            0 => {
                for row in self.upper_window_lines..self.terminal_height {
                    self.move_to_visible(0, row).map_err(DisplayError::new)?;
                    queue!(self.stdout, Clear(ClearType::CurrentLine))
                        .map_err(|e| DisplayError::new(format!("Failed to clear line: {}", e)))?;
                }
                self.cursor_row = self.terminal_height - 1;
                self.cursor_col = 0;
            }
            1 => {
                for row in 0..self.upper_window_lines {
                    self.move_to_visible(0, row).map_err(DisplayError::new)?;
                    queue!(self.stdout, Clear(ClearType::CurrentLine))
                        .map_err(|e| DisplayError::new(format!("Failed to clear line: {}", e)))?;
                }
                for line in &mut self.upper_window_content {
                    line.fill(' ');
                }
                self.upper_cursor_row = 0;
                self.upper_cursor_col = 0;
            }
            _ => {}
        }
        self.stdout
            .flush()
            .map_err(|e| DisplayError::new(format!("Failed to flush: {}", e)))?;
        Ok(())
    }

    fn handle_resize(&mut self, width: u16, height: u16) {
        self.terminal_width = width;
        self.terminal_height = height;
        self.cursor_col = self.cursor_col.min(width.saturating_sub(1));
        self.cursor_row = self.cursor_row.min(height.saturating_sub(1));
        self.upper_cursor_col = self.upper_cursor_col.min(width.saturating_sub(1));
        self.upper_cursor_row = self.upper_cursor_row.min(self.upper_window_lines.saturating_sub(1));
    }

    fn show_status(&mut self, _location: &str, _score: i16, _moves: u16) -> Result<(), DisplayError> {
        // V3 games draw their own status line into the split upper window;
        // nothing extra to do here.
        Ok(())
    }

    fn erase_line(&mut self) -> Result<(), DisplayError> {
        if self.current_window == 1 {
            self.move_to_visible(self.upper_cursor_col, self.upper_cursor_row)
                .map_err(DisplayError::new)?;
            queue!(self.stdout, Clear(ClearType::UntilNewLine))
                .map_err(|e| DisplayError::new(format!("Failed to clear line: {}", e)))?;
            if let Some(line) = self.upper_window_content.get_mut(self.upper_cursor_row as usize) {
                for slot in &mut line[self.upper_cursor_col as usize..] {
                    *slot = ' ';
                }
            }
            self.stdout
                .flush()
                .map_err(|e| DisplayError::new(format!("Failed to flush: {}", e)))?;
        }
        Ok(())
    }

    fn get_cursor(&mut self) -> Result<(u16, u16), DisplayError> {
        if self.current_window == 1 {
            Ok((self.upper_cursor_row + 1, self.upper_cursor_col + 1))
        } else {
            Ok((self.cursor_row + 1, self.cursor_col + 1))
        }
    }

    fn set_buffer_mode(&mut self, _buffered: bool) -> Result<(), DisplayError> {
        Ok(())
    }

    fn set_text_style(&mut self, style: u16) -> Result<(), DisplayError> {
        self.reverse_video = (style & 1) != 0;
        Ok(())
    }

    fn print_input_echo(&mut self, text: &str) -> Result<(), DisplayError> {
        self.print(text)
    }

    fn get_terminal_size(&self) -> (u16, u16) {
        (self.terminal_width, self.terminal_height)
    }

    fn force_refresh(&mut self) -> Result<(), DisplayError> {
        self.stdout
            .flush()
            .map_err(|e| DisplayError::new(format!("Failed to flush: {}", e)))?;
        Ok(())
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, Show, ResetColor);
        let _ = terminal::disable_raw_mode();
    }
}
