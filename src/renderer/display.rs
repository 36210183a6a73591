use anyhow::Result;
use crossterm::{
    cursor,
    style::Print,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use serde::Serialize;
use std::io::{BufWriter, Stdout, Write};

use super::cell::CellData;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Ascii,
    Rgb,
}

const ASCII_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Owns the terminal while a clip plays: raw mode, alternate screen, hidden
/// cursor. All of it is undone on drop.
pub struct DisplayManager {
    stdout: BufWriter<Stdout>,
    mode: DisplayMode,
    last_cells: Option<Vec<CellData>>,
    render_buffer: Vec<u8>,
}

impl DisplayManager {
    pub fn new(mode: DisplayMode) -> Result<Self> {
        let stdout = BufWriter::with_capacity(1024 * 1024, std::io::stdout());
        let mut dm = Self {
            stdout,
            mode,
            last_cells: None,
            render_buffer: Vec::with_capacity(1024 * 1024),
        };

        dm.initialize_terminal()?;
        Ok(dm)
    }

    fn initialize_terminal(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.stdout.execute(EnterAlternateScreen)?;
        self.stdout.execute(cursor::Hide)?;
        // No line wrapping at the right edge.
        self.stdout.execute(Print("\x1b[?7l"))?;
        Ok(())
    }

    pub fn terminal_size(&self) -> Result<(u16, u16)> {
        Ok(terminal::size()?)
    }

    /// Draws `cells` (rows of `width`) centered, writing only cells that changed.
    pub fn render_diff(&mut self, cells: &[CellData], width: usize) -> Result<()> {
        let (term_cols, term_rows) = terminal::size().unwrap_or((80, 24));
        encode_diff(
            &mut self.render_buffer,
            &mut self.last_cells,
            cells,
            width,
            (term_cols, term_rows),
            self.mode,
        );

        self.stdout.write_all(&self.render_buffer)?;
        self.stdout.flush()?;
        Ok(())
    }

    /// Prints a status line under the picture.
    pub fn status_line(&mut self, text: &str) -> Result<()> {
        let (_, rows) = terminal::size().unwrap_or((80, 24));
        self.stdout.execute(cursor::MoveTo(0, rows.saturating_sub(1)))?;
        self.stdout.execute(Print(format!("\x1b[0m\x1b[2K{}", text)))?;
        Ok(())
    }
}

impl Drop for DisplayManager {
    fn drop(&mut self) {
        let _ = self.stdout.execute(Print("\x1b[0m\x1b[?7h"));
        let _ = self.stdout.execute(cursor::Show);
        let _ = self.stdout.execute(LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn encode_diff(
    buffer: &mut Vec<u8>,
    last_cells: &mut Option<Vec<CellData>>,
    cells: &[CellData],
    width: usize,
    (term_cols, term_rows): (u16, u16),
    mode: DisplayMode,
) {
    buffer.clear();
    if width == 0 {
        return;
    }

    // Synchronized update: the terminal shows the frame only when complete.
    buffer.extend_from_slice(b"\x1b[?2026h");

    let mut force_redraw = false;
    if last_cells.as_ref().map(Vec::len) != Some(cells.len()) {
        buffer.extend_from_slice(b"\x1b[2J");
        *last_cells = Some(vec![CellData::default(); cells.len()]);
        force_redraw = true;
    }
    let Some(previous) = last_cells.as_mut() else {
        return;
    };

    let content_width = width as u16;
    let content_height = (cells.len() / width) as u16;
    let offset_x = term_cols.saturating_sub(content_width) / 2;
    let offset_y = term_rows.saturating_sub(content_height) / 2;

    let mut cursor_at: Option<(u16, u16)> = None;
    let mut last_fg = None;
    let mut last_bg = None;

    for (i, cell) in cells.iter().enumerate() {
        if !force_redraw && previous[i] == *cell {
            cursor_at = None;
            continue;
        }

        let x = (i % width) as u16 + offset_x;
        let y = (i / width) as u16 + offset_y;
        if x >= term_cols || y >= term_rows {
            cursor_at = None;
            continue;
        }

        if cursor_at != Some((x, y)) {
            let _ = write!(buffer, "\x1b[{};{}H", y + 1, x + 1);
        }

        match mode {
            DisplayMode::Rgb => {
                if last_fg != Some(cell.fg) {
                    let (r, g, b) = cell.fg;
                    let _ = write!(buffer, "\x1b[38;2;{};{};{}m", r, g, b);
                    last_fg = Some(cell.fg);
                }
                if last_bg != Some(cell.bg) {
                    let (r, g, b) = cell.bg;
                    let _ = write!(buffer, "\x1b[48;2;{};{};{}m", r, g, b);
                    last_bg = Some(cell.bg);
                }
                let mut utf8 = [0u8; 4];
                buffer.extend_from_slice(cell.char.encode_utf8(&mut utf8).as_bytes());
            }
            DisplayMode::Ascii => {
                let idx = cell.brightness() as usize * (ASCII_RAMP.len() - 1) / 255;
                let mut utf8 = [0u8; 4];
                buffer.extend_from_slice(ASCII_RAMP[idx].encode_utf8(&mut utf8).as_bytes());
            }
        }

        previous[i] = *cell;
        cursor_at = Some((x + 1, y));
    }

    buffer.extend_from_slice(b"\x1b[0m");
    buffer.extend_from_slice(b"\x1b[?2026l");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> CellData {
        CellData {
            char: '▀',
            fg: (255, 0, 0),
            bg: (0, 0, 0),
        }
    }

    #[test]
    fn first_frame_clears_and_draws_everything() {
        let mut buffer = Vec::new();
        let mut last = None;
        encode_diff(&mut buffer, &mut last, &[red(), red()], 2, (2, 1), DisplayMode::Rgb);

        let out = String::from_utf8(buffer).unwrap();
        assert!(out.contains("\x1b[2J"));
        assert!(out.contains("\x1b[1;1H"));
        assert_eq!(out.matches('▀').count(), 2);
        // Same colours: one colour escape for both cells.
        assert_eq!(out.matches("\x1b[38;2;255;0;0m").count(), 1);
    }

    #[test]
    fn unchanged_cells_are_skipped() {
        let mut buffer = Vec::new();
        let mut last = None;
        encode_diff(&mut buffer, &mut last, &[red(), red()], 2, (2, 1), DisplayMode::Rgb);

        let mut changed = red();
        changed.fg = (0, 255, 0);
        encode_diff(&mut buffer, &mut last, &[red(), changed], 2, (2, 1), DisplayMode::Rgb);

        let out = String::from_utf8(buffer).unwrap();
        assert!(!out.contains("\x1b[2J"));
        assert_eq!(out.matches('▀').count(), 1);
        assert!(out.contains("\x1b[1;2H"));
    }

    #[test]
    fn ascii_mode_has_no_colour_escapes() {
        let white = CellData {
            char: '▀',
            fg: (255, 255, 255),
            bg: (255, 255, 255),
        };
        let mut buffer = Vec::new();
        let mut last = None;
        encode_diff(&mut buffer, &mut last, &[white, CellData::default()], 2, (2, 1), DisplayMode::Ascii);

        let out = String::from_utf8(buffer).unwrap();
        assert!(out.contains('@'));
        assert!(!out.contains("38;2"));
    }

    #[test]
    fn content_is_centered() {
        let mut buffer = Vec::new();
        let mut last = None;
        encode_diff(&mut buffer, &mut last, &[red()], 1, (11, 5), DisplayMode::Rgb);
        let out = String::from_utf8(buffer).unwrap();
        assert!(out.contains("\x1b[3;6H"));
    }
}
