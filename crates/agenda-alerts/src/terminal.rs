//! A [`Surface`] drawn into the terminal with crossterm.
//!
//! Surface units are mapped onto character cells of a fixed pixel size, so
//! the same layout constants drive both a pixel window and a terminal. The
//! surface occupies a region anchored at the placement's cell, draws into an
//! off-screen cell grid, and writes the whole grid once per frame.

use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEventKind,
};
use crossterm::style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use tracing::warn;

use crate::error::SurfaceError;
use crate::surface::{Color, InputState, Key, Placement, Point, Rect, Size, Surface};

/// Pixel size of one character cell.
const CELL: Size = Size {
    width: 8.0,
    height: 16.0,
};
const TARGET_FPS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    ch: char,
    fg: Option<Color>,
    bg: Option<Color>,
}

const BLANK: Cell = Cell {
    ch: ' ',
    fg: None,
    bg: None,
};

pub struct TerminalSurface {
    out: Stdout,
    /// Top-left cell of the surface region, in terminal cells.
    origin: (u16, u16),
    cols: u16,
    rows: u16,
    grid: Vec<Cell>,
    terminal_size: (u16, u16),
    pointer: Point,
    is_open: bool,
    close_requested: bool,
    needs_clear: bool,
    last_frame: Instant,
    frame_started: Instant,
    frame_budget: Duration,
}

impl TerminalSurface {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            out: io::stdout(),
            origin: (0, 0),
            cols: 0,
            rows: 0,
            grid: Vec::new(),
            terminal_size: terminal::size().unwrap_or((80, 24)),
            pointer: Point::default(),
            is_open: false,
            close_requested: false,
            needs_clear: true,
            last_frame: now,
            frame_started: now,
            frame_budget: Duration::from_secs(1) / TARGET_FPS,
        }
    }

    fn place(&mut self, position: Point, size: Size) {
        let (term_cols, term_rows) = self.terminal_size;
        let col = ((position.x / CELL.width).floor().max(0.0) as u16).min(term_cols.saturating_sub(1));
        let row = ((position.y / CELL.height).floor().max(0.0) as u16).min(term_rows.saturating_sub(1));
        let cols = ((size.width / CELL.width).ceil() as u16).min(term_cols - col);
        let rows = ((size.height / CELL.height).ceil() as u16).min(term_rows - row);
        self.origin = (col, row);
        self.cols = cols;
        self.rows = rows;
        self.grid = vec![BLANK; cols as usize * rows as usize];
        self.needs_clear = true;
    }

    fn cell_of(p: Point) -> (i32, i32) {
        (
            (p.x / CELL.width).floor() as i32,
            (p.y / CELL.height).floor() as i32,
        )
    }

    fn cell_mut(&mut self, col: i32, row: i32) -> Option<&mut Cell> {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return None;
        }
        let index = row as usize * self.cols as usize + col as usize;
        self.grid.get_mut(index)
    }

    /// Draw a glyph, keeping whatever background is already there.
    fn put(&mut self, col: i32, row: i32, ch: char, fg: Color) {
        if let Some(cell) = self.cell_mut(col, row) {
            cell.ch = ch;
            cell.fg = Some(fg);
        }
    }

    fn cell_span(start: f32, len: f32, unit: f32) -> std::ops::Range<i32> {
        let first = (start / unit).floor() as i32;
        let last = ((start + len) / unit).ceil() as i32;
        first..last.max(first + 1)
    }

    fn flush_grid(&mut self) -> io::Result<()> {
        if self.needs_clear {
            queue!(self.out, ResetColor, Clear(ClearType::All))?;
            self.needs_clear = false;
        }
        let (ox, oy) = self.origin;
        for row in 0..self.rows {
            queue!(self.out, MoveTo(ox, oy + row))?;
            let mut fg = None;
            let mut bg = None;
            for col in 0..self.cols {
                let cell = self.grid[row as usize * self.cols as usize + col as usize];
                if cell.bg != bg {
                    queue!(self.out, SetBackgroundColor(term_color(cell.bg)))?;
                    bg = cell.bg;
                }
                if cell.fg != fg {
                    queue!(self.out, SetForegroundColor(term_color(cell.fg)))?;
                    fg = cell.fg;
                }
                queue!(self.out, Print(cell.ch))?;
            }
            queue!(self.out, ResetColor)?;
        }
        self.out.flush()
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

fn term_color(c: Option<Color>) -> TermColor {
    match c {
        Some(c) => TermColor::Rgb {
            r: c.r,
            g: c.g,
            b: c.b,
        },
        None => TermColor::Reset,
    }
}

impl Surface for TerminalSurface {
    fn monitor_size(&self) -> Size {
        Size::new(
            self.terminal_size.0 as f32 * CELL.width,
            self.terminal_size.1 as f32 * CELL.height,
        )
    }

    fn open(&mut self, placement: &Placement) -> Result<(), SurfaceError> {
        enable_raw_mode().map_err(|e| SurfaceError::Open(e.to_string()))?;
        if let Err(e) = execute!(self.out, EnterAlternateScreen, EnableMouseCapture, Hide) {
            let _ = disable_raw_mode();
            return Err(SurfaceError::Open(e.to_string()));
        }
        self.is_open = true;
        self.close_requested = false;
        self.place(placement.position, placement.size);
        let now = Instant::now();
        self.last_frame = now;
        self.frame_started = now;
        Ok(())
    }

    fn resize(&mut self, size: Size) {
        let position = Point::new(
            self.origin.0 as f32 * CELL.width,
            self.origin.1 as f32 * CELL.height,
        );
        self.place(position, size);
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn frame_time(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame);
        self.last_frame = now;
        delta.as_secs_f32()
    }

    fn poll_input(&mut self) -> InputState {
        let mut input = InputState {
            pointer: self.pointer,
            ..InputState::default()
        };
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!(error = %e, "terminal input poll failed");
                    break;
                }
            }
            let ev = match event::read() {
                Ok(ev) => ev,
                Err(e) => {
                    warn!(error = %e, "terminal input read failed");
                    break;
                }
            };
            match ev {
                Event::Mouse(mouse) => {
                    let local = Point::new(
                        (mouse.column as f32 - self.origin.0 as f32 + 0.5) * CELL.width,
                        (mouse.row as f32 - self.origin.1 as f32 + 0.5) * CELL.height,
                    );
                    self.pointer = local;
                    input.pointer = local;
                    if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
                        input.pointer_pressed = true;
                    }
                }
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.close_requested = true;
                    }
                    KeyCode::Esc => input.keys.push(Key::Escape),
                    KeyCode::Enter => input.keys.push(Key::Enter),
                    KeyCode::Char(c) => input.keys.push(Key::Char(c)),
                    _ => {}
                },
                Event::Resize(cols, rows) => {
                    self.terminal_size = (cols, rows);
                    self.needs_clear = true;
                }
                _ => {}
            }
        }
        input
    }

    fn begin_frame(&mut self) {
        self.grid.fill(BLANK);
    }

    fn end_frame(&mut self) -> Result<(), SurfaceError> {
        self.flush_grid()?;
        let elapsed = self.frame_started.elapsed();
        if elapsed < self.frame_budget {
            std::thread::sleep(self.frame_budget - elapsed);
        }
        self.frame_started = Instant::now();
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let cols = Self::cell_span(rect.x, rect.width, CELL.width);
        if rect.height < CELL.height / 2.0 {
            // Too thin for a full cell: draw as a rule.
            let row = Self::cell_of(Point::new(rect.x, rect.y)).1;
            for col in cols {
                self.put(col, row, '─', color);
            }
            return;
        }
        for row in Self::cell_span(rect.y, rect.height, CELL.height) {
            for col in cols.clone() {
                if let Some(cell) = self.cell_mut(col, row) {
                    *cell = Cell {
                        ch: ' ',
                        fg: None,
                        bg: Some(color),
                    };
                }
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, _thickness: f32, color: Color) {
        let (left, top) = Self::cell_of(Point::new(rect.x, rect.y));
        let (right, bottom) = Self::cell_of(Point::new(
            rect.x + rect.width - 1.0,
            rect.y + rect.height - 1.0,
        ));
        for col in left + 1..right {
            self.put(col, top, '─', color);
            self.put(col, bottom, '─', color);
        }
        for row in top + 1..bottom {
            self.put(left, row, '│', color);
            self.put(right, row, '│', color);
        }
        self.put(left, top, '┌', color);
        self.put(right, top, '┐', color);
        self.put(left, bottom, '└', color);
        self.put(right, bottom, '┘', color);
    }

    fn line(&mut self, from: Point, to: Point, color: Color) {
        let (c0, r0) = Self::cell_of(from);
        let (c1, r1) = Self::cell_of(to);
        if r0 == r1 {
            for col in c0.min(c1)..=c0.max(c1) {
                self.put(col, r0, '─', color);
            }
        } else if c0 == c1 {
            for row in r0.min(r1)..=r0.max(r1) {
                self.put(c0, row, '│', color);
            }
        } else {
            self.put(c0, r0, '·', color);
            self.put(c1, r1, '·', color);
        }
    }

    fn circle(&mut self, center: Point, radius: f32, color: Color) {
        let (col, row) = Self::cell_of(center);
        let glyph = if radius < CELL.width { '•' } else { '●' };
        self.put(col, row, glyph, color);
    }

    fn text(&mut self, text: &str, at: Point, _size: f32, color: Color) {
        let (col, row) = Self::cell_of(at);
        for (i, ch) in text.chars().enumerate() {
            self.put(col + i as i32, row, ch, color);
        }
    }

    fn measure_text(&self, text: &str, _size: f32) -> f32 {
        text.chars().count() as f32 * CELL.width
    }

    fn close(&mut self) {
        if !self.is_open {
            return;
        }
        self.is_open = false;
        if let Err(e) = execute!(
            self.out,
            ResetColor,
            Show,
            DisableMouseCapture,
            LeaveAlternateScreen
        ) {
            warn!(error = %e, "restoring terminal screen failed");
        }
        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "leaving raw mode failed");
        }
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_with_grid(cols: u16, rows: u16) -> TerminalSurface {
        let mut s = TerminalSurface::new();
        s.terminal_size = (cols, rows);
        s.place(
            Point::new(0.0, 0.0),
            Size::new(cols as f32 * CELL.width, rows as f32 * CELL.height),
        );
        s
    }

    fn row_text(s: &TerminalSurface, row: u16) -> String {
        let start = row as usize * s.cols as usize;
        s.grid[start..start + s.cols as usize]
            .iter()
            .map(|c| c.ch)
            .collect()
    }

    #[test]
    fn placement_maps_pixels_to_cells() {
        let mut s = TerminalSurface::new();
        s.terminal_size = (200, 60);
        s.place(Point::new(1480.0, 20.0), Size::new(420.0, 150.0));
        assert_eq!(s.origin, (185, 1));
        assert_eq!((s.cols, s.rows), (15, 10));
    }

    #[test]
    fn region_is_clipped_to_terminal() {
        let mut s = TerminalSurface::new();
        s.terminal_size = (40, 10);
        s.place(Point::new(0.0, 0.0), Size::new(420.0, 1000.0));
        assert_eq!((s.cols, s.rows), (40, 10));
    }

    #[test]
    fn text_is_clipped_at_right_edge() {
        let mut s = surface_with_grid(5, 1);
        s.text("Dismiss", Point::new(0.0, 0.0), 14.0, Color::WHITE);
        assert_eq!(row_text(&s, 0), "Dismi");
    }

    #[test]
    fn fill_then_text_keeps_background() {
        let mut s = surface_with_grid(4, 2);
        let bg = Color::rgb(45, 45, 55);
        s.fill_rect(Rect::new(0.0, 0.0, 32.0, 32.0), bg);
        s.text("ab", Point::new(0.0, 16.0), 14.0, Color::WHITE);
        let cell = s.grid[4];
        assert_eq!(cell.ch, 'a');
        assert_eq!(cell.bg, Some(bg));
        assert_eq!(cell.fg, Some(Color::WHITE));
    }

    #[test]
    fn thin_rect_becomes_a_rule() {
        let mut s = surface_with_grid(6, 1);
        s.fill_rect(Rect::new(0.0, 4.0, 24.0, 3.0), Color::WHITE);
        assert_eq!(row_text(&s, 0), "───   ");
    }

    #[test]
    fn measure_is_monospace() {
        let s = TerminalSurface::new();
        assert_eq!(s.measure_text("Dismiss", 14.0), 56.0);
    }

    #[test]
    fn begin_frame_clears_grid() {
        let mut s = surface_with_grid(3, 1);
        s.text("xyz", Point::new(0.0, 0.0), 14.0, Color::WHITE);
        s.begin_frame();
        assert_eq!(row_text(&s, 0), "   ");
    }
}
