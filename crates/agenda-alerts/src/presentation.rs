//! The frame loop that animates, dismisses and draws the alert stack.
//!
//! One frame: read the elapsed time, `tick` the stack, poll input, apply a
//! dismiss click or the cancel key, then draw a snapshot of what remains.
//! Nothing in a frame blocks; pacing belongs to the surface.

use agenda_core::config::{DisplayConfig, ResizePolicy};
use tracing::{debug, info};

use crate::error::SurfaceError;
use crate::stack::{Alert, AlertStack};
use crate::surface::{Color, Key, Placement, Point, Rect, Size, Surface};
use crate::truncate::truncate_message;

/// Why a display session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every alert expired or was dismissed.
    Drained,
    /// The host closed the surface.
    Closed,
    /// The cancel key cleared the stack.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Done(SessionOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub border: Color,
    pub title: Color,
    pub message: Color,
    pub time: Color,
    pub accent: Color,
    pub button: Color,
    pub button_hover: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::rgb(45, 45, 55),
            border: Color::rgb(70, 70, 80),
            title: Color::WHITE,
            message: Color::rgb(200, 200, 200),
            time: Color::rgb(100, 200, 255),
            accent: Color::rgb(255, 165, 0),
            button: Color::rgb(70, 130, 180),
            button_hover: Color::rgb(100, 149, 237),
        }
    }
}

pub struct PresentationLoop {
    stack: AlertStack,
    resize: ResizePolicy,
    cancel_key: Key,
    message_chars: usize,
    palette: Palette,
    /// Alert count the surface is currently sized for.
    sized_for: usize,
}

impl PresentationLoop {
    pub fn new(stack: AlertStack, cfg: &DisplayConfig) -> Self {
        Self {
            stack,
            resize: cfg.resize,
            cancel_key: Key::Escape,
            message_chars: cfg.message_chars,
            palette: Palette::default(),
            sized_for: 0,
        }
    }

    pub fn with_cancel_key(mut self, key: Key) -> Self {
        self.cancel_key = key;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Open `surface` sized for the current stack and run frames until the
    /// stack drains, the host closes the surface, or the user cancels.
    ///
    /// An empty stack returns [`SessionOutcome::Drained`] without opening.
    pub fn run_session<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> Result<SessionOutcome, SurfaceError> {
        let count = self.stack.len();
        if count == 0 {
            return Ok(SessionOutcome::Drained);
        }

        let placement = Placement::top_right(surface.monitor_size(), self.stack.layout(), count);
        surface.open(&placement)?;
        self.sized_for = count;
        info!(count, resize = ?self.resize, "display session opened");

        let outcome = loop {
            match self.frame(surface) {
                Ok(FrameOutcome::Continue) => {}
                Ok(FrameOutcome::Done(outcome)) => break Ok(outcome),
                Err(e) => break Err(e),
            }
        };
        surface.close();
        if let Ok(outcome) = &outcome {
            info!(?outcome, "display session ended");
        }
        outcome
    }

    /// Run one frame against an already-open surface.
    pub fn frame<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Result<FrameOutcome, SurfaceError> {
        if surface.should_close() {
            return Ok(FrameOutcome::Done(SessionOutcome::Closed));
        }
        if self.stack.is_empty() {
            return Ok(FrameOutcome::Done(SessionOutcome::Drained));
        }

        let delta = surface.frame_time();
        self.stack.tick(delta);

        let input = surface.poll_input();
        if input.pointer_pressed && self.stack.dismiss_at(input.pointer) {
            debug!(x = input.pointer.x, y = input.pointer.y, "dismiss click handled");
        }
        if input.key_pressed(self.cancel_key) {
            let removed = self.stack.clear_all();
            debug!(removed, "cancel key cleared all alerts");
            return Ok(FrameOutcome::Done(SessionOutcome::Cancelled));
        }

        let snapshot = self.stack.snapshot();
        self.follow_stack(surface, snapshot.alerts.len());

        surface.begin_frame();
        for alert in &snapshot.alerts {
            self.draw_alert(surface, alert, input.pointer);
        }
        if let (Some(last), true) = (snapshot.alerts.last(), snapshot.overflow > 0) {
            let y = last.offset + self.stack.layout().alert_height - 30.0;
            surface.text(
                &format!("+{} more", snapshot.overflow),
                Point::new(10.0, y),
                14.0,
                self.palette.accent,
            );
        }
        surface.end_frame()?;
        Ok(FrameOutcome::Continue)
    }

    fn follow_stack<S: Surface + ?Sized>(&mut self, surface: &mut S, count: usize) {
        if self.resize != ResizePolicy::FollowStack || count == 0 || count == self.sized_for {
            return;
        }
        let layout = self.stack.layout();
        surface.resize(Size::new(layout.width, layout.surface_height(count)));
        debug!(from = self.sized_for, to = count, "surface resized to stack");
        self.sized_for = count;
    }

    fn draw_alert<S: Surface + ?Sized>(&self, surface: &mut S, alert: &Alert, pointer: Point) {
        let layout = self.stack.layout();
        let p = &self.palette;
        let y = alert.offset;
        let width = layout.width;
        let height = layout.alert_height;

        surface.fill_rect(layout.alert_rect(y), p.background);
        surface.stroke_rect(layout.alert_rect(y), 2.0, p.border);

        // Bell.
        surface.circle(Point::new(30.0, y + 25.0), 15.0, p.accent);
        surface.circle(Point::new(30.0, y + 22.0), 8.0, p.background);
        surface.fill_rect(Rect::new(26.0, y + 22.0, 8.0, 6.0), p.background);
        surface.circle(Point::new(30.0, y + 30.0), 2.0, Color::WHITE);

        surface.text(&alert.title, Point::new(55.0, y + 10.0), 18.0, p.title);

        // Clock and time.
        let clock = Point::new(60.0, y + 37.0);
        surface.circle(clock, 6.0, p.time);
        surface.line(clock, Point::new(60.0, y + 32.0), Color::WHITE);
        surface.line(clock, Point::new(64.0, y + 37.0), Color::WHITE);
        surface.text(
            &format!("Time: {}", alert.time_str),
            Point::new(75.0, y + 30.0),
            14.0,
            p.time,
        );

        surface.line(
            Point::new(10.0, y + 50.0),
            Point::new(width - 10.0, y + 50.0),
            p.accent,
        );

        let message = truncate_message(&alert.message, self.message_chars);
        surface.text(&message, Point::new(10.0, y + 60.0), 14.0, p.message);

        let initial = self.stack.settings().countdown_secs;
        let remaining = (alert.countdown / initial).clamp(0.0, 1.0) as f32;
        surface.fill_rect(
            Rect::new(10.0, y + height - 40.0, remaining * (width - 20.0), 3.0),
            p.accent,
        );

        let button = layout.dismiss_rect(y);
        let fill = if button.contains(pointer) {
            p.button_hover
        } else {
            p.button
        };
        surface.fill_rect(button, fill);
        let label = "Dismiss";
        let label_width = surface.measure_text(label, 14.0);
        surface.text(
            label,
            Point::new(button.x + (button.width - label_width) / 2.0, button.y + 6.0),
            14.0,
            Color::WHITE,
        );
    }
}
