//! The rendering/input seam consumed by the presentation loop.
//!
//! A surface is a rectangular drawing area anchored somewhere on a monitor.
//! Coordinates are surface-local floats with the origin at the top-left.

use crate::error::SurfaceError;
use crate::layout::AlertLayout;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left/top edges inclusive, right/bottom edges exclusive.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
}

/// Keys the presentation loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Char(char),
}

/// Input gathered since the previous frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    /// Last known pointer position, surface-local.
    pub pointer: Point,
    /// A primary-button press happened this frame.
    pub pointer_pressed: bool,
    /// Keys pressed this frame, in arrival order.
    pub keys: Vec<Key>,
}

impl InputState {
    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }
}

/// Where and how large to open a surface, in monitor coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Point,
    pub size: Size,
}

impl Placement {
    /// Anchor to the monitor's top-right corner, tall enough for `count` alerts.
    pub fn top_right(monitor: Size, layout: &AlertLayout, count: usize) -> Self {
        let size = Size::new(layout.width, layout.surface_height(count));
        Self {
            position: Point::new(
                (monitor.width - size.width - layout.margin).max(0.0),
                layout.margin,
            ),
            size,
        }
    }
}

/// A drawable, input-producing window (or terminal region).
///
/// Drawing calls are only valid between [`begin_frame`](Surface::begin_frame)
/// and [`end_frame`](Surface::end_frame).
pub trait Surface {
    /// Size of the area the surface is placed within.
    fn monitor_size(&self) -> Size;

    fn open(&mut self, placement: &Placement) -> Result<(), SurfaceError>;

    fn resize(&mut self, size: Size);

    /// The host asked the surface to close (window closed, Ctrl-C, ...).
    fn should_close(&self) -> bool;

    /// Seconds elapsed since the previous call.
    fn frame_time(&mut self) -> f32;

    fn poll_input(&mut self) -> InputState;

    fn begin_frame(&mut self);

    /// Present the frame. Implementations pace themselves to their target rate.
    fn end_frame(&mut self) -> Result<(), SurfaceError>;

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn stroke_rect(&mut self, rect: Rect, thickness: f32, color: Color);

    fn line(&mut self, from: Point, to: Point, color: Color);

    fn circle(&mut self, center: Point, radius: f32, color: Color);

    fn text(&mut self, text: &str, at: Point, size: f32, color: Color);

    fn measure_text(&self, text: &str, size: f32) -> f32;

    fn close(&mut self);
}
