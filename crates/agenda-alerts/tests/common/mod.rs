#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use agenda_alerts::{Color, InputState, Key, Placement, Point, Rect, Size, Surface, SurfaceError};

/// Frames after which the fake reports a host close, so a broken loop
/// fails the test instead of hanging it.
const RUNAWAY_FRAMES: usize = 100_000;

#[derive(Debug, Clone, Default)]
pub struct ScriptedFrame {
    pub delta: f32,
    pub input: InputState,
}

impl ScriptedFrame {
    pub fn idle(delta: f32) -> Self {
        Self {
            delta,
            input: InputState::default(),
        }
    }

    pub fn click(at: Point) -> Self {
        Self {
            delta: 0.0,
            input: InputState {
                pointer: at,
                pointer_pressed: true,
                keys: Vec::new(),
            },
        }
    }

    pub fn hover(at: Point) -> Self {
        Self {
            delta: 0.0,
            input: InputState {
                pointer: at,
                ..InputState::default()
            },
        }
    }

    pub fn key(key: Key) -> Self {
        Self {
            delta: 0.0,
            input: InputState {
                keys: vec![key],
                ..InputState::default()
            },
        }
    }
}

/// In-memory surface: replays scripted frames and records every call.
pub struct ScriptedSurface {
    pub monitor: Size,
    pub fail_open: bool,
    /// `should_close` turns true once this many frames have started.
    pub close_after: Option<usize>,
    /// Delta used once the script runs out.
    pub default_delta: f32,
    pub script: VecDeque<ScriptedFrame>,
    hooks: HashMap<usize, Box<dyn FnOnce() + Send>>,

    pub opened: Vec<Placement>,
    pub closes: usize,
    pub resizes: Vec<Size>,
    pub frames: usize,
    pub presented: usize,
    pub fills: Vec<(Rect, Color)>,
    pub texts: Vec<(String, Point, Color)>,
}

impl ScriptedSurface {
    pub fn new() -> Self {
        Self {
            monitor: Size::new(1920.0, 1080.0),
            fail_open: false,
            close_after: None,
            default_delta: 1.0 / 60.0,
            script: VecDeque::new(),
            hooks: HashMap::new(),
            opened: Vec::new(),
            closes: 0,
            resizes: Vec::new(),
            frames: 0,
            presented: 0,
            fills: Vec::new(),
            texts: Vec::new(),
        }
    }

    pub fn with_script(mut self, frames: impl IntoIterator<Item = ScriptedFrame>) -> Self {
        self.script.extend(frames);
        self
    }

    /// Run `hook` at the start of frame `frame` (0-based), before the tick.
    pub fn on_frame(mut self, frame: usize, hook: impl FnOnce() + Send + 'static) -> Self {
        self.hooks.insert(frame, Box::new(hook));
        self
    }

    pub fn texts_containing(&self, needle: &str) -> Vec<&(String, Point, Color)> {
        self.texts.iter().filter(|(t, _, _)| t.contains(needle)).collect()
    }
}

impl Surface for ScriptedSurface {
    fn monitor_size(&self) -> Size {
        self.monitor
    }

    fn open(&mut self, placement: &Placement) -> Result<(), SurfaceError> {
        if self.fail_open {
            return Err(SurfaceError::Open("no display".into()));
        }
        self.opened.push(*placement);
        Ok(())
    }

    fn resize(&mut self, size: Size) {
        self.resizes.push(size);
    }

    fn should_close(&self) -> bool {
        self.frames >= RUNAWAY_FRAMES || self.close_after.is_some_and(|n| self.frames >= n)
    }

    fn frame_time(&mut self) -> f32 {
        let frame = self.frames;
        self.frames += 1;
        if let Some(hook) = self.hooks.remove(&frame) {
            hook();
        }
        match self.script.front() {
            Some(f) => f.delta,
            None => self.default_delta,
        }
    }

    fn poll_input(&mut self) -> InputState {
        self.script.pop_front().map(|f| f.input).unwrap_or_default()
    }

    fn begin_frame(&mut self) {
        self.fills.clear();
        self.texts.clear();
    }

    fn end_frame(&mut self) -> Result<(), SurfaceError> {
        self.presented += 1;
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.fills.push((rect, color));
    }

    fn stroke_rect(&mut self, _rect: Rect, _thickness: f32, _color: Color) {}

    fn line(&mut self, _from: Point, _to: Point, _color: Color) {}

    fn circle(&mut self, _center: Point, _radius: f32, _color: Color) {}

    fn text(&mut self, text: &str, at: Point, _size: f32, color: Color) {
        self.texts.push((text.to_string(), at, color));
    }

    fn measure_text(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size / 2.0
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}

/// Centre of a rect, for aiming clicks.
pub fn center(r: Rect) -> Point {
    Point::new(r.x + r.width / 2.0, r.y + r.height / 2.0)
}
