//! `agenda-alerts`: the notification engine.
//!
//! # Overview
//!
//! ```text
//! StoreGateway ──▶ EligibilityPoller ──▶ AlertStack ◀── PresentationLoop ──▶ Surface
//!                         │                                  ▲
//!                         ├──▶ NotificationSink (one-shot)   │
//!                         └──▶ wake channel ──▶ DisplayService
//! ```
//!
//! The [`stack::AlertStack`] is the only shared state. Every operation takes
//! its single lock for the whole mutation, including the reindex, so any
//! observer sees positions `0..N-1` exactly once each. Gateway and sink calls
//! are always made with the lock released.
//!
//! | Module         | Role                                                 |
//! |----------------|------------------------------------------------------|
//! | `stack`        | Newest-first alert collection, expiry and dismissal  |
//! | `poller`       | Periodic eligibility scan, at-least-once hand-off    |
//! | `presentation` | Frame loop: animate, handle input, draw              |
//! | `surface`      | Rendering/input seam and geometry primitives         |
//! | `terminal`     | crossterm implementation of [`surface::Surface`]     |
//! | `sink`         | OS notification mechanisms                           |
//! | `display`      | Blocking task that opens a session on each wake      |

pub mod display;
pub mod error;
pub mod layout;
pub mod poller;
pub mod presentation;
pub mod sink;
pub mod stack;
pub mod surface;
pub mod terminal;
pub mod truncate;

pub use display::DisplayService;
pub use error::{SinkError, SurfaceError};
pub use layout::AlertLayout;
pub use poller::{CycleReport, EligibilityPoller, PollSettings};
pub use presentation::{FrameOutcome, PresentationLoop, SessionOutcome};
pub use sink::{sink_from_kind, NotificationSink};
pub use stack::{Alert, AlertId, AlertStack, StackSettings, StackSnapshot};
pub use surface::{Color, InputState, Key, Placement, Point, Rect, Size, Surface};
pub use terminal::TerminalSurface;
