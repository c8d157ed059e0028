// src/display/mod.rs
//! Output sinks for guidance: what is shown and what is spoken

pub mod terminal;

use crate::{navigation::NavigationUpdate, recorder::RecordingSnapshot};

pub use terminal::{ConsoleVoice, TerminalDisplay};

/// Renders core output. Implementations must not block.
pub trait GuidanceDisplay {
    /// Non-fatal status line, e.g. a position source error
    fn show_status(&mut self, message: &str);

    fn show_navigation(&mut self, update: &NavigationUpdate);

    fn show_recording(&mut self, snapshot: &RecordingSnapshot<'_>);
}

/// Speaks instruction text. At most one utterance is active at a time.
pub trait VoiceSink {
    /// Start speaking `text`, cutting off any utterance still in progress
    fn speak(&mut self, text: &str);

    fn cancel(&mut self);
}
