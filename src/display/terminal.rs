// src/display/terminal.rs
//! Terminal-based display implementation

use super::{GuidanceDisplay, VoiceSink};
use crate::{
    error::{Result, RouteError},
    geo,
    instruction::InstructionState,
    navigation::NavigationUpdate,
    recorder::RecordingSnapshot,
    route::Route,
};
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use log::{debug, warn};
use std::io::{self, Stdout, Write};

pub struct TerminalDisplay<W: Write = Stdout> {
    out: W,
}

impl TerminalDisplay<Stdout> {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for TerminalDisplay<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print a one-line summary per route
    pub fn render_route_list(&mut self, routes: &[Route]) -> Result<()> {
        if routes.is_empty() {
            execute!(self.out, Print("No saved routes\n")).map_err(RouteError::Io)?;
            return Ok(());
        }

        for route in routes {
            execute!(
                self.out,
                SetForegroundColor(Color::Green),
                Print(format!("{:>15}  ", route.id)),
                ResetColor,
                Print(format!(
                    "{:<32} {:>8.2} km {:>6} pts  {}\n",
                    route.name,
                    route.total_distance_km,
                    route.points.len(),
                    route.created_at.format("%Y-%m-%d %H:%M")
                ))
            )
            .map_err(RouteError::Io)?;
        }
        Ok(())
    }

    /// Print the details of a single route
    pub fn render_route(&mut self, route: &Route) -> Result<()> {
        execute!(
            self.out,
            SetForegroundColor(Color::Yellow),
            Print(format!("{}\n", route.name)),
            ResetColor,
            Print(format!("  Id:        {}\n", route.id)),
            Print(format!("  Distance:  {:.2} km\n", route.total_distance_km)),
            Print(format!("  Points:    {}\n", route.points.len())),
            Print(format!("  Duration:  {}\n", geo::format_duration(route.duration_seconds))),
            Print(format!("  Created:   {}\n", route.created_at.to_rfc3339()))
        )
        .map_err(RouteError::Io)?;

        if let (Some(start), Some(end)) = (route.start(), route.end()) {
            execute!(
                self.out,
                Print(format!("  Start:     {:.6}, {:.6}\n", start.latitude, start.longitude)),
                Print(format!("  End:       {:.6}, {:.6}\n", end.latitude, end.longitude))
            )
            .map_err(RouteError::Io)?;
        }
        Ok(())
    }

    fn render_navigation(&mut self, update: &NavigationUpdate) -> Result<()> {
        let color = match update.instruction.state {
            InstructionState::OffRoute => Color::Red,
            InstructionState::Arrived => Color::Green,
            InstructionState::Approaching => Color::Yellow,
            InstructionState::OnRoute => Color::Cyan,
        };

        execute!(
            self.out,
            SetForegroundColor(color),
            Print(format!("{}\n", update.instruction.text)),
            ResetColor,
            Print(format!(
                "  Distance to route: {:.0} m | Remaining: {:.2} km | Progress: {}%\n",
                update.matched.off_route_meters,
                update.matched.remaining_distance_km,
                update.matched.progress_percent
            ))
        )
        .map_err(RouteError::Io)?;

        if update.instruction.state == InstructionState::OffRoute {
            if let Some(direction) = &update.heading_to_route {
                execute!(self.out, Print(format!("  Head {} to rejoin\n", direction)))
                    .map_err(RouteError::Io)?;
            }
        }
        Ok(())
    }

    fn render_recording(&mut self, snapshot: &RecordingSnapshot<'_>) -> Result<()> {
        execute!(
            self.out,
            SetForegroundColor(Color::Magenta),
            Print("REC "),
            ResetColor,
            Print(format!(
                "{} points | {:.2} km | {}\n",
                snapshot.point_count(),
                snapshot.distance_km,
                snapshot.format_elapsed()
            ))
        )
        .map_err(RouteError::Io)
    }

    fn render_status(&mut self, message: &str) -> Result<()> {
        execute!(
            self.out,
            SetForegroundColor(Color::Blue),
            Print(format!("{}\n", message)),
            ResetColor
        )
        .map_err(RouteError::Io)
    }
}

impl<W: Write> GuidanceDisplay for TerminalDisplay<W> {
    fn show_status(&mut self, message: &str) {
        if let Err(e) = self.render_status(message) {
            warn!("Failed to render status: {}", e);
        }
    }

    fn show_navigation(&mut self, update: &NavigationUpdate) {
        if let Err(e) = self.render_navigation(update) {
            warn!("Failed to render navigation update: {}", e);
        }
    }

    fn show_recording(&mut self, snapshot: &RecordingSnapshot<'_>) {
        if let Err(e) = self.render_recording(snapshot) {
            warn!("Failed to render recording stats: {}", e);
        }
    }
}

/// Prints spoken text to the terminal in place of a speech engine
pub struct ConsoleVoice<W: Write = Stdout> {
    out: W,
    speaking: Option<String>,
}

impl ConsoleVoice<Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for ConsoleVoice<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleVoice<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            speaking: None,
        }
    }

    /// Text of the utterance currently in progress
    pub fn current(&self) -> Option<&str> {
        self.speaking.as_deref()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> VoiceSink for ConsoleVoice<W> {
    fn speak(&mut self, text: &str) {
        self.cancel();
        if let Err(e) = execute!(
            self.out,
            SetForegroundColor(Color::Green),
            Print(format!(">> {}\n", text)),
            ResetColor
        ) {
            warn!("Failed to speak: {}", e);
        }
        self.speaking = Some(text.to_string());
    }

    fn cancel(&mut self) {
        if let Some(previous) = self.speaking.take() {
            debug!("Interrupting utterance: {}", previous);
        }
    }
}
