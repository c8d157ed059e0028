// src/guide.rs
//! Coordinates recording, navigation, storage and output sinks.
//!
//! Position sources run as background tasks, but every fix is funneled
//! through one event channel and handled to completion, display and voice
//! included, before the next one is taken.

use crate::{
    clock::{Clock, SystemClock},
    display::{GuidanceDisplay, VoiceSink},
    error::{Result, RouteError},
    gps::{PositionSource, Subscription},
    instruction::GuidanceSettings,
    navigation::{NavigationSession, NavigationUpdate},
    recorder::{Recorder, RecordingSnapshot},
    route::{Fix, Route},
    scheduler::ScheduledTask,
    store::{KeyValueStore, RouteStore},
};
use log::{debug, info, warn};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;

pub const NAVIGATION_STARTED: &str = "Navigation started. Follow the route.";
pub const NAVIGATION_STOPPED: &str = "Navigation stopped.";

/// How often the run loop checks for sources that have ended
const SOURCE_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub enum GuideEvent {
    RecordingFix(Fix),
    RecordingError(String),
    NavigationFix { session_id: u64, fix: Fix },
    NavigationError { session_id: u64, message: String },
    /// Deferred stop after arrival
    AutoStop { session_id: u64 },
}

struct ActiveNavigation {
    session: NavigationSession,
    subscription: Subscription,
    auto_stop: Option<ScheduledTask>,
}

pub struct RouteGuide<S, D, V, C = SystemClock>
where
    S: KeyValueStore,
    D: GuidanceDisplay,
    V: VoiceSink,
    C: Clock,
{
    store: RouteStore<S>,
    recorder: Recorder<C>,
    recording: Option<Subscription>,
    navigation: Option<ActiveNavigation>,
    next_session_id: u64,
    settings: GuidanceSettings,
    display: D,
    voice: V,
    events: mpsc::UnboundedSender<GuideEvent>,
}

impl<S, D, V> RouteGuide<S, D, V, SystemClock>
where
    S: KeyValueStore,
    D: GuidanceDisplay,
    V: VoiceSink,
{
    pub fn new(
        store: RouteStore<S>,
        display: D,
        voice: V,
        settings: GuidanceSettings,
    ) -> (Self, mpsc::UnboundedReceiver<GuideEvent>) {
        Self::with_clock(store, display, voice, settings, SystemClock)
    }
}

impl<S, D, V, C> RouteGuide<S, D, V, C>
where
    S: KeyValueStore,
    D: GuidanceDisplay,
    V: VoiceSink,
    C: Clock,
{
    pub fn with_clock(
        store: RouteStore<S>,
        display: D,
        voice: V,
        settings: GuidanceSettings,
        clock: C,
    ) -> (Self, mpsc::UnboundedReceiver<GuideEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let guide = Self {
            store,
            recorder: Recorder::with_clock(clock),
            recording: None,
            navigation: None,
            next_session_id: 1,
            settings,
            display,
            voice,
            events,
        };
        (guide, rx)
    }

    pub fn store(&self) -> &RouteStore<S> {
        &self.store
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn voice(&self) -> &V {
        &self.voice
    }

    pub fn recording_snapshot(&self) -> RecordingSnapshot<'_> {
        self.recorder.snapshot()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn navigation_session(&self) -> Option<&NavigationSession> {
        self.navigation.as_ref().map(|n| &n.session)
    }

    pub fn auto_stop_pending(&self) -> bool {
        self.navigation
            .as_ref()
            .and_then(|n| n.auto_stop.as_ref())
            .map_or(false, |task| task.is_pending())
    }

    /// Nothing is recording or navigating
    pub fn is_idle(&self) -> bool {
        !self.recorder.is_recording() && self.navigation.is_none()
    }

    pub fn start_recording(&mut self, source: &dyn PositionSource) -> Result<()> {
        self.recorder.start()?;

        let fix_tx = self.events.clone();
        let error_tx = self.events.clone();
        self.recording = Some(source.subscribe(
            Box::new(move |fix| {
                let _ = fix_tx.send(GuideEvent::RecordingFix(fix));
            }),
            Box::new(move |message| {
                let _ = error_tx.send(GuideEvent::RecordingError(message));
            }),
        ));

        info!("Recording from {}", source.name());
        self.display.show_status("Recording...");
        Ok(())
    }

    /// Unsubscribe and freeze the recording. A no-op when not recording.
    pub fn stop_recording(&mut self) {
        if let Some(mut subscription) = self.recording.take() {
            subscription.cancel();
        }
        if self.recorder.is_recording() {
            self.recorder.stop();
            self.display.show_status("Recording stopped");
        }
    }

    /// Store the stopped recording and clear the buffer
    pub fn save_recording(&mut self, name: &str) -> Result<Route> {
        let route = self.recorder.to_route(name)?;
        let saved = self.store.save_route(route)?;
        self.recorder.reset()?;
        self.display
            .show_status(&format!("Route '{}' saved ({})", saved.name, saved.id));
        Ok(saved)
    }

    pub fn clear_recording(&mut self) -> Result<()> {
        self.recorder.reset()?;
        self.display.show_status("Route cleared");
        Ok(())
    }

    /// Begin replaying a saved route, returning the new session id
    pub fn start_navigation(&mut self, route_id: i64, source: &dyn PositionSource) -> Result<u64> {
        if self.navigation.is_some() {
            return Err(RouteError::InvalidState(
                "navigation already in progress".to_string(),
            ));
        }

        let route = self.store.get_route(route_id)?;
        let session_id = self.next_session_id;
        let session = NavigationSession::new(session_id, Arc::new(route), self.settings)?;
        self.next_session_id += 1;

        let fix_tx = self.events.clone();
        let error_tx = self.events.clone();
        let subscription = source.subscribe(
            Box::new(move |fix| {
                let _ = fix_tx.send(GuideEvent::NavigationFix { session_id, fix });
            }),
            Box::new(move |message| {
                let _ = error_tx.send(GuideEvent::NavigationError { session_id, message });
            }),
        );

        info!(
            "Navigation session {} started on route {} '{}'",
            session_id,
            route_id,
            session.route().name
        );
        self.navigation = Some(ActiveNavigation {
            session,
            subscription,
            auto_stop: None,
        });
        self.display.show_status("Navigation started");
        self.voice.speak(NAVIGATION_STARTED);
        Ok(session_id)
    }

    /// End the active session, canceling any pending auto-stop. A no-op when idle.
    pub fn stop_navigation(&mut self) {
        let Some(mut active) = self.navigation.take() else {
            debug!("No navigation session to stop");
            return;
        };

        if let Some(mut task) = active.auto_stop.take() {
            task.cancel();
        }
        active.subscription.cancel();
        active.session.finish();

        info!("Navigation session {} stopped", active.session.id());
        self.display.show_status("Navigation stopped");
        self.voice.speak(NAVIGATION_STOPPED);
    }

    /// Process one event to completion
    pub fn handle_event(&mut self, event: GuideEvent) {
        match event {
            GuideEvent::RecordingFix(fix) => self.on_recording_fix(&fix),
            GuideEvent::RecordingError(message) => {
                if self.recorder.is_recording() {
                    self.display.show_status(&format!("Error: {}", message));
                } else {
                    debug!("Dropping source error delivered after recording stopped");
                }
            }
            GuideEvent::NavigationFix { session_id, fix } => {
                self.on_navigation_fix(session_id, &fix);
            }
            GuideEvent::NavigationError {
                session_id,
                message,
            } => {
                if self.is_current_session(session_id) {
                    self.display
                        .show_status(&format!("Navigation error: {}", message));
                }
            }
            GuideEvent::AutoStop { session_id } => {
                if self.is_current_session(session_id) {
                    info!("Arrived, stopping session {}", session_id);
                    self.stop_navigation();
                } else {
                    debug!("Ignoring stale auto-stop for session {}", session_id);
                }
            }
        }
    }

    /// Handle events until nothing is recording or navigating.
    ///
    /// A source that ends on its own (replay exhausted, receiver unplugged)
    /// stops its mode once its queued fixes are handled, unless an arrival
    /// auto-stop is still pending.
    pub async fn run_until_idle(&mut self, events: &mut mpsc::UnboundedReceiver<GuideEvent>) {
        let mut ticker = tokio::time::interval(SOURCE_POLL_INTERVAL);

        while !self.is_idle() {
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = ticker.tick() => self.stop_ended_sources(),
            }
        }
    }

    fn stop_ended_sources(&mut self) {
        if self.recording.as_ref().map_or(false, |s| !s.is_active()) {
            self.display.show_status("Position source ended");
            self.stop_recording();
        }

        let navigation_ended = self
            .navigation
            .as_ref()
            .map_or(false, |n| !n.subscription.is_active() && n.auto_stop.is_none());
        if navigation_ended {
            self.display.show_status("Position source ended");
            self.stop_navigation();
        }
    }

    fn is_current_session(&self, session_id: u64) -> bool {
        self.navigation
            .as_ref()
            .map_or(false, |n| n.session.id() == session_id)
    }

    fn on_recording_fix(&mut self, fix: &Fix) {
        if !self.recorder.is_recording() {
            debug!("Dropping fix delivered after recording stopped");
            return;
        }

        match self.recorder.on_fix(fix) {
            Ok(_) => {
                let snapshot = self.recorder.snapshot();
                self.display.show_recording(&snapshot);
            }
            Err(e) => {
                warn!("Rejected recording fix: {}", e);
                self.display.show_status(&format!("Error: {}", e));
            }
        }
    }

    fn on_navigation_fix(&mut self, session_id: u64, fix: &Fix) {
        let grace = Duration::from_secs(self.settings.arrival_grace_secs);
        let events = self.events.clone();

        let Some(active) = self.navigation.as_mut() else {
            debug!("Dropping fix for ended session {}", session_id);
            return;
        };
        if active.session.id() != session_id {
            debug!("Dropping fix for stale session {}", session_id);
            return;
        }

        let update: NavigationUpdate = match active.session.on_fix(fix) {
            Ok(update) => update,
            Err(e) => {
                warn!("Rejected navigation fix: {}", e);
                self.display.show_status(&format!("Navigation error: {}", e));
                return;
            }
        };

        if update.instruction.is_arrived && active.auto_stop.is_none() {
            debug!("Scheduling auto-stop for session {} in {:?}", session_id, grace);
            active.auto_stop = Some(ScheduledTask::schedule(grace, move || {
                let _ = events.send(GuideEvent::AutoStop { session_id });
            }));
        }

        self.display.show_navigation(&update);
        if update.instruction.should_announce {
            self.voice.speak(&update.instruction.text);
        }
    }
}
