//! Ad controller - main orchestrator for one creative placement
//!
//! Coordinates:
//! - Ad parameter ingestion and video slot wiring
//! - Container rendering
//! - Lifecycle state transitions
//! - Attribute updates and the events they raise

use crate::{
    attributes::{AttributeField, AttributeSet, AttributeValue, ViewMode},
    config::CreativeConfig,
    events::{AdEvent, EventKind, EventRegistry},
    mount::{
        AutoplaySettings, ContainerProvider, ContainerSlot, Environment, MediaPlayback, VideoSlot,
    },
    params::{self, CreativeData, MediaDescriptor},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Protocol version implemented by this creative
pub const VPAID_VERSION: &str = "2.0";

/// Unique identifier for a creative instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreativeId(pub Uuid);

impl CreativeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CreativeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CreativeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ad lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdState {
    /// Constructed, waiting for `initAd`
    Uninitialized,
    /// Resolving parameters and wiring mount points
    Initializing,
    /// Ad is running
    Playing,
    /// Ad paused by the host
    Paused,
    /// Stopped by the host (terminal)
    Stopped,
    /// Skipped by the user (terminal)
    Skipped,
}

impl AdState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: AdState) -> bool {
        use AdState::*;
        if target == Stopped {
            return !self.is_terminal();
        }
        matches!(
            (self, target),
            (Uninitialized, Initializing) |
            (Initializing, Playing) | (Initializing, Uninitialized) |
            (Playing, Paused) | (Playing, Skipped) |
            (Paused, Playing) | (Paused, Skipped)
        )
    }

    /// No lifecycle operation is meaningful after a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, AdState::Stopped | AdState::Skipped)
    }

    /// Initialized and not yet finished
    pub fn is_active(&self) -> bool {
        matches!(self, AdState::Playing | AdState::Paused)
    }
}

impl std::fmt::Display for AdState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdState::Uninitialized => write!(f, "uninitialized"),
            AdState::Initializing => write!(f, "initializing"),
            AdState::Playing => write!(f, "playing"),
            AdState::Paused => write!(f, "paused"),
            AdState::Stopped => write!(f, "stopped"),
            AdState::Skipped => write!(f, "skipped"),
        }
    }
}

/// Controller for a single creative placement
pub struct AdController {
    /// Unique creative ID
    id: CreativeId,
    /// Build configuration
    config: CreativeConfig,
    /// Current lifecycle state
    state: AdState,
    /// Properties exposed to the host
    attributes: AttributeSet,
    /// Host callbacks
    events: EventRegistry,
    /// Synthesizes a container when the host supplies none
    provider: Box<dyn ContainerProvider>,
    /// Container the creative rendered into
    slot: Option<Box<dyn ContainerSlot>>,
    /// Host video element
    video_slot: Option<Box<dyn VideoSlot>>,
    /// Media resolved from the ad parameters
    media: Option<MediaDescriptor>,
    /// Cleared once the ad finishes so a late `loadeddata` cannot start playback
    playback_gate: Rc<Cell<bool>>,
}

impl AdController {
    /// Create a new controller
    pub fn new(config: CreativeConfig, provider: impl ContainerProvider + 'static) -> Self {
        Self {
            id: CreativeId::new(),
            attributes: AttributeSet::from_config(&config),
            config,
            state: AdState::Uninitialized,
            events: EventRegistry::new(),
            provider: Box::new(provider),
            slot: None,
            video_slot: None,
            media: None,
            playback_gate: Rc::new(Cell::new(true)),
        }
    }

    pub fn id(&self) -> CreativeId {
        self.id
    }

    pub fn state(&self) -> AdState {
        self.state
    }

    pub fn config(&self) -> &CreativeConfig {
        &self.config
    }

    /// Snapshot of every attribute
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Whether the creative has been rendered into a container
    pub fn is_rendered(&self) -> bool {
        self.slot.is_some()
    }

    /// Media wired into the video slot, once initialized
    pub fn media(&self) -> Option<&MediaDescriptor> {
        self.media.as_ref()
    }

    /// Transition to new state
    fn set_state(&mut self, new_state: AdState) -> Result<()> {
        let current = self.state;

        if !current.can_transition_to(new_state) {
            return Err(Error::InvalidStateTransition {
                from: current.to_string(),
                to: new_state.to_string(),
            });
        }

        self.state = new_state;
        info!(creative_id = %self.id, from = %current, to = %new_state, "State transition");
        Ok(())
    }

    fn emit(&mut self, event: AdEvent) {
        self.events.dispatch(&event);
    }

    /// Store a host-supplied value. Rejections are logged, never raised.
    fn store(&mut self, field: AttributeField, value: impl Into<AttributeValue>) -> bool {
        match self.attributes.set(field, value) {
            Ok(()) => true,
            Err(e) => {
                warn!(creative_id = %self.id, error = %e, "Attribute update rejected");
                false
            }
        }
    }

    fn ensure_live(&self, operation: &str) -> bool {
        if self.state.is_terminal() {
            warn!(creative_id = %self.id, state = %self.state, operation, "Ignored after ad ended");
            return false;
        }
        true
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Confirm interface compatibility with the host
    pub fn handshake_version(&self, host_version: &str) -> &'static str {
        debug!(host_version, supported = VPAID_VERSION, "Handshake");
        let host_major = host_version
            .split('.')
            .next()
            .and_then(|major| major.trim().parse::<u32>().ok());
        if host_major.is_some_and(|major| major < 2) {
            warn!(host_version, "Host predates protocol version {}", VPAID_VERSION);
        }
        VPAID_VERSION
    }

    /// Initialize the ad: resolve media, wire the mount points, render and start.
    ///
    /// Any failure raises `AdError` if the host subscribed one and is returned
    /// either way; see [`AdController::escalate`]. On malformed parameters the
    /// controller returns to `Uninitialized` so the call can be retried.
    #[instrument(skip(self, creative_data, environment), fields(creative_id = %self.id))]
    pub fn init_ad(
        &mut self,
        width: u32,
        height: u32,
        view_mode: ViewMode,
        desired_bitrate: u32,
        creative_data: &CreativeData,
        environment: Environment,
    ) -> Result<()> {
        let result = self.try_init(
            width,
            height,
            view_mode,
            desired_bitrate,
            creative_data,
            environment,
        );
        if let Err(e) = &result {
            if self.events.is_subscribed(&EventKind::Error) {
                self.emit(AdEvent::Error {
                    message: format!("{}: {}", e.error_code(), e),
                });
            }
        }
        result
    }

    fn try_init(
        &mut self,
        width: u32,
        height: u32,
        view_mode: ViewMode,
        desired_bitrate: u32,
        creative_data: &CreativeData,
        environment: Environment,
    ) -> Result<()> {
        if self.state != AdState::Uninitialized {
            warn!(state = %self.state, "initAd called twice");
        }
        self.set_state(AdState::Initializing)?;

        let media = match params::resolve(&creative_data.ad_parameters) {
            Ok(media) => media,
            Err(e) => {
                warn!(error = %e, "Ad parameters rejected");
                self.set_state(AdState::Uninitialized)?;
                return Err(e);
            }
        };

        let Environment {
            slot,
            mut video_slot,
            video_slot_can_autoplay,
        } = environment;

        video_slot.set_source(&media);
        if video_slot_can_autoplay {
            video_slot.configure_autoplay(AutoplaySettings {
                muted: self.config.autoplay_muted,
                looped: self.config.autoplay_loop,
            });
            let gate = Rc::clone(&self.playback_gate);
            video_slot.on_loaded_data(Box::new(move |playback: &mut dyn MediaPlayback| {
                if gate.get() {
                    playback.play();
                } else {
                    debug!("Video loaded after ad ended, not starting playback");
                }
            }));
        }

        self.store(AttributeField::Width, width);
        self.store(AttributeField::Height, height);
        self.store(AttributeField::ViewMode, view_mode);
        self.store(AttributeField::DesiredBitrate, desired_bitrate);

        info!(
            width,
            height,
            view_mode = %view_mode,
            desired_bitrate,
            media = %media,
            autoplay = video_slot_can_autoplay,
            "Init ad"
        );

        let mut slot = match slot {
            Some(slot) => slot,
            None => {
                debug!("No container supplied, synthesizing one");
                self.provider.create_container()
            }
        };
        video_slot.set_visible(false);
        slot.render(&self.config.html_template, &mut *video_slot);

        self.slot = Some(slot);
        self.video_slot = Some(video_slot);
        self.media = Some(media);

        self.set_state(AdState::Playing)?;
        self.emit(AdEvent::Loaded);
        self.emit(AdEvent::Started);
        Ok(())
    }

    /// Decide who hears about a failed `init_ad`. Failures the host already
    /// received through its `AdError` handler are absorbed; anything else is
    /// handed back for the caller to raise.
    pub fn escalate(&self, result: Result<()>) -> Result<()> {
        match result {
            Err(e) if self.events.is_subscribed(&EventKind::Error) => {
                debug!(creative_id = %self.id, error = %e, "Failure reported through AdError");
                Ok(())
            }
            other => other,
        }
    }

    /// Host start signal; acknowledged with `AdStarted` once initialized
    pub fn start_ad(&mut self) {
        if !self.state.is_active() {
            warn!(creative_id = %self.id, state = %self.state, "startAd ignored");
            return;
        }
        info!(creative_id = %self.id, "Starting ad");
        self.emit(AdEvent::Started);
    }

    /// Stop the ad for good
    pub fn stop_ad(&mut self) {
        if !self.ensure_live("stopAd") {
            return;
        }
        info!(creative_id = %self.id, "Stopping ad");
        self.finish(AdState::Stopped);
        self.emit(AdEvent::Stopped);
    }

    fn finish(&mut self, terminal: AdState) {
        self.playback_gate.set(false);
        if let Some(video) = self.video_slot.as_mut() {
            video.pause();
        }
        // Terminal states are reachable from every live state we call this from
        if let Err(e) = self.set_state(terminal) {
            warn!(creative_id = %self.id, error = %e, "Could not finish ad");
        }
    }

    pub fn pause_ad(&mut self) {
        match self.state {
            AdState::Playing => {
                if let Some(video) = self.video_slot.as_mut() {
                    video.pause();
                }
                self.state = AdState::Paused;
                info!(creative_id = %self.id, "Ad paused");
            }
            AdState::Paused => debug!(creative_id = %self.id, "Already paused"),
            state => {
                warn!(creative_id = %self.id, state = %state, "pauseAd ignored");
                return;
            }
        }
        self.emit(AdEvent::Paused);
    }

    pub fn resume_ad(&mut self) {
        match self.state {
            AdState::Paused => {
                if let Some(video) = self.video_slot.as_mut() {
                    video.play();
                }
                self.state = AdState::Playing;
                info!(creative_id = %self.id, "Ad resumed");
            }
            AdState::Playing => debug!(creative_id = %self.id, "Already playing"),
            state => {
                warn!(creative_id = %self.id, state = %state, "resumeAd ignored");
                return;
            }
        }
        self.emit(AdEvent::Resumed);
    }

    /// Set volume in percent. Out-of-range values are rejected and raise no event.
    pub fn set_ad_volume(&mut self, value: i64) {
        if !self.ensure_live("setAdVolume") {
            return;
        }
        debug!(creative_id = %self.id, value, "setAdVolume");
        if self.store(AttributeField::Volume, value) {
            self.emit(AdEvent::VolumeChange);
        }
    }

    pub fn resize_ad(&mut self, width: u32, height: u32, view_mode: ViewMode) {
        if !self.ensure_live("resizeAd") {
            return;
        }
        info!(creative_id = %self.id, width, height, view_mode = %view_mode, "Resize ad");
        self.store(AttributeField::Width, width);
        self.store(AttributeField::Height, height);
        self.store(AttributeField::ViewMode, view_mode);
        self.emit(AdEvent::SizeChange);
    }

    pub fn expand_ad(&mut self) {
        if !self.ensure_live("expandAd") {
            return;
        }
        debug!(creative_id = %self.id, "expandAd");
        self.store(AttributeField::Expanded, true);
        self.emit(AdEvent::Expanded);
    }

    /// Collapse the ad. The protocol defines no collapse event, so none is raised.
    pub fn collapse_ad(&mut self) {
        if !self.ensure_live("collapseAd") {
            return;
        }
        debug!(creative_id = %self.id, "collapseAd");
        self.store(AttributeField::Expanded, false);
    }

    /// Best-effort skip. Only honoured for a skippable, running ad whose host
    /// listens for `AdSkipped`; anything else is logged and dropped.
    pub fn skip_ad(&mut self) {
        if !self.attributes.skippable_state() {
            warn!(creative_id = %self.id, "Skip requested on a non-skippable ad");
            return;
        }
        if !self.state.is_active() {
            warn!(creative_id = %self.id, state = %self.state, "skipAd ignored");
            return;
        }
        if !self.events.is_subscribed(&EventKind::Skipped) {
            warn!(creative_id = %self.id, "Invalid ad skip request: no AdSkipped handler");
            return;
        }
        info!(creative_id = %self.id, "Skipping ad");
        self.finish(AdState::Skipped);
        self.emit(AdEvent::Skipped);
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&AdEvent) + 'static,
    {
        self.events.subscribe(kind, handler);
    }

    /// Subscribe with a context value the handler receives on every call
    pub fn subscribe_with<C, F>(&mut self, kind: EventKind, context: C, handler: F)
    where
        C: 'static,
        F: FnMut(&mut C, &AdEvent) + 'static,
    {
        self.events.subscribe_with(kind, context, handler);
    }

    pub fn unsubscribe(&mut self, kind: &EventKind) {
        self.events.unsubscribe(kind);
    }

    pub fn is_subscribed(&self, kind: &EventKind) -> bool {
        self.events.is_subscribed(kind)
    }

    // =========================================================================
    // Creative-initiated signals
    // =========================================================================

    /// Deliver a signal only the host can act on. Without a subscriber the
    /// signal is dropped and `UnsubscribedHandler` returned as advice.
    fn signal(&mut self, event: AdEvent) -> Result<()> {
        let kind = event.kind();
        if !self.events.is_subscribed(&kind) {
            warn!(creative_id = %self.id, event = %kind, "Callback not subscribed");
            return Err(Error::UnsubscribedHandler(kind));
        }
        info!(creative_id = %self.id, event = %event, "Signal");
        self.emit(event);
        Ok(())
    }

    pub fn click_thru(
        &mut self,
        url: impl Into<String>,
        id: impl Into<String>,
        player_handles: bool,
    ) -> Result<()> {
        self.signal(AdEvent::ClickThru {
            url: url.into(),
            id: id.into(),
            player_handles,
        })
    }

    pub fn report_error(&mut self, message: impl Into<String>) -> Result<()> {
        self.signal(AdEvent::Error {
            message: message.into(),
        })
    }

    pub fn log_message(&mut self, message: impl Into<String>) -> Result<()> {
        self.signal(AdEvent::Log {
            message: message.into(),
        })
    }

    pub fn interaction(&mut self, id: impl Into<String>) -> Result<()> {
        self.signal(AdEvent::Interaction { id: id.into() })
    }

    /// Fire any event at its subscriber directly. Returns whether one ran.
    pub fn trigger(&mut self, event: AdEvent) -> bool {
        debug!(creative_id = %self.id, event = %event, "Manual trigger");
        self.events.dispatch(&event)
    }

    // =========================================================================
    // Creative-side attribute updates
    // =========================================================================

    pub fn set_skippable_state(&mut self, skippable: bool) {
        self.store(AttributeField::SkippableState, skippable);
    }

    pub fn set_remaining_time(&mut self, seconds: f64) -> Result<()> {
        self.attributes.set(AttributeField::RemainingTime, seconds)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn get_ad_width(&self) -> u32 {
        self.attributes.width()
    }

    pub fn get_ad_height(&self) -> u32 {
        self.attributes.height()
    }

    pub fn get_ad_view_mode(&self) -> ViewMode {
        self.attributes.view_mode()
    }

    pub fn get_ad_desired_bitrate(&self) -> u32 {
        self.attributes.desired_bitrate()
    }

    pub fn get_ad_volume(&self) -> u8 {
        self.attributes.volume()
    }

    pub fn get_ad_remaining_time(&self) -> f64 {
        self.attributes.remaining_time()
    }

    pub fn get_ad_duration(&self) -> f64 {
        self.attributes.duration()
    }

    pub fn get_ad_companions(&self) -> &str {
        self.attributes.companions()
    }

    pub fn get_ad_icons(&self) -> &str {
        self.attributes.icons()
    }

    pub fn get_ad_linear(&self) -> bool {
        self.attributes.linear()
    }

    pub fn get_ad_expanded(&self) -> bool {
        self.attributes.expanded()
    }

    pub fn get_ad_skippable_state(&self) -> bool {
        self.attributes.skippable_state()
    }
}

impl std::fmt::Debug for AdController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdController")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("media", &self.media)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::{HeadlessContainerProvider, HeadlessVideoSlot};

    const PARAMS: &str = r#"{"videos":[{"url":"http://x/v.mp4","type":"video/mp4"}]}"#;

    fn initialized() -> AdController {
        let mut ad = AdController::new(CreativeConfig::default(), HeadlessContainerProvider::new());
        ad.init_ad(
            640,
            360,
            ViewMode::Normal,
            256,
            &CreativeData::new(PARAMS),
            Environment::new(HeadlessVideoSlot::new()),
        )
        .unwrap();
        ad
    }

    #[test]
    fn test_controller_creation() {
        let ad = AdController::new(CreativeConfig::default(), HeadlessContainerProvider::new());
        assert_eq!(ad.state(), AdState::Uninitialized);
        assert!(ad.media().is_none());
        assert!(!ad.is_rendered());
        assert_eq!(ad.handshake_version("2.0"), "2.0");
        assert_eq!(ad.handshake_version("1.1"), VPAID_VERSION);
    }

    #[test]
    fn test_state_transitions() {
        use AdState::*;
        assert!(Uninitialized.can_transition_to(Initializing));
        assert!(Initializing.can_transition_to(Playing));
        assert!(Initializing.can_transition_to(Uninitialized));
        assert!(Playing.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Playing));
        assert!(Paused.can_transition_to(Skipped));
        assert!(Uninitialized.can_transition_to(Stopped));

        assert!(!Uninitialized.can_transition_to(Playing));
        assert!(!Stopped.can_transition_to(Stopped));
        assert!(!Skipped.can_transition_to(Playing));
        assert!(!Playing.can_transition_to(Initializing));
    }

    #[test]
    fn test_init_twice_rejected() {
        let mut ad = initialized();
        let err = ad
            .init_ad(
                1,
                1,
                ViewMode::Normal,
                1,
                &CreativeData::new(PARAMS),
                Environment::new(HeadlessVideoSlot::new()),
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");
        assert_eq!(ad.state(), AdState::Playing);
        assert_eq!(ad.get_ad_width(), 640);
    }

    #[test]
    fn test_pause_resume_cycle() {
        let mut ad = initialized();
        ad.pause_ad();
        assert_eq!(ad.state(), AdState::Paused);
        ad.pause_ad();
        assert_eq!(ad.state(), AdState::Paused);
        ad.resume_ad();
        assert_eq!(ad.state(), AdState::Playing);
    }

    #[test]
    fn test_operations_ignored_after_stop() {
        let mut ad = initialized();
        ad.stop_ad();
        assert_eq!(ad.state(), AdState::Stopped);

        ad.set_ad_volume(10);
        ad.expand_ad();
        ad.resume_ad();
        assert_eq!(ad.get_ad_volume(), 50);
        assert!(!ad.get_ad_expanded());
        assert_eq!(ad.state(), AdState::Stopped);
    }

    #[test]
    fn test_signal_without_subscriber() {
        let mut ad = initialized();
        assert_eq!(
            ad.interaction("banner"),
            Err(Error::UnsubscribedHandler(EventKind::Interaction))
        );
        ad.subscribe(EventKind::Interaction, |_| {});
        assert!(ad.interaction("banner").is_ok());
    }
}
