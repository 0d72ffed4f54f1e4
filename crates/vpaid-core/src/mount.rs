//! Mount points - the host-owned surfaces the creative renders into
//!
//! The host hands over a container and a video element at init time. Both are
//! modelled as traits so the controller never touches a page directly; a DOM
//! backend lives in the wasm crate and the headless backend below records
//! everything for tests and the CLI.

use crate::params::MediaDescriptor;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Playback control handed to the loaded-data continuation
pub trait MediaPlayback {
    fn play(&mut self);
    fn pause(&mut self);
}

/// One-shot continuation run when the video slot reports its data is loaded
pub type LoadedContinuation = Box<dyn FnOnce(&mut dyn MediaPlayback)>;

/// Element flags applied when the host allows autoplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoplaySettings {
    pub muted: bool,
    pub looped: bool,
}

/// The host's video element
pub trait VideoSlot: MediaPlayback {
    /// Point the element at a media file
    fn set_source(&mut self, media: &MediaDescriptor);

    /// Turn on autoplay with the given flags
    fn configure_autoplay(&mut self, settings: AutoplaySettings);

    /// Register the continuation for the element's next `loadeddata` signal
    fn on_loaded_data(&mut self, continuation: LoadedContinuation);

    fn set_visible(&mut self, visible: bool);

    /// Backends use this to recognise their own video slot when adopting it
    fn as_any(&self) -> &dyn Any;
}

/// The host's container element
pub trait ContainerSlot {
    /// Turn the container into the skin surface, inject the banner template
    /// and adopt the video slot ahead of the banner canvas.
    fn render(&mut self, template: &str, video: &mut dyn VideoSlot);
}

/// Creates a container when the host supplied none
pub trait ContainerProvider {
    fn create_container(&mut self) -> Box<dyn ContainerSlot>;
}

/// Mount points and capabilities supplied by the host
pub struct Environment {
    /// Container to render into; synthesized through the provider when absent
    pub slot: Option<Box<dyn ContainerSlot>>,
    pub video_slot: Box<dyn VideoSlot>,
    pub video_slot_can_autoplay: bool,
}

impl Environment {
    pub fn new(video_slot: impl VideoSlot + 'static) -> Self {
        Self {
            slot: None,
            video_slot: Box::new(video_slot),
            video_slot_can_autoplay: false,
        }
    }

    pub fn with_slot(mut self, slot: impl ContainerSlot + 'static) -> Self {
        self.slot = Some(Box::new(slot));
        self
    }

    pub fn with_autoplay(mut self, can_autoplay: bool) -> Self {
        self.video_slot_can_autoplay = can_autoplay;
        self
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("slot", &self.slot.is_some())
            .field("video_slot_can_autoplay", &self.video_slot_can_autoplay)
            .finish()
    }
}

// =============================================================================
// Headless backend
// =============================================================================

/// Observable state of a headless video slot
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSlotState {
    pub source: Option<MediaDescriptor>,
    pub autoplay: Option<AutoplaySettings>,
    pub visible: bool,
    pub playing: bool,
    pub play_count: u32,
    pub awaiting_load: bool,
}

impl Default for VideoSlotState {
    fn default() -> Self {
        Self {
            source: None,
            autoplay: None,
            visible: true,
            playing: false,
            play_count: 0,
            awaiting_load: false,
        }
    }
}

/// In-memory video slot. Clones share state.
#[derive(Clone, Default)]
pub struct HeadlessVideoSlot {
    state: Rc<RefCell<VideoSlotState>>,
    pending: Rc<RefCell<Option<LoadedContinuation>>>,
}

impl HeadlessVideoSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VideoSlotState {
        self.state.borrow().clone()
    }

    /// Simulate the element's `loadeddata` signal.
    ///
    /// Returns whether a continuation was waiting.
    pub fn finish_loading(&self) -> bool {
        let continuation = self.pending.borrow_mut().take();
        match continuation {
            Some(continuation) => {
                self.state.borrow_mut().awaiting_load = false;
                continuation(&mut self.clone());
                true
            }
            None => false,
        }
    }
}

impl MediaPlayback for HeadlessVideoSlot {
    fn play(&mut self) {
        let mut state = self.state.borrow_mut();
        state.playing = true;
        state.play_count += 1;
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }
}

impl VideoSlot for HeadlessVideoSlot {
    fn set_source(&mut self, media: &MediaDescriptor) {
        self.state.borrow_mut().source = Some(media.clone());
    }

    fn configure_autoplay(&mut self, settings: AutoplaySettings) {
        self.state.borrow_mut().autoplay = Some(settings);
    }

    fn on_loaded_data(&mut self, continuation: LoadedContinuation) {
        self.state.borrow_mut().awaiting_load = true;
        *self.pending.borrow_mut() = Some(continuation);
    }

    fn set_visible(&mut self, visible: bool) {
        self.state.borrow_mut().visible = visible;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for HeadlessVideoSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HeadlessVideoSlot").field(&*self.state.borrow()).finish()
    }
}

/// Observable state of a headless container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerState {
    /// Templates rendered so far, oldest first
    pub rendered: Vec<String>,
    /// Whether the video slot was moved into this container
    pub adopted_video: bool,
    /// Created by a provider rather than supplied by the host
    pub synthesized: bool,
}

/// In-memory container. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct HeadlessContainer {
    state: Rc<RefCell<ContainerState>>,
}

impl HeadlessContainer {
    pub fn new() -> Self {
        Self::default()
    }

    fn synthesized() -> Self {
        let container = Self::new();
        container.state.borrow_mut().synthesized = true;
        container
    }

    pub fn state(&self) -> ContainerState {
        self.state.borrow().clone()
    }
}

impl ContainerSlot for HeadlessContainer {
    fn render(&mut self, template: &str, video: &mut dyn VideoSlot) {
        let mut state = self.state.borrow_mut();
        state.rendered.push(template.to_string());
        state.adopted_video = video.as_any().is::<HeadlessVideoSlot>();
    }
}

/// Provider handing out headless containers. Clones share the created list.
#[derive(Debug, Clone, Default)]
pub struct HeadlessContainerProvider {
    created: Rc<RefCell<Vec<HeadlessContainer>>>,
}

impl HeadlessContainerProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Containers created so far
    pub fn created(&self) -> Vec<HeadlessContainer> {
        self.created.borrow().clone()
    }
}

impl ContainerProvider for HeadlessContainerProvider {
    fn create_container(&mut self) -> Box<dyn ContainerSlot> {
        let container = HeadlessContainer::synthesized();
        self.created.borrow_mut().push(container.clone());
        Box::new(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loaded_continuation_runs_once() {
        let mut video = HeadlessVideoSlot::new();
        video.on_loaded_data(Box::new(|media: &mut dyn MediaPlayback| media.play()));
        assert!(video.state().awaiting_load);

        assert!(video.finish_loading());
        assert!(!video.finish_loading());

        let state = video.state();
        assert!(state.playing);
        assert_eq!(state.play_count, 1);
        assert!(!state.awaiting_load);
    }

    #[test]
    fn test_provider_tracks_containers() {
        let mut provider = HeadlessContainerProvider::new();
        let mut video = HeadlessVideoSlot::new();
        let mut slot = provider.create_container();
        slot.render("<canvas></canvas>", &mut video);

        let created = provider.created();
        assert_eq!(created.len(), 1);
        let state = created[0].state();
        assert!(state.synthesized);
        assert!(state.adopted_video);
        assert_eq!(state.rendered, vec!["<canvas></canvas>".to_string()]);
    }
}
