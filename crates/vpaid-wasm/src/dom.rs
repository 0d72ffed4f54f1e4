//! DOM mount points - the browser backend for the creative's container and video slot

use std::any::Any;
use vpaid_core::{
    AutoplaySettings, ContainerProvider, ContainerSlot, LoadedContinuation, MediaDescriptor,
    MediaPlayback, VideoSlot,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlSourceElement, HtmlVideoElement, Node};

use crate::log;

/// Apply inline styles to an element
fn set_style(element: &HtmlElement, styles: &[(&str, &str)]) {
    let style = element.style();
    for (property, value) in styles {
        if style.set_property(property, value).is_err() {
            log(&format!("Could not set style {}", property));
        }
    }
}

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn create_html_element(document: &Document, tag: &str) -> Result<HtmlElement, JsValue> {
    document.create_element(tag)?.dyn_into::<HtmlElement>().map_err(JsValue::from)
}

/// Playback handle over a video element
struct ElementPlayback(HtmlVideoElement);

impl MediaPlayback for ElementPlayback {
    fn play(&mut self) {
        // The returned promise rejects when the browser blocks playback
        if self.0.play().is_err() {
            log("Video play() failed");
        }
    }

    fn pause(&mut self) {
        if self.0.pause().is_err() {
            log("Video pause() failed");
        }
    }
}

/// The host's `<video>` element
pub struct DomVideoSlot {
    element: HtmlVideoElement,
    on_loaded: Option<Closure<dyn FnMut()>>,
}

impl DomVideoSlot {
    pub fn new(element: HtmlVideoElement) -> Self {
        Self {
            element,
            on_loaded: None,
        }
    }

    pub fn element(&self) -> &HtmlVideoElement {
        &self.element
    }
}

impl MediaPlayback for DomVideoSlot {
    fn play(&mut self) {
        ElementPlayback(self.element.clone()).play();
    }

    fn pause(&mut self) {
        ElementPlayback(self.element.clone()).pause();
    }
}

impl VideoSlot for DomVideoSlot {
    fn set_source(&mut self, media: &MediaDescriptor) {
        let Some(document) = document() else {
            log("No document, cannot attach video source");
            return;
        };
        let source = match document
            .create_element("source")
            .map(|el| el.unchecked_into::<HtmlSourceElement>())
        {
            Ok(source) => source,
            Err(_) => {
                log("Could not create <source> element");
                return;
            }
        };
        source.set_src(&media.url);
        source.set_type(&media.mime_type);
        if self.element.append_child(&source).is_err() {
            log("Could not attach <source> element");
        }

        set_style(
            &self.element,
            &[("width", "100%"), ("height", "auto"), ("position", "absolute")],
        );
    }

    fn configure_autoplay(&mut self, settings: AutoplaySettings) {
        self.element.set_autoplay(true);
        self.element.set_muted(settings.muted);
        self.element.set_loop(settings.looped);
    }

    fn on_loaded_data(&mut self, continuation: LoadedContinuation) {
        let element = self.element.clone();
        let mut continuation = Some(continuation);
        let closure = Closure::<dyn FnMut()>::new(move || {
            if let Some(continuation) = continuation.take() {
                continuation(&mut ElementPlayback(element.clone()));
            }
        });
        self.element
            .set_onloadeddata(Some(closure.as_ref().unchecked_ref()));
        // Dropping the closure would invalidate the handler
        self.on_loaded = Some(closure);
    }

    fn set_visible(&mut self, visible: bool) {
        let display = if visible { "" } else { "none" };
        set_style(&self.element, &[("display", display)]);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The host's container `<div>`
pub struct DomContainer {
    element: HtmlElement,
    animation: Option<HtmlElement>,
}

impl DomContainer {
    pub fn new(element: HtmlElement) -> Self {
        Self {
            element,
            animation: None,
        }
    }

    /// The element the banner template was injected into, once rendered
    pub fn animation_container(&self) -> Option<&HtmlElement> {
        self.animation.as_ref()
    }

    /// Accept a host slot only if it is a `<div>`
    pub fn from_slot(slot: &JsValue) -> Option<Self> {
        let element = slot.dyn_ref::<HtmlElement>()?;
        (element.tag_name() == "DIV").then(|| Self::new(element.clone()))
    }

    fn build(&mut self, template: &str, video: &mut dyn VideoSlot) -> Result<(), JsValue> {
        let document = document().ok_or_else(|| JsValue::from_str("no document"))?;

        self.element.class_list().add_1("skinContent")?;
        set_style(
            &self.element,
            &[
                ("position", "absolute"),
                ("width", "100%"),
                ("height", "100%"),
                ("top", "0"),
                ("left", "0"),
                ("overflow", "hidden"),
                ("z-index", "4"),
            ],
        );

        let animation = create_html_element(&document, "div")?;
        animation.set_id("animation_container");
        set_style(
            &animation,
            &[
                ("position", "absolute"),
                ("left", "50%"),
                ("transform", "translateX(-50%)"),
            ],
        );
        animation.set_inner_html(template);
        self.element.append_child(&animation)?;

        let canvas = animation.query_selector("canvas")?;
        if let Some(canvas) = canvas.as_ref().and_then(|c| c.dyn_ref::<HtmlElement>()) {
            set_style(canvas, &[("position", "relative")]);
        }

        if let Some(dom_video) = video.as_any().downcast_ref::<DomVideoSlot>() {
            let reference = canvas.as_ref().map(|c| AsRef::<Node>::as_ref(c));
            animation.insert_before(dom_video.element(), reference)?;
        }

        self.animation = Some(animation);
        Ok(())
    }
}

impl ContainerSlot for DomContainer {
    fn render(&mut self, template: &str, video: &mut dyn VideoSlot) {
        if let Err(e) = self.build(template, video) {
            log(&format!("Render failed: {:?}", e));
        }
    }
}

/// Container used when the page offers nowhere to render
struct DetachedContainer;

impl ContainerSlot for DetachedContainer {
    fn render(&mut self, _template: &str, _video: &mut dyn VideoSlot) {
        log("No document body, creative not rendered");
    }
}

/// Synthesizes a `<div>` on the page body when the host passed no slot
#[derive(Default)]
pub struct DocumentContainerProvider;

impl DocumentContainerProvider {
    fn create(&self) -> Result<HtmlElement, JsValue> {
        let document = document().ok_or_else(|| JsValue::from_str("no document"))?;
        let slot = create_html_element(&document, "div")?;
        let body = match document.body() {
            Some(body) => body,
            None => {
                let body = create_html_element(&document, "body")?;
                let _ = document.set_body(Some(&body));
                body
            }
        };
        body.append_child(&slot)?;
        Ok(slot)
    }
}

impl ContainerProvider for DocumentContainerProvider {
    fn create_container(&mut self) -> Box<dyn ContainerSlot> {
        match self.create() {
            Ok(element) => Box::new(DomContainer::new(element)),
            Err(e) => {
                log(&format!("Could not synthesize container: {:?}", e));
                Box::new(DetachedContainer)
            }
        }
    }
}
