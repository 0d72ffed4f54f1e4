//! VPAID WASM - the creative as a browser-loadable VPAID ad
//!
//! Exposes the VPAID 2.0 interface the video player (wrapper) expects:
//! - `getVPAIDAd()` entry point
//! - camelCase lifecycle methods and getters
//! - `subscribe(callback, eventName, context)` host callbacks
//!
//! ## Integration
//!
//! ```javascript
//! import init, { getVPAIDAd } from '@vpaid/wasm';
//!
//! await init();
//! window.getVPAIDAd = getVPAIDAd;
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use vpaid_core::{
    AdController, AdEvent, CreativeConfig, CreativeData, Environment, EventKind, ViewMode,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlVideoElement;

mod console;
mod dom;
mod outbox;

pub use dom::{DocumentContainerProvider, DomContainer, DomVideoSlot};
pub use outbox::Outbox;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    console::install();
    vpaid_core::init();
    log("Initialized");
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    vpaid_core::VERSION.to_string()
}

pub(crate) fn log(message: &str) {
    web_sys::console::log_2(&"[VPAID]".into(), &message.into());
}

/// Entry point the wrapper calls to obtain the ad
#[wasm_bindgen(js_name = getVPAIDAd)]
pub fn get_vpaid_ad() -> VpaidAd {
    VpaidAd::new(None)
}

/// A host callback waiting to be invoked
struct PendingCall {
    callback: js_sys::Function,
    context: JsValue,
    event: AdEvent,
}

impl PendingCall {
    fn invoke(self) -> Result<(), JsValue> {
        let args = js_sys::Array::new();
        for arg in self.event.args() {
            args.push(&serde_wasm_bindgen::to_value(&arg)?);
        }
        self.callback.apply(&self.context, &args).map(|_| ())
    }
}

/// The VPAID ad object handed to the wrapper
///
/// Host callbacks run before the triggering method returns, but only after the
/// controller is released, so a callback may call straight back into the ad.
/// If a callback throws, the remaining callbacks of that call still run and
/// the first exception is rethrown to the host.
#[wasm_bindgen]
pub struct VpaidAd {
    controller: RefCell<AdController>,
    outbox: Rc<Outbox<PendingCall>>,
}

impl VpaidAd {
    fn with_config(config: CreativeConfig) -> VpaidAd {
        VpaidAd {
            controller: RefCell::new(AdController::new(config, DocumentContainerProvider)),
            outbox: Rc::new(Outbox::new()),
        }
    }

    /// Run an operation on the controller, then deliver the events it raised
    fn run<T>(&self, op: impl FnOnce(&mut AdController) -> T) -> Result<T, JsValue> {
        let result = {
            let mut controller = self.controller.borrow_mut();
            op(&mut *controller)
        };
        self.flush()?;
        Ok(result)
    }

    fn flush(&self) -> Result<(), JsValue> {
        self.outbox.drain(PendingCall::invoke)
    }
}

#[wasm_bindgen]
impl VpaidAd {
    /// Create an ad. `html_template` is the banner markup, `<canvas></canvas>` by default.
    #[wasm_bindgen(constructor)]
    pub fn new(html_template: Option<String>) -> VpaidAd {
        let mut config = CreativeConfig::default();
        if let Some(template) = html_template {
            config.html_template = template;
        }
        Self::with_config(config)
    }

    /// Create an ad from a JSON creative configuration
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(config_json: &str) -> Result<VpaidAd, JsValue> {
        let config = CreativeConfig::from_json(config_json)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self::with_config(config))
    }

    #[wasm_bindgen(js_name = handshakeVersion)]
    pub fn handshake_version(&self, version: &str) -> String {
        self.controller.borrow().handshake_version(version).to_string()
    }

    #[wasm_bindgen(js_name = initAd)]
    pub fn init_ad(
        &self,
        width: u32,
        height: u32,
        view_mode: &str,
        desired_bitrate: u32,
        creative_data: JsValue,
        environment_vars: JsValue,
    ) -> Result<(), JsValue> {
        let view_mode = view_mode.parse::<ViewMode>().unwrap_or_else(|e| {
            log(&format!("{}, using normal", e));
            ViewMode::Normal
        });
        let creative_data = read_creative_data(&creative_data)?;
        let environment = read_environment(&environment_vars)?;

        self.run(|ad| {
            let result =
                ad.init_ad(width, height, view_mode, desired_bitrate, &creative_data, environment);
            ad.escalate(result)
        })?
        .map_err(|e| JsError::new(&e.to_string()).into())
    }

    #[wasm_bindgen(js_name = startAd)]
    pub fn start_ad(&self) -> Result<(), JsValue> {
        self.run(|ad| ad.start_ad())
    }

    #[wasm_bindgen(js_name = stopAd)]
    pub fn stop_ad(&self) -> Result<(), JsValue> {
        self.run(|ad| ad.stop_ad())
    }

    #[wasm_bindgen(js_name = pauseAd)]
    pub fn pause_ad(&self) -> Result<(), JsValue> {
        self.run(|ad| ad.pause_ad())
    }

    #[wasm_bindgen(js_name = resumeAd)]
    pub fn resume_ad(&self) -> Result<(), JsValue> {
        self.run(|ad| ad.resume_ad())
    }

    #[wasm_bindgen(js_name = setAdVolume)]
    pub fn set_ad_volume(&self, value: f64) -> Result<(), JsValue> {
        if !value.is_finite() || value.fract() != 0.0 {
            log(&format!("setAdVolume {} rejected", value));
            return Ok(());
        }
        self.run(|ad| ad.set_ad_volume(value as i64))
    }

    #[wasm_bindgen(js_name = resizeAd)]
    pub fn resize_ad(&self, width: u32, height: u32, view_mode: &str) -> Result<(), JsValue> {
        let view_mode = match view_mode.parse::<ViewMode>() {
            Ok(mode) => mode,
            Err(e) => {
                log(&format!("{}, keeping current view mode", e));
                self.controller.borrow().get_ad_view_mode()
            }
        };
        self.run(|ad| ad.resize_ad(width, height, view_mode))
    }

    #[wasm_bindgen(js_name = expandAd)]
    pub fn expand_ad(&self) -> Result<(), JsValue> {
        self.run(|ad| ad.expand_ad())
    }

    #[wasm_bindgen(js_name = collapseAd)]
    pub fn collapse_ad(&self) -> Result<(), JsValue> {
        self.run(|ad| ad.collapse_ad())
    }

    #[wasm_bindgen(js_name = skipAd)]
    pub fn skip_ad(&self) -> Result<(), JsValue> {
        self.run(|ad| ad.skip_ad())
    }

    /// Register `callback` for `event_name`, invoked with `this` bound to `context`
    pub fn subscribe(&self, callback: js_sys::Function, event_name: &str, context: JsValue) {
        let outbox = Rc::clone(&self.outbox);
        self.controller
            .borrow_mut()
            .subscribe(EventKind::from(event_name), move |event| {
                outbox.push(PendingCall {
                    callback: callback.clone(),
                    context: context.clone(),
                    event: event.clone(),
                });
            });
    }

    pub fn unsubscribe(&self, event_name: &str) {
        self.controller
            .borrow_mut()
            .unsubscribe(&EventKind::from(event_name));
    }

    // =========================================================================
    // Creative-initiated signals
    // =========================================================================

    /// Raise `AdClickThru`. Returns false when the host has no handler.
    #[wasm_bindgen(js_name = clickThru)]
    pub fn click_thru(&self, url: &str, id: &str, player_handles: bool) -> Result<bool, JsValue> {
        self.run(|ad| ad.click_thru(url, id, player_handles).is_ok())
    }

    /// Raise `AdError`. Returns false when the host has no handler.
    #[wasm_bindgen(js_name = reportError)]
    pub fn report_error(&self, message: &str) -> Result<bool, JsValue> {
        self.run(|ad| ad.report_error(message).is_ok())
    }

    /// Raise `AdLog`. Returns false when the host has no handler.
    #[wasm_bindgen(js_name = logMessage)]
    pub fn log_message(&self, message: &str) -> Result<bool, JsValue> {
        self.run(|ad| ad.log_message(message).is_ok())
    }

    /// Raise `AdInteraction`. Returns false when the host has no handler.
    pub fn interaction(&self, id: &str) -> Result<bool, JsValue> {
        self.run(|ad| ad.interaction(id).is_ok())
    }

    // =========================================================================
    // Getters
    // =========================================================================

    #[wasm_bindgen(js_name = getAdWidth)]
    pub fn get_ad_width(&self) -> u32 {
        self.controller.borrow().get_ad_width()
    }

    #[wasm_bindgen(js_name = getAdHeight)]
    pub fn get_ad_height(&self) -> u32 {
        self.controller.borrow().get_ad_height()
    }

    #[wasm_bindgen(js_name = getAdViewMode)]
    pub fn get_ad_view_mode(&self) -> String {
        self.controller.borrow().get_ad_view_mode().to_string()
    }

    #[wasm_bindgen(js_name = getAdDesiredBitrate)]
    pub fn get_ad_desired_bitrate(&self) -> u32 {
        self.controller.borrow().get_ad_desired_bitrate()
    }

    #[wasm_bindgen(js_name = getAdVolume)]
    pub fn get_ad_volume(&self) -> u8 {
        self.controller.borrow().get_ad_volume()
    }

    #[wasm_bindgen(js_name = getAdRemainingTime)]
    pub fn get_ad_remaining_time(&self) -> f64 {
        self.controller.borrow().get_ad_remaining_time()
    }

    #[wasm_bindgen(js_name = getAdDuration)]
    pub fn get_ad_duration(&self) -> f64 {
        self.controller.borrow().get_ad_duration()
    }

    #[wasm_bindgen(js_name = getAdCompanions)]
    pub fn get_ad_companions(&self) -> String {
        self.controller.borrow().get_ad_companions().to_string()
    }

    #[wasm_bindgen(js_name = getAdIcons)]
    pub fn get_ad_icons(&self) -> String {
        self.controller.borrow().get_ad_icons().to_string()
    }

    #[wasm_bindgen(js_name = getAdLinear)]
    pub fn get_ad_linear(&self) -> bool {
        self.controller.borrow().get_ad_linear()
    }

    #[wasm_bindgen(js_name = getAdExpanded)]
    pub fn get_ad_expanded(&self) -> bool {
        self.controller.borrow().get_ad_expanded()
    }

    #[wasm_bindgen(js_name = getAdSkippableState)]
    pub fn get_ad_skippable_state(&self) -> bool {
        self.controller.borrow().get_ad_skippable_state()
    }

    /// All attributes as a plain object, for debug panels
    #[wasm_bindgen(js_name = getAttributes)]
    pub fn get_attributes(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(self.controller.borrow().attributes())?)
    }
}

fn read_creative_data(creative_data: &JsValue) -> Result<CreativeData, JsValue> {
    let raw = js_sys::Reflect::get(creative_data, &"AdParameters".into())?;
    Ok(CreativeData::new(raw.as_string().unwrap_or_default()))
}

fn read_environment(environment_vars: &JsValue) -> Result<Environment, JsValue> {
    let video = js_sys::Reflect::get(environment_vars, &"videoSlot".into())?
        .dyn_into::<HtmlVideoElement>()
        .map_err(|_| JsError::new("environmentVars.videoSlot must be a <video> element"))?;
    let slot = js_sys::Reflect::get(environment_vars, &"slot".into())?;
    let can_autoplay = js_sys::Reflect::get(environment_vars, &"videoSlotCanAutoPlay".into())?
        .as_bool()
        .unwrap_or(false);

    let mut environment = Environment::new(DomVideoSlot::new(video)).with_autoplay(can_autoplay);
    if let Some(container) = DomContainer::from_slot(&slot) {
        environment = environment.with_slot(container);
    }
    Ok(environment)
}
