#![cfg(target_arch = "wasm32")]
use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;

use vpaid_wasm::VpaidAd;

wasm_bindgen_test_configure!(run_in_browser);

const PARAMS: &str = r#"{"videos":[{"url":"http://x/v.mp4","type":"video/mp4"}]}"#;

fn creative_data(params: &str) -> JsValue {
    let data = Object::new();
    Reflect::set(&data, &"AdParameters".into(), &params.into()).unwrap();
    data.into()
}

fn environment() -> JsValue {
    let document = web_sys::window().unwrap().document().unwrap();
    let video = document
        .create_element("video")
        .unwrap()
        .dyn_into::<web_sys::HtmlVideoElement>()
        .unwrap();
    let env = Object::new();
    Reflect::set(&env, &"videoSlot".into(), &video).unwrap();
    env.into()
}

/// Host context whose `seen` array collects delivered events
fn host_context() -> Object {
    let ctx = Object::new();
    Reflect::set(&ctx, &"seen".into(), &Array::new()).unwrap();
    ctx
}

fn recorder(name: &str) -> Function {
    Function::new_no_args(&format!("this.seen.push('{}');", name))
}

fn seen(ctx: &Object) -> String {
    let seen = Array::from(&Reflect::get(ctx, &"seen".into()).unwrap());
    String::from(seen.join(","))
}

fn init(ad: &VpaidAd, params: &str) -> Result<(), JsValue> {
    ad.init_ad(640, 360, "normal", 256, creative_data(params), environment())
}

#[wasm_bindgen_test]
fn init_ad_succeeds() {
    let ad = VpaidAd::new(None);
    let ctx = host_context();
    ad.subscribe(recorder("AdLoaded"), "AdLoaded", ctx.clone().into());
    ad.subscribe(recorder("AdStarted"), "AdStarted", ctx.clone().into());

    assert!(init(&ad, PARAMS).is_ok());
    assert_eq!(seen(&ctx), "AdLoaded,AdStarted");
    assert_eq!(ad.get_ad_width(), 640);
}

#[wasm_bindgen_test]
fn init_ad_throws_without_ad_error_handler() {
    let ad = VpaidAd::new(None);
    assert!(init(&ad, "{videos:").is_err());
}

#[wasm_bindgen_test]
fn init_ad_reports_through_ad_error_handler() {
    let ad = VpaidAd::new(None);
    let ctx = host_context();
    let on_error = Function::new_with_args("message", "this.seen.push(message.split(':')[0]);");
    ad.subscribe(on_error, "AdError", ctx.clone().into());

    assert!(init(&ad, "{videos:").is_ok());
    assert_eq!(seen(&ctx), "MALFORMED_PARAMETERS");
}

#[wasm_bindgen_test]
fn throwing_handler_does_not_leak_events_into_next_call() {
    let ad = VpaidAd::new(None);
    let ctx = host_context();
    let throwing = Function::new_no_args("this.seen.push('AdLoaded'); throw new Error('host bug');");
    ad.subscribe(throwing, "AdLoaded", ctx.clone().into());
    ad.subscribe(recorder("AdStarted"), "AdStarted", ctx.clone().into());
    ad.subscribe(recorder("AdPaused"), "AdPaused", ctx.clone().into());

    assert!(init(&ad, PARAMS).is_err());
    assert_eq!(seen(&ctx), "AdLoaded,AdStarted");

    assert!(ad.pause_ad().is_ok());
    assert_eq!(seen(&ctx), "AdLoaded,AdStarted,AdPaused");
}
