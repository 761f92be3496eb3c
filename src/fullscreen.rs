use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Document, HtmlCanvasElement};

use crate::error::{ShellError, js_value_to_string};

/// The three Fullscreen API calls the shell makes.
pub trait FullscreenControl {
    fn is_active(&self) -> bool;
    fn enter(&self) -> Result<(), ShellError>;
    fn exit(&self) -> Result<(), ShellError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenAction {
    Requested,
    Exited,
    Ignored,
}

impl FullscreenAction {
    pub fn name(self) -> &'static str {
        match self {
            FullscreenAction::Requested => "requested",
            FullscreenAction::Exited => "exited",
            FullscreenAction::Ignored => "ignored",
        }
    }
}

/// Fullscreen button: enter only, never toggles off.
pub fn on_fullscreen_click(control: &impl FullscreenControl) -> Result<FullscreenAction, ShellError> {
    if control.is_active() {
        return Ok(FullscreenAction::Ignored);
    }
    control.enter()?;
    Ok(FullscreenAction::Requested)
}

/// Rotation while fullscreen leaves fullscreen.
pub fn on_orientation_change(control: &impl FullscreenControl) -> Result<FullscreenAction, ShellError> {
    if !control.is_active() {
        return Ok(FullscreenAction::Ignored);
    }
    control.exit()?;
    Ok(FullscreenAction::Exited)
}

/// Calls a Fullscreen API method and returns its promise, if the browser
/// hands one back (older engines return `undefined`).
///
/// `web_sys`' bindings drop the promise, which hides denials.
pub fn call_fullscreen_method(target: &JsValue, method: &'static str) -> Result<Option<Promise>, ShellError> {
    let function = Reflect::get(target, &JsValue::from_str(method))?
        .dyn_into::<Function>()
        .map_err(|_| ShellError::FullscreenRejected {
            method,
            reason: "unsupported".to_string(),
        })?;
    let returned = function
        .call0(target)
        .map_err(|err| ShellError::FullscreenRejected {
            method,
            reason: js_value_to_string(&err),
        })?;
    Ok(returned.dyn_into::<Promise>().ok())
}

/// Waits for a Fullscreen API promise and maps a rejection.
pub async fn settle_fullscreen(method: &'static str, promise: Promise) -> Result<(), ShellError> {
    JsFuture::from(promise)
        .await
        .map(|_| ())
        .map_err(|err| ShellError::FullscreenRejected {
            method,
            reason: js_value_to_string(&err),
        })
}

fn call_and_report(target: &JsValue, method: &'static str) -> Result<(), ShellError> {
    if let Some(promise) = call_fullscreen_method(target, method)? {
        spawn_local(async move {
            if let Err(err) = settle_fullscreen(method, promise).await {
                shell_log!(warn, "{}", err);
            }
        });
    }
    Ok(())
}

#[derive(Clone)]
pub struct CanvasFullscreen {
    document: Document,
    canvas: HtmlCanvasElement,
}

impl CanvasFullscreen {
    pub fn new(document: Document, canvas: HtmlCanvasElement) -> Self {
        Self { document, canvas }
    }
}

impl FullscreenControl for CanvasFullscreen {
    fn is_active(&self) -> bool {
        self.document.fullscreen_element().is_some()
    }

    fn enter(&self) -> Result<(), ShellError> {
        call_and_report(&self.canvas, "requestFullscreen")
    }

    fn exit(&self) -> Result<(), ShellError> {
        call_and_report(&self.document, "exitFullscreen")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Recorder {
        active: Cell<bool>,
        fail_enter: bool,
        enters: Cell<u32>,
        exits: Cell<u32>,
    }

    impl FullscreenControl for Recorder {
        fn is_active(&self) -> bool {
            self.active.get()
        }

        fn enter(&self) -> Result<(), ShellError> {
            if self.fail_enter {
                return Err(ShellError::Js("denied".to_string()));
            }
            self.enters.set(self.enters.get() + 1);
            self.active.set(true);
            Ok(())
        }

        fn exit(&self) -> Result<(), ShellError> {
            self.exits.set(self.exits.get() + 1);
            self.active.set(false);
            Ok(())
        }
    }

    #[test]
    fn click_requests_when_windowed() {
        let control = Recorder::default();
        assert_eq!(on_fullscreen_click(&control), Ok(FullscreenAction::Requested));
        assert_eq!(control.enters.get(), 1);
    }

    #[test]
    fn click_does_not_toggle_off() {
        let control = Recorder::default();
        control.active.set(true);
        assert_eq!(on_fullscreen_click(&control), Ok(FullscreenAction::Ignored));
        assert_eq!(control.enters.get(), 0);
        assert_eq!(control.exits.get(), 0);
        assert!(control.active.get());
    }

    #[test]
    fn click_surfaces_rejected_request() {
        let control = Recorder {
            fail_enter: true,
            ..Recorder::default()
        };
        assert!(on_fullscreen_click(&control).is_err());
        assert!(!control.active.get());
    }

    #[test]
    fn rotation_exits_only_when_fullscreen() {
        let control = Recorder::default();
        assert_eq!(on_orientation_change(&control), Ok(FullscreenAction::Ignored));
        assert_eq!(control.exits.get(), 0);

        control.active.set(true);
        assert_eq!(on_orientation_change(&control), Ok(FullscreenAction::Exited));
        assert_eq!(control.exits.get(), 1);
        assert!(!control.active.get());
    }
}
