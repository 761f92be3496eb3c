use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, EventTarget, HtmlCanvasElement, HtmlElement, Window};

use crate::config::{RotationPolicy, ShellConfig};
use crate::error::ShellError;
use crate::fullscreen::{CanvasFullscreen, on_fullscreen_click, on_orientation_change};

pub const STATUS_ATTRIBUTE: &str = "data-shell-status";
pub const LAST_EVENT_ATTRIBUTE: &str = "data-shell-last-event";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// Parses the declared `width` / `height` attributes. An absent
    /// attribute takes the matching fallback (the element's reflected size).
    pub fn from_attributes(
        width: Option<&str>,
        height: Option<&str>,
        fallback: (u32, u32),
    ) -> Result<Self, ShellError> {
        Ok(Self {
            width: parse_dimension("width", width, fallback.0)?,
            height: parse_dimension("height", height, fallback.1)?,
        })
    }

    pub fn of(canvas: &HtmlCanvasElement) -> Result<Self, ShellError> {
        Self::from_attributes(
            canvas.get_attribute("width").as_deref(),
            canvas.get_attribute("height").as_deref(),
            (canvas.width(), canvas.height()),
        )
    }

    pub fn max_width_css(&self) -> String {
        format!("{}px", self.width)
    }

    pub fn max_height_css(&self) -> String {
        format!("{}px", self.height)
    }
}

fn parse_dimension(attribute: &'static str, value: Option<&str>, fallback: u32) -> Result<u32, ShellError> {
    let Some(raw) = value else {
        return Ok(fallback);
    };
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ShellError::InvalidCanvasSize {
            attribute,
            value: raw.to_string(),
        })
}

pub fn set_status(document: &Document, status: &str) {
    if let Some(el) = document.document_element() {
        let _ = el.set_attribute(STATUS_ATTRIBUTE, status);
    }
}

/// Marks the canvas with the most recent control event it handled.
pub fn record_event(canvas: &HtmlCanvasElement, event: &str) {
    let _ = canvas.set_attribute(LAST_EVENT_ATTRIBUTE, event);
}

fn required_element(document: &Document, id: &str) -> Result<HtmlElement, ShellError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| ShellError::MissingElement { id: id.to_string() })?
        .dyn_into::<HtmlElement>()
        .map_err(|_| ShellError::WrongElementType {
            id: id.to_string(),
            expected: "HTML element",
        })
}

/// The host-page chrome the engine canvas is mounted into.
pub struct PageShell {
    window: Window,
    document: Document,
    container: HtmlElement,
    wrapper: HtmlElement,
    loading: HtmlElement,
    fullscreen_button: HtmlElement,
    rotation: RotationPolicy,
}

impl PageShell {
    /// Locates every required element up front.
    pub fn locate(window: Window, config: &ShellConfig) -> Result<Self, ShellError> {
        let document = window.document().ok_or(ShellError::MissingDocument)?;
        let container = required_element(&document, &config.container_id)?;
        let wrapper = required_element(&document, &config.wrapper_id)?;
        let loading = required_element(&document, &config.loading_id)?;
        let fullscreen_button = required_element(&document, &config.fullscreen_id)?;

        Ok(Self {
            window,
            document,
            container,
            wrapper,
            loading,
            fullscreen_button,
            rotation: config.rotation,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Sizes the container to the canvas, mounts and reveals it, then
    /// registers the fullscreen and orientation handlers.
    pub fn attach(&self, canvas: &HtmlCanvasElement) -> Result<(CanvasSize, ShellBindings), ShellError> {
        let size = CanvasSize::of(canvas)?;
        let mut bindings = ShellBindings::default();

        bindings.block_selection(canvas)?;

        let style = self.container.style();
        style.set_property("max-width", &size.max_width_css())?;
        style.set_property("max-height", &size.max_height_css())?;

        self.container.append_child(canvas)?;
        self.loading.style().set_property("display", "none")?;
        canvas.style().set_property("display", "block")?;
        self.wrapper.style().set_property("display", "block")?;

        let control = CanvasFullscreen::new(self.document.clone(), canvas.clone());
        bindings.fullscreen_button(canvas, &self.fullscreen_button, control.clone())?;
        if self.rotation == RotationPolicy::ExitFullscreen {
            bindings.orientation(canvas, &self.window, control)?;
        }

        set_status(&self.document, "ready");
        Ok((size, bindings))
    }
}

struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

/// Owns the listeners registered by [`PageShell::attach`]. Dropping it
/// unregisters them.
#[derive(Default)]
pub struct ShellBindings {
    listeners: Vec<Listener>,
}

impl ShellBindings {
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn detach(mut self) {
        self.remove_all();
        shell_log!("listeners detached");
    }

    /// Keeps every listener registered until the page unloads.
    pub fn keep_for_page(mut self) {
        for listener in self.listeners.drain(..) {
            listener.callback.forget();
        }
    }

    fn listen(
        &mut self,
        target: EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<(), ShellError> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        self.listeners.push(Listener {
            target,
            event,
            callback,
        });
        Ok(())
    }

    fn block_selection(&mut self, canvas: &HtmlCanvasElement) -> Result<(), ShellError> {
        canvas.style().set_property("user-select", "none")?;
        self.listen(canvas.clone().into(), "selectstart", |event: Event| {
            event.prevent_default();
        })
    }

    fn fullscreen_button(
        &mut self,
        canvas: &HtmlCanvasElement,
        button: &HtmlElement,
        control: CanvasFullscreen,
    ) -> Result<(), ShellError> {
        let canvas = canvas.clone();
        self.listen(button.clone().into(), "click", move |_event: Event| {
            match on_fullscreen_click(&control) {
                Ok(action) => {
                    record_event(&canvas, &format!("fullscreen_{}", action.name()));
                    shell_log!("fullscreen {}", action.name());
                }
                Err(err) => {
                    record_event(&canvas, "fullscreen_failed");
                    shell_log!(warn, "fullscreen request failed: {}", err);
                }
            }
        })
    }

    fn orientation(
        &mut self,
        canvas: &HtmlCanvasElement,
        window: &Window,
        control: CanvasFullscreen,
    ) -> Result<(), ShellError> {
        let canvas = canvas.clone();
        let (target, event) = orientation_target(window)?;
        self.listen(target, event, move |_event: Event| {
            match on_orientation_change(&control) {
                Ok(action) => {
                    record_event(&canvas, &format!("orientation_{}", action.name()));
                    shell_log!("orientation change, fullscreen {}", action.name());
                }
                Err(err) => {
                    record_event(&canvas, "orientation_failed");
                    shell_log!(warn, "leaving fullscreen failed: {}", err);
                }
            }
        })
    }

    fn remove_all(&mut self) {
        for listener in self.listeners.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.event,
                listener.callback.as_ref().unchecked_ref(),
            );
        }
    }
}

impl Drop for ShellBindings {
    fn drop(&mut self) {
        self.remove_all();
    }
}

/// `screen.orientation` where supported, otherwise the window's legacy
/// `orientationchange` event.
pub fn orientation_target(window: &Window) -> Result<(EventTarget, &'static str), ShellError> {
    let screen = window.screen()?;
    let has_orientation = Reflect::get(&screen, &JsValue::from_str("orientation"))
        .map(|value| !value.is_undefined() && !value.is_null())
        .unwrap_or(false);
    if has_orientation {
        Ok((screen.orientation().into(), "change"))
    } else {
        Ok((window.clone().into(), "orientationchange"))
    }
}
