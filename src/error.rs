use std::fmt;

use wasm_bindgen::JsValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    MissingWindow,
    MissingDocument,
    /// A required host-page element is absent.
    MissingElement { id: String },
    /// The element exists but is not of the expected DOM type.
    WrongElementType { id: String, expected: &'static str },
    /// The canvas selector matched an element that is not a `<canvas>`.
    NotACanvas { selector: String },
    /// `width` / `height` attribute on the canvas is not a pixel count.
    InvalidCanvasSize { attribute: &'static str, value: String },
    CanvasTimeout { selector: String, waited_ms: i32 },
    /// The browser refused a Fullscreen API call.
    FullscreenRejected { method: &'static str, reason: String },
    Js(String),
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::MissingWindow => write!(f, "no window"),
            ShellError::MissingDocument => write!(f, "no document"),
            ShellError::MissingElement { id } => {
                write!(f, "host page is missing required element #{}", id)
            }
            ShellError::WrongElementType { id, expected } => {
                write!(f, "element #{} is not a {}", id, expected)
            }
            ShellError::NotACanvas { selector } => {
                write!(f, "element matching {:?} is not a canvas", selector)
            }
            ShellError::InvalidCanvasSize { attribute, value } => {
                write!(f, "canvas {} attribute {:?} is not a pixel size", attribute, value)
            }
            ShellError::CanvasTimeout {
                selector,
                waited_ms,
            } => write!(f, "no element matching {:?} after {} ms", selector, waited_ms),
            ShellError::FullscreenRejected { method, reason } => {
                write!(f, "{} rejected: {}", method, reason)
            }
            ShellError::Js(message) => write!(f, "js error: {}", message),
        }
    }
}

impl std::error::Error for ShellError {}

impl From<JsValue> for ShellError {
    fn from(value: JsValue) -> Self {
        ShellError::Js(js_value_to_string(&value))
    }
}

impl From<ShellError> for JsValue {
    fn from(err: ShellError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

pub(crate) fn js_value_to_string(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
