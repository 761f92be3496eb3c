//! Host-page shell for a canvas injected by a WebAssembly engine.
//!
//! Waits for the engine's `<canvas>`, mounts it into `#container` sized to
//! its declared resolution, swaps the loading indicator for the canvas and
//! wires the fullscreen button and rotation handling.

use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::Window;

/// Console logging with a crate prefix: `shell_log!("..")`,
/// `shell_log!(warn, "..")`, `shell_log!(error, "..")`.
macro_rules! shell_log {
    (warn, $($arg:tt)*) => {
        web_sys::console::warn_1(&wasm_bindgen::JsValue::from_str(
            &format!("[canvas_shell] {}", format_args!($($arg)*)),
        ))
    };
    (error, $($arg:tt)*) => {
        web_sys::console::error_1(&wasm_bindgen::JsValue::from_str(
            &format!("[canvas_shell] {}", format_args!($($arg)*)),
        ))
    };
    ($($arg:tt)*) => {
        web_sys::console::log_1(&wasm_bindgen::JsValue::from_str(
            &format!("[canvas_shell] {}", format_args!($($arg)*)),
        ))
    };
}

pub mod config;
pub mod error;
pub mod fullscreen;
pub mod shell;
pub mod wait;

pub use config::{RotationPolicy, ShellConfig, WaitStrategy};
pub use error::ShellError;
pub use fullscreen::{FullscreenAction, FullscreenControl};
pub use shell::{CanvasSize, PageShell, ShellBindings};

fn window() -> Result<Window, ShellError> {
    web_sys::window().ok_or(ShellError::MissingWindow)
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let query = web_sys::window()
        .and_then(|win| win.location().search().ok())
        .unwrap_or_default();

    spawn_local(async move {
        if let Err(err) = boot(&query).await {
            report_fatal(&err);
        }
    });
}

/// Boots the shell with an explicit query string, e.g. from a host page
/// that loads the module without `start`.
#[wasm_bindgen]
pub fn boot_with_query(query: String) -> Promise {
    future_to_promise(async move {
        match boot(&query).await {
            Ok(size) => Ok(JsValue::from_str(&format!("{}x{}", size.width, size.height))),
            Err(err) => {
                report_fatal(&err);
                Err(err.into())
            }
        }
    })
}

/// Locates the shell, waits for the canvas and attaches it. Listeners stay
/// registered for the page lifetime.
pub async fn boot(query: &str) -> Result<CanvasSize, ShellError> {
    let (config, warnings) = ShellConfig::from_query(query)?;
    for warning in &warnings {
        shell_log!(warn, "{}", warning);
    }

    let shell = PageShell::locate(window()?, &config)?;
    shell::set_status(shell.document(), "waiting");
    shell_log!(
        "waiting for {:?} ({:?}, timeout {})",
        config.canvas_selector,
        config.wait,
        config
            .timeout_ms
            .map(|ms| format!("{} ms", ms))
            .unwrap_or_else(|| "none".to_string())
    );

    let canvas = wait::wait_for_canvas(
        shell.window(),
        shell.document(),
        &config.canvas_selector,
        config.wait,
        config.timeout_ms,
    )
    .await?;

    let (size, bindings) = shell.attach(&canvas)?;
    shell_log!(
        "canvas mounted at {}x{} with {} listeners",
        size.width,
        size.height,
        bindings.len()
    );
    bindings.keep_for_page();

    Ok(size)
}

fn report_fatal(err: &ShellError) {
    let message = format!("fatal: {}", err);

    if let Some(doc) = web_sys::window().and_then(|win| win.document()) {
        shell::set_status(&doc, "error");
        if let Some(loading) = doc.get_element_by_id(&ShellConfig::default().loading_id) {
            loading.set_text_content(Some(&message));
        }
    }

    shell_log!(error, "{}", message);
}
