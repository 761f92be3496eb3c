//! Waiting for the engine to inject its canvas.
//!
//! Timer and observer callbacks only record the outcome and resolve a
//! promise; cleanup runs after the await so no closure is dropped while
//! it is executing.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Promise};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlCanvasElement, MutationObserver, MutationObserverInit, Window};

use crate::config::WaitStrategy;
use crate::error::ShellError;

#[derive(Default)]
struct Watch {
    outcome: Option<Result<HtmlCanvasElement, ShellError>>,
    interval: Option<i32>,
    timeout: Option<i32>,
    observer: Option<MutationObserver>,
    poll_cb: Option<Closure<dyn FnMut()>>,
    timeout_cb: Option<Closure<dyn FnMut()>>,
    observer_cb: Option<Closure<dyn FnMut(Array, MutationObserver)>>,
}

impl Watch {
    fn settle(&mut self, outcome: Result<HtmlCanvasElement, ShellError>, wake: &Function) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        let _ = wake.call0(&JsValue::NULL);
    }

    fn teardown(&mut self, window: &Window) {
        if let Some(id) = self.interval.take() {
            window.clear_interval_with_handle(id);
        }
        if let Some(id) = self.timeout.take() {
            window.clear_timeout_with_handle(id);
        }
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        self.poll_cb = None;
        self.timeout_cb = None;
        self.observer_cb = None;
    }
}

/// Returns the first element matching `selector`, if it is a canvas.
pub fn find_canvas(document: &Document, selector: &str) -> Result<Option<HtmlCanvasElement>, ShellError> {
    let Some(element) = document.query_selector(selector)? else {
        return Ok(None);
    };
    element
        .dyn_into::<HtmlCanvasElement>()
        .map(Some)
        .map_err(|_| ShellError::NotACanvas {
            selector: selector.to_string(),
        })
}

/// Resolves once an element matching `selector` exists.
///
/// With `timeout_ms = None` this waits for as long as the page lives.
pub async fn wait_for_canvas(
    window: &Window,
    document: &Document,
    selector: &str,
    strategy: WaitStrategy,
    timeout_ms: Option<i32>,
) -> Result<HtmlCanvasElement, ShellError> {
    if let Some(canvas) = find_canvas(document, selector)? {
        return Ok(canvas);
    }

    let mut wake = None;
    let promise = Promise::new(&mut |resolve, _reject| wake = Some(resolve));
    let wake = wake.ok_or_else(|| ShellError::Js("promise executor did not run".to_string()))?;

    let watch = Rc::new(RefCell::new(Watch::default()));

    let installed = install(window, document, selector, strategy, timeout_ms, &watch, &wake);
    if let Err(err) = installed {
        watch.borrow_mut().teardown(window);
        return Err(err);
    }

    let _ = JsFuture::from(promise).await;

    let mut watch = watch.borrow_mut();
    watch.teardown(window);
    watch
        .outcome
        .take()
        .unwrap_or_else(|| Err(ShellError::Js("canvas wait woke without an outcome".to_string())))
}

fn install(
    window: &Window,
    document: &Document,
    selector: &str,
    strategy: WaitStrategy,
    timeout_ms: Option<i32>,
    watch: &Rc<RefCell<Watch>>,
    wake: &Function,
) -> Result<(), ShellError> {
    match strategy {
        WaitStrategy::Poll { interval_ms } => {
            let check = checker(document, selector, watch, wake);
            let cb = Closure::wrap(Box::new(check) as Box<dyn FnMut()>);
            let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                interval_ms.max(1),
            )?;
            let mut watch = watch.borrow_mut();
            watch.interval = Some(id);
            watch.poll_cb = Some(cb);
        }
        WaitStrategy::Observe => {
            let target = document
                .document_element()
                .ok_or(ShellError::MissingDocument)?;
            let mut check = checker(document, selector, watch, wake);
            let cb = Closure::wrap(Box::new(move |_records: Array, _observer: MutationObserver| {
                check();
            }) as Box<dyn FnMut(Array, MutationObserver)>);
            let observer = MutationObserver::new(cb.as_ref().unchecked_ref())?;
            let options = MutationObserverInit::new();
            options.set_child_list(true);
            options.set_subtree(true);
            observer.observe_with_options(&target, &options)?;
            let mut watch = watch.borrow_mut();
            watch.observer = Some(observer);
            watch.observer_cb = Some(cb);
        }
    }

    if let Some(limit) = timeout_ms {
        let watch_timeout = Rc::clone(watch);
        let wake_timeout = wake.clone();
        let selector = selector.to_string();
        let cb = Closure::wrap(Box::new(move || {
            watch_timeout.borrow_mut().settle(
                Err(ShellError::CanvasTimeout {
                    selector: selector.clone(),
                    waited_ms: limit,
                }),
                &wake_timeout,
            );
        }) as Box<dyn FnMut()>);
        let id = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), limit)?;
        let mut watch = watch.borrow_mut();
        watch.timeout = Some(id);
        watch.timeout_cb = Some(cb);
    }

    Ok(())
}

fn checker(
    document: &Document,
    selector: &str,
    watch: &Rc<RefCell<Watch>>,
    wake: &Function,
) -> impl FnMut() + 'static {
    let document = document.clone();
    let selector = selector.to_string();
    let watch = Rc::clone(watch);
    let wake = wake.clone();
    move || {
        if watch.borrow().outcome.is_some() {
            return;
        }
        match find_canvas(&document, &selector) {
            Ok(Some(canvas)) => watch.borrow_mut().settle(Ok(canvas), &wake),
            Ok(None) => {}
            Err(err) => watch.borrow_mut().settle(Err(err), &wake),
        }
    }
}
