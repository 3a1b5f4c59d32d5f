use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::{Array, Function, Promise, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::block::BlockMap;
use crate::error::{PluginError, Result};
use crate::host::{Host, NotifyLevel};
use crate::logging;
use crate::markdown::forest_to_markdown;
use crate::outline::render_outline_html;
use crate::present::Artifact;
use crate::roots::find_root_blocks;
use crate::sanitize::sanitize;
use crate::session::Session;
use crate::settings::Settings;
use crate::tree::{build_forest, build_tree_at};

const REFRESH_DELAY_MS: i32 = 500;

impl From<PluginError> for JsValue {
    fn from(err: PluginError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn decode_blocks(value: JsValue) -> Result<BlockMap> {
    serde_wasm_bindgen::from_value(value).map_err(|e| PluginError::Decode(e.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Result<JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| PluginError::Decode(e.to_string()))
}

#[derive(Serialize)]
struct PanelConfig<'a> {
    title: &'a str,
    kind: &'static str,
    content: &'a str,
}

/// [`Host`] over the `orca` object the note-taking app hands to plugins.
pub struct OrcaHost {
    orca: JsValue,
    dispatcher: Option<Function>,
    // one handler for every block event, so unregistering finds the same function
    on_broadcast: Option<Function>,
}

impl OrcaHost {
    pub fn new(orca: JsValue) -> Self {
        Self {
            orca,
            dispatcher: None,
            on_broadcast: None,
        }
    }

    fn set_dispatcher(&mut self, dispatcher: Function) {
        self.dispatcher = Some(dispatcher);
    }

    fn set_broadcast_handler(&mut self, handler: Function) {
        self.on_broadcast = Some(handler);
    }

    fn lookup(&self, path: &[&str]) -> Result<JsValue> {
        let mut current = self.orca.clone();
        for key in path {
            current = Reflect::get(&current, &JsValue::from_str(key))
                .ok()
                .filter(|value| !value.is_undefined() && !value.is_null())
                .ok_or_else(|| PluginError::MissingCapability(path.join(".")))?;
        }
        Ok(current)
    }

    // Calls `orca.<path>` with its owning object as `this`.
    fn call(&self, path: &[&str], args: &Array) -> Result<JsValue> {
        let (name, owner_path) = path
            .split_last()
            .ok_or_else(|| PluginError::MissingCapability(String::new()))?;
        let owner = self.lookup(owner_path)?;
        let function: Function = self
            .lookup(path)?
            .dyn_into()
            .map_err(|_| PluginError::MissingCapability(format!("{} as a function", path.join("."))))?;
        function
            .apply(&owner, args)
            .map_err(|e| PluginError::Host(format!("{name}: {}", describe(&e))))
    }
}

impl Host for OrcaHost {
    fn api_version(&self) -> Option<String> {
        self.lookup(&["state", "apiVersion"])
            .ok()
            .and_then(|version| version.as_string())
    }

    fn blocks(&self) -> Result<BlockMap> {
        decode_blocks(self.lookup(&["state", "blocks"])?)
    }

    fn notify(&self, level: NotifyLevel, message: &str) {
        let args = Array::of2(&level.as_str().into(), &message.into());
        if let Err(err) = self.call(&["notify"], &args) {
            log::warn!("notify failed: {err}");
        }
    }

    fn open_panel(&self, panel_id: &str, title: &str, artifact: &Artifact) -> Result<()> {
        let config = encode(&PanelConfig {
            title,
            kind: artifact.kind(),
            content: artifact.as_str(),
        })?;
        let result = self.call(&["nav", "addPanel"], &Array::of2(&panel_id.into(), &config))?;
        if let Ok(promise) = result.dyn_into::<Promise>() {
            let panel_id = panel_id.to_string();
            spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    log::error!("panel {panel_id} failed to open: {}", describe(&err));
                }
            });
        }
        Ok(())
    }

    fn close_panel(&self, panel_id: &str) {
        if let Err(err) = self.call(&["nav", "closePanel"], &Array::of1(&panel_id.into())) {
            log::warn!("closing panel {panel_id} failed: {err}");
        }
    }

    fn register_command(&self, command_id: &str, description: &str) -> Result<()> {
        let dispatcher = self
            .dispatcher
            .as_ref()
            .ok_or_else(|| PluginError::Host("command dispatcher not installed".to_string()))?;
        let handler = dispatcher.bind1(&JsValue::NULL, &command_id.into());
        self.call(
            &["commands", "registerCommand"],
            &Array::of3(&command_id.into(), &handler, &description.into()),
        )?;
        Ok(())
    }

    fn unregister_command(&self, command_id: &str) {
        if let Err(err) = self.call(
            &["commands", "unregisterCommand"],
            &Array::of1(&command_id.into()),
        ) {
            log::warn!("unregistering {command_id} failed: {err}");
        }
    }

    fn register_broadcast(&self, event: &str) -> Result<()> {
        let handler = self
            .on_broadcast
            .as_ref()
            .ok_or_else(|| PluginError::Host("broadcast handler not installed".to_string()))?;
        self.call(
            &["broadcasts", "registerHandler"],
            &Array::of2(&event.into(), handler),
        )?;
        Ok(())
    }

    fn unregister_broadcast(&self, event: &str) {
        let Some(handler) = &self.on_broadcast else {
            return;
        };
        if let Err(err) = self.call(
            &["broadcasts", "unregisterHandler"],
            &Array::of2(&event.into(), handler),
        ) {
            log::warn!("unregistering {event} handler failed: {err}");
        }
    }
}

// Collapses a burst of block events into one refresh REFRESH_DELAY_MS after
// the last of them.
struct Debounce {
    timer: Rc<Cell<Option<i32>>>,
    fire: Closure<dyn FnMut()>,
}

impl Debounce {
    fn new(mut action: impl FnMut() + 'static) -> Self {
        let timer = Rc::new(Cell::new(None));
        let pending = Rc::clone(&timer);
        let fire = Closure::<dyn FnMut()>::new(move || {
            pending.set(None);
            action();
        });
        Self { timer, fire }
    }

    fn schedule(&self) {
        self.cancel();
        let Some(window) = web_sys::window() else {
            log::warn!("no window to schedule a refresh on");
            return;
        };
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            self.fire.as_ref().unchecked_ref(),
            REFRESH_DELAY_MS,
        ) {
            Ok(handle) => self.timer.set(Some(handle)),
            Err(err) => log::warn!("scheduling a refresh failed: {}", describe(&err)),
        }
    }

    fn cancel(&self) {
        if let (Some(handle), Some(window)) = (self.timer.take(), web_sys::window()) {
            window.clear_timeout_with_handle(handle);
        }
    }
}

#[wasm_bindgen]
pub struct OutlinePlugin {
    session: Rc<RefCell<Session<OrcaHost>>>,
    refresh: Rc<Debounce>,
    _dispatch: Closure<dyn FnMut(String)>,
    _on_broadcast: Closure<dyn FnMut(JsValue)>,
}

#[wasm_bindgen]
impl OutlinePlugin {
    #[wasm_bindgen(constructor)]
    pub fn new(name: String, orca: JsValue, settings: Option<String>) -> OutlinePlugin {
        let settings = settings
            .as_deref()
            .map(Settings::from_json_or_default)
            .unwrap_or_default();
        logging::init(settings.log_level());

        let session = Rc::new(RefCell::new(Session::new(name, OrcaHost::new(orca), settings)));
        let weak: Weak<RefCell<Session<OrcaHost>>> = Rc::downgrade(&session);
        let dispatch = Closure::<dyn FnMut(String)>::new(move |command_id: String| {
            let Some(session) = weak.upgrade() else {
                return;
            };
            match session.try_borrow_mut() {
                Ok(mut session) => session.handle_command(&command_id),
                Err(_) => log::warn!("{command_id} ignored, plugin is busy"),
            };
        });

        let weak = Rc::downgrade(&session);
        let refresh = Rc::new(Debounce::new(move || {
            let Some(session) = weak.upgrade() else {
                return;
            };
            match session.try_borrow_mut() {
                Ok(mut session) => session.handle_blocks_changed(),
                Err(_) => log::warn!("refresh skipped, plugin is busy"),
            };
        }));
        let pending = Rc::clone(&refresh);
        let on_broadcast = Closure::<dyn FnMut(JsValue)>::new(move |block_id: JsValue| {
            log::debug!("block {} changed", describe(&block_id));
            pending.schedule();
        });

        {
            let mut session = session.borrow_mut();
            let host = session.host_mut();
            host.set_dispatcher(dispatch.as_ref().unchecked_ref::<Function>().clone());
            host.set_broadcast_handler(on_broadcast.as_ref().unchecked_ref::<Function>().clone());
        }

        OutlinePlugin {
            session,
            refresh,
            _dispatch: dispatch,
            _on_broadcast: on_broadcast,
        }
    }

    pub fn load(&self) -> std::result::Result<(), JsValue> {
        self.session.borrow_mut().load().map_err(Into::into)
    }

    pub fn unload(&self) {
        self.refresh.cancel();
        self.session.borrow_mut().unload();
    }

    pub fn refresh(&self) -> std::result::Result<usize, JsValue> {
        self.session.borrow_mut().refresh().map_err(Into::into)
    }

    #[wasm_bindgen(js_name = showOutline)]
    pub fn show_outline(&self, root_id: Option<String>) -> std::result::Result<bool, JsValue> {
        self.session
            .borrow_mut()
            .show_outline(root_id.as_deref())
            .map_err(Into::into)
    }

    pub fn toggle(&self) -> std::result::Result<bool, JsValue> {
        self.session.borrow_mut().toggle().map_err(Into::into)
    }

    #[wasm_bindgen(js_name = updateSettings)]
    pub fn update_settings(&self, json: &str) -> std::result::Result<(), JsValue> {
        let settings = Settings::from_json(json)?;
        log::set_max_level(settings.log_level());
        self.session.borrow_mut().set_settings(settings);
        Ok(())
    }
}

#[wasm_bindgen(js_name = sanitize)]
pub fn sanitize_js(input: JsValue) -> String {
    input.as_string().map(|text| sanitize(&text)).unwrap_or_default()
}

#[wasm_bindgen(js_name = buildTree)]
pub fn build_tree_js(
    root_id: &str,
    blocks: JsValue,
    level: Option<u32>,
) -> std::result::Result<JsValue, JsValue> {
    let blocks = decode_blocks(blocks)?;
    let tree = build_tree_at(root_id, &blocks, level.unwrap_or(0) as usize);
    Ok(encode(&tree)?)
}

#[wasm_bindgen(js_name = findRootBlocks)]
pub fn find_root_blocks_js(blocks: JsValue) -> std::result::Result<Vec<String>, JsValue> {
    Ok(find_root_blocks(&decode_blocks(blocks)?))
}

#[wasm_bindgen(js_name = blocksToMarkdown)]
pub fn blocks_to_markdown_js(
    blocks: JsValue,
    empty_title: Option<String>,
) -> std::result::Result<String, JsValue> {
    let forest = build_forest(&decode_blocks(blocks)?);
    let empty_title = empty_title.unwrap_or_else(|| Settings::default().empty_title);
    Ok(forest_to_markdown(&forest, &empty_title))
}

#[wasm_bindgen(js_name = renderOutlineHtml)]
pub fn render_outline_html_js(blocks: JsValue) -> std::result::Result<String, JsValue> {
    Ok(render_outline_html(&build_forest(&decode_blocks(blocks)?)))
}
