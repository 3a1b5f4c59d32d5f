use indexmap::IndexMap;

use crate::error::{PluginError, Result};
use crate::host::{Host, NotifyLevel};
use crate::outline::outline_title;
use crate::settings::Settings;
use crate::tree::{TreeBuilder, TreeNode};

pub const SHOW_OUTLINE: &str = "showOutline";
pub const TOGGLE: &str = "toggle";

pub const BLOCK_EVENTS: [&str; 3] = [
    "core.block.updated",
    "core.block.created",
    "core.block.deleted",
];

const MIN_API_VERSION: (u32, u32) = (1, 5);

const PAGE_KEY: &str = "page";

// Versions that do not parse are let through; only a readable version below
// the minimum is refused.
fn api_version_supported(version: &str) -> bool {
    let mut parts = version.trim().split('.').map(|part| part.parse::<u32>().ok());
    let major = parts.next().flatten();
    let minor = parts.next().flatten();
    match (major, minor) {
        (Some(major), _) if major < MIN_API_VERSION.0 => false,
        (Some(major), Some(minor)) if major == MIN_API_VERSION.0 => minor >= MIN_API_VERSION.1,
        _ => true,
    }
}

pub struct Session<H> {
    host: H,
    name: String,
    settings: Settings,
    // outline key (root id or "page") -> host panel id
    panels: IndexMap<String, String>,
    commands: Vec<String>,
    broadcasts: Vec<&'static str>,
}

impl<H: Host> Session<H> {
    pub fn new(name: impl Into<String>, host: H, settings: Settings) -> Self {
        Self {
            host,
            name: name.into(),
            settings,
            panels: IndexMap::new(),
            commands: Vec::new(),
            broadcasts: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn is_mind_map_mode(&self) -> bool {
        self.panels.contains_key(PAGE_KEY)
    }

    pub fn open_panels(&self) -> impl Iterator<Item = &str> {
        self.panels.values().map(String::as_str)
    }

    pub fn command_id(&self, command: &str) -> String {
        format!("{}.{command}", self.name)
    }

    pub fn load(&mut self) -> Result<()> {
        if let Some(version) = self.host.api_version() {
            if !api_version_supported(&version) {
                log::error!("{} needs host API 1.5 or newer, found {version}", self.name);
                return Err(PluginError::UnsupportedApi(version));
            }
        }
        for (command, description) in [
            (SHOW_OUTLINE, "Show the current blocks as a mind map"),
            (TOGGLE, "Toggle mind map mode"),
        ] {
            let id = self.command_id(command);
            if self.commands.contains(&id) {
                continue;
            }
            self.host.register_command(&id, description)?;
            self.commands.push(id);
        }
        for event in BLOCK_EVENTS {
            if self.broadcasts.contains(&event) {
                continue;
            }
            match self.host.register_broadcast(event) {
                Ok(()) => self.broadcasts.push(event),
                Err(err) => log::warn!("no auto refresh on {event}: {err}"),
            }
        }
        log::info!("{} loaded", self.name);
        self.host.notify(NotifyLevel::Success, "Mind map plugin enabled");
        Ok(())
    }

    pub fn unload(&mut self) {
        self.close_all();
        for id in self.commands.drain(..) {
            self.host.unregister_command(&id);
        }
        for event in self.broadcasts.drain(..) {
            self.host.unregister_broadcast(event);
        }
        log::info!("{} unloaded", self.name);
        self.host.notify(NotifyLevel::Info, "Mind map plugin disabled");
    }

    /// Builds and shows the outline of `root`, or of every root block when
    /// `root` is `None`. Returns whether a panel was opened.
    pub fn show_outline(&mut self, root: Option<&str>) -> Result<bool> {
        self.render(root, true)
    }

    fn render(&mut self, root: Option<&str>, announce: bool) -> Result<bool> {
        let blocks = self.host.blocks()?;
        let options = self.settings.tree_options();
        let builder = TreeBuilder::new(&blocks, &options);

        let forest: Vec<TreeNode> = match root {
            Some(id) => {
                if !blocks.get(id).is_some_and(|block| !block.id.is_empty()) {
                    self.host
                        .notify(NotifyLevel::Error, &format!("Block {id} not found"));
                    return Ok(false);
                }
                Some(builder.build(id))
                    .into_iter()
                    .filter(|node| !node.is_empty())
                    .collect()
            }
            None => builder.forest(),
        };

        if forest.is_empty() {
            self.host
                .notify(NotifyLevel::Warn, "There are no blocks to show");
            return Ok(false);
        }

        let artifact = self.settings.presenter().present(&forest);
        let key = root.unwrap_or(PAGE_KEY).to_string();
        let panel_id = format!("{}.panel.{key}", self.name);
        if let Some(previous) = self.panels.shift_remove(&key) {
            self.host.close_panel(&previous);
        }
        self.host
            .open_panel(&panel_id, &outline_title(&forest), &artifact)?;
        self.panels.insert(key, panel_id);

        let count: usize = forest.iter().map(TreeNode::node_count).sum();
        log::debug!("rendered {count} nodes as {}", artifact.kind());
        if announce {
            self.host.notify(
                NotifyLevel::Success,
                &format!("Mind map ready: {count} nodes"),
            );
        }
        Ok(true)
    }

    /// Flips mind map mode, which is on while the page outline panel is open.
    /// Turning it on shows the page outline; if there is nothing to show the
    /// mode stays off.
    pub fn toggle(&mut self) -> Result<bool> {
        if self.is_mind_map_mode() {
            self.close_all();
            return Ok(false);
        }
        self.show_outline(None)
    }

    /// Re-renders every open panel from the current blocks. Panels whose
    /// outline can no longer be built are closed. Returns how many panels
    /// were refreshed.
    pub fn refresh(&mut self) -> Result<usize> {
        let keys: Vec<String> = self.panels.keys().cloned().collect();
        let mut refreshed = 0;
        for key in keys {
            let root = (key != PAGE_KEY).then_some(key.as_str());
            if self.render(root, false)? {
                refreshed += 1;
            } else if let Some(panel_id) = self.panels.shift_remove(&key) {
                self.host.close_panel(&panel_id);
            }
        }
        if refreshed > 0 {
            log::debug!("refreshed {refreshed} panels");
        }
        Ok(refreshed)
    }

    pub fn close_all(&mut self) {
        for (_, panel_id) in self.panels.drain(..) {
            self.host.close_panel(&panel_id);
        }
    }

    /// Entry point for host command callbacks. Errors end up as host
    /// notifications instead of propagating into the host.
    pub fn handle_command(&mut self, command_id: &str) {
        let result = match command_id.strip_prefix(&format!("{}.", self.name)) {
            Some(SHOW_OUTLINE) => self.show_outline(None).map(|_| ()),
            Some(TOGGLE) => self.toggle().map(|_| ()),
            _ => Err(PluginError::UnknownCommand(command_id.to_string())),
        };
        if let Err(err) = result {
            log::error!("{command_id} failed: {err}");
            self.host
                .notify(NotifyLevel::Error, &format!("Operation failed: {err}"));
        }
    }

    pub fn handle_blocks_changed(&mut self) {
        if let Err(err) = self.refresh() {
            log::error!("refresh failed: {err}");
            self.host
                .notify(NotifyLevel::Error, &format!("Operation failed: {err}"));
        }
    }
}
