use crate::block::BlockMap;
use crate::error::Result;
use crate::present::Artifact;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Success,
    Warn,
    Error,
}

impl NotifyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NotifyLevel::Info => "info",
            NotifyLevel::Success => "success",
            NotifyLevel::Warn => "warn",
            NotifyLevel::Error => "error",
        }
    }
}

/// Capabilities the note-taking host exposes to the plugin.
///
/// The browser binding implements this over the live runtime object; tests
/// implement it with a recording mock.
pub trait Host {
    fn api_version(&self) -> Option<String>;

    fn blocks(&self) -> Result<BlockMap>;

    fn notify(&self, level: NotifyLevel, message: &str);

    fn open_panel(&self, panel_id: &str, title: &str, artifact: &Artifact) -> Result<()>;

    fn close_panel(&self, panel_id: &str);

    /// Registers a command that, when invoked, is routed back to
    /// [`Session::handle_command`](crate::session::Session::handle_command).
    fn register_command(&self, command_id: &str, description: &str) -> Result<()>;

    fn unregister_command(&self, command_id: &str);

    /// Subscribes to a host broadcast. Deliveries end up in
    /// [`Session::handle_blocks_changed`](crate::session::Session::handle_blocks_changed).
    fn register_broadcast(&self, event: &str) -> Result<()>;

    fn unregister_broadcast(&self, event: &str);
}
