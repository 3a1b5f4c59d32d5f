//! Turns a note-taking host's flat block mapping into sanitized outline trees
//! and renders them as markdown for a mind-map library or as an HTML outline.

pub mod block;
pub mod error;
pub mod host;
pub mod logging;
pub mod markdown;
pub mod noise;
pub mod outline;
pub mod present;
pub mod roots;
pub mod sanitize;
pub mod session;
pub mod settings;
pub mod tree;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use block::{Block, BlockMap};
pub use error::PluginError;
pub use host::{Host, NotifyLevel};
pub use noise::NoiseFilter;
pub use present::{Artifact, Presenter, PresenterKind};
pub use roots::find_root_blocks;
pub use sanitize::{sanitize, sanitize_value};
pub use session::Session;
pub use settings::Settings;
pub use tree::{build_forest, build_tree, build_tree_at, TreeBuilder, TreeNode, TreeOptions};
