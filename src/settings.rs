use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::markdown::EMPTY_PAGE_TITLE;
use crate::noise::{NoiseFilter, DEFAULT_TABLE_KEYWORDS, TABLE_CELL_TYPE};
use crate::present::{
    MarkdownHtmlPresenter, MarkdownPresenter, OutlinePresenter, Presenter, PresenterKind,
};
use crate::tree::{TreeOptions, DEFAULT_MAX_DEPTH, UNKNOWN_BLOCK};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub presenter: PresenterKind,
    pub placeholder: String,
    pub max_depth: usize,
    pub table_keywords: Vec<String>,
    pub table_cell_type: String,
    pub empty_title: String,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            presenter: PresenterKind::default(),
            placeholder: UNKNOWN_BLOCK.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            table_keywords: DEFAULT_TABLE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            table_cell_type: TABLE_CELL_TYPE.to_string(),
            empty_title: EMPTY_PAGE_TITLE.to_string(),
            debug: false,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_or_default(json: &str) -> Self {
        Self::from_json(json).unwrap_or_else(|err| {
            log::warn!("{err}, using default settings");
            Self::default()
        })
    }

    pub fn tree_options(&self) -> TreeOptions {
        TreeOptions {
            placeholder: self.placeholder.clone(),
            max_depth: self.max_depth.min(DEFAULT_MAX_DEPTH),
            noise: NoiseFilter::new(self.table_cell_type.clone(), self.table_keywords.iter().cloned()),
        }
    }

    pub fn presenter(&self) -> Box<dyn Presenter> {
        let markdown = MarkdownPresenter {
            empty_title: self.empty_title.clone(),
        };
        match self.presenter {
            PresenterKind::Outline => Box::new(OutlinePresenter),
            PresenterKind::Markdown => Box::new(markdown),
            PresenterKind::MarkdownHtml => Box::new(MarkdownHtmlPresenter { markdown }),
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockMap};
    use crate::error::PluginError;
    use crate::tree::TreeBuilder;

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(Settings::from_json("").unwrap(), Settings::default());
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let settings =
            Settings::from_json(r#"{"presenter": "markdown", "maxDepth": 4, "unknown": 1}"#)
                .unwrap();
        assert_eq!(settings.presenter, PresenterKind::Markdown);
        assert_eq!(settings.max_depth, 4);
        assert_eq!(settings.placeholder, "unknown block");
        assert_eq!(settings.presenter().present(&[]).kind(), "markdown");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            Settings::from_json("{not json"),
            Err(PluginError::Settings(_))
        ));
        assert_eq!(Settings::from_json_or_default("{not json"), Settings::default());
    }

    #[test]
    fn oversized_max_depth_is_clamped() {
        let settings = Settings::from_json(r#"{"maxDepth": 1000000}"#).unwrap();
        assert_eq!(settings.max_depth, 1_000_000);
        assert_eq!(settings.tree_options().max_depth, DEFAULT_MAX_DEPTH);

        let blocks: BlockMap = (0..200_000)
            .map(|i| Block::new(i.to_string(), "x").with_children([(i + 1).to_string()]))
            .collect();
        let options = settings.tree_options();
        let tree = TreeBuilder::new(&blocks, &options).build("0");
        assert_eq!(tree.node_count(), DEFAULT_MAX_DEPTH + 1);
    }

    #[test]
    fn table_settings_reach_the_noise_filter() {
        let settings = Settings::from_json(
            r#"{"tableKeywords": ["Header"], "tableCellType": "cell"}"#,
        )
        .unwrap();
        let options = settings.tree_options();
        assert!(options.noise.is_noise(&Block::new("a", "Header row")));
        assert!(options.noise.is_noise(&Block::new("b", "x").with_kind("cell")));
        assert!(!options.noise.is_noise(&Block::new("c", "阶段")));
    }
}
