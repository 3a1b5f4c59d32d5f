use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Serialize};

use crate::markdown::forest_to_markdown;
use crate::outline::render_outline_html;
use crate::tree::TreeNode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Artifact {
    Markdown(String),
    Html(String),
}

impl Artifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Markdown(_) => "markdown",
            Artifact::Html(_) => "html",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Artifact::Markdown(text) | Artifact::Html(text) => text,
        }
    }
}

pub trait Presenter {
    fn present(&self, forest: &[TreeNode]) -> Artifact;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresenterKind {
    #[default]
    Outline,
    Markdown,
    MarkdownHtml,
}

#[derive(Clone, Debug)]
pub struct MarkdownPresenter {
    pub empty_title: String,
}

impl Presenter for MarkdownPresenter {
    fn present(&self, forest: &[TreeNode]) -> Artifact {
        Artifact::Markdown(forest_to_markdown(forest, &self.empty_title))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OutlinePresenter;

impl Presenter for OutlinePresenter {
    fn present(&self, forest: &[TreeNode]) -> Artifact {
        Artifact::Html(render_outline_html(forest))
    }
}

/// Renders the mind-map markdown straight to HTML, for hosts without a
/// layout library.
#[derive(Clone, Debug)]
pub struct MarkdownHtmlPresenter {
    pub markdown: MarkdownPresenter,
}

impl Presenter for MarkdownHtmlPresenter {
    fn present(&self, forest: &[TreeNode]) -> Artifact {
        let markdown = forest_to_markdown(forest, &self.markdown.empty_title);
        let parser = Parser::new_ext(&markdown, Options::empty());
        let mut out = String::new();
        html::push_html(&mut out, parser);
        Artifact::Html(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockMap};
    use crate::markdown::EMPTY_PAGE_TITLE;
    use crate::tree::build_forest;

    fn forest() -> Vec<TreeNode> {
        build_forest(&BlockMap::from_iter([
            Block::new("r", "Root").with_children(["c"]),
            Block::new("c", "Child"),
        ]))
    }

    #[test]
    fn markdown_presenter_emits_markdown() {
        let presenter = MarkdownPresenter {
            empty_title: EMPTY_PAGE_TITLE.to_string(),
        };
        let artifact = presenter.present(&forest());
        assert_eq!(artifact.kind(), "markdown");
        assert_eq!(artifact.as_str(), "# Root\n\n## Child");
    }

    #[test]
    fn markdown_html_presenter_renders_headings() {
        let presenter = MarkdownHtmlPresenter {
            markdown: MarkdownPresenter {
                empty_title: EMPTY_PAGE_TITLE.to_string(),
            },
        };
        let artifact = presenter.present(&forest());
        assert_eq!(artifact, Artifact::Html("<h1>Root</h1>\n<h2>Child</h2>\n".to_string()));
    }

    #[test]
    fn outline_presenter_emits_html() {
        let artifact = OutlinePresenter.present(&forest());
        assert_eq!(artifact.kind(), "html");
        assert!(artifact.as_str().contains("Child"));
    }

    #[test]
    fn presenter_kind_reads_camel_case() {
        let kind: PresenterKind = serde_json::from_str("\"markdownHtml\"").unwrap();
        assert_eq!(kind, PresenterKind::MarkdownHtml);
    }
}
