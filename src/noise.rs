use regex::Regex;
use std::sync::OnceLock;

use crate::block::Block;

pub const TABLE_CELL_TYPE: &str = "table2";

/// Header words that only ever show up inside tables.
pub const DEFAULT_TABLE_KEYWORDS: &[&str] = &["阶段", "功能与特点"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoiseFilter {
    cell_type: String,
    keywords: Vec<String>,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::new(TABLE_CELL_TYPE, DEFAULT_TABLE_KEYWORDS.iter().copied())
    }
}

impl NoiseFilter {
    pub fn new<I, S>(cell_type: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cell_type: cell_type.into(),
            keywords: keywords
                .into_iter()
                .map(Into::into)
                .filter(|keyword: &String| !keyword.is_empty())
                .collect(),
        }
    }

    pub fn is_noise(&self, block: &Block) -> bool {
        if block.kind.as_deref() == Some(self.cell_type.as_str()) {
            return true;
        }
        let text = block.text();
        if text.is_empty() {
            return false;
        }
        self.keywords
            .iter()
            .any(|keyword| text.contains(keyword.as_str()))
            || is_numbered_cell_label(text.trim())
    }
}

/// `"3. 阶段"`-style labels: a number, a period, then nothing but CJK ideographs.
fn is_numbered_cell_label(text: &str) -> bool {
    static RE_CELL: OnceLock<Regex> = OnceLock::new();
    let re_cell =
        RE_CELL.get_or_init(|| Regex::new(r"^[0-9]+\.\s*[\x{4E00}-\x{9FFF}]+$").unwrap());
    re_cell.is_match(text)
}
