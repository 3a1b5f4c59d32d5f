use crate::tree::TreeNode;

pub const EMPTY_PAGE_TITLE: &str = "# Page is empty";

const MAX_HEADING_LEVEL: usize = 6;

/// One heading per node, nesting depth mapped onto heading level.
///
/// This is the input format mind-map layout libraries expect: a root is an
/// `#` heading, its children `##`, and so on down to `######`, where deeper
/// levels flatten.
pub fn forest_to_markdown(forest: &[TreeNode], empty_title: &str) -> String {
    let mut markdown = String::new();
    for root in forest {
        for node in root.walk() {
            let content = node.content.trim();
            if content.is_empty() {
                continue;
            }
            let depth = (node.level + 1).min(MAX_HEADING_LEVEL);
            markdown.push_str(&"#".repeat(depth));
            markdown.push(' ');
            markdown.push_str(content);
            markdown.push_str("\n\n");
        }
    }

    let trimmed = markdown.trim_end();
    if trimmed.is_empty() {
        empty_title.to_string()
    } else {
        trimmed.to_string()
    }
}
