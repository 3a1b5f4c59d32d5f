use crate::tree::TreeNode;

const BULLETS: [&str; 5] = ["●", "○", "▪", "▫", "‣"];
const TITLE_CHARS: usize = 60;
const DEFAULT_TITLE: &str = "Mind map";

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn outline_title(forest: &[TreeNode]) -> String {
    forest
        .iter()
        .find(|node| !node.is_empty())
        .map(|node| node.content.chars().take(TITLE_CHARS).collect())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

pub fn render_outline_html(forest: &[TreeNode]) -> String {
    let mut body = String::new();
    for root in forest {
        render_node(root, 0, &mut body);
    }
    let count: usize = forest
        .iter()
        .filter(|node| !node.is_empty())
        .map(TreeNode::node_count)
        .sum();

    format!(
        concat!(
            "<div class=\"orca-outline\" style=\"font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif; max-width: 800px; margin: 0 auto; padding: 24px;\">",
            "<h2 class=\"orca-outline-title\" style=\"margin: 0 0 24px 0; font-size: 24px; border-bottom: 3px solid #2563eb; padding-bottom: 12px;\">{title}</h2>",
            "<div class=\"orca-outline-body\" style=\"border: 1px solid #e2e8f0; border-radius: 6px; padding: 20px; margin-bottom: 16px; max-height: 500px; overflow-y: auto;\">{body}</div>",
            "<div class=\"orca-outline-footer\" style=\"font-size: 14px; color: #6b7280; border-top: 1px solid #e2e8f0; padding-top: 12px;\">{count} nodes</div>",
            "</div>"
        ),
        title = escape_html(&outline_title(forest)),
        body = body,
        count = count,
    )
}

// Styling keys off the position in this outline, not the node's stored level.
fn render_node(node: &TreeNode, depth: usize, out: &mut String) {
    if node.is_empty() {
        return;
    }
    let indent = depth * 24;
    let font_size = 16usize.saturating_sub(depth * 2).max(12);
    let bullet = BULLETS[depth.min(BULLETS.len() - 1)];
    let (margin, weight, color) = match depth {
        0 => ("12px", "600", "#2563eb"),
        1 => ("6px", "500", "#374151"),
        _ => ("6px", "normal", "#6b7280"),
    };

    out.push_str(&format!(
        "<div class=\"orca-outline-node\" data-id=\"{id}\" style=\"margin: {margin} 0; padding-left: {indent}px; font-size: {font_size}px; line-height: 1.5; font-weight: {weight};\"><span style=\"color: #2563eb; margin-right: 8px;\">{bullet}</span><span style=\"color: {color};\">{content}</span></div>",
        id = escape_html(&node.id),
        content = escape_html(&node.content),
    ));
    for child in &node.children {
        render_node(child, depth + 1, out);
    }
}
