use serde::Serialize;

use crate::block::BlockMap;
use crate::noise::NoiseFilter;
use crate::roots::find_root_blocks_with;
use crate::sanitize::sanitize;

pub const UNKNOWN_BLOCK: &str = "unknown block";

pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: String,
    pub content: String,
    pub children: Vec<TreeNode>,
    pub level: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl TreeNode {
    fn placeholder(id: &str, content: &str, level: usize) -> Self {
        Self {
            id: id.to_string(),
            content: content.to_string(),
            children: Vec::new(),
            level,
            parent: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

pub struct Walk<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeOptions {
    pub placeholder: String,
    pub max_depth: usize,
    pub noise: NoiseFilter,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            placeholder: UNKNOWN_BLOCK.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            noise: NoiseFilter::default(),
        }
    }
}

pub struct TreeBuilder<'a> {
    blocks: &'a BlockMap,
    options: &'a TreeOptions,
    max_depth: usize,
}

impl<'a> TreeBuilder<'a> {
    // Recursion depth never exceeds DEFAULT_MAX_DEPTH, whatever the options ask for.
    pub fn new(blocks: &'a BlockMap, options: &'a TreeOptions) -> Self {
        Self {
            blocks,
            options,
            max_depth: options.max_depth.min(DEFAULT_MAX_DEPTH),
        }
    }

    pub fn build(&self, root_id: &str) -> TreeNode {
        self.build_at(root_id, 0)
    }

    pub fn build_at(&self, root_id: &str, level: usize) -> TreeNode {
        let mut path = Vec::new();
        self.build_node(root_id, level, 0, &mut path)
    }

    pub fn forest(&self) -> Vec<TreeNode> {
        let forest: Vec<TreeNode> = find_root_blocks_with(self.blocks, &self.options.noise)
            .iter()
            .map(|root_id| self.build(root_id))
            .filter(|node| !node.is_empty())
            .collect();
        log::debug!(
            "built {} trees from {} blocks",
            forest.len(),
            self.blocks.len()
        );
        forest
    }

    // `path` holds the keys on the current recursion path; a child already on
    // it is a back edge and is skipped.
    fn build_node(
        &self,
        id: &str,
        level: usize,
        depth: usize,
        path: &mut Vec<&'a str>,
    ) -> TreeNode {
        let Some((key, block)) = self
            .blocks
            .entry(id)
            .filter(|(_, block)| !block.id.is_empty())
        else {
            log::warn!("block {id} not found");
            return TreeNode::placeholder(id, &self.options.placeholder, level);
        };

        let content = sanitize(block.text());
        if content.is_empty() || self.options.noise.is_noise(block) {
            return TreeNode {
                id: block.id.clone(),
                content: String::new(),
                children: Vec::new(),
                level,
                parent: block.parent.clone(),
            };
        }

        let mut children = Vec::new();
        if depth >= self.max_depth {
            if !block.children.is_empty() {
                log::warn!(
                    "block {id} is {depth} levels deep, omitting its {} children",
                    block.children.len()
                );
            }
        } else {
            path.push(key);
            for child_id in &block.children {
                let Some((child_key, child)) = self.blocks.entry(child_id) else {
                    continue;
                };
                if !child.is_valid() {
                    continue;
                }
                if path.contains(&child_key) {
                    log::warn!("cycle through block {child_key} under {key}, skipping");
                    continue;
                }
                let node = self.build_node(child_key, level + 1, depth + 1, path);
                if !node.is_empty() {
                    children.push(node);
                }
            }
            path.pop();
        }

        TreeNode {
            id: block.id.clone(),
            content,
            children,
            level,
            parent: block.parent.clone(),
        }
    }
}

pub fn build_tree(root_id: &str, blocks: &BlockMap) -> TreeNode {
    build_tree_at(root_id, blocks, 0)
}

pub fn build_tree_at(root_id: &str, blocks: &BlockMap, level: usize) -> TreeNode {
    let options = TreeOptions::default();
    TreeBuilder::new(blocks, &options).build_at(root_id, level)
}

pub fn build_forest(blocks: &BlockMap) -> Vec<TreeNode> {
    let options = TreeOptions::default();
    TreeBuilder::new(blocks, &options).forest()
}
