use crate::block::BlockMap;
use crate::noise::NoiseFilter;

pub fn find_root_blocks(blocks: &BlockMap) -> Vec<String> {
    find_root_blocks_with(blocks, &NoiseFilter::default())
}

pub fn find_root_blocks_with(blocks: &BlockMap, noise: &NoiseFilter) -> Vec<String> {
    blocks
        .iter()
        .filter(|(_, block)| block.is_valid() && !noise.is_noise(block))
        .filter(|(_, block)| {
            block
                .parent
                .as_deref()
                .map_or(true, |parent| !blocks.contains(parent))
        })
        .map(|(key, _)| key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;

    #[test]
    fn finds_parentless_blocks_in_order() {
        let blocks = BlockMap::from_json(
            r#"{
                "1": {"id": 1, "text": "r1", "children": [2]},
                "2": {"id": 2, "text": "c", "children": [], "parent": 1},
                "3": {"id": 3, "text": "r2", "children": []}
            }"#,
        )
        .unwrap();
        assert_eq!(find_root_blocks(&blocks), vec!["1", "3"]);
    }

    #[test]
    fn dangling_parent_makes_a_root() {
        let blocks = BlockMap::from_iter([
            Block::new("orphan", "lost").with_parent("gone"),
            Block::new("kid", "has parent").with_parent("orphan"),
        ]);
        assert_eq!(find_root_blocks(&blocks), vec!["orphan"]);
    }

    #[test]
    fn skips_invalid_and_noise_blocks() {
        let blocks = BlockMap::from_iter([
            Block::new("blank", "  "),
            Block::new("cell", "value").with_kind("table2"),
            Block::new("label", "2. 设计"),
            Block::new("", "no id"),
            Block::new("real", "content"),
        ]);
        assert_eq!(find_root_blocks(&blocks), vec!["real"]);
    }

    #[test]
    fn empty_mapping_has_no_roots() {
        assert!(find_root_blocks(&BlockMap::new()).is_empty());
        let all_noise = BlockMap::from_iter([Block::new("t", "x").with_kind("table2")]);
        assert!(find_root_blocks(&all_noise).is_empty());
    }
}
