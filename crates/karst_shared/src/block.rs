use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

#[repr(transparent)]
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Pod,
    Zeroable,
)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: Self = Self(0);
    pub const BEDSTONE: Self = Self(1);
    pub const GRANITE: Self = Self(2);
    pub const LOAM: Self = Self(3);
    pub const VERDANT_TURF: Self = Self(4);
    pub const DUNE_SAND: Self = Self(5);
    pub const GRAVEL_BED: Self = Self(6);
    pub const TUFF: Self = Self(7);
    pub const STILL_WATER: Self = Self(8);
    pub const LAVA_SOURCE: Self = Self(9);
    pub const BASALT: Self = Self(10);
    pub const SNOWCAP: Self = Self(11);
}

pub fn is_water_block(block: BlockId) -> bool {
    block == BlockId::STILL_WATER
}

pub fn is_lava_block(block: BlockId) -> bool {
    block == BlockId::LAVA_SOURCE
}

pub fn is_liquid_block(block: BlockId) -> bool {
    is_water_block(block) || is_lava_block(block)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockProperties {
    pub name: String,
    pub solid: bool,
    pub transparent: bool,
    pub hardness: f32,
    #[serde(default)]
    pub light_level: u8,
}

#[derive(Default, Debug, Clone)]
pub struct BlockRegistry {
    properties: Vec<BlockProperties>,
    by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            properties: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn register(&mut self, props: BlockProperties) -> BlockId {
        if let Some(existing) = self.by_name.get(props.name.as_str()) {
            return *existing;
        }

        let next_index = self.properties.len();
        let id = BlockId(
            u16::try_from(next_index).expect("block registry exceeded BlockId capacity (u16::MAX)"),
        );

        self.by_name.insert(props.name.clone(), id);
        self.properties.push(props);
        id
    }

    pub fn get_properties(&self, id: BlockId) -> &BlockProperties {
        self.properties
            .get(id.0 as usize)
            .or_else(|| self.properties.get(BlockId::AIR.0 as usize))
            .expect("block registry is empty; call register_default_blocks() first")
    }

    pub fn get_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

pub fn register_default_blocks() -> BlockRegistry {
    fn block(name: &str, solid: bool, transparent: bool, hardness: f32) -> BlockProperties {
        block_with_light(name, solid, transparent, hardness, 0)
    }

    fn block_with_light(
        name: &str,
        solid: bool,
        transparent: bool,
        hardness: f32,
        light_level: u8,
    ) -> BlockProperties {
        BlockProperties {
            name: name.to_string(),
            solid,
            transparent,
            hardness,
            light_level,
        }
    }

    let mut registry = BlockRegistry::new();

    let defaults = [
        block("air", false, true, 0.0),
        block("bedstone", true, false, 1000.0),
        block("granite", true, false, 4.0),
        block("loam", true, false, 1.2),
        block("verdant_turf", true, false, 0.8),
        block("dune_sand", true, false, 0.6),
        block("gravel_bed", true, false, 0.9),
        block("tuff", true, false, 3.0),
        block("still_water", false, true, 100.0),
        block_with_light("lava_source", false, false, 100.0, 14),
        block("basalt", true, false, 4.2),
        block("snowcap", true, true, 0.1),
    ];

    for (idx, props) in defaults.into_iter().enumerate() {
        let id = registry.register(props);
        debug_assert_eq!(id.0 as usize, idx, "default block IDs must be stable");
    }

    registry
}
