pub mod block;
pub mod column;
pub mod coords;
pub mod worldgen;
