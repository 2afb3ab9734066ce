#![doc = include_str!("../README.md")]

pub mod cli;
pub mod error;
pub mod runtime;
pub mod tools;
pub mod types;


pub use error::*;
pub use runtime::*;
pub use tools::batch::{
    batch, bounded_map, bounded_map_spawned, bounded_map_with_stats, partition_outcomes,
    try_bounded_map, Outcome,
};
pub use types::*;
