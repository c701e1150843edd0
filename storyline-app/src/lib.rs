//! Storyline application layer: page cache, harvesting and the HTTP endpoint.

pub mod cache;
pub mod harvest;
pub mod server;

pub use cache::{PageCache, write_stories};
pub use harvest::{Harvest, HarvestError, Harvester, build_from_config};
pub use server::{STORIES_ROUTE, router, serve};
