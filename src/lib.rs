// Library for tests to access modules

pub mod collector;
pub mod config;
pub mod filter;
pub mod gateway;
pub mod models;
pub mod normalize;
pub mod sampler;
pub mod sink;
pub mod swarm;
pub mod version;
pub mod worker;
