pub mod audit;
pub mod candidates;
pub mod config;
pub mod extract;
pub mod filesystem;
pub mod fixup;
pub mod heuristics;
pub mod integrate;
pub mod keys;
pub mod migrate;
pub mod regions;
pub mod rewrite;
pub mod runtime;
pub mod store;
pub mod tokens;
