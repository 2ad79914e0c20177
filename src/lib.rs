//! Story Forge — synthetic training stories for conversational AI.
//!
//! Parses a markdown story seed file into intent units and recombines
//! them into new stories: randomly sampled multi-intent stories and
//! per-intent repeated stories, with optional entities drawn at random.

pub mod core;
pub mod schema;
