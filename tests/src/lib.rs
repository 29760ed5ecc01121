//! Cross-crate scenarios driving the discovery engine through in-memory ports.

mod discovery;
mod exclusion;
mod support;
