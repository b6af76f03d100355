//! Real-world scenario benchmarks.
//!
//! Full engine renders with realistic voice counts: a single held note, a
//! chord, and a chord whose release tails overlap new notes.

mod voices;

pub use voices::bench_voices;
