//! Execution primitives shared across the orchestration engine.

pub mod concurrency_limiter;

pub use concurrency_limiter::ConcurrencyLimiter;
