//! Resilience patterns for fault tolerance and error handling
//!
//! This module provides **generic, reusable** resilience patterns including:
//! - **Circuit Breaker**: Prevents cascading failures by detecting and stopping
//!   repeated failures
//! - **Retry Logic**: Configurable retry strategies with exponential backoff
//!   and jitter
//!
//! These patterns help build robust systems that can handle transient failures
//! gracefully.
//!
//! Both are generic over error types (`<E: std::error::Error>`), testable via
//! the `Clock`/`MockClock` abstraction, and framework-agnostic.

pub mod circuit_breaker;
pub mod retry;

// Re-export circuit breaker types
pub use circuit_breaker::{
    BoxedError, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder,
    CircuitBreakerMetrics, CircuitState, Clock, ConfigError, ConfigResult, MockClock,
    ResilienceError, ResilienceResult, SyncCircuitBreaker, SystemClock,
};
// Re-export retry types
pub use retry::{
    policies, retry, retry_with_policy, BackoffStrategy, Jitter, RetryConfig, RetryConfigBuilder,
    RetryContext, RetryDecision, RetryError, RetryExecutor, RetryOutcome, RetryPolicy, RetryResult,
};
