//! Per-IP rate limits.
//!
//! Two token buckets are configured: a generous one for the API as a whole
//! and a strict one for the credential endpoints under `/api/auth`.
//!
//! - `RATE_LIMIT_GENERAL_PER_SECOND` (default 20)
//! - `RATE_LIMIT_GENERAL_BURST_SIZE` (default 60)
//! - `RATE_LIMIT_AUTH_PER_SECOND` (default 1)
//! - `RATE_LIMIT_AUTH_BURST_SIZE` (default 5)
//! - `RATE_LIMIT_TRUST_PROXY` (default false): key buckets on the forwarding
//!   headers instead of the peer address. Only enable behind a proxy that
//!   overwrites them.
//!
//! A value of zero is raised to one; governor quotas cannot be empty.

use std::num::NonZeroU32;

use governor::Quota;

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub general_per_second: u32,
    pub general_burst_size: u32,
    pub auth_per_second: u32,
    pub auth_burst_size: u32,
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general_per_second: 20,
            general_burst_size: 60,
            auth_per_second: 1,
            auth_burst_size: 5,
            trust_proxy: false,
        }
    }
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            general_per_second: env_or("RATE_LIMIT_GENERAL_PER_SECOND", defaults.general_per_second),
            general_burst_size: env_or("RATE_LIMIT_GENERAL_BURST_SIZE", defaults.general_burst_size),
            auth_per_second: env_or("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second),
            auth_burst_size: env_or("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size),
            trust_proxy: env_or("RATE_LIMIT_TRUST_PROXY", defaults.trust_proxy),
        }
    }

    #[must_use]
    pub fn general_quota(&self) -> Quota {
        Quota::per_second(non_zero(self.general_per_second))
            .allow_burst(non_zero(self.general_burst_size))
    }

    #[must_use]
    pub fn auth_quota(&self) -> Quota {
        Quota::per_second(non_zero(self.auth_per_second)).allow_burst(non_zero(self.auth_burst_size))
    }
}
