//! Flutter bridge for the CryptoGuard client-state core.

pub mod api;
