//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, random codes, constant-time compare)
//! - Password hashing (Argon2id)
//! - Cookie management
//! - Rate limiting infrastructure (TTL key-value store)

pub mod cookie;
pub mod crypto;
pub mod password;
pub mod rate_limit;
