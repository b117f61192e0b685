/// Authentication and authorization utilities
///
/// This module provides the secure authentication primitives for PharmaLens:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Bearer token generation and validation
/// - [`reset`]: Password-reset token generation
/// - [`middleware`]: Request authentication context
/// - [`authorization`]: Role checks for admin-only routes
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Bearer Tokens**: HS256 signing with a fixed 24-hour expiry
/// - **Reset Tokens**: 32 bytes from the OS RNG, hex-encoded
/// - **Constant-time Comparison**: password verification never
///   short-circuits on mismatch

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod reset;
