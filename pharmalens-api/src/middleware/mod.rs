/// Middleware modules for the API server
///
/// This module contains custom middleware for:
/// - Security headers
///
/// Bearer-token authentication and the admin role check live in `app`,
/// next to the router they protect.

pub mod security;
