/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, me, logout,
///   forgot-password, reset-password)
/// - `scan`: Scan pipeline and history endpoints
/// - `dashboard`: Role-scoped stats and admin user management
/// - `pages`: Static HTML pages and uploaded image serving

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod pages;
pub mod scan;
