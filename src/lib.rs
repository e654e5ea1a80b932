//! Cove - A lightweight content showcase system
//!
//! This library provides the core functionality for the Cove showcase system:
//! an admin-managed catalog of model profiles, their photo and video media,
//! and promotional banners, served over a JSON API. Persistence, file storage
//! and credential checks are delegated to a hosted backend service.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod models;
pub mod repositories;
pub mod services;
