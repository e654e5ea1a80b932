//! Data models
//!
//! This module contains all data structures used throughout the Cove showcase system.
//! Models represent:
//! - Backend rows (Model, Media, Banner)
//! - In-memory admin sessions
//! - Internal data transfer objects
//!
//! Row structs keep the column names used by the hosted backend so they can be
//! deserialized straight from its REST responses.

mod banner;
mod media;
mod model;
mod session;

pub use banner::{Banner, BannerPatch, BannerType, NewBanner};
pub use media::{Media, MediaOwner, MediaType, NewMedia};
pub use model::{Model, ModelPatch, NewModel};
pub use session::Session;
