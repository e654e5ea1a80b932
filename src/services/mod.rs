//! Services layer - Business logic
//!
//! This module contains all business logic services for the showcase
//! site. Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories, storage and cache
//! - Handling validation and error cases

pub mod banner;
pub mod dashboard;
pub mod gallery;
pub mod import;
pub mod media;
pub mod model;
pub mod rate_limiter;
pub mod session;

pub use banner::{BannerPage, BannerService, BannerServiceError, BannerStats};
pub use dashboard::{Dashboard, DashboardError, DashboardService, Insights, UploadBucket};
pub use gallery::{Key, Lightbox, SyncCommand};
pub use import::{
    ImportError, ImportOutcome, ImportPayload, ImportService, ImportTarget, suggested_model_name,
};
pub use media::{MediaService, MediaServiceError};
pub use model::{
    CatalogFilter, CatalogPage, CatalogStats, ModelDraft, ModelService, ModelServiceError,
    generate_slug,
};
pub use rate_limiter::LoginRateLimiter;
pub use session::{SessionError, SessionService};
