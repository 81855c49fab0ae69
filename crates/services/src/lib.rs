#![forbid(unsafe_code)]

pub mod admin_service;
pub mod app_services;
pub mod catalog_service;
pub mod config;
pub mod dashboard_service;
pub mod error;
pub mod progress_service;
pub mod submission_service;

pub use course_core::Clock;

pub use admin_service::AdminService;
pub use app_services::AppServices;
pub use catalog_service::CatalogService;
pub use config::SessionConfig;
pub use dashboard_service::{Dashboard, DashboardItem, DashboardService, average_progress};
pub use error::{
    AdminError, AppServicesError, CatalogError, DashboardError, ProgressError,
    SubmissionServiceError,
};
pub use progress_service::{CompletionOutcome, ProgressService};
pub use submission_service::{QuizOutcome, SubmissionService};
