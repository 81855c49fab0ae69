use std::sync::Arc;

use course_core::model::SessionContext;
use storage::http::BackendConfig;
use storage::repository::Storage;

use crate::Clock;
use crate::admin_service::AdminService;
use crate::catalog_service::CatalogService;
use crate::dashboard_service::DashboardService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::submission_service::SubmissionService;

/// Assembles app-facing services for one signed-in session.
#[derive(Clone)]
pub struct AppServices {
    session: SessionContext,
    catalog: Arc<CatalogService>,
    dashboard: Arc<DashboardService>,
    progress: Arc<ProgressService>,
    submissions: Arc<SubmissionService>,
    admin: Arc<AdminService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, session: SessionContext, clock: Clock) -> Self {
        let progress = ProgressService::new(
            session.clone(),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
        );
        let submissions = Arc::new(SubmissionService::new(
            clock,
            progress.clone(),
            Arc::clone(&storage.submissions),
        ));
        let dashboard = Arc::new(DashboardService::new(
            session.clone(),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
        ));
        let admin = Arc::new(AdminService::new(
            session.clone(),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.submissions),
            Arc::clone(&storage.batches),
        ));
        let catalog = Arc::new(CatalogService::new(Arc::clone(&storage.courses)));

        Self {
            session,
            catalog,
            dashboard,
            progress: Arc::new(progress),
            submissions,
            admin,
        }
    }

    /// Build services backed by the REST API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Http` if the HTTP client cannot be built.
    pub fn http(
        config: &BackendConfig,
        session: SessionContext,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::http(config)?;
        Ok(Self::new(&storage, session, clock))
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn submissions(&self) -> Arc<SubmissionService> {
        Arc::clone(&self.submissions)
    }

    #[must_use]
    pub fn admin(&self) -> Arc<AdminService> {
        Arc::clone(&self.admin)
    }
}
