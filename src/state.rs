//! Shared application state injected into every handler.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{AuthService, RedirectService, VariantService};
use crate::domain::repositories::{
    FormRepository, ShortUrlRepository, VariantRepository, VisitRepository,
};
use crate::domain::visit_event::VisitEvent;
use crate::infrastructure::session::RevocationStore;

pub type DynVariantService = VariantService<dyn VariantRepository, dyn ShortUrlRepository>;
pub type DynRedirectService =
    RedirectService<dyn ShortUrlRepository, dyn VariantRepository, dyn FormRepository>;
pub type DynAuthService = AuthService<dyn RevocationStore>;

/// Storage backends the services are built from.
///
/// PostgreSQL in production, in-memory repositories in tests.
#[derive(Clone)]
pub struct Repositories {
    pub variants: Arc<dyn VariantRepository>,
    pub short_urls: Arc<dyn ShortUrlRepository>,
    pub forms: Arc<dyn FormRepository>,
    pub visits: Arc<dyn VisitRepository>,
}

/// Session settings taken from [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub admin_token: String,
    pub secret: String,
    pub max_age: u64,
    pub cookie_name: String,
}

#[derive(Clone)]
pub struct AppState {
    pub variant_service: Arc<DynVariantService>,
    pub redirect_service: Arc<DynRedirectService>,
    pub auth_service: Arc<DynAuthService>,
    pub short_urls: Arc<dyn ShortUrlRepository>,
    pub visit_sender: mpsc::Sender<VisitEvent>,
    pub session_cookie_name: String,
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        revocations: Arc<dyn RevocationStore>,
        session: SessionSettings,
        visit_sender: mpsc::Sender<VisitEvent>,
        click_id_max_age: u64,
        behind_proxy: bool,
    ) -> Self {
        let variant_service = Arc::new(VariantService::new(
            repositories.variants.clone(),
            repositories.short_urls.clone(),
        ));
        let redirect_service = Arc::new(RedirectService::new(
            repositories.short_urls.clone(),
            repositories.variants,
            repositories.forms,
            click_id_max_age,
        ));
        let auth_service = Arc::new(AuthService::new(
            revocations,
            &session.admin_token,
            &session.secret,
            session.max_age,
        ));

        Self {
            variant_service,
            redirect_service,
            auth_service,
            short_urls: repositories.short_urls,
            visit_sender,
            session_cookie_name: session.cookie_name,
            behind_proxy,
        }
    }
}
