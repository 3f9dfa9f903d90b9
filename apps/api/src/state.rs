use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::codes::CodeStore;
use crate::auth::sms::SmsSender;
use crate::commerce::payments::PaymentGateway;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Pending verification codes. Default: in-process map; a shared cache
    /// implementation can be swapped in for multi-instance deployments.
    pub codes: Arc<dyn CodeStore>,
    /// SMS delivery. Default: log-only sender until a provider is integrated.
    pub sms: Arc<dyn SmsSender>,
    /// Payment confirmation. Default: stub honoring the client-reported flag.
    pub payments: Arc<dyn PaymentGateway>,
    pub config: Config,
}
