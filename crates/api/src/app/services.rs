use std::sync::Arc;

use sqlx::SqlitePool;

use eventposter_auth::TokenIssuer;
use eventposter_infra::repo::EventRepository;
use eventposter_infra::{AccountDirectory, EventCatalog, ExpirySweeper, RegistrationLedger};

/// Services shared by every handler, all backed by one connection pool.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub accounts: AccountDirectory,
    pub catalog: EventCatalog,
    pub ledger: RegistrationLedger,
    pub sweeper: ExpirySweeper,
}

impl AppServices {
    pub fn new(pool: SqlitePool, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self {
            accounts: AccountDirectory::new(pool.clone(), tokens),
            catalog: EventCatalog::new(pool.clone()),
            ledger: RegistrationLedger::new(pool.clone()),
            sweeper: ExpirySweeper::new(EventRepository::new(pool)),
        }
    }
}
