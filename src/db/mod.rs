// Database layer: connection pooling plus the ledger store implementations

pub mod diesel_pool;
pub mod ledger;
pub mod memory_ledger;
pub mod postgres_ledger;

pub use diesel_pool::{
    create_diesel_pool, mask_connection_string, DieselDatabaseConfig, DieselPool, MIGRATIONS,
};
pub use ledger::{
    AttributionWrite, CommissionCredit, DistributionWrite, LedgerError, LedgerStore,
    ReferrerGrant,
};
pub use memory_ledger::MemoryLedger;
pub use postgres_ledger::PostgresLedger;
