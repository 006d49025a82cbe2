//! MiniMind DB - Database abstractions
//!
//! SQLx-based persistence for the subscription row that backs the credit
//! ledger, the tier resolver and payment processing.
//!
//! # Example
//!
//! ```rust,ignore
//! use minimind_db::{create_pool, run_migrations, Repositories};
//!
//! let pool = create_pool("postgres://localhost/minimind").await?;
//! run_migrations(&pool).await?;
//! let repos = Repositories::new(pool);
//!
//! let row = repos.subscriptions.get_or_create(user_id, today).await?;
//! ```

pub mod error;
#[cfg(feature = "memory")]
pub mod memory;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, run_migrations, DbPool};
pub use repo::*;
