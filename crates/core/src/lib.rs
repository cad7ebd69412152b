pub mod config;
pub mod metrics;
pub mod movie;
pub mod provider;
pub mod reconcile;
pub mod search;
pub mod store;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use movie::CanonicalMovie;
pub use search::{SearchError, SearchOrchestrator, SearchOutcome, SearchPath};
pub use store::{MovieStore, SqliteMovieStore, StoreError};
