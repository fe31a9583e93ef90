/// Database access layer
///
/// This module provides the PostgreSQL connection pool and the migration
/// runner used at startup.

pub mod migrations;
pub mod pool;
