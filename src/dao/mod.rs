/// Quiz persistence abstraction and its backends.
pub mod quiz_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
