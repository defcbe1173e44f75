pub mod access;
pub mod db;
pub mod postgrest_store;
pub mod sqlite_store;
pub mod store;

#[cfg(test)]
pub mod memory_store;
