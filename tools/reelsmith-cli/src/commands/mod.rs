pub mod assemble;
pub mod check;
pub mod config;
pub mod ingest;
pub mod init;
pub mod plan;
