pub mod init;
pub mod loss;
pub mod metrics;
