pub mod availability;
pub mod backup;
pub mod booking;
pub mod cache;
pub mod desk;
pub mod log;
pub mod pricing;
pub mod session;
pub mod sweeper;

#[cfg(test)]
pub(crate) mod test_support;
