pub mod booking;
pub mod session;
pub mod station;
pub mod time_slot;
