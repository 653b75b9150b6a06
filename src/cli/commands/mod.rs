pub mod avail;
pub mod backup;
pub mod book;
pub mod bookings;
pub mod cancel;
pub mod cart;
pub mod check_in;
pub mod config;
pub mod db;
pub mod delete_group;
pub mod init;
pub mod log;
pub mod session;
pub mod station;
pub mod sweep;

use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::utils::date::parse_date;
use chrono::NaiveDate;

/// Open the configured database with every migration applied.
pub(crate) fn open_db(cfg: &Config) -> AppResult<DbPool> {
    let pool = DbPool::new(&cfg.database)?;
    init_db(&pool.conn)?;
    Ok(pool)
}

pub(crate) fn parse_date_arg(s: &str) -> AppResult<NaiveDate> {
    parse_date(s).ok_or_else(|| AppError::InvalidDate(s.to_string()))
}
