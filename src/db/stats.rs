use crate::db::migrate::applied_versions;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use std::fs;

fn count(pool: &DbPool, sql: &str) -> rusqlite::Result<i64> {
    pool.conn.query_row(sql, [], |row| row.get(0))
}

pub fn print_db_info(pool: &mut DbPool, db_path: &str) -> AppResult<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) ROW COUNTS
    //
    let stations = count(pool, "SELECT COUNT(*) FROM stations WHERE active = 1")?;
    let bookings = count(pool, "SELECT COUNT(*) FROM bookings")?;
    let groups = count(pool, "SELECT COUNT(DISTINCT booking_group_id) FROM bookings")?;
    let open_sessions = count(pool, "SELECT COUNT(*) FROM sessions WHERE end_time IS NULL")?;

    println!("{}• Active stations:{} {}{}{}", CYAN, RESET, GREEN, stations, RESET);
    println!(
        "{}• Bookings:{} {}{}{} in {} groups",
        CYAN, RESET, GREEN, bookings, RESET, groups
    );
    println!("{}• Open sessions:{} {}", CYAN, RESET, open_sessions);

    //
    // 3) DATE RANGE
    //
    let first_date: Option<String> = pool
        .conn
        .query_row("SELECT MIN(date) FROM bookings", [], |row| {
            row.get::<_, Option<String>>(0)
        })?;
    let last_date: Option<String> = pool
        .conn
        .query_row("SELECT MAX(date) FROM bookings", [], |row| {
            row.get::<_, Option<String>>(0)
        })?;

    let placeholder = format!("{GREY}--{RESET}");
    println!("{}• Booking dates:{}", CYAN, RESET);
    println!("    from: {}", first_date.unwrap_or_else(|| placeholder.clone()));
    println!("    to:   {}", last_date.unwrap_or(placeholder));

    //
    // 4) SCHEMA
    //
    let versions = applied_versions(&pool.conn)?;
    println!(
        "{}• Schema:{} {}",
        CYAN,
        RESET,
        versions.last().map(String::as_str).unwrap_or("--")
    );

    println!();
    Ok(())
}
