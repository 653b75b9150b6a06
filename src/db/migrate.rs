//! Schema migrations.
//!
//! Every migration runs at most once. Applied versions are recorded in the
//! `log` table (`operation = 'migration_applied'`, `target = version`), so a
//! database carries its own schema history.

use crate::errors::{AppError, AppResult};
use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, params};

struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20250301_0001_create_stations",
        description: "Created stations table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS stations (
            id           TEXT PRIMARY KEY,
            name         TEXT NOT NULL,
            kind         TEXT NOT NULL CHECK(kind IN ('console','table')),
            hourly_rate  REAL NOT NULL CHECK(hourly_rate >= 0),
            active       INTEGER NOT NULL DEFAULT 1,
            created_at   TEXT NOT NULL
        );
        "#,
    },
    Migration {
        version: "20250301_0002_create_bookings",
        description: "Created bookings table with overlap guard",
        sql: r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id          TEXT NOT NULL,
            station_id           TEXT NOT NULL REFERENCES stations(id),
            booking_group_id     TEXT NOT NULL,
            date                 TEXT NOT NULL,
            start_time           TEXT NOT NULL,
            end_time             TEXT NOT NULL,
            duration_minutes     INTEGER NOT NULL,
            status               TEXT NOT NULL DEFAULT 'confirmed'
                                 CHECK(status IN ('confirmed','in-progress','completed','cancelled','no-show')),
            coupon_code          TEXT,
            discount_percentage  REAL NOT NULL DEFAULT 0,
            original_price       REAL NOT NULL,
            final_price          REAL NOT NULL,
            created_at           TEXT NOT NULL,
            updated_at           TEXT NOT NULL,
            CHECK(start_time < end_time),
            UNIQUE(booking_group_id, station_id)
        );

        CREATE INDEX IF NOT EXISTS idx_bookings_station_date ON bookings(station_id, date);
        CREATE INDEX IF NOT EXISTS idx_bookings_date_status ON bookings(date, status);
        CREATE INDEX IF NOT EXISTS idx_bookings_group ON bookings(booking_group_id);

        CREATE TRIGGER IF NOT EXISTS bookings_no_overlap
        BEFORE INSERT ON bookings
        WHEN NEW.status IN ('confirmed','in-progress')
        BEGIN
            SELECT RAISE(ABORT, 'booking overlaps an active booking on the same station')
            WHERE EXISTS (
                SELECT 1 FROM bookings b
                WHERE b.station_id = NEW.station_id
                  AND b.date = NEW.date
                  AND b.status IN ('confirmed','in-progress')
                  AND b.start_time < NEW.end_time
                  AND b.end_time > NEW.start_time
            );
        END;
        "#,
    },
    Migration {
        version: "20250301_0003_create_sessions",
        description: "Created sessions table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            station_id        TEXT NOT NULL REFERENCES stations(id),
            customer_id       TEXT,
            start_time        TEXT NOT NULL,
            end_time          TEXT,
            duration_minutes  INTEGER,
            cost              INTEGER
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_open_station
            ON sessions(station_id) WHERE end_time IS NULL;
        "#,
    },
    Migration {
        version: "20250412_0004_add_checked_in_at",
        description: "Added checked_in_at to bookings",
        sql: "ALTER TABLE bookings ADD COLUMN checked_in_at TEXT;",
    },
    Migration {
        version: "20250412_0005_create_cart_items",
        description: "Created cart_items table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS cart_items (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            label         TEXT NOT NULL,
            source        TEXT NOT NULL,
            reference_id  INTEGER NOT NULL,
            amount        REAL NOT NULL,
            created_at    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cart_items_source ON cart_items(source, reference_id);
        "#,
    },
    Migration {
        version: "20250520_0006_add_session_rate",
        description: "Added hourly_rate to sessions",
        sql: r#"
        ALTER TABLE sessions ADD COLUMN hourly_rate REAL NOT NULL DEFAULT 0;

        UPDATE sessions
           SET hourly_rate = IFNULL(
               (SELECT st.hourly_rate FROM stations st WHERE st.id = sessions.station_id), 0);
        "#,
    },
];

/// Ensure that the `log` table exists.
fn ensure_log_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )
}

fn is_applied(conn: &Connection, version: &str) -> rusqlite::Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, m: &Migration) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(m.sql)
        .map_err(|e| AppError::Migration(format!("{}: {}", m.version, e)))?;

    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        params![m.version, m.description],
    )?;

    tx.commit()?;
    Ok(())
}

/// Versions already recorded in this database, oldest first.
pub fn applied_versions(conn: &Connection) -> AppResult<Vec<String>> {
    ensure_log_table(conn)?;
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Public entry point: run all pending migrations.
/// Returns the number of migrations applied by this call.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<usize> {
    ensure_log_table(conn)?;

    let mut applied = 0;
    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }
        apply(conn, m)?;
        success(format!("Migration applied: {} → {}", m.version, m.description));
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_run_once() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_pending_migrations(&conn).unwrap(), MIGRATIONS.len());
        assert_eq!(run_pending_migrations(&conn).unwrap(), 0);
        assert_eq!(applied_versions(&conn).unwrap().len(), MIGRATIONS.len());
    }

    #[test]
    fn overlap_trigger_rejects_raw_inserts() {
        let conn = Connection::open_in_memory().unwrap();
        run_pending_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO stations (id, name, kind, hourly_rate, created_at)
             VALUES ('s1', 'PS5', 'console', 300, 'now')",
            [],
        )
        .unwrap();

        let insert = |group: &str, start: &str, end: &str| {
            conn.execute(
                "INSERT INTO bookings (customer_id, station_id, booking_group_id, date,
                     start_time, end_time, duration_minutes, original_price, final_price,
                     created_at, updated_at)
                 VALUES ('c1', 's1', ?1, '2024-01-01', ?2, ?3, 60, 300, 300, 'now', 'now')",
                params![group, start, end],
            )
        };

        insert("g1", "14:00", "15:00").unwrap();
        assert!(insert("g2", "14:30", "15:30").is_err());
        // touching endpoints are fine
        insert("g3", "15:00", "16:00").unwrap();
    }
}
