use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::desk::FrontDesk;
use crate::core::sweeper::SweepReport;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{hint, info, warning};
use crate::utils::time::{format_datetime, now};
use chrono::NaiveDateTime;
use std::thread;
use std::time::Duration;

fn print_report(at: NaiveDateTime, r: &SweepReport) {
    info(format!(
        "Sweep at {}: {} examined, {} updated, {} skipped, {} failed",
        format_datetime(at),
        r.examined,
        r.transitioned,
        r.skipped,
        r.failed
    ));
    if r.failed > 0 {
        warning("Some bookings could not be updated; see `rlounge log --print --op sweep_error`.");
    }
}

/// One pass of `sweep --watch`. A store failure is reported and swallowed so
/// the next tick can try again; anything else stops the loop.
fn watch_tick(desk: &mut FrontDesk, at: NaiveDateTime) -> AppResult<Option<SweepReport>> {
    match desk.sweep(at) {
        Ok(report) => {
            print_report(at, &report);
            Ok(Some(report))
        }
        Err(e) if e.is_retryable() => {
            warning(format!("Sweep at {} failed: {}", format_datetime(at), e));
            hint("Retrying at the next interval.");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Sweep { watch, at } = cmd {
        let fixed = at
            .as_deref()
            .map(|s| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
                    .map_err(|_| AppError::InvalidDate(s.to_string()))
            })
            .transpose()?;

        let mut desk = FrontDesk::open(cfg)?;

        if !*watch {
            let t = fixed.unwrap_or_else(now);
            let report = desk.sweep(t)?;
            print_report(t, &report);
            return Ok(());
        }

        loop {
            watch_tick(&mut desk, fixed.unwrap_or_else(now))?;
            thread::sleep(Duration::from_secs(cfg.sweep_interval_secs));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{at, migrate};
    use crate::db::pool::DbPool;

    fn desk() -> FrontDesk {
        let pool = DbPool::in_memory().unwrap();
        migrate(&pool, &["s1"]);
        FrontDesk::from_pool(pool, &Config::with_database(":memory:"))
    }

    #[test]
    fn watch_tick_survives_a_store_failure() {
        let mut d = desk();
        d.pool.conn.execute_batch("DROP TABLE bookings;").unwrap();

        let outcome = watch_tick(&mut d, at("2024-01-02 08:00")).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn watch_tick_reports_a_normal_pass() {
        let mut d = desk();
        let report = watch_tick(&mut d, at("2024-01-02 08:00")).unwrap().unwrap();
        assert_eq!(report.examined, 0);
    }
}
