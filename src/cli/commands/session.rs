use super::open_db;
use crate::cli::parser::{Commands, SessionAction};
use crate::config::Config;
use crate::core::session::{SessionClock, sample_open_session, start_session, stop_session};
use crate::db::sessions::load_open_sessions;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use crate::utils::formatting::{mins2readable, money};
use crate::utils::table::Table;
use crate::utils::time::{format_datetime, now};
use std::io::{Write, stdout};
use std::thread;
use std::time::Duration;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Session { action } = cmd else {
        return Ok(());
    };

    let mut pool = open_db(cfg)?;

    match action {
        SessionAction::Start { station, customer } => {
            let started = start_session(&mut pool.conn, station, customer.as_deref(), now())?;
            success(format!(
                "Session #{} started on {} at {}",
                started.session.id,
                station,
                format_datetime(started.session.start_time)
            ));
            if let Some(b) = started.clashing_booking {
                warning(format!(
                    "{} is booked {} by {} (booking #{})",
                    station, b.slot, b.customer_id, b.id
                ));
            }
        }

        SessionAction::Stop { id } => {
            let (session, item) = stop_session(&mut pool.conn, *id, now())?;
            success(format!(
                "Session #{} on {} closed after {}",
                session.id,
                session.station_id,
                mins2readable(session.duration_minutes.unwrap_or(0), false)
            ));
            println!(
                "🛒 Cart item #{}: {}  {}",
                item.id,
                item.label,
                money(item.amount, &cfg.currency)
            );
        }

        SessionAction::Status => {
            let open = load_open_sessions(&pool.conn)?;
            if open.is_empty() {
                info("No open sessions.");
                return Ok(());
            }

            let t = now();
            let mut table = Table::new(vec!["ID", "Station", "Customer", "Started", "Elapsed", "Cost"]);
            for s in &open {
                let tick = SessionClock::sample(s.start_time, s.hourly_rate, t);
                table.add_row(vec![
                    s.id.to_string(),
                    s.station_id.clone(),
                    s.customer_id.clone().unwrap_or_else(|| "walk-in".to_string()),
                    format_datetime(s.start_time),
                    tick.to_string(),
                    money(tick.cost as f64, &cfg.currency),
                ]);
            }
            print!("{}", table.render());
        }

        SessionAction::Watch { id } => loop {
            match sample_open_session(&pool.conn, *id, now()) {
                Ok((session, tick)) => {
                    print!(
                        "\r⏱  #{} {}  {}  {}   ",
                        session.id,
                        session.station_id,
                        tick,
                        money(tick.cost as f64, &cfg.currency)
                    );
                    stdout().flush()?;
                }
                Err(AppError::SessionClosed(_)) => {
                    println!();
                    info(format!("Session #{} has been closed.", id));
                    break;
                }
                Err(e) => return Err(e),
            }
            thread::sleep(Duration::from_secs(1));
        },
    }

    Ok(())
}
