use super::parse_date_arg;
use crate::cli::parser::Commands;
use crate::config::{Config, FailurePolicy};
use crate::core::desk::FrontDesk;
use crate::db::queries::{load_station, load_stations};
use crate::errors::AppResult;
use crate::models::time_slot::TimeSlot;
use crate::ui::messages::{header, hint, info, warning};
use crate::utils::colors::{RESET, color_for_availability};
use crate::utils::formatting::money;
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Avail {
        date,
        slot,
        stations,
    } = cmd
    {
        let date = parse_date_arg(date)?;
        let slot = TimeSlot::parse(slot)?;
        let mut desk = FrontDesk::open(cfg)?;

        let ids: Vec<String> = if stations.is_empty() {
            load_stations(&desk.pool.conn, false)?
                .into_iter()
                .map(|s| s.id)
                .collect()
        } else {
            stations
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        if ids.is_empty() {
            info("No stations registered yet.");
            return Ok(());
        }

        let view = desk.availability_view(&ids, date, slot)?;

        if let Some(reason) = &view.degraded {
            warning(format!("Availability could not be checked: {}", reason));
            match cfg.availability_on_error {
                FailurePolicy::Closed => hint("Showing every station as taken. Try again shortly."),
                FailurePolicy::Open => {
                    hint("Showing every station as free. Booking will re-check before saving.")
                }
            }
        }

        header(format!("{} {}", date, slot));
        let mut table = Table::new(vec!["Station", "Quote", "Available"]);
        for id in &ids {
            let verdict = view.availability.is_available(id);
            let (quote, label, available) = match load_station(&desk.pool.conn, id) {
                Ok(Some(st)) => (
                    money(st.quote(slot.duration_minutes()), &cfg.currency),
                    if verdict { "yes" } else { "no" },
                    verdict,
                ),
                Ok(None) => ("--".to_string(), "unknown station", false),
                // store failure already reported above
                Err(_) => ("--".to_string(), if verdict { "yes" } else { "no" }, verdict),
            };
            table.add_row(vec![
                id.clone(),
                quote,
                format!("{}{}{}", color_for_availability(available), label, RESET),
            ]);
        }
        print!("{}", table.render());
    }

    Ok(())
}
