use super::parse_date_arg;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::desk::FrontDesk;
use crate::db::queries::load_station;
use crate::errors::{AppError, AppResult};
use crate::models::booking::{BookingGroupRequest, StationPrice};
use crate::models::time_slot::TimeSlot;
use crate::ui::messages::{hint, info, success, warning};
use crate::utils::formatting::money;
use crate::utils::table::Table;
use crate::utils::time::now;
use rusqlite::Connection;
use std::collections::HashMap;
use uuid::Uuid;

/// Parse `STATION=PRICE` pairs given with `--price`.
fn parse_price_overrides(raw: &[String]) -> AppResult<HashMap<String, f64>> {
    let mut out = HashMap::new();
    for item in raw {
        let (station, price) = item
            .split_once('=')
            .ok_or_else(|| AppError::Validation(format!("expected STATION=PRICE, got '{}'", item)))?;
        let price: f64 = price
            .trim()
            .parse()
            .map_err(|_| AppError::Validation(format!("invalid price in '{}'", item)))?;
        out.insert(station.trim().to_string(), price);
    }
    Ok(out)
}

/// Explicit price when given, otherwise hourly rate × duration.
fn price_stations(
    conn: &Connection,
    stations: &[String],
    overrides: &HashMap<String, f64>,
    minutes: i64,
) -> AppResult<Vec<StationPrice>> {
    let mut out = Vec::with_capacity(stations.len());
    for id in stations {
        let price = match overrides.get(id) {
            Some(p) => *p,
            None => load_station(conn, id)?
                .ok_or_else(|| AppError::UnknownStation(id.clone()))?
                .quote(minutes),
        };
        out.push(StationPrice::new(id.clone(), price));
    }
    Ok(out)
}

fn list_or_dash(ids: &[String]) -> String {
    if ids.is_empty() {
        "-".to_string()
    } else {
        ids.join(", ")
    }
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Book {
        date,
        slot,
        stations,
        customer,
        group,
        coupon,
        discount,
        prices,
    } = cmd
    {
        let date = parse_date_arg(date)?;
        let slot = TimeSlot::parse(slot)?;
        let overrides = parse_price_overrides(prices)?;
        let stations: Vec<String> = stations.iter().map(|s| s.trim().to_string()).collect();

        let mut desk = FrontDesk::open(cfg)?;
        let minutes = slot.duration_minutes();

        let req = BookingGroupRequest {
            customer_id: customer.clone(),
            date,
            slot,
            duration_minutes: minutes,
            booking_group_id: group
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            coupon_code: coupon.clone(),
            discount_percentage: *discount,
            stations: price_stations(&desk.pool.conn, &stations, &overrides, minutes)?,
        };

        // advisory only: the submission re-checks inside its transaction
        let view = desk.availability_view(&stations, date, slot)?;
        match &view.degraded {
            Some(reason) => warning(format!("Availability could not be checked: {}", reason)),
            None => {
                let a = &view.availability;
                info(format!(
                    "Free: {} | Taken: {}",
                    list_or_dash(&a.available_ids),
                    list_or_dash(&a.unavailable_ids)
                ));
            }
        }

        let created = match desk.submit_booking_group(&req, now()) {
            Ok(rows) => rows,
            Err(e @ AppError::Conflict { .. }) => {
                hint(format!(
                    "Check what is still free with: rlounge avail {} {}",
                    date, slot
                ));
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        success(format!(
            "Booking group {} confirmed for {} on {} {}",
            req.booking_group_id, req.customer_id, date, slot
        ));

        let mut table = Table::new(vec!["ID", "Station", "Original", "Final", "Status"]);
        let mut total = 0.0;
        for b in &created {
            total += b.final_price;
            table.add_row(vec![
                b.id.to_string(),
                b.station_id.clone(),
                money(b.original_price, &cfg.currency),
                money(b.final_price, &cfg.currency),
                b.status.to_string(),
            ]);
        }
        print!("{}", table.render());
        println!(
            "Total: {}",
            money(crate::core::pricing::round2(total), &cfg.currency)
        );
    }

    Ok(())
}
