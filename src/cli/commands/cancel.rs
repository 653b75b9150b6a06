use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::desk::FrontDesk;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use crate::utils::time::now;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Cancel { id, group } = cmd {
        let mut desk = FrontDesk::open(cfg)?;

        if let Some(id) = id {
            let b = desk.cancel_booking(*id, now())?;
            success(format!(
                "Booking #{} cancelled ({} {} on {})",
                b.id, b.station_id, b.slot, b.date
            ));
        } else if let Some(group) = group {
            let rows = desk.cancel_group(group, now())?;
            if rows.is_empty() {
                info(format!("Nothing left to cancel in group {}.", group));
            } else {
                let stations: Vec<&str> = rows.iter().map(|b| b.station_id.as_str()).collect();
                success(format!(
                    "Group {} cancelled: {}",
                    group,
                    stations.join(", ")
                ));
            }
        }
    }

    Ok(())
}
