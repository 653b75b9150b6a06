use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::desk::FrontDesk;
use crate::errors::AppResult;
use crate::ui::messages::success;
use crate::utils::time::now;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::CheckIn { id } = cmd {
        let mut desk = FrontDesk::open(cfg)?;
        let b = desk.check_in(*id, now())?;
        success(format!(
            "{} checked in on {} ({}), booking #{} is now {}",
            b.customer_id, b.station_id, b.slot, b.id, b.status
        ));
    }

    Ok(())
}
