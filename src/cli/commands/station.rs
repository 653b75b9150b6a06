use super::open_db;
use crate::cli::parser::{Commands, StationAction};
use crate::config::Config;
use crate::core::pricing::validate_price;
use crate::db::log::audit;
use crate::db::queries::{
    insert_station, load_station, load_stations, set_station_active, update_station_rate,
};
use crate::errors::{AppError, AppResult};
use crate::models::station::{Station, StationKind};
use crate::ui::messages::{info, success};
use crate::utils::colors::{GREEN, GREY, RED, RESET};
use crate::utils::formatting::money;
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Station { action } = cmd else {
        return Ok(());
    };

    let pool = open_db(cfg)?;
    let conn = &pool.conn;

    match action {
        StationAction::Add {
            id,
            name,
            kind,
            rate,
        } => {
            let id = id.trim();
            if id.is_empty() {
                return Err(AppError::Validation("station id must not be empty".into()));
            }
            let kind =
                StationKind::from_code(kind).ok_or_else(|| AppError::InvalidStationKind(kind.clone()))?;
            validate_price(id, *rate)?;
            if load_station(conn, id)?.is_some() {
                return Err(AppError::Validation(format!("station {} already exists", id)));
            }

            let station = Station {
                id: id.to_string(),
                name: name.clone().unwrap_or_else(|| id.to_string()),
                kind,
                hourly_rate: *rate,
                active: true,
                current_session: None,
            };
            insert_station(conn, &station)?;
            audit(
                conn,
                "station",
                id,
                &format!("added {} at {}/h", kind.to_db_str(), rate),
            )?;
            success(format!(
                "Station {} added ({}, {}/h)",
                id,
                kind.to_db_str(),
                money(*rate, &cfg.currency)
            ));
        }

        StationAction::List { all } => {
            let stations = load_stations(conn, *all)?;
            if stations.is_empty() {
                info("No stations registered yet.");
                return Ok(());
            }

            let mut table = Table::new(vec!["ID", "Name", "Kind", "Rate/h", "Status"]);
            for st in &stations {
                let status = if !st.active {
                    format!("{GREY}retired{RESET}")
                } else if let Some(sid) = st.current_session {
                    format!("{RED}occupied (session #{sid}){RESET}")
                } else {
                    format!("{GREEN}free{RESET}")
                };
                table.add_row(vec![
                    st.id.clone(),
                    st.name.clone(),
                    st.kind.to_db_str().to_string(),
                    money(st.hourly_rate, &cfg.currency),
                    status,
                ]);
            }
            print!("{}", table.render());
        }

        StationAction::Rate { id, rate } => {
            validate_price(id, *rate)?;
            if update_station_rate(conn, id, *rate)? == 0 {
                return Err(AppError::UnknownStation(id.clone()));
            }
            audit(conn, "station", id, &format!("hourly rate set to {}", rate))?;
            success(format!(
                "Station {} now costs {}/h",
                id,
                money(*rate, &cfg.currency)
            ));
        }

        StationAction::Retire { id } => {
            if set_station_active(conn, id, false)? == 0 {
                return Err(AppError::UnknownStation(id.clone()));
            }
            audit(conn, "station", id, "retired")?;
            success(format!("Station {} retired", id));
        }
    }

    Ok(())
}
