use super::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::pricing::round2;
use crate::db::sessions::load_cart;
use crate::errors::AppResult;
use crate::ui::messages::info;
use crate::utils::formatting::money;
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if matches!(cmd, Commands::Cart) {
        let pool = open_db(cfg)?;
        let items = load_cart(&pool.conn)?;

        if items.is_empty() {
            info("Cart is empty.");
            return Ok(());
        }

        let mut table = Table::new(vec!["ID", "Item", "Source", "Amount"]);
        for it in &items {
            table.add_row(vec![
                it.id.to_string(),
                it.label.clone(),
                format!("{} #{}", it.source, it.reference_id),
                money(it.amount, &cfg.currency),
            ]);
        }
        print!("{}", table.render());

        let total: f64 = items.iter().map(|i| i.amount).sum();
        println!("Total: {}", money(round2(total), &cfg.currency));
    }

    Ok(())
}
