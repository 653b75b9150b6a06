use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::desk::FrontDesk;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};
use std::io::{Write, stdin, stdout};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::DeleteGroup { group, force } = cmd {
        if !*force {
            warning(format!(
                "This permanently removes every booking of group '{}'.",
                group
            ));
            print!("Continue? [y/N]: ");
            stdout().flush()?;

            let mut answer = String::new();
            stdin().read_line(&mut answer)?;
            let answer = answer.trim().to_lowercase();
            if !(answer == "y" || answer == "yes") {
                info("Deletion cancelled by user.");
                return Ok(());
            }
        }

        let mut desk = FrontDesk::open(cfg)?;
        let n = desk.delete_group(group)?;
        success(format!("Deleted {} booking row(s) of group {}", n, group));
    }

    Ok(())
}
