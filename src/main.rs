//! rLounge main entrypoint.

use rlounge::run;
use rlounge::ui::messages::hint;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        if e.is_retryable() {
            hint("The database could not be reached; the command can be retried.");
        }
        std::process::exit(1);
    }
}
