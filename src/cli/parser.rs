use clap::{Parser, Subcommand};

/// Command-line interface definition for rLounge
/// Front-desk CLI for a gaming lounge: stations, bookings and walk-in sessions on SQLite
#[derive(Parser)]
#[command(
    name = "rlounge",
    version = env!("CARGO_PKG_VERSION"),
    about = "A front-desk CLI for gaming lounges: book stations, run walk-in sessions, keep statuses current",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields with their defaults")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,

        #[arg(long = "op", help = "Only rows for this operation (book, sweep, ...)")]
        operation: Option<String>,
    },

    /// Create a backup copy of the database
    Backup {
        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long)]
        compress: bool,

        #[arg(long, short = 'f', help = "Overwrite an existing backup file")]
        force: bool,
    },

    /// Manage stations (consoles and tables)
    Station {
        #[command(subcommand)]
        action: StationAction,
    },

    /// Show which stations are free for a slot
    Avail {
        /// Date of the slot (YYYY-MM-DD, today, tomorrow)
        date: String,

        /// Slot as HH:MM-HH:MM
        slot: String,

        #[arg(
            long = "stations",
            value_delimiter = ',',
            help = "Comma-separated station ids (default: every active station)"
        )]
        stations: Vec<String>,
    },

    /// Book one or more stations for the same slot
    Book {
        /// Date of the slot (YYYY-MM-DD, today, tomorrow)
        date: String,

        /// Slot as HH:MM-HH:MM
        slot: String,

        #[arg(
            long = "stations",
            value_delimiter = ',',
            required = true,
            help = "Comma-separated station ids"
        )]
        stations: Vec<String>,

        #[arg(long = "customer", help = "Customer id")]
        customer: String,

        #[arg(long = "group", help = "Booking group id (default: a new UUID)")]
        group: Option<String>,

        #[arg(long = "coupon", help = "Coupon code")]
        coupon: Option<String>,

        #[arg(
            long = "discount",
            default_value_t = 0.0,
            help = "Discount percentage (0-100)"
        )]
        discount: f64,

        #[arg(
            long = "price",
            value_name = "STATION=PRICE",
            help = "Explicit price for a station (default: hourly rate x duration)"
        )]
        prices: Vec<String>,
    },

    /// List bookings for a date
    Bookings {
        /// Date (YYYY-MM-DD, today, tomorrow; default: today)
        date: Option<String>,

        #[arg(long = "status", help = "Filter by status (confirmed, in-progress, ...)")]
        status: Option<String>,

        #[arg(long = "json", help = "Print as JSON")]
        json: bool,
    },

    /// Cancel a booking or a whole booking group
    Cancel {
        #[arg(long = "id", conflicts_with = "group", required_unless_present = "group")]
        id: Option<i64>,

        #[arg(long = "group")]
        group: Option<String>,
    },

    /// Record that the customer of a booking has arrived
    CheckIn {
        /// Booking id
        id: i64,
    },

    /// Physically delete a booking group (admin)
    DeleteGroup {
        /// Booking group id
        group: String,

        #[arg(long, short = 'f', help = "Do not ask for confirmation")]
        force: bool,
    },

    /// Walk-in sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Move bookings to the status the clock says they should have
    Sweep {
        #[arg(long = "watch", help = "Keep sweeping every sweep_interval_secs")]
        watch: bool,

        /// Pretend the current time is this (YYYY-MM-DD HH:MM)
        #[arg(long = "at", hide = true)]
        at: Option<String>,
    },

    /// List billable items produced by closed sessions
    Cart,
}

#[derive(Subcommand)]
pub enum StationAction {
    /// Register a new station
    Add {
        /// Station id (e.g. ps5-1)
        id: String,

        #[arg(long = "name", help = "Display name (default: the id)")]
        name: Option<String>,

        #[arg(long = "kind", help = "console (ps) or table (pool)")]
        kind: String,

        #[arg(long = "rate", help = "Hourly rate")]
        rate: f64,
    },

    /// List stations with their current occupancy
    List {
        #[arg(long = "all", help = "Include retired stations")]
        all: bool,
    },

    /// Change the hourly rate of a station
    Rate {
        id: String,
        rate: f64,
    },

    /// Retire a station so it can no longer be booked
    Retire {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Open a walk-in session on a station
    Start {
        station: String,

        #[arg(long = "customer")]
        customer: Option<String>,
    },

    /// Close a session and add its cost to the cart
    Stop {
        /// Session id
        id: i64,
    },

    /// Show open sessions with their running cost
    Status,

    /// Live clock for one session (Ctrl-C to quit)
    Watch {
        /// Session id
        id: i64,
    },
}
