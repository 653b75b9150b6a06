use crate::db::log::{LogEntry, load_log};
use crate::errors::AppResult;
use ansi_term::Colour;
use regex::Regex;
use rusqlite::Connection;
use std::sync::OnceLock;

const OP_WIDTH_MAX: usize = 40;
const MESSAGE_WIDTH: usize = 72;

fn strip_ansi(s: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1B\[[0-9;]*[mK]").expect("static regex"));
    re.replace_all(s, "").into_owned()
}

/// Colour of the operation column.
fn color_for_operation(op: &str) -> Colour {
    match op {
        "book" | "session_start" => Colour::Green,
        "cancel" | "delete" | "sweep_error" => Colour::Red,
        "check_in" | "session_stop" => Colour::Cyan,
        "sweep" => Colour::Yellow,
        "migration_applied" => Colour::Purple,
        "backup" => Colour::Blue,
        "init" | "station" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

fn op_target(e: &LogEntry) -> String {
    if e.target.is_empty() {
        e.operation.clone()
    } else {
        format!("{} ({})", e.operation, e.target)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let mut t: String = s.chars().take(max.saturating_sub(3)).collect();
        t.push_str("...");
        t
    } else {
        s.to_string()
    }
}

/// Render entries as aligned lines; only the operation word is coloured and
/// long messages wrap under the message column.
pub fn render(entries: &[LogEntry], color: bool) -> Vec<String> {
    let id_w = entries.iter().map(|e| e.id.to_string().len()).max().unwrap_or(1);
    let date_w = entries.iter().map(|e| e.date.len()).max().unwrap_or(10);
    let op_w = entries
        .iter()
        .map(|e| op_target(e).chars().count())
        .max()
        .unwrap_or(10)
        .min(OP_WIDTH_MAX);

    let mut out = Vec::new();
    for e in entries {
        let visible = truncate(&op_target(e), op_w);
        let padding = " ".repeat(op_w.saturating_sub(visible.chars().count()));

        let shown = if color {
            let paint = color_for_operation(&e.operation);
            match visible.split_once(' ') {
                Some((op, rest)) => format!("{} {}", paint.paint(op), rest),
                None => paint.paint(visible.as_str()).to_string(),
            }
        } else {
            visible
        };

        let prefix = format!(
            "{:>id_w$}: {:<date_w$} | {}{} => ",
            e.id, e.date, shown, padding
        );
        let indent = " ".repeat(strip_ansi(&prefix).chars().count());

        let wrapped = textwrap::wrap(&e.message, MESSAGE_WIDTH);
        let mut lines = wrapped.iter();
        let first = lines.next().map(|l| l.to_string()).unwrap_or_default();
        out.push(format!("{}{}", prefix, first));
        for l in lines {
            out.push(format!("{}{}", indent, l));
        }
    }
    out
}

pub struct LogLogic;

impl LogLogic {
    pub fn print_log(conn: &Connection, operation: Option<&str>) -> AppResult<()> {
        let entries = load_log(conn, operation)?;

        if entries.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        println!("📜 Internal log:\n");
        for line in render(&entries, true) {
            println!("{}", line);
        }
        Ok(())
    }
}
