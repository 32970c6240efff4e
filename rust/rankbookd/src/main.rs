mod awards;
mod batch;
mod calc;
mod extract;
mod ipc;
mod logging;
mod names;
mod schema;
mod settings;
mod table;

use std::io::{self, BufRead, Write};
use tracing::{debug, warn};

fn main() {
    if let Err(e) = logging::init_tracing() {
        eprintln!("rankbookd: logging disabled: {e}");
    }

    let mut state = ipc::AppState::default();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => {
                debug!(id = %req.id, method = %req.method, "request");
                ipc::handle_request(&mut state, req)
            }
            Err(e) => {
                // No id to echo back.
                warn!(error = %e, "undecodable request line");
                ipc::err("", "bad_json", e.to_string(), None)
            }
        };

        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
