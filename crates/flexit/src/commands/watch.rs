//! `flexit watch`: keep a session open and print each new snapshot.

use std::time::Duration;

use tracing::{debug, warn};

use flexit_core::{DeviceState, Flexit, FlexitConfig};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    mut config: FlexitConfig,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(secs) = args.interval {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        config.update_interval = Duration::from_secs(secs);
    }
    debug!(interval = ?config.update_interval, "starting watch");

    let flexit = Flexit::new(config);
    flexit.connect().await?;
    let mut rx = flexit.subscribe();
    print_line(&flexit.state(), global);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    warn!("snapshot channel closed");
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                print_line(&snapshot, global);
            }
        }
    }

    flexit.shutdown().await;
    Ok(())
}

fn print_line(state: &DeviceState, global: &GlobalOpts) {
    let line = match global.output {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            serde_json::to_string(state).unwrap_or_default()
        }
        _ => format!(
            "{}  mode={}  room={}  supply={}  outside={}",
            chrono::Local::now().format("%H:%M:%S"),
            state
                .mode()
                .map_or_else(|| output::MISSING.into(), |m| m.to_string()),
            output::celsius(state.room_temperature()),
            output::celsius(state.supply_temperature()),
            output::celsius(state.outside_temperature()),
        ),
    };
    output::print_output(&line, global.quiet);
}
