//! `flexit status`: one snapshot of readings, setpoints and mode.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use flexit_core::{DeviceState, Flexit, FlexitConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct StatusReport {
    #[serde(flatten)]
    state: Arc<DeviceState>,
    filter_exchange_due: Option<bool>,
    last_refresh: Option<DateTime<Utc>>,
}

pub async fn handle(config: FlexitConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let (state, last_refresh) =
        Flexit::oneshot(config, |f| async move { Ok((f.state(), f.last_refresh())) }).await?;

    let report = StatusReport {
        filter_exchange_due: state.filter_exchange_due(),
        state,
        last_refresh,
    };
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| detail(r, color),
        |r| {
            r.state
                .mode()
                .map_or_else(|| output::MISSING.into(), |m| m.to_string())
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(report: &StatusReport, color: bool) -> String {
    let s = &report.state;
    let due = report.filter_exchange_due.unwrap_or(false);
    let filter_state = match report.filter_exchange_due {
        Some(true) => "replace now",
        Some(false) => "ok",
        None => output::MISSING,
    };

    let mut rows = vec![
        (
            "Mode",
            s.mode()
                .map_or_else(|| output::MISSING.into(), |m| m.to_string()),
        ),
        ("Home setpoint", output::celsius(s.home_temperature())),
        ("Away setpoint", output::celsius(s.away_temperature())),
        ("Room", output::celsius(s.room_temperature())),
        ("Outside", output::celsius(s.outside_temperature())),
        ("Supply", output::celsius(s.supply_temperature())),
        ("Extract", output::celsius(s.extract_temperature())),
        ("Exhaust", output::celsius(s.exhaust_temperature())),
        (
            "Electric heater",
            s.heater_enabled().map_or_else(
                || output::MISSING.to_owned(),
                |on| String::from(if on { "on" } else { "off" }),
            ),
        ),
        ("Filter run time", output::hours(s.filter_operating_time())),
        (
            "Filter exchange in",
            output::hours(s.filter_time_for_exchange()),
        ),
        ("Filter", output::alert(filter_state, due, color)),
    ];
    if let Some(at) = report.last_refresh {
        rows.push((
            "Updated",
            output::dim(&at.format("%Y-%m-%d %H:%M:%S UTC").to_string(), color),
        ));
    }
    output::render_fields(rows)
}
