//! `flexit info`: device metadata and registry identity.

use std::sync::Arc;

use serde::Serialize;

use flexit_core::{DeviceIdentity, DeviceInfo, Flexit, FlexitConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct InfoReport {
    plant_id: Option<String>,
    #[serde(flatten)]
    info: Arc<DeviceInfo>,
    identity: DeviceIdentity,
}

pub async fn handle(config: FlexitConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let report = Flexit::oneshot(config, |f| async move {
        Ok(InfoReport {
            plant_id: f.plant_id(),
            info: f.device_info(),
            identity: f.identity(),
        })
    })
    .await?;

    let out = output::render_single(&global.output, &report, detail, |r| {
        output::text(r.info.serial_info.as_deref())
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(report: &InfoReport) -> String {
    let i = &report.info;
    output::render_fields(vec![
        ("Name", report.identity.name.clone()),
        ("Plant", output::text(report.plant_id.as_deref())),
        ("Manufacturer", report.identity.manufacturer.to_owned()),
        ("Model", output::text(i.model_name.as_deref())),
        ("Model info", output::text(i.model_info.as_deref())),
        ("Serial", output::text(i.serial_info.as_deref())),
        ("Firmware", output::text(i.fw.as_deref())),
        (
            "Application version",
            output::text(i.application_software_version.as_deref()),
        ),
        ("Description", output::text(i.description.as_deref())),
        ("Online", output::text(i.online_status.as_deref())),
        ("System status", output::text(i.system_status.as_deref())),
        (
            "Last restart reason",
            output::text(i.last_restart_reason.as_deref()),
        ),
    ])
}
