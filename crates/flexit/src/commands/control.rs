//! `flexit mode` / `flexit temp`: write commands.
//!
//! Input is validated before any network traffic so a typo never costs a
//! login round-trip.

use flexit_core::{Flexit, FlexitConfig, FlexitError, MAX_SETPOINT, MIN_SETPOINT, Mode};

use crate::cli::{GlobalOpts, SetpointTarget};
use crate::error::CliError;

pub async fn set_mode(
    config: FlexitConfig,
    name: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    Mode::code_of(name)?;

    let requested = name.to_owned();
    let code = Flexit::oneshot(config, |f| async move { f.set_mode(&requested).await }).await?;

    if !global.quiet {
        let label = Mode::name_of(i64::from(code)).unwrap_or(name);
        eprintln!("✓ Mode set to {label}");
    }
    Ok(())
}

pub async fn set_temperature(
    config: FlexitConfig,
    target: SetpointTarget,
    celsius: f64,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !celsius.is_finite() || !(MIN_SETPOINT..=MAX_SETPOINT).contains(&celsius) {
        return Err(FlexitError::InvalidSetpoint {
            value: celsius,
            min: MIN_SETPOINT,
            max: MAX_SETPOINT,
        }
        .into());
    }

    Flexit::oneshot(config, |f| async move {
        match target {
            SetpointTarget::Home => f.set_home_temperature(celsius).await,
            SetpointTarget::Away => f.set_away_temperature(celsius).await,
        }
    })
    .await?;

    if !global.quiet {
        let which = match target {
            SetpointTarget::Home => "Home",
            SetpointTarget::Away => "Away",
        };
        eprintln!("✓ {which} setpoint set to {celsius} °C");
    }
    Ok(())
}
