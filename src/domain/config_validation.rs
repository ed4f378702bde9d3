//! Configuration validation.
//!
//! Checks every config field before a simulation or replay runs.

use crate::domain::error::DaytraderError;
use crate::ports::config_port::ConfigPort;

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    validate_data_dir(config)?;
    validate_initial_balance(config)?;
    validate_volume_cap(config)?;
    validate_mass_sell_days(config)?;
    Ok(())
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    match config.get_string("data", "dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(DaytraderError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        }),
    }
}

fn validate_initial_balance(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    let value = config.get_double("simulation", "initial_balance", 1.0);
    if value <= 0.0 || !value.is_finite() {
        return Err(DaytraderError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "initial_balance".to_string(),
            reason: "initial_balance must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_volume_cap(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    let value = config.get_double("simulation", "volume_cap", 0.1);
    if value <= 0.0 || value > 1.0 {
        return Err(DaytraderError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "volume_cap".to_string(),
            reason: "volume_cap must be in (0, 1]".to_string(),
        });
    }
    Ok(())
}

fn validate_mass_sell_days(config: &dyn ConfigPort) -> Result<(), DaytraderError> {
    let value = config.get_int("simulation", "days_to_start_mass_sell", 0);
    if value < 0 {
        return Err(DaytraderError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "days_to_start_mass_sell".to_string(),
            reason: "days_to_start_mass_sell must be non-negative".to_string(),
        });
    }
    Ok(())
}
