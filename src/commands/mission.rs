//! Mission control and configuration commands

use std::path::Path;

use thermolog_core::ds1922::MissionSettings;

use super::config::format_interval;
use super::Session;

/// Start a mission with the stored configuration
pub fn run_start(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    session.read_configuration()?;
    let reg = session.registers();
    if reg.mission_in_progress() {
        return Err("A mission is already running, stop it first".into());
    }
    if !reg.clock_enabled() {
        log::warn!("The logger clock is stopped, samples will not be taken");
    }
    if reg.sample_count() > 0 {
        log::warn!(
            "Starting a new mission discards {} logged samples",
            reg.sample_count()
        );
    }

    session.start_mission()?;
    println!("Mission started");
    Ok(())
}

/// Stop the running mission
pub fn run_stop(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    session.read_configuration()?;
    if !session.registers().mission_in_progress() {
        println!("No mission running");
        return Ok(());
    }
    session.stop_mission()?;
    println!("Mission stopped");
    Ok(())
}

/// Clear the log memory
pub fn run_clear(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    session.read_configuration()?;
    if session.registers().mission_in_progress() {
        return Err("Cannot clear memory while a mission is running".into());
    }
    session.clear_memory()?;
    println!("Memory cleared");
    Ok(())
}

/// Apply a settings file and commit the configuration
pub fn run_configure(
    session: &mut Session,
    file: &Path,
    sync_clock: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = MissionSettings::from_toml_file(file)?;
    log::info!("Loaded settings from {:?}", file);

    session.read_configuration()?;
    if session.registers().mission_in_progress() {
        return Err("Cannot change the configuration while a mission is running".into());
    }

    let reg = session.registers_mut();
    settings.apply(reg)?;
    if sync_clock {
        let now = chrono::Local::now().naive_local();
        reg.set_rtc(&now);
        log::info!("Setting clock to {}", now.format("%Y-%m-%d %H:%M:%S"));
    }

    session.write_configuration()?;

    let reg = session.registers();
    println!(
        "Configuration written: sample every {}, {} resolution, rollover {}",
        format_interval(reg.sample_interval_secs()),
        if reg.high_resolution() { "16 bit" } else { "8 bit" },
        if reg.rollover() { "on" } else { "off" }
    );
    Ok(())
}
