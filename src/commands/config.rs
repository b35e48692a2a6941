//! Configuration display

use chrono::NaiveDateTime;
use thermolog_core::ds1922::StatusRegister;

use super::Session;

/// Read the configuration and print it
pub fn run_config(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    if !session.registers_valid() {
        session.read_configuration()?;
    }

    println!("Logger Configuration");
    println!("====================");
    println!();
    if let Some(rom) = session.rom() {
        println!("ROM code:        {}", rom);
    }
    print_registers(session.registers());
    Ok(())
}

fn print_registers(reg: &StatusRegister) {
    println!("Device type:     {}", reg.device_type());
    println!("Clock:           {}", format_time(reg.rtc()));
    println!("Clock running:   {}", yes_no(reg.clock_enabled()));
    println!(
        "Sample rate:     {} ({})",
        format_interval(reg.sample_interval_secs()),
        if reg.high_speed() { "seconds" } else { "minutes" }
    );
    println!("Logging:         {}", yes_no(reg.logging_enabled()));
    println!(
        "Resolution:      {}",
        if reg.high_resolution() { "16 bit" } else { "8 bit" }
    );
    println!("Rollover:        {}", yes_no(reg.rollover()));
    println!("Start on alarm:  {}", yes_no(reg.start_upon_alarm()));
    println!("Start delay:     {} min", reg.mission_start_delay());
    println!();

    println!(
        "Low alarm:       {:.1} °C{}{}",
        reg.alarm_low_threshold(),
        if reg.alarm_low_enabled() { "" } else { " (disabled)" },
        if reg.alarm_low() { " TRIGGERED" } else { "" }
    );
    println!(
        "High alarm:      {:.1} °C{}{}",
        reg.alarm_high_threshold(),
        if reg.alarm_high_enabled() { "" } else { " (disabled)" },
        if reg.alarm_high() { " TRIGGERED" } else { "" }
    );
    println!();

    let state = if reg.waiting_for_alarm() {
        "waiting for alarm"
    } else if reg.mission_in_progress() {
        "in progress"
    } else {
        "stopped"
    };
    println!("Mission:         {}", state);
    println!("Mission start:   {}", format_time(reg.mission_timestamp()));
    println!("Mission samples: {}", reg.sample_count());
    println!("Device samples:  {}", reg.device_sample_count());
    println!("Password:        {}", if reg.password_enabled() { "enabled" } else { "disabled" });
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn format_time(time: Option<NaiveDateTime>) -> String {
    match time {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "not set".to_string(),
    }
}

/// Format a sample interval like "1 h 30 min"
pub(crate) fn format_interval(secs: u32) -> String {
    let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
    let mut parts = Vec::new();
    if h > 0 {
        parts.push(format!("{} h", h));
    }
    if m > 0 {
        parts.push(format!("{} min", m));
    }
    if s > 0 || parts.is_empty() {
        parts.push(format!("{} s", s));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "0 s");
        assert_eq!(format_interval(10), "10 s");
        assert_eq!(format_interval(600), "10 min");
        assert_eq!(format_interval(5430), "1 h 30 min 30 s");
    }
}
