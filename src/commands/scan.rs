//! Bus scan command implementation

use thermolog_core::onewire::{enumerate, RomCode};

use super::Session;

/// Search the bus and print every ROM code found
pub fn run_scan(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    let master = session.master_mut();
    if !master.is_open() {
        master.open()?;
    }
    let roms = enumerate(master)?;

    if roms.is_empty() {
        println!("No devices found on the 1-Wire bus");
        return Ok(());
    }

    println!("Found {} device(s):", roms.len());
    for rom in &roms {
        println!("  {}  {}", rom, describe(rom));
    }
    Ok(())
}

fn describe(rom: &RomCode) -> &'static str {
    if !rom.crc_valid() {
        return "(bad CRC)";
    }
    match rom.family() {
        RomCode::FAMILY_DS1922 => "DS1922/DS1923 logger",
        0x01 => "DS2401 serial number",
        0x10 => "DS18S20 thermometer",
        0x28 => "DS18B20 thermometer",
        0x81 => "DS2490 bridge ID",
        _ => "",
    }
}
