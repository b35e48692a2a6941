//! List command implementation

use crate::bridges;

/// List the supported bridges and, where possible, the connected adapters
pub fn list_bridges() {
    println!("Supported bridges:");
    println!();
    for bridge in bridges::available_bridges() {
        println!("  {:8} - {}", bridge.name, bridge.description);
        if !bridge.aliases.is_empty() {
            println!("  {:8}   aliases: {}", "", bridge.aliases.join(", "));
        }
    }

    #[cfg(feature = "ds2490")]
    {
        println!();
        match thermolog_ds2490::Ds2490::list_devices() {
            Ok(devices) if devices.is_empty() => println!("No DS2490 adapters connected"),
            Ok(devices) => {
                println!("Connected DS2490 adapters:");
                for (index, device) in devices.iter().enumerate() {
                    println!("  index={}: {}", index, device);
                }
            }
            Err(e) => log::warn!("Failed to list USB devices: {}", e),
        }
    }
}
