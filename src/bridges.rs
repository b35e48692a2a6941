//! Bridge registration and dispatch
//!
//! Bridges are selected with a string of the form `name` or
//! `name:key1=value1,key2=value2`. Each bridge crate parses its own options.

use thermolog_core::onewire::OneWireMaster;

/// Information about a bridge
pub struct BridgeInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Bridges enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_bridges() -> Vec<BridgeInfo> {
    let mut bridges = Vec::new();

    #[cfg(feature = "ds2490")]
    bridges.push(BridgeInfo {
        name: "ds2490",
        aliases: &["ds9490"],
        description: "DS2490/DS9490 USB 1-Wire adapter (VID:04fa PID:2490) (index=<n>,timeout=<ms>,polls=<n>)",
    });

    #[cfg(feature = "dummy")]
    bridges.push(BridgeInfo {
        name: "dummy",
        aliases: &[],
        description: "Emulated bus with a DS1922 logger (type=<l|t|e>,samples=<n>,devices=<n>)",
    });

    bridges
}

/// Parsed bridge selection
#[derive(Debug)]
pub struct BridgeParams {
    /// Bridge name as given
    pub name: String,
    /// Key-value options in the order given
    pub params: Vec<(String, String)>,
}

impl BridgeParams {
    fn options(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Split a bridge string into name and options
pub fn parse_bridge_params(s: &str) -> Result<BridgeParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = Vec::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.push((key.to_string(), value.to_string()));
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(BridgeParams {
        name: name.to_string(),
        params,
    })
}

/// Open the bridge named by `bridge`
pub fn open_bridge(bridge: &str) -> Result<Box<dyn OneWireMaster>, Box<dyn std::error::Error>> {
    let params = parse_bridge_params(bridge)?;

    match params.name.as_str() {
        #[cfg(feature = "ds2490")]
        "ds2490" | "ds9490" => open_ds2490(&params),

        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(&params),

        _ => Err(format!("Unknown bridge: {}", params.name).into()),
    }
}

#[cfg(feature = "ds2490")]
fn open_ds2490(params: &BridgeParams) -> Result<Box<dyn OneWireMaster>, Box<dyn std::error::Error>> {
    use thermolog_ds2490::{parse_options, Ds2490};

    log::info!("Opening DS2490 bridge...");

    let config = parse_options(&params.options())
        .map_err(|e| format!("Invalid ds2490 parameters: {}", e))?;

    let bridge = Ds2490::open_with_config(config).map_err(|e| {
        format!(
            "Failed to open DS2490: {}\n\
             Make sure the adapter is connected and you have permissions.\n\
             On Linux the ds2490 kernel module may hold the device: sudo rmmod ds2490",
            e
        )
    })?;

    Ok(Box::new(bridge))
}

#[cfg(feature = "dummy")]
fn open_dummy(params: &BridgeParams) -> Result<Box<dyn OneWireMaster>, Box<dyn std::error::Error>> {
    use thermolog_dummy::{parse_options, DummyBus};

    let config = parse_options(&params.options())
        .map_err(|e| format!("Invalid dummy parameters: {}", e))?;
    log::info!(
        "Using emulated {} with {} samples",
        config.device_type,
        config.samples
    );

    Ok(Box::new(DummyBus::from_config(&config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bridge_params() {
        let params = parse_bridge_params("ds2490:index=1,timeout=200").unwrap();
        assert_eq!(params.name, "ds2490");
        assert_eq!(params.options(), [("index", "1"), ("timeout", "200")]);

        // Repeated keys stay in order so the last one wins
        let params = parse_bridge_params("dummy:type=t,samples=5,type=e").unwrap();
        assert_eq!(
            params.options(),
            [("type", "t"), ("samples", "5"), ("type", "e")]
        );

        let params = parse_bridge_params("dummy").unwrap();
        assert_eq!(params.name, "dummy");
        assert!(params.params.is_empty());
    }

    #[test]
    fn test_parse_bridge_params_invalid() {
        assert!(parse_bridge_params("ds2490:index").is_err());
    }

    #[test]
    fn test_unknown_bridge() {
        assert!(open_bridge("ch341a").is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy() {
        use thermolog_core::onewire::enumerate;

        let mut bus = open_bridge("dummy:devices=1").unwrap();
        assert_eq!(enumerate(&mut bus).unwrap().len(), 2);
        assert!(open_bridge("dummy:type=q").is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_repeated_option_last_wins() {
        use thermolog_core::onewire::enumerate;

        let mut bus = open_bridge("dummy:devices=3,devices=0").unwrap();
        assert_eq!(enumerate(&mut bus).unwrap().len(), 1);
        let mut bus = open_bridge("dummy:devices=0,devices=3").unwrap();
        assert_eq!(enumerate(&mut bus).unwrap().len(), 4);
    }
}
