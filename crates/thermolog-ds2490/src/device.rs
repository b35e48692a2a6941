//! DS2490 device implementation
//!
//! This module provides the `Ds2490` struct that talks to the bridge over
//! USB and implements the `OneWireMaster` trait.

use std::time::Duration;

use nusb::transfer::{
    Buffer, Bulk, ControlOut, ControlType, In, Interrupt, Recipient, TransferError,
};
use nusb::{Endpoint, Interface, MaybeFuture};
use thermolog_core::error::{Error as CoreError, Result as CoreResult};
use thermolog_core::onewire::OneWireMaster;

use crate::error::{Ds2490Error, Result};
use crate::protocol::*;

/// DS2490 configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ds2490Config {
    /// Index among the connected bridges
    pub index: usize,
    /// Timeout for every USB transfer
    pub timeout: Duration,
    /// Status packets to read before giving up on the idle flag
    pub poll_limit: u32,
}

impl Default for Ds2490Config {
    fn default() -> Self {
        Self {
            index: 0,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_limit: DEFAULT_POLL_LIMIT,
        }
    }
}

/// Claimed interface and its endpoints
struct Connection {
    interface: Interface,
    status_ep: Endpoint<Interrupt, In>,
    data_ep: Endpoint<Bulk, In>,
}

/// DS2490 USB 1-Wire bridge
///
/// The bridge holds the claimed USB interface while it is open. [`close`]
/// releases it; every bus operation then fails with
/// [`Ds2490Error::NotOpen`] until the bridge is opened again. Dropping the
/// bridge releases the interface as well.
///
/// [`close`]: Ds2490::close
pub struct Ds2490 {
    config: Ds2490Config,
    connection: Option<Connection>,
}

impl Ds2490 {
    /// Create an unopened bridge handle
    pub fn new(config: Ds2490Config) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    /// Open the first DS2490 with the default configuration
    pub fn open() -> Result<Self> {
        Self::open_with_config(Ds2490Config::default())
    }

    /// Open a DS2490 with the given configuration
    pub fn open_with_config(config: Ds2490Config) -> Result<Self> {
        let mut bridge = Self::new(config);
        bridge.connect()?;
        Ok(bridge)
    }

    /// Current configuration
    pub fn config(&self) -> &Ds2490Config {
        &self.config
    }

    /// Whether the interface is claimed
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Find the bridge, select its configuration and claim the interface
    ///
    /// Does nothing if the bridge is already open.
    pub fn connect(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        let device_info = nusb::list_devices()
            .wait()
            .map_err(|e| Ds2490Error::OpenFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == DS2490_USB_VENDOR && d.product_id() == DS2490_USB_PRODUCT)
            .nth(self.config.index)
            .ok_or(Ds2490Error::DeviceNotFound {
                index: self.config.index,
            })?;

        log::info!(
            "Opening DS2490 at bus {} address {}",
            device_info.bus_id(),
            device_info.device_address()
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| Ds2490Error::OpenFailed(e.to_string()))?;

        let active = device
            .active_configuration()
            .map(|c| c.configuration_value())
            .ok();
        if active != Some(USB_CONFIGURATION) {
            device
                .set_configuration(USB_CONFIGURATION)
                .wait()
                .map_err(|e| {
                    Ds2490Error::ClaimFailed(format!("Failed to set configuration: {}", e))
                })?;
        }

        let interface = device
            .claim_interface(USB_INTERFACE)
            .wait()
            .map_err(|e| Ds2490Error::ClaimFailed(e.to_string()))?;
        interface
            .set_alt_setting(USB_ALT_SETTING)
            .wait()
            .map_err(|e| {
                Ds2490Error::ClaimFailed(format!("Failed to set alternate setting: {}", e))
            })?;

        let status_ep = interface
            .endpoint::<Interrupt, In>(STATUS_EP)
            .map_err(|e| Ds2490Error::ClaimFailed(e.to_string()))?;
        let data_ep = interface
            .endpoint::<Bulk, In>(DATA_IN_EP)
            .map_err(|e| Ds2490Error::ClaimFailed(e.to_string()))?;

        log::debug!(
            "DS2490 claimed: status EP 0x{:02X}, data EP 0x{:02X}",
            STATUS_EP,
            DATA_IN_EP
        );

        self.connection = Some(Connection {
            interface,
            status_ep,
            data_ep,
        });
        Ok(())
    }

    /// Release the USB interface
    pub fn close(&mut self) {
        if self.connection.take().is_some() {
            log::debug!("DS2490 released");
        }
    }

    /// List all connected DS2490 bridges
    pub fn list_devices() -> Result<Vec<Ds2490DeviceInfo>> {
        let devices = nusb::list_devices()
            .wait()
            .map_err(|e| Ds2490Error::OpenFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == DS2490_USB_VENDOR && d.product_id() == DS2490_USB_PRODUCT)
            .map(|d| Ds2490DeviceInfo {
                bus: d.bus_id().to_string(),
                address: d.device_address(),
                serial: d.serial_number().map(str::to_string),
            })
            .collect();

        Ok(devices)
    }

    fn connection(&mut self) -> Result<&mut Connection> {
        self.connection.as_mut().ok_or(Ds2490Error::NotOpen)
    }

    /// Issue a communication command and wait until the bridge is idle
    fn comm_command(&mut self, value: u16, index: u16) -> Result<StatusPacket> {
        let timeout = self.config.timeout;
        let connection = self.connection()?;
        connection
            .interface
            .control_out(
                ControlOut {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request: COMM_CMD,
                    value,
                    index,
                    data: &[],
                },
                timeout,
            )
            .wait()
            .map_err(|e| transfer_error("Control transfer failed", e))?;

        self.wait_idle()
    }

    /// Read status packets until the idle flag is set
    fn wait_idle(&mut self) -> Result<StatusPacket> {
        let timeout = self.config.timeout;
        let poll_limit = self.config.poll_limit;
        let connection = self.connection()?;

        let max_packet_size = connection.status_ep.max_packet_size();
        let len = STATUS_PACKET_LEN.div_ceil(max_packet_size) * max_packet_size;

        for _ in 0..poll_limit {
            let mut buf = Buffer::new(len);
            buf.set_requested_len(len);
            let data = connection
                .status_ep
                .transfer_blocking(buf, timeout)
                .into_result()
                .map_err(|e| transfer_error("Status read failed", e))?;

            let status = StatusPacket::parse(&data).ok_or_else(|| {
                Ds2490Error::InvalidResponse(format!("{} byte status packet", data.len()))
            })?;
            if status.short_detected() {
                return Err(Ds2490Error::BusShort);
            }
            if status.is_idle() {
                return Ok(status);
            }
        }

        log::debug!("DS2490 not idle after {} status packets", poll_limit);
        Err(Ds2490Error::Timeout)
    }

    /// Read the result byte of the last bit or byte command
    fn read_data(&mut self) -> Result<u8> {
        let timeout = self.config.timeout;
        let connection = self.connection()?;

        let len = connection.data_ep.max_packet_size();
        let mut buf = Buffer::new(len);
        buf.set_requested_len(len);
        let data = connection
            .data_ep
            .transfer_blocking(buf, timeout)
            .into_result()
            .map_err(|e| transfer_error("Data read failed", e))?;

        data.first()
            .copied()
            .ok_or_else(|| Ds2490Error::InvalidResponse("no data byte".into()))
    }

    /// Reset the 1-Wire bus
    pub fn reset_bus(&mut self) -> Result<()> {
        let status = self.comm_command(COMM_RESET, 0)?;
        if status.no_presence() {
            log::debug!("no presence pulse after reset");
        }
        Ok(())
    }

    /// Run one bit I/O time slot
    pub fn bit_io(&mut self, bit: bool) -> Result<bool> {
        self.comm_command(bit_io_value(bit), 0)?;
        let read = self.read_data()?;
        Ok(read & 0x01 != 0)
    }

    /// Run eight time slots for one byte
    pub fn byte_io(&mut self, byte: u8) -> Result<u8> {
        self.comm_command(COMM_BYTE_IO, byte as u16)?;
        self.read_data()
    }
}

impl Drop for Ds2490 {
    fn drop(&mut self) {
        self.close();
    }
}

fn transfer_error(context: &str, e: TransferError) -> Ds2490Error {
    match e {
        // transfer_blocking cancels the transfer when the timeout expires
        TransferError::Cancelled => Ds2490Error::Timeout,
        e => Ds2490Error::TransferFailed(format!("{}: {}", context, e)),
    }
}

fn core_error(e: Ds2490Error) -> CoreError {
    log::error!("DS2490: {}", e);
    e.into()
}

impl OneWireMaster for Ds2490 {
    fn open(&mut self) -> CoreResult<()> {
        self.connect().map_err(core_error)
    }

    fn is_open(&self) -> bool {
        self.is_connected()
    }

    fn reset(&mut self) -> CoreResult<()> {
        log::trace!("reset");
        self.reset_bus().map_err(core_error)
    }

    fn touch_bit(&mut self, bit: bool) -> CoreResult<bool> {
        let read = self.bit_io(bit).map_err(core_error)?;
        log::trace!("touch bit {} -> {}", bit as u8, read as u8);
        Ok(read)
    }

    fn touch_byte(&mut self, byte: u8) -> CoreResult<u8> {
        let read = self.byte_io(byte).map_err(core_error)?;
        log::trace!("touch byte 0x{:02X} -> 0x{:02X}", byte, read);
        Ok(read)
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Information about a connected DS2490
#[derive(Debug, Clone)]
pub struct Ds2490DeviceInfo {
    /// USB bus identifier
    pub bus: String,
    /// USB device address
    pub address: u8,
    /// USB serial number, if the bridge reports one
    pub serial: Option<String>,
}

impl std::fmt::Display for Ds2490DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DS2490 at bus {} address {}", self.bus, self.address)?;
        if let Some(serial) = &self.serial {
            write!(f, " serial={}", serial)?;
        }
        Ok(())
    }
}

/// Parse bridge options from key-value pairs
///
/// Supported options:
/// - `index=<n>` - which DS2490 to use when several are connected (default 0)
/// - `timeout=<ms>` - USB transfer timeout (default 5000)
/// - `polls=<n>` - status packets to wait for idle (default 1000)
pub fn parse_options(options: &[(&str, &str)]) -> Result<Ds2490Config> {
    let mut config = Ds2490Config::default();

    for (key, value) in options {
        match *key {
            "index" => {
                config.index = value.parse().map_err(|_| {
                    Ds2490Error::InvalidParameter(format!("Invalid index value: {}", value))
                })?;
            }
            "timeout" => {
                let ms: u64 = value.parse().map_err(|_| {
                    Ds2490Error::InvalidParameter(format!("Invalid timeout value: {}", value))
                })?;
                if ms == 0 {
                    return Err(Ds2490Error::InvalidParameter(
                        "timeout must be at least 1 ms".into(),
                    ));
                }
                config.timeout = Duration::from_millis(ms);
            }
            "polls" => {
                let polls: u32 = value.parse().map_err(|_| {
                    Ds2490Error::InvalidParameter(format!("Invalid polls value: {}", value))
                })?;
                if polls == 0 {
                    return Err(Ds2490Error::InvalidParameter(
                        "polls must be at least 1".into(),
                    ));
                }
                config.poll_limit = polls;
            }
            _ => {
                return Err(Ds2490Error::InvalidParameter(format!(
                    "Unknown option: {}",
                    key
                )));
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_default() {
        assert_eq!(parse_options(&[]).unwrap(), Ds2490Config::default());
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("index", "1"), ("timeout", "250"), ("polls", "20")]).unwrap();
        assert_eq!(config.index, 1);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.poll_limit, 20);
    }

    #[test]
    fn test_parse_options_invalid() {
        assert!(parse_options(&[("index", "x")]).is_err());
        assert!(parse_options(&[("polls", "0")]).is_err());
        assert!(parse_options(&[("timeout", "0")]).is_err());
        assert!(matches!(
            parse_options(&[("speed", "fast")]),
            Err(Ds2490Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_unopened_bridge() {
        let mut bridge = Ds2490::new(Ds2490Config::default());
        assert!(!bridge.is_open());
        assert_eq!(OneWireMaster::reset(&mut bridge), Err(CoreError::BusNotOpen));
        assert_eq!(bridge.touch_byte(0xCC), Err(CoreError::BusNotOpen));
        bridge.close();
        assert!(!bridge.is_connected());
    }
}
