use rusb::{Device, DeviceHandle, GlobalContext, UsbContext};

use crate::protocol::{self, KNOWN_VENDOR_PRODUCT_IDS};
use crate::{Bus, BusChannel, BusError};

/// I2C buses provided by i2c-tiny-usb adapters. Channel `n` is the `n`-th adapter in USB
/// enumeration order.
pub struct UsbBus<T: UsbContext = GlobalContext> {
    context: T,
}

impl UsbBus<GlobalContext> {
    pub fn new() -> Result<Self, BusError> {
        Self::with_context(GlobalContext::default())
    }
}

impl<T: UsbContext> UsbBus<T> {
    /// Fails with `NoDevice` if no adapter is plugged in.
    pub fn with_context(context: T) -> Result<Self, BusError> {
        let bus = Self { context };
        let count = bus.adapters()?.len();
        if count == 0 {
            return Err(rusb::Error::NoDevice.into());
        }
        log::debug!("found {} i2c-tiny-usb adapter(s)", count);
        Ok(bus)
    }

    /// Connected i2c-tiny-usb adapters, in enumeration order.
    pub fn adapters(&self) -> Result<Vec<Device<T>>, BusError> {
        Ok(self
            .context
            .devices()?
            .iter()
            .filter(|dev| {
                dev.device_descriptor().is_ok_and(|desc| {
                    KNOWN_VENDOR_PRODUCT_IDS.contains(&(desc.vendor_id(), desc.product_id()))
                })
            })
            .collect())
    }
}

impl<T: UsbContext> Bus for UsbBus<T> {
    type Channel = UsbChannel<T>;

    fn open(&self, channel: u8, address: u8) -> Result<UsbChannel<T>, BusError> {
        let device = self
            .adapters()?
            .into_iter()
            .nth(usize::from(channel))
            .ok_or(rusb::Error::NotFound)?;
        let handle = device.open()?;
        handle.claim_interface(0)?;
        protocol::check_device(&handle)?;
        Ok(UsbChannel {
            handle,
            address: u16::from(address),
        })
    }
}

/// One device address on an adapter. The USB handle is closed when the channel is dropped.
pub struct UsbChannel<T: UsbContext = GlobalContext> {
    handle: DeviceHandle<T>,
    address: u16,
}

impl<T: UsbContext> BusChannel for UsbChannel<T> {
    fn read_register8(&mut self, register: u8) -> Result<u8, BusError> {
        let mut value = [0u8; 1];
        protocol::write_read(&self.handle, self.address, &[register], &mut value)?;
        Ok(value[0])
    }

    fn write_register8(&mut self, register: u8, value: u8) -> Result<(), BusError> {
        protocol::write(&self.handle, self.address, &[register, value])
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
        protocol::read(&self.handle, self.address, buf)
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), BusError> {
        protocol::write(&self.handle, self.address, buf)
    }

    // one transaction with a repeated start instead of two
    fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<(), BusError> {
        protocol::write_read(&self.handle, self.address, &[start], buf)
    }
}
