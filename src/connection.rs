use std::time::Duration;

use rusb::constants::{
    LIBUSB_ENDPOINT_IN, LIBUSB_ENDPOINT_OUT, LIBUSB_RECIPIENT_INTERFACE,
    LIBUSB_REQUEST_TYPE_VENDOR,
};
use rusb::{DeviceHandle, UsbContext};

// control transfer parameters
const TIMEOUT: Duration = Duration::from_secs(1);
const REQUEST_TYPE_IN: u8 =
    LIBUSB_REQUEST_TYPE_VENDOR | LIBUSB_RECIPIENT_INTERFACE | LIBUSB_ENDPOINT_IN;
const REQUEST_TYPE_OUT: u8 =
    LIBUSB_REQUEST_TYPE_VENDOR | LIBUSB_RECIPIENT_INTERFACE | LIBUSB_ENDPOINT_OUT;

/// Vendor control requests to an i2c-tiny-usb adapter. The whole protocol runs over these, so
/// `crate::protocol` needs nothing else from the device and can be tested against
/// `mock::ScriptedConnection`.
pub(crate) trait Connection {
    fn control_in(
        &self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> rusb::Result<usize>;

    fn control_out(&self, request: u8, value: u16, index: u16, buf: &[u8]) -> rusb::Result<usize>;
}

impl<T: UsbContext> Connection for DeviceHandle<T> {
    #[inline]
    fn control_in(
        &self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> rusb::Result<usize> {
        self.read_control(REQUEST_TYPE_IN, request, value, index, buf, TIMEOUT)
    }

    #[inline]
    fn control_out(&self, request: u8, value: u16, index: u16, buf: &[u8]) -> rusb::Result<usize> {
        self.write_control(REQUEST_TYPE_OUT, request, value, index, buf, TIMEOUT)
    }
}
