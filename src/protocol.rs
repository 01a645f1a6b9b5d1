use i2c::{Message, ReadFlags, WriteFlags};

use crate::{BusError, Connection};

// i2c-tiny-usb and compatible devices can use multiple USB VID+PID combinations
pub(crate) const KNOWN_VENDOR_PRODUCT_IDS: [(u16, u16); 2] = [
    (0x0403, 0xc631), // FTDI
    (0x1c40, 0x0534), // EZPrototypes
];

mod constants {
    pub const CMD_ECHO: u8 = 0;
    pub const CMD_GET_FUNC: u8 = 1;
    pub const CMD_GET_STATUS: u8 = 3;
    pub const CMD_I2C_IO: u8 = 4;

    // following can be OR'd with CMD_I2C_IO
    pub const CMD_I2C_BEGIN: u8 = 1;
    pub const CMD_I2C_END: u8 = 2;

    // possible values for the CMD_GET_STATUS response
    #[cfg(test)]
    pub const STATUS_IDLE: u8 = 0;
    pub const STATUS_ADDRESS_NAK: u8 = 2;

    // CMD_GET_FUNC bit for plain (non-SMBus) I2C transfers
    pub const I2C_FUNC_I2C: u32 = 0x00000001;

    // per-message flag, needs to be set for all I2C reads
    pub const I2C_M_RD: u16 = 0x0001;
}
use constants::*;

const ECHO_PROBES: [u16; 4] = [0x0000, 0xffff, 0xa55a, 0x0ff0];

fn message_read(
    dev: &impl Connection,
    command: u8,
    address: u16,
    data: &mut [u8],
) -> Result<(), BusError> {
    let n_read = dev.control_in(command, I2C_M_RD, address, data)?;
    if n_read != data.len() {
        return Err(rusb::Error::Io.into());
    }
    Ok(())
}

fn message_write(
    dev: &impl Connection,
    command: u8,
    address: u16,
    data: &[u8],
) -> Result<(), BusError> {
    let n_written = dev.control_out(command, 0, address, data)?;
    if n_written != data.len() {
        return Err(rusb::Error::Io.into());
    }
    Ok(())
}

fn status(dev: &impl Connection) -> Result<u8, BusError> {
    let mut status = [0u8; 1];
    message_read(dev, CMD_GET_STATUS, 0, &mut status)?;
    Ok(status[0])
}

/// Runs `messages` as one I2C transaction: start before the first message, repeated start
/// between messages, stop after the last one.
pub(crate) fn transfer(dev: &impl Connection, messages: &mut [Message]) -> Result<(), BusError> {
    let last = messages.len().saturating_sub(1);
    for (i, message) in messages.iter_mut().enumerate() {
        let mut cmd = CMD_I2C_IO;
        if i == 0 {
            cmd |= CMD_I2C_BEGIN;
        }
        if i == last {
            cmd |= CMD_I2C_END;
        }

        let op_result = match message {
            Message::Read { address, data, .. } => message_read(dev, cmd, *address, data),
            Message::Write { address, data, .. } => message_write(dev, cmd, *address, data),
        };

        // A missing acknowledgement usually fails the control transfer too. The status tells a
        // NACK apart from other USB errors.
        if status(dev)? == STATUS_ADDRESS_NAK {
            return Err(BusError::Nack);
        }
        op_result?;
    }
    Ok(())
}

pub(crate) fn write(dev: &impl Connection, address: u16, data: &[u8]) -> Result<(), BusError> {
    transfer(
        dev,
        &mut [Message::Write {
            address,
            data,
            flags: WriteFlags::empty(),
        }],
    )
}

pub(crate) fn read(dev: &impl Connection, address: u16, data: &mut [u8]) -> Result<(), BusError> {
    transfer(
        dev,
        &mut [Message::Read {
            address,
            data,
            flags: ReadFlags::empty(),
        }],
    )
}

/// Writes `command` and reads the reply within one transaction (repeated start), the usual
/// way of reading device registers.
pub(crate) fn write_read(
    dev: &impl Connection,
    address: u16,
    command: &[u8],
    data: &mut [u8],
) -> Result<(), BusError> {
    transfer(
        dev,
        &mut [
            Message::Write {
                address,
                data: command,
                flags: WriteFlags::empty(),
            },
            Message::Read {
                address,
                data,
                flags: ReadFlags::empty(),
            },
        ],
    )
}

/// Makes sure the adapter speaks i2c-tiny-usb and supports plain I2C transfers.
pub(crate) fn check_device(dev: &impl Connection) -> Result<(), BusError> {
    let mut buf_func = [0u8; 4];
    message_read(dev, CMD_GET_FUNC, 0, &mut buf_func)?;
    if u32::from_le_bytes(buf_func) & I2C_FUNC_I2C == 0 {
        return Err(rusb::Error::NotSupported.into());
    }

    // CMD_ECHO returns its wValue, which message_read() would use for flags
    for probe in ECHO_PROBES {
        let mut buf_echo = [0u8; 2];
        let n_read = dev.control_in(CMD_ECHO, probe, 0, &mut buf_echo)?;
        if n_read != 2 || u16::from_le_bytes(buf_echo) != probe {
            return Err(rusb::Error::Other.into());
        }
    }
    Ok(())
}
