use std::path::PathBuf;

/// Failure of a single transfer on the I2C transport.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BusError {
    #[error("USB error")]
    Usb(#[from] rusb::Error),

    #[error("no acknowledgement from the i2c device")]
    Nack,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("can't find an i2c-tiny-usb adapter")]
    NoAdapter(#[source] BusError),

    #[error("can't open I2C bus channel {channel} for address {address:02X}")]
    BusOpen {
        channel: u8,
        address: u8,
        #[source]
        source: BusError,
    },

    #[error("I2C transfer failed")]
    Bus(#[from] BusError),

    /// `found` is `None` when nothing acknowledged the address.
    #[error("BME280 reg# 0xd0 reads {}, not 0x60; is chip installed?", chip_id_text(.found))]
    IdentityMismatch { found: Option<u8> },

    #[error("timeout waiting for BME280 status")]
    Timeout,

    #[error("BME280 output stuck; is sensor damaged?")]
    SensorStuck,

    #[error("can't publish JSON file {}", path.display())]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("can't use bus lock {}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out waiting for bus lock {}", path.display())]
    LockTimeout { path: PathBuf },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether the publish loop may skip the affected sensor for one cycle and carry on.
    /// Everything else is fatal for the process.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::BusOpen { .. } | Error::Publish { .. })
    }

    /// The message of this error followed by those of all its sources.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(e) = source {
            message.push_str(": ");
            message.push_str(&e.to_string());
            source = e.source();
        }
        message
    }
}

fn chip_id_text(found: &Option<u8>) -> String {
    match found {
        Some(id) => format!("{id:#04x}"),
        None => "nothing".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
