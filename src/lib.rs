//! Polls BME280 sensors behind i2c-tiny-usb adapters and publishes compensated temperature,
//! humidity and pressure as JSON snapshots. Access to the bus is serialized across processes
//! through a lock file.

mod bus;
mod calibration;
mod compensation;
mod connection;
mod daemon;
mod error;
mod protocol;
mod sample;
mod session;
mod usb_bus;

pub mod config;
pub mod lock;
pub mod logger;
pub mod publish;
pub mod registers;


pub(crate) use connection::Connection;

pub use bus::{Bus, BusChannel};
pub use calibration::CalibrationTable;
pub use compensation::Reading;
pub use config::{Command, Config, SensorConfig};
pub use daemon::{PublishLoop, Receiver};
pub use error::*;
pub use rusb;
pub use sample::RawSample;
pub use session::{Measurement, RetryPolicy, SensorIdentity, SensorSession, State};
pub use usb_bus::{UsbBus, UsbChannel};
