use std::fmt;
use std::thread::sleep;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::registers::*;
use crate::{Bus, BusChannel, BusError, CalibrationTable, Error, RawSample, Reading, Result};

/// Bus channel and 7-bit device address of one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorIdentity {
    pub channel: u8,
    pub address: u8,
}

impl SensorIdentity {
    pub fn new(channel: u8, address: u8) -> Self {
        Self { channel, address }
    }

    /// Stable per-sensor id used to key published records.
    pub fn record_id(&self) -> u16 {
        (u16::from(self.channel) << 8) | u16::from(self.address)
    }
}

impl fmt::Display for SensorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I2C: channel:{}; address:{:02x}", self.channel, self.address)
    }
}

/// Bounds the status poll and the stuck-sample retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_millis(50),
        }
    }
}

/// Progress of the most recent acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Closed,
    Opened,
    Reset,
    IdentityVerified,
    Configured,
    CalibrationLoaded,
    SamplingReady,
    SampleAcquired,
    Failed,
}

/// Compensated values of the latest good sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Percent relative humidity.
    pub humidity: f64,
    /// Pascal.
    pub pressure: f64,
}

/// One BME280 on the bus, together with the data of its last successful acquisition.
#[derive(Debug)]
pub struct SensorSession {
    identity: SensorIdentity,
    policy: RetryPolicy,
    state: State,
    calibration: Option<CalibrationTable>,
    sample: Option<RawSample>,
    timestamp: Option<DateTime<Utc>>,
}

impl SensorSession {
    pub fn new(identity: SensorIdentity, policy: RetryPolicy) -> Self {
        Self {
            identity,
            policy,
            state: State::Closed,
            calibration: None,
            sample: None,
            timestamp: None,
        }
    }

    pub fn identity(&self) -> SensorIdentity {
        self.identity
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Resets and configures the chip, loads its calibration and reads one valid sample.
    ///
    /// The bus handle is closed again before returning, whatever the outcome. On failure the
    /// previous sample (if any) is kept.
    pub fn acquire<B: Bus>(&mut self, bus: &B) -> Result<()> {
        self.state = State::Closed;
        let result = self.try_acquire(bus);
        match &result {
            Ok(()) => self.enter(State::SampleAcquired),
            Err(e) => {
                log::debug!("{}: acquisition failed: {}", self.identity, e);
                self.state = State::Failed;
            }
        }
        result
    }

    fn try_acquire<B: Bus>(&mut self, bus: &B) -> Result<()> {
        let SensorIdentity { channel, address } = self.identity;
        let mut dev = bus
            .open(channel, address)
            .map_err(|source| Error::BusOpen {
                channel,
                address,
                source,
            })?;
        self.enter(State::Opened);

        // An unacknowledged reset is left for the identity check to report.
        match dev.write_register8(REG_RESET, RESET_COMMAND) {
            Err(BusError::Nack) => log::debug!("{}: reset not acknowledged", self.identity),
            result => result?,
        }
        self.enter(State::Reset);

        let found = match dev.read_register8(REG_CHIP_ID) {
            Ok(id) => Some(id),
            Err(BusError::Nack) => None,
            Err(e) => return Err(e.into()),
        };
        if found != Some(CHIP_ID) {
            return Err(Error::IdentityMismatch { found });
        }
        self.enter(State::IdentityVerified);

        for (register, value) in CONFIGURATION {
            dev.write_register8(register, value)?;
        }
        self.enter(State::Configured);

        let calibration = CalibrationTable::load(&mut dev)?;
        self.enter(State::CalibrationLoaded);

        for _ in 0..self.policy.attempts {
            sleep(self.policy.delay);
            self.wait_for_status(&mut dev)?;
            self.enter(State::SamplingReady);

            let sample = RawSample::read(&mut dev)?;
            log::trace!(
                "{}: T:{:05x} H:{:05x} P:{:05x}",
                self.identity,
                sample.adc_t,
                sample.adc_h,
                sample.adc_p
            );
            if sample.is_valid() {
                self.calibration = Some(calibration);
                self.sample = Some(sample);
                self.timestamp = Some(Utc::now());
                return Ok(());
            }
        }
        Err(Error::SensorStuck)
    }

    /// Waits while the chip copies NVM data to its image registers.
    fn wait_for_status(&self, dev: &mut impl BusChannel) -> Result<()> {
        for _ in 0..self.policy.attempts {
            if dev.read_register8(REG_STATUS)? & STATUS_IM_UPDATE == 0 {
                return Ok(());
            }
            sleep(self.policy.delay);
        }
        Err(Error::Timeout)
    }

    fn enter(&mut self, state: State) {
        log::debug!("{}: {:?}", self.identity, state);
        self.state = state;
    }

    /// Calibration and sample of the last successful acquisition.
    pub fn reading(&self) -> Option<Reading> {
        Some(Reading::new(self.calibration?, self.sample?))
    }

    pub fn measurement(&self) -> Option<Measurement> {
        let reading = self.reading()?;
        Some(Measurement {
            timestamp: self.timestamp?,
            temperature: reading.temperature(),
            humidity: reading.humidity(),
            pressure: reading.pressure(),
        })
    }
}
