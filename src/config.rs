//! Command-line configuration.
//!
//! Options are processed left to right: `--channel` and `--address` set the bus location used
//! by every following `--jsonfile`, so several sensors can be listed in one invocation:
//!
//! ```text
//! bme280d --polltime 30 -c 1 -a 0x76 -j /run/bme280-76.json -a 0x77 -j /run/bme280-77.json
//! ```

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::lock::DEFAULT_LOCK_PATH;
use crate::{Error, Result, RetryPolicy, SensorIdentity};

pub const DEFAULT_CHANNEL: u8 = 0x01;
pub const DEFAULT_ADDRESS: u8 = 0x76;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

pub const USAGE: &str = "\
Usage: bme280d [--polltime secs] [--lockfile path] [--lock-timeout secs]
               [--retries n] [--retry-delay ms]
               --channel n --address n --jsonfile path
               [--channel n --address n --jsonfile path]...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    pub identity: SensorIdentity,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub sensors: Vec<SensorConfig>,
    pub poll_interval: Duration,
    pub lock_path: PathBuf,
    pub lock_timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensors: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            lock_path: PathBuf::from(DEFAULT_LOCK_PATH),
            lock_timeout: None,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Config),
    Help,
}

impl Config {
    /// Parses the arguments following the program name.
    pub fn from_args<I, S>(args: I) -> Result<Command>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Config::default();
        let mut channel = DEFAULT_CHANNEL;
        let mut address = DEFAULT_ADDRESS;

        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            let (name, inline) = match arg.split_once('=') {
                Some((name, value)) if name.starts_with("--") => (name.to_string(), Some(value)),
                _ => (arg.clone(), None),
            };
            let mut value = || -> Result<String> {
                match inline {
                    Some(v) => Ok(v.to_string()),
                    None => args
                        .next()
                        .ok_or_else(|| Error::Config(format!("{} requires a value", name))),
                }
            };

            match name.as_str() {
                "-c" | "--channel" => channel = parse_number(&name, &value()?)?,
                "-a" | "--address" => {
                    address = parse_number(&name, &value()?)?;
                    if address > 0x7F {
                        return Err(Error::Config(format!(
                            "address {:#x} is not a 7-bit I2C address",
                            address
                        )));
                    }
                }
                "-j" | "--jsonfile" => config.sensors.push(SensorConfig {
                    identity: SensorIdentity::new(channel, address),
                    output: PathBuf::from(value()?),
                }),
                "-p" | "--polltime" => {
                    config.poll_interval = Duration::from_secs(parse_number(&name, &value()?)?)
                }
                "-l" | "--lockfile" => config.lock_path = PathBuf::from(value()?),
                "--lock-timeout" => {
                    config.lock_timeout =
                        Some(Duration::from_secs(parse_number(&name, &value()?)?))
                }
                "--retries" => config.retry.attempts = parse_number(&name, &value()?)?,
                "--retry-delay" => {
                    config.retry.delay = Duration::from_millis(parse_number(&name, &value()?)?)
                }
                "-h" | "--help" => return Ok(Command::Help),
                _ => return Err(Error::Config(format!("unknown option {}", name))),
            }
        }

        config.validate()?;
        Ok(Command::Run(config))
    }

    pub fn validate(&self) -> Result<()> {
        if self.sensors.is_empty() {
            return Err(Error::Config("no sensor configured, use --jsonfile".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be at least 1s".into()));
        }
        if self.retry.attempts == 0 {
            return Err(Error::Config("retries must be at least 1".into()));
        }
        let mut seen = HashSet::new();
        for sensor in &self.sensors {
            if !seen.insert(sensor.identity) {
                return Err(Error::Config(format!(
                    "sensor on channel {} address {:#04x} configured twice",
                    sensor.identity.channel, sensor.identity.address
                )));
            }
        }
        Ok(())
    }
}

/// Parses an unsigned number like `strtol(s, NULL, 0)`: `0x` prefix for hex, a leading `0` for
/// octal, decimal otherwise.
fn parse_number<T>(option: &str, s: &str) -> Result<T>
where
    T: TryFrom<u64>,
{
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        u64::from_str_radix(&s[1..], 8)
    } else {
        s.parse()
    };
    parsed
        .ok()
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| Error::Config(format!("invalid value {:?} for {}", s, option)))
}
