use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use crate::lock::BusLock;
use crate::publish::{render_json, render_summary, write_atomic};
use crate::{Bus, Config, Result, SensorSession};

/// A sensor and the file its snapshot is published to.
#[derive(Debug)]
pub struct Receiver {
    pub session: SensorSession,
    pub output: PathBuf,
}

/// Polls every configured sensor under the bus lock and publishes its latest reading.
pub struct PublishLoop<B: Bus> {
    bus: B,
    lock: BusLock,
    receivers: Vec<Receiver>,
    interval: Duration,
}

impl<B: Bus> PublishLoop<B> {
    pub fn new(bus: B, lock: BusLock, interval: Duration) -> Self {
        Self {
            bus,
            lock,
            receivers: Vec::new(),
            interval,
        }
    }

    pub fn from_config(bus: B, config: &Config) -> Result<Self> {
        let lock = BusLock::open(&config.lock_path)?.with_timeout(config.lock_timeout);
        log::debug!("bus lock: {}", lock.path().display());
        let mut daemon = Self::new(bus, lock, config.poll_interval);
        for sensor in &config.sensors {
            daemon.add_receiver(
                SensorSession::new(sensor.identity, config.retry),
                sensor.output.clone(),
            );
        }
        Ok(daemon)
    }

    pub fn add_receiver(&mut self, session: SensorSession, output: PathBuf) {
        self.receivers.push(Receiver { session, output });
    }

    pub fn receivers(&self) -> &[Receiver] {
        &self.receivers
    }

    /// Runs cycles until an unrecoverable error occurs. Returns immediately if no sensor is
    /// configured.
    pub fn run(&mut self) -> Result<()> {
        if self.receivers.is_empty() {
            log::warn!("no sensors configured, nothing to do");
            return Ok(());
        }
        loop {
            self.run_cycle()?;
            sleep(self.interval);
        }
    }

    /// Acquires and publishes every sensor once. Returns the number of snapshots written.
    pub fn run_cycle(&mut self) -> Result<usize> {
        let mut published = 0;
        for receiver in &mut self.receivers {
            let acquired = {
                let _guard = self.lock.lock()?;
                receiver.session.acquire(&self.bus)
            };
            match acquired {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    log::error!("{}", e.report());
                    continue;
                }
                Err(e) => return Err(e),
            }

            if publish(receiver) {
                published += 1;
            }
        }
        Ok(published)
    }
}

fn publish(receiver: &Receiver) -> bool {
    let Some(measurement) = receiver.session.measurement() else {
        return false;
    };
    let identity = receiver.session.identity();
    match write_atomic(&receiver.output, &render_json(&identity, &measurement)) {
        Ok(()) => {
            log::info!("{}", render_summary(&identity, &measurement));
            true
        }
        Err(e) => {
            log::error!("{}", e.report());
            false
        }
    }
}
