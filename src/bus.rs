use crate::BusError;

/// An open handle to one device on the bus. Dropping the channel closes the handle, so a
/// channel can't outlive the operation that opened it.
pub trait BusChannel {
    fn read_register8(&mut self, register: u8) -> Result<u8, BusError>;

    fn write_register8(&mut self, register: u8, value: u8) -> Result<(), BusError>;

    /// Reads exactly `buf.len()` bytes starting at the device's current register pointer.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), BusError>;

    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), BusError>;

    /// Burst read of consecutive registers starting at `start`.
    fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.write_bytes(&[start])?;
        self.read_bytes(buf)
    }
}

/// Platform I2C driver: hands out channels to `(channel, address)` pairs.
pub trait Bus {
    type Channel: BusChannel;

    fn open(&self, channel: u8, address: u8) -> Result<Self::Channel, BusError>;
}

#[cfg(test)]
pub mod mock {
    //! In-memory BME280 chips behind a fake bus. Every open, transfer and close is appended
    //! to a shared event log so tests can check ordering across sensors and threads.

    use super::*;
    use crate::registers::*;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};

    /// Calibration capture of a datasheet-like part: T1=27504 T2=26435 T3=-1000,
    /// P1=36477 P2=-10685 P3=3024 P4=2855 P5=140 P6=-7 P7=15500 P8=-14600 P9=6000,
    /// H1=75 H2=362 H3=0 H4=313 H5=50 H6=30.
    pub const CALIBRATION: [u8; CALIB_LEN] = [
        0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC, 0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, 0x27, 0x0B,
        0x8C, 0x00, 0xF9, 0xFF, 0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17, 0x00, 0x4B, 0x6A, 0x01,
        0x00, 0x13, 0x29, 0x20, 0x03, 0x1E,
    ];

    /// adc_P=415148 adc_T=519888 adc_H=30000
    pub const SAMPLE: [u8; DATA_LEN] = [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x75, 0x30];

    pub const STUCK_SAMPLE: [u8; DATA_LEN] = [0x80, 0x00, 0x00, 0x80, 0x00, 0x00, 0x80, 0x00];

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Event {
        Open { channel: u8, address: u8 },
        Transfer { channel: u8, address: u8 },
        Close { channel: u8, address: u8 },
    }

    impl Event {
        pub fn key(&self) -> (u8, u8) {
            match *self {
                Event::Open { channel, address }
                | Event::Transfer { channel, address }
                | Event::Close { channel, address } => (channel, address),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct SimulatedChip {
        pub chip_id: u8,
        pub calibration: [u8; CALIB_LEN],
        /// Samples returned by successive data reads; the last one repeats forever.
        pub samples: VecDeque<[u8; DATA_LEN]>,
        /// Number of status reads (per acquisition) reporting busy before turning ready.
        pub busy_polls: u32,
        pub writes: Vec<(u8, u8)>,
        pointer: u8,
        busy_remaining: u32,
    }

    impl SimulatedChip {
        pub fn new() -> Self {
            Self {
                chip_id: CHIP_ID,
                calibration: CALIBRATION,
                samples: VecDeque::from([SAMPLE]),
                busy_polls: 0,
                writes: Vec::new(),
                pointer: 0,
                busy_remaining: 0,
            }
        }

        pub fn with_samples(mut self, samples: &[[u8; DATA_LEN]]) -> Self {
            self.samples = samples.iter().copied().collect();
            self
        }

        pub fn with_busy_polls(mut self, polls: u32) -> Self {
            self.busy_polls = polls;
            self
        }

        fn write_register(&mut self, register: u8, value: u8) {
            if register == REG_RESET && value == RESET_COMMAND {
                self.busy_remaining = self.busy_polls;
            }
            self.writes.push((register, value));
        }

        fn read_next(&mut self) -> u8 {
            let register = self.pointer;
            self.pointer = self.pointer.wrapping_add(1);
            match register {
                0x88..=0xA1 => self.calibration[(register - REG_CALIB_00) as usize],
                0xE1..=0xE8 => self.calibration[CALIB_00_LEN + (register - REG_CALIB_26) as usize],
                REG_CHIP_ID => self.chip_id,
                REG_STATUS => {
                    if self.busy_remaining > 0 {
                        self.busy_remaining -= 1;
                        STATUS_IM_UPDATE
                    } else {
                        0
                    }
                }
                0xF7..=0xFE => {
                    let sample = self.samples.front().copied().unwrap_or(STUCK_SAMPLE);
                    let value = sample[(register - REG_DATA) as usize];
                    if register == 0xFE && self.samples.len() > 1 {
                        self.samples.pop_front();
                    }
                    value
                }
                _ => 0,
            }
        }
    }

    #[derive(Default)]
    struct State {
        chips: HashMap<(u8, u8), SimulatedChip>,
        unavailable_channels: HashSet<u8>,
        events: Vec<Event>,
    }

    /// Cloning shares the chips and the event log.
    #[derive(Clone, Default)]
    pub struct SimulatedBus {
        state: Arc<Mutex<State>>,
    }

    impl SimulatedBus {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_chip(&self, channel: u8, address: u8, chip: SimulatedChip) {
            self.lock().chips.insert((channel, address), chip);
        }

        pub fn set_channel_unavailable(&self, channel: u8, unavailable: bool) {
            let mut state = self.lock();
            if unavailable {
                state.unavailable_channels.insert(channel);
            } else {
                state.unavailable_channels.remove(&channel);
            }
        }

        pub fn chip(&self, channel: u8, address: u8) -> Option<SimulatedChip> {
            self.lock().chips.get(&(channel, address)).cloned()
        }

        pub fn events(&self) -> Vec<Event> {
            self.lock().events.clone()
        }

        fn lock(&self) -> MutexGuard<'_, State> {
            self.state.lock().unwrap()
        }
    }

    pub struct SimulatedChannel {
        bus: SimulatedBus,
        channel: u8,
        address: u8,
    }

    impl SimulatedChannel {
        fn with_chip<R>(&self, f: impl FnOnce(&mut SimulatedChip) -> R) -> Result<R, BusError> {
            let mut state = self.bus.lock();
            state.events.push(Event::Transfer {
                channel: self.channel,
                address: self.address,
            });
            match state.chips.get_mut(&(self.channel, self.address)) {
                Some(chip) => Ok(f(chip)),
                None => Err(BusError::Nack),
            }
        }
    }

    impl BusChannel for SimulatedChannel {
        fn read_register8(&mut self, register: u8) -> Result<u8, BusError> {
            self.with_chip(|chip| {
                chip.pointer = register;
                chip.read_next()
            })
        }

        fn write_register8(&mut self, register: u8, value: u8) -> Result<(), BusError> {
            self.with_chip(|chip| chip.write_register(register, value))
        }

        fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
            self.with_chip(|chip| buf.iter_mut().for_each(|b| *b = chip.read_next()))
        }

        fn write_bytes(&mut self, buf: &[u8]) -> Result<(), BusError> {
            self.with_chip(|chip| match *buf {
                [] => {}
                [register] => chip.pointer = register,
                [register, value, ..] => chip.write_register(register, value),
            })
        }
    }

    impl Drop for SimulatedChannel {
        fn drop(&mut self) {
            self.bus.lock().events.push(Event::Close {
                channel: self.channel,
                address: self.address,
            });
        }
    }

    impl Bus for SimulatedBus {
        type Channel = SimulatedChannel;

        fn open(&self, channel: u8, address: u8) -> Result<SimulatedChannel, BusError> {
            let mut state = self.lock();
            if state.unavailable_channels.contains(&channel) {
                return Err(rusb::Error::NoDevice.into());
            }
            state.events.push(Event::Open { channel, address });
            Ok(SimulatedChannel {
                bus: self.clone(),
                channel,
                address,
            })
        }
    }

    /// Fresh per-test directory under the system temp dir.
    pub fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bme280d-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
