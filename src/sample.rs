use crate::registers::{DATA_LEN, REG_DATA};
use crate::{BusChannel, BusError};

/// Uncompensated ADC counts from one burst read of the data registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub adc_p: i32,
    pub adc_t: i32,
    pub adc_h: i32,
}

impl RawSample {
    /// Reset values of the data registers; a chip that keeps returning these is not measuring.
    pub const STUCK: Self = Self {
        adc_p: 0x80000,
        adc_t: 0x80000,
        adc_h: 0x8000,
    };

    pub fn read(bus: &mut impl BusChannel) -> Result<Self, BusError> {
        let mut buf = [0u8; DATA_LEN];
        bus.read_registers(REG_DATA, &mut buf)?;
        Ok(Self::decode(&buf))
    }

    /// Pressure and temperature are 20-bit (MSB, LSB, XLSB[7:4]), humidity is 16-bit.
    pub fn decode(buf: &[u8; DATA_LEN]) -> Self {
        let read20 = |i: usize| {
            (i32::from(buf[i]) << 12) | (i32::from(buf[i + 1]) << 4) | (i32::from(buf[i + 2]) >> 4)
        };
        Self {
            adc_p: read20(0),
            adc_t: read20(3),
            adc_h: (i32::from(buf[6]) << 8) | i32::from(buf[7]),
        }
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::STUCK
    }
}
