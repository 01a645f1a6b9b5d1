use crate::registers::{CALIB_00_LEN, CALIB_LEN, REG_CALIB_00, REG_CALIB_26};
use crate::{BusChannel, BusError};

/// Factory trimming coefficients of one chip, named as in the Bosch datasheet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationTable {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,

    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,

    pub h1: u8,
    pub h2: i16,
    pub h3: u8,
    pub h4: i16,
    pub h5: i16,
    pub h6: i8,
}

impl CalibrationTable {
    /// Reads both calibration blocks from the chip. Transport failures are passed through
    /// untouched; retrying is up to the caller.
    pub fn load(bus: &mut impl BusChannel) -> Result<Self, BusError> {
        let mut raw = [0u8; CALIB_LEN];
        bus.read_registers(REG_CALIB_00, &mut raw[..CALIB_00_LEN])?;
        bus.read_registers(REG_CALIB_26, &mut raw[CALIB_00_LEN..])?;
        Ok(Self::decode(&raw))
    }

    /// Decodes the 34-byte capture: 26 bytes from 0x88 followed by 8 bytes from 0xE1.
    pub fn decode(raw: &[u8; CALIB_LEN]) -> Self {
        let u16_at = |i: usize| u16::from_le_bytes([raw[i], raw[i + 1]]);
        let i16_at = |i: usize| i16::from_le_bytes([raw[i], raw[i + 1]]);

        // H4 and H5 are 12-bit values, the MSB byte carries the sign
        let h4 = (i16::from(raw[29] as i8) << 4) | i16::from(raw[30] & 0x0F);
        let h5 = (i16::from(raw[32] as i8) << 4) | i16::from((raw[31] & 0xF0) >> 4);

        Self {
            t1: u16_at(0),
            t2: i16_at(2),
            t3: i16_at(4),
            p1: u16_at(6),
            p2: i16_at(8),
            p3: i16_at(10),
            p4: i16_at(12),
            p5: i16_at(14),
            p6: i16_at(16),
            p7: i16_at(18),
            p8: i16_at(20),
            p9: i16_at(22),
            // raw[24] is unused
            h1: raw[25],
            h2: i16_at(26),
            h3: raw[28],
            h4,
            h5,
            h6: raw[33] as i8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::{SimulatedBus, SimulatedChip, CALIBRATION};
    use crate::Bus;

    fn datasheet_table() -> CalibrationTable {
        CalibrationTable {
            t1: 27504,
            t2: 26435,
            t3: -1000,
            p1: 36477,
            p2: -10685,
            p3: 3024,
            p4: 2855,
            p5: 140,
            p6: -7,
            p7: 15500,
            p8: -14600,
            p9: 6000,
            h1: 75,
            h2: 362,
            h3: 0,
            h4: 313,
            h5: 50,
            h6: 30,
        }
    }

    #[test]
    fn test_decode() {
        assert_eq!(CalibrationTable::decode(&CALIBRATION), datasheet_table());
    }

    #[test]
    fn test_decode_negative_packed_fields() {
        let mut raw = CALIBRATION;
        raw[29] = 0xF0;
        raw[30] = 0xA5;
        raw[31] = 0xA0;
        raw[32] = 0xFF;
        raw[33] = 0x80;
        let table = CalibrationTable::decode(&raw);
        assert_eq!(table.h4, -251); // 0xF05
        assert_eq!(table.h5, -6); // 0xFFA
        assert_eq!(table.h6, -128);
    }

    #[test]
    fn test_decode_h5_packing() {
        let mut raw = CALIBRATION;
        raw[31] = 0xC7;
        raw[32] = 0x7A;
        let table = CalibrationTable::decode(&raw);
        assert_eq!(table.h5, (0x7A << 4) | ((0xC7 & 0xF0) >> 4));
        assert_eq!(table.h5, 0x7AC);
        // H4 only uses raw[29] and raw[30]
        assert_eq!(table.h4, CalibrationTable::decode(&CALIBRATION).h4);
    }

    #[test]
    fn test_decode_ignores_padding() {
        let mut raw = CALIBRATION;
        raw[24] = 0x5A;
        raw[31] |= 0x0F;
        assert_eq!(CalibrationTable::decode(&raw), datasheet_table());
    }

    #[test]
    fn test_load() {
        let bus = SimulatedBus::new();
        bus.add_chip(1, 0x76, SimulatedChip::new());
        let mut channel = bus.open(1, 0x76).unwrap();
        assert_eq!(CalibrationTable::load(&mut channel).unwrap(), datasheet_table());
    }

    #[test]
    fn test_load_without_device() {
        let bus = SimulatedBus::new();
        let mut channel = bus.open(1, 0x77).unwrap();
        assert_eq!(CalibrationTable::load(&mut channel), Err(BusError::Nack));
    }
}
