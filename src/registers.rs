//! BME280 register map and the fixed measurement policy written after every reset.

/// Value of `REG_CHIP_ID` on a BME280 (a BMP280 answers 0x58).
pub const CHIP_ID: u8 = 0x60;

pub const REG_CALIB_00: u8 = 0x88;
pub const REG_CHIP_ID: u8 = 0xD0;
pub const REG_RESET: u8 = 0xE0;
pub const REG_CALIB_26: u8 = 0xE1;
pub const REG_CTRL_HUM: u8 = 0xF2;
pub const REG_STATUS: u8 = 0xF3;
pub const REG_CTRL_MEAS: u8 = 0xF4;
pub const REG_CONFIG: u8 = 0xF5;
pub const REG_DATA: u8 = 0xF7;

pub const RESET_COMMAND: u8 = 0xB6;

// set while NVM data is being copied to the image registers
pub const STATUS_IM_UPDATE: u8 = 0x01;

pub const CALIB_00_LEN: usize = 26;
pub const CALIB_26_LEN: usize = 8;
pub const CALIB_LEN: usize = CALIB_00_LEN + CALIB_26_LEN;
pub const DATA_LEN: usize = 8;

const OVERSAMPLING_X4: u8 = 0b011;
const MODE_NORMAL: u8 = 0b11;
const STANDBY_125MS: u8 = 0b010;
const FILTER_X16: u8 = 0b100;
const SPI3W_DISABLE: u8 = 0;

pub const CTRL_HUM_VALUE: u8 = OVERSAMPLING_X4;
pub const CTRL_MEAS_VALUE: u8 = (OVERSAMPLING_X4 << 5) | (OVERSAMPLING_X4 << 2) | MODE_NORMAL;
pub const CONFIG_VALUE: u8 = (STANDBY_125MS << 5) | (FILTER_X16 << 2) | SPI3W_DISABLE;

/// Register writes issued after reset, in order. ctrl_hum only takes effect after the
/// following ctrl_meas write.
pub const CONFIGURATION: [(u8, u8); 3] = [
    (REG_CTRL_HUM, CTRL_HUM_VALUE),
    (REG_CTRL_MEAS, CTRL_MEAS_VALUE),
    (REG_CONFIG, CONFIG_VALUE),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_values() {
        assert_eq!(CTRL_HUM_VALUE, 0x03);
        assert_eq!(CTRL_MEAS_VALUE, 0x6F);
        assert_eq!(CONFIG_VALUE, 0x50);
        assert_eq!(CALIB_LEN, 34);
    }
}
