//! Double-precision compensation formulas from the BME280 datasheet (section 8.1).
//!
//! The operation order follows the reference code term by term so results are reproducible
//! to the last bit. Don't "simplify" the arithmetic.

use crate::{CalibrationTable, RawSample};

/// A raw sample together with the calibration table of the chip that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub calibration: CalibrationTable,
    pub sample: RawSample,
}

impl Reading {
    pub fn new(calibration: CalibrationTable, sample: RawSample) -> Self {
        Self {
            calibration,
            sample,
        }
    }

    /// Fine temperature shared by the humidity and pressure formulas.
    pub fn t_fine(&self) -> f64 {
        let cal = &self.calibration;
        let adc_t = f64::from(self.sample.adc_t);
        let var1 = (adc_t / 16384.0 - f64::from(cal.t1) / 1024.0) * f64::from(cal.t2);
        let var2 = ((adc_t / 131072.0 - f64::from(cal.t1) / 8192.0)
            * (adc_t / 131072.0 - f64::from(cal.t1) / 8192.0))
            * f64::from(cal.t3);
        var1 + var2
    }

    /// Degrees Celsius.
    pub fn temperature(&self) -> f64 {
        self.t_fine() / 5120.0
    }

    /// Relative humidity in percent, clamped to `[0, 100]`.
    pub fn humidity(&self) -> f64 {
        let cal = &self.calibration;
        let mut var_h = self.t_fine() - 76800.0;
        var_h = (f64::from(self.sample.adc_h)
            - (f64::from(cal.h4) * 64.0 + f64::from(cal.h5) / 16384.0 * var_h))
            * (f64::from(cal.h2) / 65536.0
                * (1.0
                    + f64::from(cal.h6) / 67108864.0
                        * var_h
                        * (1.0 + f64::from(cal.h3) / 67108864.0 * var_h)));
        var_h = var_h * (1.0 - f64::from(cal.h1) * var_h / 524288.0);
        var_h.clamp(0.0, 100.0)
    }

    /// Pascal. Returns 0 if the calibration would make the formula divide by zero.
    pub fn pressure(&self) -> f64 {
        let cal = &self.calibration;
        let mut var1 = (self.t_fine() / 2.0) - 64000.0;
        let mut var2 = var1 * var1 * f64::from(cal.p6) / 32768.0;
        var2 = var2 + var1 * f64::from(cal.p5) * 2.0;
        var2 = (var2 / 4.0) + (f64::from(cal.p4) * 65536.0);
        var1 = (f64::from(cal.p3) * var1 * var1 / 524288.0 + f64::from(cal.p2) * var1) / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * f64::from(cal.p1);
        if var1 == 0.0 {
            return 0.0;
        }
        let mut p = 1048576.0 - f64::from(self.sample.adc_p);
        p = (p - (var2 / 4096.0)) * 6250.0 / var1;
        var1 = f64::from(cal.p9) * p * p / 2147483648.0;
        var2 = p * f64::from(cal.p8) / 32768.0;
        p + (var1 + var2 + f64::from(cal.p7)) / 16.0
    }
}
