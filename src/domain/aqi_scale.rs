// EPA AQI scale - piecewise-linear breakpoint conversion for particulates
//
// Each segment maps a concentration band onto an AQI band. The result is
// truncated to an integer (legacy provider convention), and anything above
// the last breakpoint clamps to 500.

struct Segment {
    conc_lo: f64,
    conc_hi: f64,
    aqi_lo: f64,
    aqi_hi: f64,
}

const PM25_SEGMENTS: [Segment; 7] = [
    Segment { conc_lo: 0.0, conc_hi: 12.0, aqi_lo: 0.0, aqi_hi: 50.0 },
    Segment { conc_lo: 12.1, conc_hi: 35.4, aqi_lo: 51.0, aqi_hi: 100.0 },
    Segment { conc_lo: 35.5, conc_hi: 55.4, aqi_lo: 101.0, aqi_hi: 150.0 },
    Segment { conc_lo: 55.5, conc_hi: 150.4, aqi_lo: 151.0, aqi_hi: 200.0 },
    Segment { conc_lo: 150.5, conc_hi: 250.4, aqi_lo: 201.0, aqi_hi: 300.0 },
    Segment { conc_lo: 250.5, conc_hi: 350.4, aqi_lo: 301.0, aqi_hi: 400.0 },
    Segment { conc_lo: 350.5, conc_hi: 500.4, aqi_lo: 401.0, aqi_hi: 500.0 },
];

const PM10_SEGMENTS: [Segment; 7] = [
    Segment { conc_lo: 0.0, conc_hi: 54.0, aqi_lo: 0.0, aqi_hi: 50.0 },
    Segment { conc_lo: 55.0, conc_hi: 154.0, aqi_lo: 51.0, aqi_hi: 100.0 },
    Segment { conc_lo: 155.0, conc_hi: 254.0, aqi_lo: 101.0, aqi_hi: 150.0 },
    Segment { conc_lo: 255.0, conc_hi: 354.0, aqi_lo: 151.0, aqi_hi: 200.0 },
    Segment { conc_lo: 355.0, conc_hi: 424.0, aqi_lo: 201.0, aqi_hi: 300.0 },
    Segment { conc_lo: 425.0, conc_hi: 504.0, aqi_lo: 301.0, aqi_hi: 400.0 },
    Segment { conc_lo: 505.0, conc_hi: 604.0, aqi_lo: 401.0, aqi_hi: 500.0 },
];

fn concentration_to_aqi(value: f64, segments: &[Segment]) -> i32 {
    for seg in segments {
        if value <= seg.conc_hi {
            let slope = (seg.aqi_hi - seg.aqi_lo) / (seg.conc_hi - seg.conc_lo);
            return (slope * (value - seg.conc_lo) + seg.aqi_lo) as i32;
        }
    }
    500
}

/// Convert a PM2.5 concentration (µg/m³) to AQI.
pub fn pm25_to_aqi(concentration: f64) -> i32 {
    concentration_to_aqi(concentration, &PM25_SEGMENTS)
}

/// Convert a PM10 concentration (µg/m³) to AQI.
pub fn pm10_to_aqi(concentration: f64) -> i32 {
    concentration_to_aqi(concentration, &PM10_SEGMENTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pm25_breakpoint_exactness() {
        assert_eq!(pm25_to_aqi(12.0), 50);
        assert_eq!(pm25_to_aqi(35.4), 100);
        assert_eq!(pm25_to_aqi(500.4), 500);
    }

    #[test]
    fn test_pm25_clamps_above_scale() {
        assert_eq!(pm25_to_aqi(600.0), 500);
        assert_eq!(pm25_to_aqi(10_000.0), 500);
    }

    #[test]
    fn test_pm25_truncates_fractional_aqi() {
        // 20 µg/m³ falls in the 12.1..35.4 band: 51 + 49/23.3 * 7.9 = 67.61..
        assert_eq!(pm25_to_aqi(20.0), 67);
    }

    #[test]
    fn test_pm25_zero() {
        assert_eq!(pm25_to_aqi(0.0), 0);
    }

    #[test]
    fn test_pm10_breakpoints() {
        assert_eq!(pm10_to_aqi(54.0), 50);
        assert_eq!(pm10_to_aqi(154.0), 100);
        assert_eq!(pm10_to_aqi(604.0), 500);
        assert_eq!(pm10_to_aqi(900.0), 500);
    }
}
