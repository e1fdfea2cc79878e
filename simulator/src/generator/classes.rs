use radarcore::interface::Classification;
use std::f64::consts::TAU;

/// Car models the feed knows about and the radar class each one maps to.
pub const CAR_MODELS: &[(&str, Classification)] = &[
    ("HPD ARX-01c", Classification::A),
    ("HPD ARX-01g", Classification::A),
    ("Acura ARX-06", Classification::A),
    ("BMW M Hybrid V8", Classification::A),
    ("Cadillac V-Series.R", Classification::A),
    ("Porsche 963", Classification::A),
    ("Dallara P217", Classification::B),
    ("Ligier JS P217", Classification::B),
    ("Oreca 07", Classification::B),
    ("Aston Martin Vantage GT3", Classification::C),
    ("BMW M4 GT3", Classification::C),
    ("Corvette C8.R GT3", Classification::C),
    ("Ferrari 296 GT3", Classification::C),
    ("Ford Mustang GT3", Classification::C),
    ("Lamborghini Huracán GT3 EVO2", Classification::C),
    ("McLaren 720S GT3", Classification::C),
    ("Mercedes-AMG GT3", Classification::C),
    ("Porsche 911 GT3 R", Classification::C),
    ("Safety Car", Classification::Safety),
];

const MS_TO_KMH: f64 = 3.6;

pub fn classify_model(model: &str) -> Classification {
    CAR_MODELS
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, class)| *class)
        .unwrap_or(Classification::Unknown)
}

/// Sims disagree on heading units; anything past a full turn is taken as degrees.
pub fn normalize_heading(raw: f64) -> f64 {
    if raw.abs() > TAU {
        raw.to_radians()
    } else {
        raw
    }
}

pub fn speed_kmh(meters_per_second: f64) -> f64 {
    meters_per_second * MS_TO_KMH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_models_map_to_classes() {
        assert_eq!(classify_model("Porsche 963"), Classification::A);
        assert_eq!(classify_model("Oreca 07"), Classification::B);
        assert_eq!(classify_model("BMW M4 GT3"), Classification::C);
        assert_eq!(classify_model("Safety Car"), Classification::Safety);
        assert_eq!(classify_model("Mazda MX-5"), Classification::Unknown);
    }

    #[test]
    fn degree_headings_are_converted() {
        assert!((normalize_heading(180.0) - std::f64::consts::PI).abs() < 1e-12);
        assert_eq!(normalize_heading(1.5), 1.5);
    }

    #[test]
    fn speed_converts_to_kmh() {
        assert!((speed_kmh(50.0) - 180.0).abs() < 1e-9);
    }
}
