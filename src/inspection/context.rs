//! Technical sheet builders
//!
//! Each discipline collects a few structured fields in the field form; they
//! are flattened into the single technical-context line embedded in the
//! prompt.

use crate::standards::Discipline;
use std::fmt;
use std::str::FromStr;

/// Structured technical sheet
#[derive(Debug, Clone, PartialEq)]
pub enum TechnicalContext {
    /// Static equipment (tanks, vessels)
    Mechanical {
        diameter_m: f64,
        height_m: f64,
        material: String,
        fluid: String,
    },
    Electrical {
        equipment: String,
        voltage: VoltageClass,
        load_amps: f64,
        condition: ElectricalCondition,
    },
    Welding {
        process: WeldingProcess,
        position: WeldPosition,
    },
    /// Free description for disciplines without a structured sheet
    FreeText(String),
}

impl TechnicalContext {
    /// Form defaults for a discipline
    pub fn defaults_for(discipline: Discipline) -> Self {
        match discipline {
            Discipline::Mechanical => Self::Mechanical {
                diameter_m: 15.0,
                height_m: 8.0,
                material: "ASTM A36 steel".to_string(),
                fluid: "Crude oil".to_string(),
            },
            Discipline::ElectricalPower => Self::Electrical {
                equipment: "Transformer".to_string(),
                voltage: VoltageClass::V110_220,
                load_amps: 100.0,
                condition: ElectricalCondition::HotSpot,
            },
            Discipline::WeldingStructure => Self::Welding {
                process: WeldingProcess::Smaw,
                position: WeldPosition::P1G,
            },
            Discipline::CorrosionCoatings | Discipline::SafetyHse => {
                Self::FreeText(String::new())
            }
        }
    }

    /// Prompt line
    pub fn render(&self) -> String {
        match self {
            Self::Mechanical {
                diameter_m,
                height_m,
                material,
                fluid,
            } => format!(
                "Static equipment. Dimensions: {}x{}m. Material: {}. Fluid: {}.",
                diameter_m, height_m, material, fluid
            ),
            Self::Electrical {
                equipment,
                voltage,
                load_amps,
                condition,
            } => format!(
                "Electrical equipment: {}. Voltage: {}. Load: {}A. Condition: {}.",
                equipment, voltage, load_amps, condition
            ),
            Self::Welding { process, position } => format!(
                "Weld inspection. Process: {}. Position: {}.",
                process, position
            ),
            Self::FreeText(text) => text.trim().to_string(),
        }
    }
}

impl fmt::Display for TechnicalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Declares a closed set of form choices with their display labels
macro_rules! form_choice {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|c| c.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        let options: Vec<_> = Self::ALL.iter().map(|c| c.label()).collect();
                        format!("'{}' is not one of: {}", wanted, options.join(", "))
                    })
            }
        }
    };
}

form_choice!(
    /// Nominal voltage class
    VoltageClass {
        V110_220 => "110/220V",
        V440 => "440V",
        KV13_8 => "13.8kV",
        KV115 => "115kV",
    }
);

form_choice!(
    /// Observed electrical symptom
    ElectricalCondition {
        HotSpot => "Hot spot",
        Noise => "Noise",
        Arcing => "Arcing",
    }
);

form_choice!(
    WeldingProcess {
        Smaw => "SMAW",
        Gtaw => "GTAW",
        Gmaw => "GMAW",
        Fcaw => "FCAW",
    }
);

form_choice!(
    /// Test position
    WeldPosition {
        P1G => "1G",
        P2G => "2G",
        P3G => "3G",
        P4G => "4G",
        P6G => "6G",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mechanical_defaults_render() {
        let ctx = TechnicalContext::defaults_for(Discipline::Mechanical);
        assert_eq!(
            ctx.render(),
            "Static equipment. Dimensions: 15x8m. Material: ASTM A36 steel. Fluid: Crude oil."
        );
    }

    #[test]
    fn test_electrical_render() {
        let ctx = TechnicalContext::Electrical {
            equipment: "Switchgear".to_string(),
            voltage: VoltageClass::KV13_8,
            load_amps: 250.5,
            condition: ElectricalCondition::Arcing,
        };
        assert_eq!(
            ctx.to_string(),
            "Electrical equipment: Switchgear. Voltage: 13.8kV. Load: 250.5A. Condition: Arcing."
        );
    }

    #[test]
    fn test_welding_render() {
        let ctx = TechnicalContext::Welding {
            process: WeldingProcess::Gtaw,
            position: WeldPosition::P6G,
        };
        assert_eq!(ctx.render(), "Weld inspection. Process: GTAW. Position: 6G.");
    }

    #[test]
    fn test_free_text_is_trimmed() {
        let ctx = TechnicalContext::FreeText("  Severe corrosion, marine environment \n".to_string());
        assert_eq!(ctx.render(), "Severe corrosion, marine environment");
        assert_eq!(
            TechnicalContext::defaults_for(Discipline::SafetyHse),
            TechnicalContext::FreeText(String::new())
        );
    }

    #[test]
    fn test_choice_parsing() {
        assert_eq!("fcaw".parse::<WeldingProcess>(), Ok(WeldingProcess::Fcaw));
        assert_eq!(" 13.8KV ".parse::<VoltageClass>(), Ok(VoltageClass::KV13_8));
        assert_eq!("hot spot".parse::<ElectricalCondition>(), Ok(ElectricalCondition::HotSpot));

        let err = "5G".parse::<WeldPosition>().unwrap_err();
        assert!(err.contains("1G, 2G, 3G, 4G, 6G"));
    }
}
