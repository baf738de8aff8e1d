use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::Value;

/// Per-section TOML config loading. Sections are optional; a missing one
/// falls back to defaults with a warning.
pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> Self {
        match section {
            Some(value) => value.clone().try_into().expect("cannot deserialize config"),
            None => {
                warn!("config section not found");
                Self::default()
            }
        }
    }
}

/// `[sim]` section of a run config file. Every field overrides the matching
/// value from the topology's inline `simulation` section.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RunOverrides {
    pub algorithms: Option<Vec<String>>,
    pub cycles: Option<u64>,
    pub seed: Option<u64>,
    pub out_prefix: Option<String>,
}

impl Config for RunOverrides {}

#[cfg(test)]
mod tests {
    use super::*;
    use toml::Table;

    #[test]
    fn sim_section_overrides_parse() {
        let table: Table = toml::from_str(
            r#"
            [sim]
            algorithms = ["ipact", "limited"]
            cycles = 200
            seed = 7
            out_prefix = "out/run1"
            "#,
        )
        .unwrap();
        let overrides = RunOverrides::from_section(table.get("sim"));
        assert_eq!(
            overrides.algorithms,
            Some(vec!["ipact".to_string(), "limited".to_string()])
        );
        assert_eq!(overrides.cycles, Some(200));
        assert_eq!(overrides.seed, Some(7));
        assert_eq!(overrides.out_prefix.as_deref(), Some("out/run1"));
    }

    #[test]
    fn missing_section_yields_defaults() {
        let table: Table = toml::from_str("").unwrap();
        let overrides = RunOverrides::from_section(table.get("sim"));
        assert!(overrides.algorithms.is_none());
        assert!(overrides.cycles.is_none());
    }
}
