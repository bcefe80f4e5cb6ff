//! Per-counter processing configuration
//!
//! The job receives its counters ("mostradores") as one comma-separated string. Each
//! identifier expands into an immutable configuration record built once per run.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::sync::Arc;

/// Category flags applied to every counter of a job; all enabled unless configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterFlags {
    pub include_refrigerated: bool,
    pub include_controlled_substances: bool,
    pub include_specialties: bool,
    pub include_generics: bool,
    pub include_medical_devices: bool,
    pub include_supplements: bool,
    pub include_dermatological: bool,
    pub include_otc: bool,
    pub include_ethical_patent: bool,
}

impl Default for CounterFlags {
    fn default() -> Self {
        Self {
            include_refrigerated: true,
            include_controlled_substances: true,
            include_specialties: true,
            include_generics: true,
            include_medical_devices: true,
            include_supplements: true,
            include_dermatological: true,
            include_otc: true,
            include_ethical_patent: true,
        }
    }
}

/// Defaults for the non-flag counter fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterDefaults {
    pub inventory_type: String,
    pub target_amount: f64,
    #[serde(flatten)]
    pub flags: CounterFlags,
}

impl Default for CounterDefaults {
    fn default() -> Self {
        Self {
            inventory_type: "SPP".to_string(),
            target_amount: 150_000.0,
            flags: CounterFlags::default(),
        }
    }
}

/// Processing configuration of one counter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounterConfig {
    #[serde(rename = "mostrador")]
    pub counter: String,
    #[serde(rename = "Tipo_invenadro")]
    pub inventory_type: String,
    #[serde(rename = "Monto_deseado")]
    pub target_amount: f64,
    #[serde(rename = "Incluye_Refrigerados", serialize_with = "yes_no")]
    pub include_refrigerated: bool,
    #[serde(rename = "Incluye_Psicotropicos", serialize_with = "yes_no")]
    pub include_controlled_substances: bool,
    #[serde(rename = "Incluye_Especialidades", serialize_with = "yes_no")]
    pub include_specialties: bool,
    #[serde(rename = "Incluye_Genericos", serialize_with = "yes_no")]
    pub include_generics: bool,
    #[serde(rename = "Incluye_Dispositivos_Medicos", serialize_with = "yes_no")]
    pub include_medical_devices: bool,
    #[serde(rename = "Incluye_Complementos_Alimenticios", serialize_with = "yes_no")]
    pub include_supplements: bool,
    #[serde(rename = "Incluye_Dermatologico", serialize_with = "yes_no")]
    pub include_dermatological: bool,
    #[serde(rename = "Incluye_OTC", serialize_with = "yes_no")]
    pub include_otc: bool,
    #[serde(rename = "Incluye_Etico_Patente", serialize_with = "yes_no")]
    pub include_ethical_patent: bool,
}

fn yes_no<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "S" } else { "N" })
}

impl CounterConfig {
    pub fn new(counter: impl Into<String>, defaults: &CounterDefaults) -> Self {
        let flags = defaults.flags;
        Self {
            counter: counter.into(),
            inventory_type: defaults.inventory_type.clone(),
            target_amount: defaults.target_amount,
            include_refrigerated: flags.include_refrigerated,
            include_controlled_substances: flags.include_controlled_substances,
            include_specialties: flags.include_specialties,
            include_generics: flags.include_generics,
            include_medical_devices: flags.include_medical_devices,
            include_supplements: flags.include_supplements,
            include_dermatological: flags.include_dermatological,
            include_otc: flags.include_otc,
            include_ethical_patent: flags.include_ethical_patent,
        }
    }
}

/// Split a counter list into identifiers: trimmed, empty entries dropped,
/// duplicates removed keeping the first occurrence
pub fn parse_counter_ids(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}

/// Build the shared, read-only counter configuration list
pub fn build_counter_configs(raw: &str, defaults: &CounterDefaults) -> Arc<[CounterConfig]> {
    parse_counter_ids(raw)
        .into_iter()
        .map(|id| CounterConfig::new(id, defaults))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_counter_ids() {
        assert_eq!(
            parse_counter_ids(" 7051602, 7051603 ,,7051602"),
            vec!["7051602".to_string(), "7051603".to_string()]
        );
        assert!(parse_counter_ids(" , ").is_empty());
    }

    #[test]
    fn test_counter_flags_default_enabled() {
        let configs = build_counter_configs("7051602", &CounterDefaults::default());
        assert_eq!(configs.len(), 1);
        let config = &configs[0];
        assert!(config.include_refrigerated);
        assert!(config.include_controlled_substances);
        assert!(config.include_ethical_patent);
        assert_eq!(config.inventory_type, "SPP");
        assert_eq!(config.target_amount, 150_000.0);
    }

    #[test]
    fn test_counter_config_serializes_with_legacy_names() {
        let mut defaults = CounterDefaults::default();
        defaults.flags.include_controlled_substances = false;
        let config = CounterConfig::new("7051602", &defaults);

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["mostrador"], json!("7051602"));
        assert_eq!(value["Incluye_Refrigerados"], json!("S"));
        assert_eq!(value["Incluye_Psicotropicos"], json!("N"));
        assert_eq!(value["Monto_deseado"], json!(150000.0));
    }

    #[test]
    fn test_counter_defaults_from_toml() {
        let defaults: CounterDefaults = toml::from_str(
            r#"
            target_amount = 90000.0
            include_refrigerated = false
            "#,
        )
        .unwrap();
        assert_eq!(defaults.inventory_type, "SPP");
        assert_eq!(defaults.target_amount, 90_000.0);
        assert!(!defaults.flags.include_refrigerated);
        assert!(defaults.flags.include_otc);
    }
}
