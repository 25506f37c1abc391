use super::input::LoadError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Tunable constants. Every field has a default, so a settings file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// A FIFO/LIFO lot whose remaining quantity is within this of zero is used up.
    pub lot_tolerance: Decimal,
    pub vat: VatAccounts,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            lot_tolerance: dec!(0.01),
            vat: VatAccounts::default(),
        }
    }
}

/// Accounts used for generated VAT postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VatAccounts {
    pub output: String,
    /// Output VAT on imports, used when the voucher is a customs declaration.
    pub output_customs: String,
    pub input: String,
    pub input_fixed_asset: String,
    pub fixed_asset_prefix: String,
    pub customs_voucher_type: String,
}

impl Default for VatAccounts {
    fn default() -> Self {
        VatAccounts {
            output: "33311".to_string(),
            output_customs: "33312".to_string(),
            input: "1331".to_string(),
            input_fixed_asset: "1332".to_string(),
            fixed_asset_prefix: "211".to_string(),
            customs_voucher_type: "TKHQ".to_string(),
        }
    }
}

impl Settings {
    /// Load from a JSON file, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, LoadError> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        let file = File::open(path)?;
        let settings: Settings = serde_json::from_reader(BufReader::new(file))?;
        if settings.lot_tolerance < Decimal::ZERO {
            return Err(LoadError::Malformed {
                source_name: path.display().to_string(),
                message: "lot_tolerance must not be negative".to_string(),
            });
        }
        log::debug!("settings loaded from {}: {:?}", path.display(), settings);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"vat": {"output": "3331"}}"#).unwrap();
        assert_eq!(settings.lot_tolerance, dec!(0.01));
        assert_eq!(settings.vat.output, "3331");
        assert_eq!(settings.vat.input, "1331");
    }

    #[test]
    fn tolerance_from_text() {
        let settings: Settings = serde_json::from_str(r#"{"lot_tolerance": "0.0001"}"#).unwrap();
        assert_eq!(settings.lot_tolerance, dec!(0.0001));
    }
}
