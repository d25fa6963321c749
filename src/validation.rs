//! Declarative field schema for emission records

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{
    config::ValidationConfig,
    errors::FieldError,
    models::{EmissionRecord, Imo},
};

/// Raw submitted form values keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData(BTreeMap<String, String>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.0.insert(field.to_string(), value.into());
    }

    /// Value of `field`, with blank input treated as absent
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Integer { min: i64, max: i64 },
    Text { max_length: usize },
    Decimal {
        max_digits: usize,
        decimal_places: Option<usize>,
        min: f64,
    },
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

pub const EMISSION_FIELDS: [FieldSpec; 6] = [
    FieldSpec {
        name: "imo",
        label: "IMO Number",
        kind: FieldKind::Integer {
            min: Imo::MIN,
            max: Imo::MAX,
        },
        required: true,
    },
    FieldSpec {
        name: "ship_name",
        label: "Ship Name",
        kind: FieldKind::Text { max_length: 64 },
        required: true,
    },
    FieldSpec {
        name: "type",
        label: "Ship Type",
        kind: FieldKind::Text { max_length: 64 },
        required: true,
    },
    FieldSpec {
        name: "technical_efficiency_number",
        label: "EEDI",
        kind: FieldKind::Decimal {
            max_digits: 6,
            decimal_places: None,
            min: 0.0,
        },
        required: false,
    },
    FieldSpec {
        name: "issue",
        label: "Issue Date",
        kind: FieldKind::Date,
        required: true,
    },
    FieldSpec {
        name: "expiry",
        label: "Expiry Date",
        kind: FieldKind::Date,
        required: true,
    },
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Integer(i64),
    Text(String),
    Decimal(f64),
    Date(NaiveDate),
}

fn check_field(spec: &FieldSpec, raw: Option<&str>) -> Result<Option<Value>, FieldError> {
    let Some(raw) = raw else {
        if spec.required {
            return Err(FieldError::new(spec.name, "This field is required."));
        }
        return Ok(None);
    };

    let value = match spec.kind {
        FieldKind::Integer { min, max } => {
            let n: i64 = raw
                .parse()
                .map_err(|_| FieldError::new(spec.name, "Enter a whole number."))?;
            if n < min {
                return Err(FieldError::new(
                    spec.name,
                    format!("Ensure this value is greater than or equal to {min}."),
                ));
            }
            if n > max {
                return Err(FieldError::new(
                    spec.name,
                    format!("Ensure this value is less than or equal to {max}."),
                ));
            }
            Value::Integer(n)
        }
        FieldKind::Text { max_length } => {
            let len = raw.chars().count();
            if len > max_length {
                return Err(FieldError::new(
                    spec.name,
                    format!("Ensure this value has at most {max_length} characters (it has {len})."),
                ));
            }
            Value::Text(raw.to_string())
        }
        FieldKind::Decimal {
            max_digits,
            decimal_places,
            min,
        } => {
            let n = parse_decimal(raw)
                .ok_or_else(|| FieldError::new(spec.name, "Enter a number."))?;
            check_digits(spec.name, raw, max_digits, decimal_places)?;
            if n < min {
                return Err(FieldError::new(
                    spec.name,
                    format!("Ensure this value is greater than or equal to {min}."),
                ));
            }
            Value::Decimal(n)
        }
        FieldKind::Date => {
            let date = DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .ok_or_else(|| FieldError::new(spec.name, "Enter a valid date."))?;
            Value::Date(date)
        }
    };
    Ok(Some(value))
}

fn parse_decimal(raw: &str) -> Option<f64> {
    let valid = !raw.is_empty()
        && raw
            .trim_start_matches(['-', '+'])
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.')
        && raw.matches('.').count() <= 1;
    if !valid {
        return None;
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn check_digits(
    field: &'static str,
    raw: &str,
    max_digits: usize,
    decimal_places: Option<usize>,
) -> Result<(), FieldError> {
    let unsigned = raw.trim_start_matches(['-', '+']);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let whole = whole.trim_start_matches('0').len();
    let fraction = fraction.trim_end_matches('0').len();

    if whole + fraction > max_digits {
        return Err(FieldError::new(
            field,
            format!("Ensure that there are no more than {max_digits} digits in total."),
        ));
    }
    let Some(places) = decimal_places else {
        return Ok(());
    };
    if fraction > places {
        return Err(FieldError::new(
            field,
            format!("Ensure that there are no more than {places} decimal places."),
        ));
    }
    if whole > max_digits - places {
        return Err(FieldError::new(
            field,
            format!(
                "Ensure that there are no more than {} digits before the decimal point.",
                max_digits - places
            ),
        ));
    }
    Ok(())
}

/// Check `form` against [`EMISSION_FIELDS`] and build the typed record.
///
/// Every field is checked; all failures are reported together.
pub fn validate(
    form: &FormData,
    config: &ValidationConfig,
) -> Result<EmissionRecord, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut values: BTreeMap<&'static str, Value> = BTreeMap::new();

    for spec in EMISSION_FIELDS.iter() {
        match check_field(spec, form.get(spec.name)) {
            Ok(Some(value)) => {
                values.insert(spec.name, value);
            }
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }

    let record = match (
        values.remove("imo"),
        values.remove("ship_name"),
        values.remove("type"),
        values.remove("technical_efficiency_number"),
        values.remove("issue"),
        values.remove("expiry"),
    ) {
        (
            Some(Value::Integer(imo)),
            Some(Value::Text(ship_name)),
            Some(Value::Text(ship_type)),
            eedi,
            Some(Value::Date(issue)),
            Some(Value::Date(expiry)),
        ) if errors.is_empty() => {
            let imo = match Imo::try_from(imo) {
                Ok(imo) => imo,
                Err(e) => return Err(vec![FieldError::new("imo", e.to_string())]),
            };
            EmissionRecord {
                imo,
                ship_name,
                ship_type,
                technical_efficiency_number: match eedi {
                    Some(Value::Decimal(n)) => Some(n),
                    _ => None,
                },
                issue,
                expiry,
            }
        }
        _ => return Err(errors),
    };

    if config.require_issue_before_expiry && record.issue >= record.expiry {
        return Err(vec![FieldError::new(
            "expiry",
            "Expiry date must be after the issue date.",
        )]);
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> FormData {
        FormData::new()
            .with("imo", "9267560")
            .with("ship_name", "SUULA")
            .with("type", "Bulk carrier")
            .with("technical_efficiency_number", "4.52")
            .with("issue", "2019-06-01")
            .with("expiry", "2024-06-01")
    }

    fn fields(errors: &[FieldError]) -> Vec<&'static str> {
        errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn accepts_valid_form() {
        let record = validate(&valid_form(), &ValidationConfig::default()).unwrap();
        assert_eq!(record.imo.value(), 9_267_560);
        assert_eq!(record.ship_type, "Bulk carrier");
        assert_eq!(record.technical_efficiency_number, Some(4.52));
        assert_eq!(record.issue, NaiveDate::from_ymd_opt(2019, 6, 1).unwrap());
    }

    #[test]
    fn blank_optional_field_is_none() {
        let form = valid_form().with("technical_efficiency_number", "  ");
        let record = validate(&form, &ValidationConfig::default()).unwrap();
        assert_eq!(record.technical_efficiency_number, None);
    }

    #[test]
    fn imo_out_of_range() {
        let errors = validate(
            &valid_form().with("imo", "1000000"),
            &ValidationConfig::default(),
        )
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["imo"]);
        assert!(errors[0].message.contains("1111111"));

        let errors = validate(
            &valid_form().with("imo", "10000000"),
            &ValidationConfig::default(),
        )
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["imo"]);
    }

    #[test]
    fn reports_every_failing_field() {
        let form = FormData::new()
            .with("imo", "abc")
            .with("ship_name", "x".repeat(65))
            .with("technical_efficiency_number", "-1")
            .with("issue", "2019-13-01");
        let errors = validate(&form, &ValidationConfig::default()).unwrap_err();
        assert_eq!(
            fields(&errors),
            vec![
                "imo",
                "ship_name",
                "type",
                "technical_efficiency_number",
                "issue",
                "expiry"
            ]
        );
    }

    #[test]
    fn decimal_digit_limits() {
        let config = ValidationConfig::default();
        let eedi = |raw: &str| validate(&valid_form().with("technical_efficiency_number", raw), &config);
        assert!(eedi("9999.99").is_ok());
        assert!(eedi("999999").is_ok());
        assert!(eedi("1000000").is_err());
        assert!(eedi("1234.567").is_err());
        assert!(eedi("1.2300").is_ok());
        assert!(eedi("1e3").is_err());
    }

    #[test]
    fn eedi_has_no_fixed_scale() {
        let record = validate(
            &valid_form().with("technical_efficiency_number", "4.125"),
            &ValidationConfig::default(),
        )
        .unwrap();
        assert_eq!(record.technical_efficiency_number, Some(4.125));
        assert!(validate(
            &valid_form().with("technical_efficiency_number", "0.12345"),
            &ValidationConfig::default()
        )
        .is_ok());
    }

    #[test]
    fn fixed_scale_limits_decimal_places() {
        let spec = FieldSpec {
            name: "amount",
            label: "Amount",
            kind: FieldKind::Decimal {
                max_digits: 6,
                decimal_places: Some(2),
                min: 0.0,
            },
            required: true,
        };
        assert_eq!(
            check_field(&spec, Some("12.5")),
            Ok(Some(Value::Decimal(12.5)))
        );
        let err = check_field(&spec, Some("1.234")).unwrap_err();
        assert_eq!(err.message, "Ensure that there are no more than 2 decimal places.");
        assert!(check_field(&spec, Some("12345.6")).is_err());
    }

    #[test]
    fn issue_must_precede_expiry() {
        let form = valid_form().with("expiry", "2019-06-01");
        let errors = validate(&form, &ValidationConfig::default()).unwrap_err();
        assert_eq!(fields(&errors), vec!["expiry"]);

        let relaxed = ValidationConfig {
            require_issue_before_expiry: false,
        };
        assert!(validate(&form, &relaxed).is_ok());
    }

    #[test]
    fn accepts_us_date_format() {
        let form = valid_form().with("issue", "06/01/2019");
        let record = validate(&form, &ValidationConfig::default()).unwrap();
        assert_eq!(record.issue, NaiveDate::from_ymd_opt(2019, 6, 1).unwrap());
    }
}
