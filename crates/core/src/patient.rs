//! Patient records: form input, coercion and projection.
//!
//! Form submissions arrive as loosely typed text. Turning them into a stored record
//! never fails: every field has a fallback.
//!
//! | Field | Coercion |
//! |---|---|
//! | `nome_pac`, `tipo_sang` | missing → empty text |
//! | `data_nasc_pac` | `YYYY-MM-DD` (or RFC 3339) → timestamp; anything else → null |
//! | `peso_pac`, `alt_pac` | longest leading decimal literal; otherwise `0` |
//!
//! Reading goes the other way: a stored document is projected into a [`PatientView`]
//! whose birth date is the UTC calendar date formatted for an `<input type="date">`.

use crate::constants::{
    FIELD_BIRTH_DATE, FIELD_BLOOD_TYPE, FIELD_HEIGHT, FIELD_NAME, FIELD_WEIGHT,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use pacientes_store::{Document, FieldValue, Fields};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;

/// Raw patient fields as submitted by a form or JSON body.
///
/// Every field is optional. JSON numbers, booleans and nulls are accepted and turned
/// into their text form, so `{"peso_pac": 72.5}` and `peso_pac=72.5` are equivalent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PatientForm {
    #[serde(default, deserialize_with = "lenient_text")]
    pub nome_pac: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub data_nasc_pac: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub peso_pac: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub alt_pac: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tipo_sang: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientText;

    impl<'de> Visitor<'de> for LenientText {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number, boolean or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_owned()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            lenient_text(d)
        }
    }

    deserializer.deserialize_any(LenientText)
}

/// Parses the longest leading decimal literal of `input`, like a browser's
/// `parseFloat`, falling back to `0`.
///
/// Leading whitespace is skipped; trailing garbage is ignored (`"72.5kg"` is 72.5,
/// `"1,75"` is 1). Input with no leading number, or a result that is not finite,
/// yields `0`.
pub fn parse_number_lenient(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    match s[..end].parse::<f64>() {
        Ok(n) if n.is_finite() && n != 0.0 => n,
        _ => 0.0,
    }
}

/// Converts a submitted birth date into a timestamp.
///
/// `YYYY-MM-DD` becomes midnight UTC of that day; a full RFC 3339 date-time is kept
/// as that instant. Empty or unparseable input yields `None`.
pub fn parse_birth_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|midnight| Utc.from_utc_datetime(&midnight));
    }

    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Formats a timestamp as the `YYYY-MM-DD` value of an `<input type="date">`.
pub fn format_date_for_input(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

/// A fully coerced patient record, ready to be written.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPatient {
    pub name: String,
    pub birth_date: Option<DateTime<Utc>>,
    pub weight: f64,
    pub height: f64,
    pub blood_type: String,
}

impl NewPatient {
    /// Applies the coercion rules to a raw form. Never fails.
    pub fn from_form(form: &PatientForm) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let number = |value: &Option<String>| value.as_deref().map_or(0.0, parse_number_lenient);

        Self {
            name: text(&form.nome_pac),
            birth_date: form.data_nasc_pac.as_deref().and_then(parse_birth_date),
            weight: number(&form.peso_pac),
            height: number(&form.alt_pac),
            blood_type: text(&form.tipo_sang),
        }
    }

    /// The five patient fields as store values.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(FIELD_NAME.into(), FieldValue::Text(self.name.clone()));
        fields.insert(
            FIELD_BIRTH_DATE.into(),
            FieldValue::timestamp_or_null(self.birth_date),
        );
        fields.insert(FIELD_WEIGHT.into(), FieldValue::Number(self.weight));
        fields.insert(FIELD_HEIGHT.into(), FieldValue::Number(self.height));
        fields.insert(
            FIELD_BLOOD_TYPE.into(),
            FieldValue::Text(self.blood_type.clone()),
        );
        fields
    }
}

/// Display projection of a stored patient.
#[derive(Clone, Debug, PartialEq)]
pub struct PatientView {
    pub id: String,
    pub name: String,
    /// `YYYY-MM-DD`, or empty when no birth date is stored.
    pub birth_date: String,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub blood_type: String,
}

impl PatientView {
    pub fn weight_display(&self) -> String {
        display_number(self.weight)
    }

    pub fn height_display(&self) -> String {
        display_number(self.height)
    }
}

fn display_number(value: Option<f64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

impl From<&Document> for PatientView {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.to_string(),
            name: doc.text(FIELD_NAME).unwrap_or_default().to_string(),
            birth_date: doc
                .timestamp(FIELD_BIRTH_DATE)
                .map(format_date_for_input)
                .unwrap_or_default(),
            weight: doc.number(FIELD_WEIGHT),
            height: doc.number(FIELD_HEIGHT),
            blood_type: doc.text(FIELD_BLOOD_TYPE).unwrap_or_default().to_string(),
        }
    }
}
