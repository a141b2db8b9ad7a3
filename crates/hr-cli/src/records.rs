//! Reading and writing JSON records.
//!
//! Input is either one JSON document (an object, or an array of objects) or
//! JSON lines. Output keeps the input's shape. Records are flat: nested
//! objects and arrays are rejected, except arrays of byte values, which
//! carry unencoded ciphertext and IVs.
//!
//! Every field is kept alongside its original JSON text. A field that comes
//! out of a command unchanged is written back with that text, so numbers
//! outside the `i64`/`u64` range or spelled `1.50` pass through exactly.

use crate::error::CliError;
use hr_redact::{FieldKey, FieldValue, Record};
use serde_json::value::{to_raw_value, RawValue};
use std::collections::BTreeMap;
use std::io::{BufRead, Read, Write};

/// Shape of the input, reproduced on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A single JSON object.
    Single,
    /// A JSON array of objects.
    Array,
    /// One JSON object per line.
    Lines,
}

/// Field name → original JSON text.
type RawFields = BTreeMap<String, Box<RawValue>>;

/// One input record as parsed, plus the text it was parsed from.
#[derive(Debug, Clone)]
struct Source {
    record: Record,
    raw: RawFields,
}

impl Source {
    /// Original text for `key`, if the field still holds its input value.
    fn unchanged(&self, key: &FieldKey, value: &FieldValue) -> Option<&RawValue> {
        match self.record.get(key.name()) {
            Some(original) if original == value => self.raw.get(key.name()).map(|r| &**r),
            _ => None,
        }
    }
}

/// Records read from one input, with the shape they came in.
#[derive(Debug, Clone)]
pub struct RecordBatch {
    pub shape: Shape,
    pub records: Vec<Record>,
    sources: Vec<Source>,
}

impl RecordBatch {
    pub fn new(shape: Shape, records: Vec<Record>) -> Self {
        Self {
            shape,
            records,
            sources: Vec::new(),
        }
    }

    /// A batch of `records` derived one-to-one from this batch's input.
    pub fn derive(&self, records: Vec<Record>) -> Self {
        Self {
            shape: self.shape,
            records,
            sources: self.sources.clone(),
        }
    }

    /// Parse a whole input.
    pub fn read<R: BufRead>(mut reader: R, jsonl: bool) -> Result<Self, CliError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;

        let items: Vec<(usize, &str)> = if jsonl {
            text.lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .collect()
        } else if text.trim_start().starts_with('[') {
            let items: Vec<&RawValue> =
                serde_json::from_str(&text).map_err(|e| input_error(0, e))?;
            items.into_iter().map(RawValue::get).enumerate().collect()
        } else {
            vec![(0, text.as_str())]
        };

        let shape = if jsonl {
            Shape::Lines
        } else if text.trim_start().starts_with('[') {
            Shape::Array
        } else {
            Shape::Single
        };

        let sources = items
            .into_iter()
            .map(|(index, item)| parse_source(index, item))
            .collect::<Result<Vec<_>, _>>()?;
        let records = sources.iter().map(|s| s.record.clone()).collect();

        Ok(Self {
            shape,
            records,
            sources,
        })
    }

    /// Write the batch in its shape. Keys are emitted in sorted order.
    pub fn write<W: Write>(&self, mut writer: W, pretty: bool) -> Result<(), CliError> {
        let objects = self
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| self.render(index, record))
            .collect::<Result<Vec<_>, _>>()?;

        match self.shape {
            Shape::Single => {
                for object in &objects {
                    write_json(&mut writer, object, pretty)?;
                    writeln!(writer)?;
                }
            }
            Shape::Array => {
                write_json(&mut writer, &objects, pretty)?;
                writeln!(writer)?;
            }
            Shape::Lines => {
                for object in &objects {
                    serde_json::to_writer(&mut writer, object)?;
                    writeln!(writer)?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn render(&self, index: usize, record: &Record) -> Result<RawFields, CliError> {
        let source = self.sources.get(index);
        record
            .iter()
            .map(|(key, value)| -> Result<(String, Box<RawValue>), CliError> {
                let raw = match source.and_then(|s| s.unchanged(key, value)) {
                    Some(raw) => raw.to_owned(),
                    None => to_raw_value(value)?,
                };
                Ok((key.name().to_string(), raw))
            })
            .collect()
    }
}

fn write_json<W: Write, T: serde::Serialize>(
    writer: &mut W,
    value: &T,
    pretty: bool,
) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(writer, value)?;
    } else {
        serde_json::to_writer(writer, value)?;
    }
    Ok(())
}

fn input_error(index: usize, err: impl std::fmt::Display) -> CliError {
    CliError::Input {
        index,
        message: err.to_string(),
    }
}

fn parse_source(index: usize, text: &str) -> Result<Source, CliError> {
    if !text.trim_start().starts_with('{') {
        return Err(input_error(index, "expected a JSON object"));
    }
    let raw: RawFields = serde_json::from_str(text).map_err(|e| input_error(index, e))?;

    let mut record = Record::new();
    for (name, value) in &raw {
        record.insert(name.as_str(), field_value(index, value)?);
    }
    Ok(Source { record, raw })
}

/// Convert one JSON value. Integers too large for `u64` are kept as their
/// decimal text so digests and ciphertexts see the exact number.
fn field_value(index: usize, raw: &RawValue) -> Result<FieldValue, CliError> {
    let text = raw.get();
    if is_wide_integer(text) {
        return Ok(FieldValue::Text(text.to_string()));
    }
    serde_json::from_str(text)
        .map_err(|e| input_error(index, format!("records must be flat ({})", e)))
}

fn is_wide_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && text.parse::<i64>().is_err()
        && text.parse::<u64>().is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hr_redact::{digest_value, Operation, Policy, Redactor, RedactorConfig};

    fn redact_text(input: &str, policy: Policy) -> String {
        let batch = RecordBatch::read(input.as_bytes(), false).unwrap();
        let redactor = Redactor::new(RedactorConfig::new(policy));
        let records = batch
            .records
            .iter()
            .map(|r| redactor.redact(r))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        let mut out = Vec::new();
        batch.derive(records).write(&mut out, false).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_read_single_object() {
        let input = br#"{"email": "george@example.com", "age": 25, "ok": true, "gone": null}"#;
        let batch = RecordBatch::read(&input[..], false).unwrap();

        assert_eq!(batch.shape, Shape::Single);
        let record = &batch.records[0];
        assert_eq!(record.get("email"), Some(&FieldValue::from("george@example.com")));
        assert_eq!(record.get("age"), Some(&FieldValue::Integer(25)));
        assert_eq!(record.get("ok"), Some(&FieldValue::Bool(true)));
        assert_eq!(record.get("gone"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_read_array_and_lines() {
        let array = br#"[{"a": 1}, {"b": 2}]"#;
        let batch = RecordBatch::read(&array[..], false).unwrap();
        assert_eq!(batch.shape, Shape::Array);
        assert_eq!(batch.records.len(), 2);

        let lines = b"{\"a\": 1}\n\n{\"b\": 2}\n";
        let batch = RecordBatch::read(&lines[..], true).unwrap();
        assert_eq!(batch.shape, Shape::Lines);
        assert_eq!(batch.records.len(), 2);
    }

    #[test]
    fn test_byte_arrays_are_bytes() {
        let input = br#"{"encrypted_ssn_iv": [1, 2, 255]}"#;
        let batch = RecordBatch::read(&input[..], false).unwrap();
        assert_eq!(
            batch.records[0].get("encrypted_ssn_iv"),
            Some(&FieldValue::Bytes(vec![1, 2, 255]))
        );
    }

    #[test]
    fn test_nested_rejected() {
        let input = br#"{"address": {"street": "22nd St"}}"#;
        let err = RecordBatch::read(&input[..], false).unwrap_err();
        assert!(matches!(err, CliError::Input { index: 0, .. }));

        let input = br#"[{"a": 1}, 7]"#;
        let err = RecordBatch::read(&input[..], false).unwrap_err();
        assert!(matches!(err, CliError::Input { index: 1, .. }));
    }

    #[test]
    fn test_unnamed_u64_max_passes_through() {
        let out = redact_text(
            r#"{"id": 18446744073709551615, "email": "a@b.c"}"#,
            Policy::new().with("email", Operation::Digest),
        );
        assert!(out.contains("\"id\":18446744073709551615"), "{}", out);
        assert!(out.contains("\"email_digest\""));
        assert!(!out.contains("\"email\":"));
    }

    #[test]
    fn test_unnamed_numbers_keep_their_text() {
        let out = redact_text(
            r#"{"wide": 123456789012345678901234567890, "price": 1.50, "ssn": "x"}"#,
            Policy::new().with("ssn", Operation::Remove),
        );
        assert_eq!(
            out,
            "{\"price\":1.50,\"wide\":123456789012345678901234567890}\n"
        );
    }

    #[test]
    fn test_wide_integer_digests_its_exact_text() {
        let literal = "123456789012345678901234567890";
        let out = redact_text(
            &format!("{{\"n\": {}}}", literal),
            Policy::new().with("n", Operation::Digest),
        );
        let expected = digest_value(&FieldValue::from(literal), "");
        assert_eq!(out, format!("{{\"n_digest\":\"{}\"}}\n", expected));
    }

    #[test]
    fn test_write_sorted_compact() {
        let record: Record = [("b", FieldValue::from(2)), ("a", FieldValue::from("x"))]
            .into_iter()
            .collect();
        let batch = RecordBatch::new(Shape::Single, vec![record]);

        let mut out = Vec::new();
        batch.write(&mut out, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"a\":\"x\",\"b\":2}\n");
    }

    #[test]
    fn test_write_lines() {
        let records = vec![
            [("a", 1)].into_iter().collect::<Record>(),
            [("a", 2)].into_iter().collect::<Record>(),
        ];
        let batch = RecordBatch::new(Shape::Lines, records);

        let mut out = Vec::new();
        batch.write(&mut out, true).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"a\":1}\n{\"a\":2}\n");
    }
}
