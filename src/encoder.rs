//! Attribute file encoder

use crate::attribute::{Attribute, AttributeTable};
use crate::error::Result;

/// Encodes attribute tables into the tab separated file format
pub struct Encoder {
    // Currently stateless, but reserved for future options
}

impl Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self {}
    }

    /// Encode a table to a string
    pub fn encode(&self, table: &AttributeTable) -> String {
        let mut output = String::new();

        for attr in table {
            self.encode_attribute(&mut output, attr);
        }

        output
    }

    /// Encode a single record: name, tab, value, newline
    fn encode_attribute(&self, output: &mut String, attr: &Attribute) {
        // The format has no escaping; these bytes will not survive a re-read.
        if has_structural_bytes(&attr.name) || has_structural_bytes(&attr.value) {
            tracing::warn!(
                name = %attr.name,
                "attribute contains tab, carriage return or newline and will not round-trip"
            );
        }

        output.push_str(&attr.name);
        output.push('\t');
        output.push_str(&attr.value);
        output.push('\n');
    }

    /// Encode a table directly to a writer
    pub fn encode_to_writer<W: std::io::Write>(&self, table: &AttributeTable, mut writer: W) -> Result<()> {
        let encoded = self.encode(table);
        writer
            .write_all(encoded.as_bytes())
            .map_err(|e| crate::error::Error::file_io(format!("Failed to write {}", table.kind()), e))?;
        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

fn has_structural_bytes(field: &str) -> bool {
    field.bytes().any(|b| matches!(b, b'\t' | b'\r' | b'\n'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeKind;
    use crate::decoder::Decoder;

    fn table(kind: AttributeKind, pairs: &[(&str, &str)]) -> AttributeTable {
        let mut table = AttributeTable::new(kind);
        for (name, value) in pairs {
            table.push(Attribute::new(*name, *value));
        }
        table
    }

    #[test]
    fn test_encode_records() {
        let t = table(AttributeKind::Manifest, &[("Name", "LM358"), ("Package", "DIP-8")]);
        assert_eq!(Encoder::new().encode(&t), "Name\tLM358\nPackage\tDIP-8\n");
    }

    #[test]
    fn test_encode_empty_table() {
        let t = AttributeTable::new(AttributeKind::Parameters);
        assert_eq!(Encoder::new().encode(&t).len(), 0);
    }

    #[test]
    fn test_encode_empty_value() {
        let t = table(AttributeKind::Parameters, &[("Notes", "")]);
        assert_eq!(Encoder::new().encode(&t), "Notes\t\n");
    }

    #[test]
    fn test_round_trip_preserves_order_and_duplicates() {
        let t = table(
            AttributeKind::Parameters,
            &[
                ("Vcc", "3V to 32V"),
                ("Channels", "2"),
                ("Vcc", "duplicate"),
                ("Temperature Range", "0°C to 70°C"),
                ("Empty", ""),
            ],
        );

        let encoded = Encoder::new().encode(&t);
        let mut decoded = AttributeTable::new(AttributeKind::Parameters);
        Decoder::new().decode_into(encoded.as_bytes(), &mut decoded).unwrap();

        assert_eq!(decoded, t);
        assert_eq!(Encoder::new().encode(&decoded), encoded);
    }

    #[test]
    fn test_encode_to_writer() {
        let t = table(AttributeKind::Manifest, &[("Name", "NE555")]);
        let mut out = Vec::new();
        Encoder::new().encode_to_writer(&t, &mut out).unwrap();
        assert_eq!(out, b"Name\tNE555\n");
    }
}
