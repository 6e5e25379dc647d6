// Start of file: /src/utils/json.rs

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer};
use anyhow::Result;

// Convert any `Serialize` type into a two-space-indented JSON string.
pub fn to_two_space_indented_json<T: Serialize>(value: &T) -> Result<String> {
    let mut writer: Vec<u8> = Vec::new();
    let formatter: PrettyFormatter<'_> = PrettyFormatter::with_indent(b"  ");
    let mut ser: Serializer<&mut Vec<u8>, PrettyFormatter<'_>> =
        Serializer::with_formatter(&mut writer, formatter);

    value.serialize(&mut ser)?;

    Ok(String::from_utf8(writer)?)
}

// End of file: /src/utils/json.rs
