//! Output serializers: JSON/XML with `"\t"` indent, CSV and Markdown with a
//! shared column set. Each takes a `Flat` collection and returns bytes for
//! a `Writer` to consume.

use crate::collections::Flat;
use crate::error::GopiumError;

const CSV_HEADER: [&str; 12] = [
    "Struct Name",
    "Struct Doc",
    "Struct Comment",
    "Field Name",
    "Field Type",
    "Field Size",
    "Field Align",
    "Field Tag",
    "Field Exported",
    "Field Embedded",
    "Field Doc",
    "Field Comment",
];

pub fn jsonb(flat: &Flat) -> Result<Vec<u8>, GopiumError> {
    let rows: Vec<_> = flat.structs().collect();
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, serde_json::ser::PrettyFormatter::with_indent(b"\t"));
    serde::Serialize::serialize(&rows, &mut ser)?;
    Ok(buf)
}

pub fn xmlb(flat: &Flat) -> Result<Vec<u8>, GopiumError> {
    #[derive(serde::Serialize)]
    #[serde(rename = "structs")]
    struct Root<'a> {
        #[serde(rename = "struct")]
        items: Vec<&'a crate::model::Struct>,
    }
    let root = Root { items: flat.structs().collect() };
    let mut xml = String::new();
    let mut ser = quick_xml::se::Serializer::new(&mut xml);
    ser.indent('\t', 1);
    serde::Serialize::serialize(&root, &mut ser).map_err(|e| GopiumError::Io(e.to_string()))?;
    Ok(xml.into_bytes())
}

pub fn csvb(flat: &Flat) -> Result<Vec<u8>, GopiumError> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(CSV_HEADER)?;
    for st in flat.structs() {
        for f in &st.fields {
            w.write_record([
                st.name.as_str(),
                &st.doc.join(" "),
                &st.comment.join(" "),
                f.name.as_str(),
                f.r#type.as_str(),
                &f.size.to_string(),
                &f.align.to_string(),
                f.tag.as_str(),
                &f.exported.to_string(),
                &f.embedded.to_string(),
                &f.doc.join(" "),
                &f.comment.join(" "),
            ])?;
        }
    }
    w.flush()?;
    w.into_inner().map_err(|e| GopiumError::Io(e.to_string()))
}

pub fn mdb(flat: &Flat) -> Result<Vec<u8>, GopiumError> {
    let mut out = String::new();
    out.push_str(&format!("| {} |\n", CSV_HEADER.join(" | ")));
    out.push_str(&format!("|{}|\n", CSV_HEADER.iter().map(|_| ":---:").collect::<Vec<_>>().join("|")));
    for st in flat.structs() {
        for f in &st.fields {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                st.name,
                st.doc.join(" "),
                st.comment.join(" "),
                f.name,
                f.r#type,
                f.size,
                f.align,
                f.tag,
                f.exported,
                f.embedded,
                f.doc.join(" "),
                f.comment.join(" "),
            ));
        }
    }
    Ok(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::Hierarchic;
    use crate::model::{Field, Struct};

    fn sample() -> Flat {
        let mut h = Hierarchic::new();
        h.insert(
            "a.rs",
            "id0",
            Struct {
                name: "Foo".into(),
                fields: vec![Field { name: "a".into(), r#type: "u8".into(), size: 1, align: 1, ..Default::default() }],
                ..Default::default()
            },
        );
        h.flatten()
    }

    #[test]
    fn jsonb_round_trips_through_struct() {
        let flat = sample();
        let bytes = jsonb(&flat).unwrap();
        let parsed: Vec<Struct> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Foo");
    }

    #[test]
    fn xmlb_is_indented_with_tabs() {
        let flat = sample();
        let bytes = xmlb(&flat).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.lines().any(|l| l.starts_with('\t')));
    }

    #[test]
    fn csvb_has_header_and_one_row_per_field() {
        let flat = sample();
        let bytes = csvb(&flat).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Struct Name,"));
        assert!(lines.next().unwrap().starts_with("Foo,"));
    }

    #[test]
    fn mdb_has_centered_separator_row() {
        let flat = sample();
        let bytes = mdb(&flat).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].contains(":---:"));
    }
}
