#![allow(dead_code)]

//! In-memory dta writer used to build fixtures for every supported version.

pub const STRL: u16 = 32_768;
pub const DOUBLE: u16 = 65_526;
pub const FLOAT: u16 = 65_527;
pub const LONG: u16 = 65_528;
pub const INT: u16 = 65_529;
pub const BYTE: u16 = 65_530;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(&'static str),
    Strl(u64),
    Double(f64),
    Float(f32),
    Long(i32),
    Int(i16),
    Byte(i8),
}

#[derive(Debug, Clone)]
struct ColumnDef {
    name: String,
    tag: u16,
    format: String,
    value_label_set: String,
    label: String,
}

#[derive(Debug, Clone)]
struct StrlRecord {
    v: u32,
    o: u64,
    subtype: u8,
    payload: Vec<u8>,
}

/// Endian-aware byte sink.
struct Out {
    buf: Vec<u8>,
    big: bool,
}

macro_rules! put {
    ($name:ident, $ty:ty) => {
        fn $name(&mut self, value: $ty) {
            if self.big {
                self.buf.extend_from_slice(&value.to_be_bytes());
            } else {
                self.buf.extend_from_slice(&value.to_le_bytes());
            }
        }
    };
}

impl Out {
    put!(u16, u16);
    put!(u32, u32);
    put!(u64, u64);
    put!(i16, i16);
    put!(i32, i32);
    put!(f32, f32);
    put!(f64, f64);

    fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn padded(&mut self, text: &str, width: usize) {
        let bytes = text.as_bytes();
        let take = bytes.len().min(width);
        self.buf.extend_from_slice(&bytes[..take]);
        self.buf.resize(self.buf.len() + width - take, 0);
    }

    fn pos(&self) -> u64 {
        self.buf.len() as u64
    }

    fn patch_u64(&mut self, at: usize, value: u64) {
        let bytes = if self.big {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.buf[at..at + 8].copy_from_slice(&bytes);
    }
}

/// Builds a dta byte stream column by column and row by row.
#[derive(Debug, Clone)]
pub struct DtaBuilder {
    version: u16,
    big_endian: bool,
    label: String,
    timestamp: String,
    columns: Vec<ColumnDef>,
    rows: Vec<Vec<Cell>>,
    strls: Vec<StrlRecord>,
    value_labels: Vec<(String, Vec<(i32, String)>)>,
}

impl DtaBuilder {
    pub fn new(version: u16) -> Self {
        Self {
            version,
            big_endian: false,
            label: "synthetic dataset".into(),
            timestamp: " 1 Jan 2024 12:00".into(),
            columns: Vec::new(),
            rows: Vec::new(),
            strls: Vec::new(),
            value_labels: Vec::new(),
        }
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.into();
        self
    }

    pub fn column(self, name: &str, tag: u16, format: &str) -> Self {
        self.labelled_column(name, tag, format, "")
    }

    pub fn labelled_column(mut self, name: &str, tag: u16, format: &str, set: &str) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            tag,
            format: format.into(),
            value_label_set: set.into(),
            label: format!("{name} label"),
        });
        self
    }

    pub fn row(mut self, cells: Vec<Cell>) -> Self {
        assert_eq!(cells.len(), self.columns.len(), "row width mismatch");
        self.rows.push(cells);
        self
    }

    pub fn strl(mut self, v: u32, o: u64, text: &str) -> Self {
        let mut payload = text.as_bytes().to_vec();
        payload.push(0);
        self.strls.push(StrlRecord {
            v,
            o,
            subtype: 130,
            payload,
        });
        self
    }

    pub fn binary_strl(mut self, v: u32, o: u64, payload: &[u8]) -> Self {
        self.strls.push(StrlRecord {
            v,
            o,
            subtype: 129,
            payload: payload.to_vec(),
        });
        self
    }

    pub fn value_labels(mut self, name: &str, entries: &[(i32, &str)]) -> Self {
        self.value_labels.push((
            name.into(),
            entries
                .iter()
                .map(|(code, text)| (*code, (*text).to_string()))
                .collect(),
        ));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        match self.version {
            117 | 118 => self.build_tagged(),
            _ => self.build_legacy(),
        }
    }

    fn widths(&self) -> (usize, usize, usize, usize) {
        if matches!(self.version, 117 | 118) {
            (129, 57, 129, 321)
        } else {
            (33, 49, 33, 81)
        }
    }

    fn build_legacy(&self) -> Vec<u8> {
        let mut out = Out {
            buf: Vec::new(),
            big: self.big_endian,
        };
        let (name_w, format_w, set_w, label_w) = self.widths();
        out.u8(u8::try_from(self.version).expect("legacy version fits a byte"));
        out.u8(if self.big_endian { 1 } else { 2 });
        out.raw(&[1, 0]);
        out.u16(self.columns.len() as u16);
        out.u32(self.rows.len() as u32);
        out.padded(&self.label, 81);
        out.padded(&self.timestamp, 18);

        for column in &self.columns {
            out.u8(legacy_code(column.tag));
        }
        for column in &self.columns {
            out.padded(&column.name, name_w);
        }
        out.raw(&vec![0u8; 2 * (self.columns.len() + 1)]);
        for column in &self.columns {
            out.padded(&column.format, format_w);
        }
        if self.version != 114 {
            for column in &self.columns {
                out.padded(&column.value_label_set, set_w);
            }
        }
        for column in &self.columns {
            out.padded(&column.label, label_w);
        }
        // one characteristic record, then the terminator
        out.u8(1);
        out.i32(4);
        out.raw(b"char");
        out.u8(0);
        out.i32(0);

        self.write_rows(&mut out);

        for (name, entries) in &self.value_labels {
            let table = label_table(entries, self.big_endian);
            out.u32(table.len() as u32);
            out.padded(name, 33);
            out.raw(&[0, 0, 0]);
            out.raw(&table);
        }
        out.buf
    }

    fn build_tagged(&self) -> Vec<u8> {
        let mut out = Out {
            buf: Vec::new(),
            big: self.big_endian,
        };
        let (name_w, format_w, set_w, label_w) = self.widths();
        let k = self.columns.len();

        out.raw(b"<stata_dta><header><release>");
        out.raw(self.version.to_string().as_bytes());
        out.raw(b"</release><byteorder>");
        out.raw(if self.big_endian { b"MSF" } else { b"LSF" });
        out.raw(b"</byteorder><K>");
        out.u16(k as u16);
        out.raw(b"</K><N>");
        if self.version == 118 {
            out.u64(self.rows.len() as u64);
        } else {
            out.u32(self.rows.len() as u32);
        }
        out.raw(b"</N><label>");
        if self.version == 118 {
            out.u16(self.label.len() as u16);
        } else {
            out.u8(self.label.len() as u8);
        }
        out.raw(self.label.as_bytes());
        out.raw(b"</label><timestamp>");
        out.u8(self.timestamp.len() as u8);
        out.raw(self.timestamp.as_bytes());
        out.raw(b"</timestamp></header>");

        let map_tag = out.pos();
        out.raw(b"<map>");
        let map_slots = out.buf.len();
        for _ in 0..14 {
            out.u64(0);
        }
        out.raw(b"</map>");

        let mut offsets = vec![0, map_tag];

        offsets.push(out.pos());
        out.raw(b"<variable_types>");
        for column in &self.columns {
            out.u16(column.tag);
        }
        out.raw(b"</variable_types>");

        offsets.push(out.pos());
        out.raw(b"<varnames>");
        for column in &self.columns {
            out.padded(&column.name, name_w);
        }
        out.raw(b"</varnames>");

        offsets.push(out.pos());
        out.raw(b"<sortlist>");
        out.raw(&vec![0u8; 2 * (k + 1)]);
        out.raw(b"</sortlist>");

        offsets.push(out.pos());
        out.raw(b"<formats>");
        for column in &self.columns {
            out.padded(&column.format, format_w);
        }
        out.raw(b"</formats>");

        offsets.push(out.pos());
        out.raw(b"<value_label_names>");
        for column in &self.columns {
            out.padded(&column.value_label_set, set_w);
        }
        out.raw(b"</value_label_names>");

        offsets.push(out.pos());
        out.raw(b"<variable_labels>");
        for column in &self.columns {
            out.padded(&column.label, label_w);
        }
        out.raw(b"</variable_labels>");

        offsets.push(out.pos());
        out.raw(b"<characteristics></characteristics>");

        offsets.push(out.pos());
        out.raw(b"<data>");
        self.write_rows(&mut out);
        out.raw(b"</data>");

        offsets.push(out.pos());
        out.raw(b"<strls>");
        for record in &self.strls {
            out.raw(b"GSO");
            out.u32(record.v);
            out.u64(record.o);
            out.u8(record.subtype);
            out.u32(record.payload.len() as u32);
            out.raw(&record.payload);
        }
        out.raw(b"</strls>");

        offsets.push(out.pos());
        out.raw(b"<value_labels>");
        for (name, entries) in &self.value_labels {
            let table = label_table(entries, self.big_endian);
            out.raw(b"<lbl>");
            out.u32(table.len() as u32);
            out.padded(name, 129);
            out.raw(&[0, 0, 0]);
            out.raw(&table);
            out.raw(b"</lbl>");
        }
        out.raw(b"</value_labels>");

        offsets.push(out.pos());
        out.raw(b"</stata_dta>");
        offsets.push(out.pos());

        for (slot, offset) in offsets.into_iter().enumerate() {
            out.patch_u64(map_slots + slot * 8, offset);
        }
        out.buf
    }

    fn write_rows(&self, out: &mut Out) {
        for row in &self.rows {
            for (cell, column) in row.iter().zip(&self.columns) {
                match cell {
                    Cell::Text(text) => out.padded(text, usize::from(column.tag)),
                    Cell::Strl(key) => out.u64(*key),
                    Cell::Double(value) => out.f64(*value),
                    Cell::Float(value) => out.f32(*value),
                    Cell::Long(value) => out.i32(*value),
                    Cell::Int(value) => out.i16(*value),
                    Cell::Byte(value) => out.u8(value.to_ne_bytes()[0]),
                }
            }
        }
    }
}

fn legacy_code(tag: u16) -> u8 {
    match tag {
        BYTE => 251,
        INT => 252,
        LONG => 253,
        FLOAT => 254,
        DOUBLE => 255,
        width => u8::try_from(width).expect("legacy string width fits a byte"),
    }
}

fn label_table(entries: &[(i32, String)], big: bool) -> Vec<u8> {
    let mut text = Vec::new();
    let mut offsets = Vec::new();
    for (_, label) in entries {
        offsets.push(text.len() as u32);
        text.extend_from_slice(label.as_bytes());
        text.push(0);
    }
    let mut out = Out {
        buf: Vec::new(),
        big,
    };
    out.u32(entries.len() as u32);
    out.u32(text.len() as u32);
    for offset in offsets {
        out.u32(offset);
    }
    for (code, _) in entries {
        out.i32(*code);
    }
    out.raw(&text);
    out.buf
}
