#![cfg(feature = "std")]

use std::path::Path;

use csv::ReaderBuilder;
use freewheel::{
    avec::{FromRecord, FromRecords},
    sans::Value,
};

const PATH: &str = "fixtures/synthetic-ride.fit";
const GZ_PATH: &str = "fixtures/synthetic-ride.fit.gz";

#[test]
fn decode_slice_cycling() {
    let data = std::fs::read(PATH).unwrap();
    let mut validator = Validator::new(PATH);
    let warnings = freewheel::avec::decode_slice(&data, &mut validator).unwrap();
    assert!(warnings.is_empty(), "{warnings:?}");
    validator.finish();
}

#[test]
fn decode_reader_cycling() {
    let mut file = std::fs::File::open(PATH).unwrap();
    let mut validator = Validator::new(PATH);
    let warnings = freewheel::avec::decode_reader(&mut file, &mut validator).unwrap();
    assert!(warnings.is_empty(), "{warnings:?}");
    validator.finish();
}

#[test]
fn decode_reader_with_short_reads() {
    let data = std::fs::read(PATH).unwrap();
    let mut reader = Trickle {
        data: &data,
        reads: 0,
    };
    let mut validator = Validator::new(PATH);
    freewheel::avec::decode_reader(&mut reader, &mut validator).unwrap();
    validator.finish();
}

#[test]
fn decode_compressed_reader_cycling() {
    for path in [PATH, GZ_PATH] {
        let file = std::io::BufReader::new(std::fs::File::open(path).unwrap());
        let mut reader = freewheel::avec::reader::inflate(file).unwrap();
        let mut validator = Validator::new(PATH);
        freewheel::avec::decode_reader(&mut reader, &mut validator).unwrap();
        validator.finish();
    }
}

#[test]
fn inflate_keeps_reader_position() {
    let mut data = b"prefix".to_vec();
    data.extend(std::fs::read(PATH).unwrap());

    let mut cursor = std::io::Cursor::new(data);
    cursor.set_position(6);
    let reader = freewheel::avec::reader::inflate(cursor).unwrap();
    let records = freewheel::avec::reader::records(reader).map(Result::unwrap).count();
    assert_eq!(records, 41);
}

#[test]
fn reader_records_match_slice_records() {
    let data = std::fs::read(PATH).unwrap();
    let from_slice: Vec<_> = freewheel::sans::decode(&data).map(Result::unwrap).collect();
    let from_reader: Vec<_> = freewheel::avec::reader::records(data.as_slice())
        .map(Result::unwrap)
        .collect();
    assert_eq!(from_reader, from_slice);
}

#[test]
fn decode_slice_stops_at_fatal_errors() {
    let data = std::fs::read(PATH).unwrap();
    let mut validator = Validator::new(PATH);
    let err = freewheel::avec::decode_slice(&data[..data.len() - 3], &mut validator).unwrap_err();
    assert!(err.is_fatal());
    // Every record but the lap was published.
    assert_eq!(validator.1.len(), 1);
}

#[test]
fn coordinates_of_a_ride() {
    let data = std::fs::read(PATH).unwrap();
    let coordinates: Vec<_> = freewheel::sans::decode(&data)
        .filter_map(Result::ok)
        .filter_map(|r| r.coordinates())
        .collect();
    assert_eq!(coordinates.len(), 30);

    let start = coordinates[0];
    assert!(52.049_06 < start.latitude && start.latitude < 52.049_08);
    assert!(-1.089_7 < start.longitude && start.longitude < -1.089_5);
}

/// Reader returning at most five bytes at a time, interrupted every third
/// read.
struct Trickle<'a> {
    data: &'a [u8],
    reads: usize,
}

impl std::io::Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reads += 1;
        if self.reads % 3 == 0 {
            return Err(std::io::ErrorKind::Interrupted.into());
        }
        let n = buf.len().min(self.data.len()).min(5);
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

struct Validator(Vec<String>, Vec<Vec<String>>);

impl Validator {
    fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().with_extension("csv");

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_path(path)
            .unwrap();

        let expected: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|f| f.to_string()).collect())
            .collect();

        Self(vec![], expected)
    }

    fn finish(&self) {
        assert!(self.0.is_empty(), "unvisited fields {:?}", self.0);
        assert!(self.1.is_empty(), "{} records not decoded", self.1.len());
    }
}

impl FromRecords for Validator {
    fn add_record(&mut self, id: u16) -> Option<&mut dyn FromRecord> {
        assert!(self.0.is_empty(), "unvisited fields {:?}", self.0);
        self.0 = self.1.remove(0);
        assert_eq!(self.0.remove(0), id.to_string());
        Some(self)
    }
}

impl FromRecord for Validator {
    fn add_field(&mut self, field: u8, value: &Value) {
        assert_eq!(self.0.remove(0), field.to_string());
        for element in value.elements().filter(|e| !e.is_absent()) {
            assert_eq!(self.0.remove(0), display(element));
        }
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::Enum(v) | Value::UInt8(v) | Value::UInt8z(v) => v.to_string(),
        Value::SInt8(v) => v.to_string(),
        Value::SInt16(v) => v.to_string(),
        Value::UInt16(v) | Value::UInt16z(v) => v.to_string(),
        Value::SInt32(v) => v.to_string(),
        Value::UInt32(v) | Value::UInt32z(v) => v.to_string(),
        Value::SInt64(v) => v.to_string(),
        Value::UInt64(v) | Value::UInt64z(v) => v.to_string(),
        Value::Float32(v) => v.to_string(),
        Value::Float64(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => panic!("unexpected value {other:?}"),
    }
}
