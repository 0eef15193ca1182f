#![allow(dead_code)]

use freewheel::sans::check::compute_crc;

/// Base type codes.
pub const ENUM: u8 = 0x00;
pub const UINT8: u8 = 0x02;
pub const SINT16: u8 = 0x83;
pub const UINT16: u8 = 0x84;
pub const SINT32: u8 = 0x85;
pub const UINT32: u8 = 0x86;
pub const STRING: u8 = 0x07;
pub const UINT16Z: u8 = 0x8B;
pub const BYTE: u8 = 0x0D;

/// How the trailing checksum of a built document is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trailer {
    Valid,
    Zero,
    Corrupt,
}

/// Builder of FIT documents for tests.
#[derive(Debug, Clone)]
pub struct Fit {
    long_header: bool,
    header_crc: Option<u16>,
    data_size: Option<u32>,
    trailer: Trailer,
    records: Vec<u8>,
}

impl Fit {
    pub fn new() -> Self {
        Self {
            long_header: true,
            header_crc: None,
            data_size: None,
            trailer: Trailer::Valid,
            records: vec![],
        }
    }

    pub fn short_header(mut self) -> Self {
        self.long_header = false;
        self
    }

    /// Write a fixed header checksum instead of the correct one.
    pub fn header_crc(mut self, crc: u16) -> Self {
        self.header_crc = Some(crc);
        self
    }

    /// Declare a record section size other than the actual one.
    pub fn data_size(mut self, size: u32) -> Self {
        self.data_size = Some(size);
        self
    }

    pub fn trailer(mut self, trailer: Trailer) -> Self {
        self.trailer = trailer;
        self
    }

    /// A little-endian definition record of `(number, size, base type)` fields.
    pub fn definition(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_with(local, 0, global.to_le_bytes(), fields, None)
    }

    /// A big-endian definition record.
    pub fn definition_be(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_with(local, 1, global.to_be_bytes(), fields, None)
    }

    /// A definition record with `(number, size, developer index)` developer
    /// fields.
    pub fn developer_definition(
        self,
        local: u8,
        global: u16,
        fields: &[(u8, u8, u8)],
        developer_fields: &[(u8, u8, u8)],
    ) -> Self {
        self.definition_with(local, 0, global.to_le_bytes(), fields, Some(developer_fields))
    }

    fn definition_with(
        mut self,
        local: u8,
        architecture: u8,
        global: [u8; 2],
        fields: &[(u8, u8, u8)],
        developer_fields: Option<&[(u8, u8, u8)]>,
    ) -> Self {
        let flag = if developer_fields.is_some() { 0x60 } else { 0x40 };
        self.records.extend([flag | local, 0, architecture]);
        self.records.extend(global);
        self.records.push(fields.len() as u8);
        for &(number, size, base_type) in fields {
            self.records.extend([number, size, base_type]);
        }
        if let Some(developer_fields) = developer_fields {
            self.records.push(developer_fields.len() as u8);
            for &(number, size, index) in developer_fields {
                self.records.extend([number, size, index]);
            }
        }
        self
    }

    /// A data record with a normal header.
    pub fn data(mut self, local: u8, body: &[u8]) -> Self {
        self.records.push(local);
        self.records.extend_from_slice(body);
        self
    }

    /// A data record with a compressed timestamp header.
    pub fn compressed(mut self, local: u8, time_offset: u8, body: &[u8]) -> Self {
        self.records.push(0x80 | (local << 5) | (time_offset & 0x1F));
        self.records.extend_from_slice(body);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let size = self.data_size.unwrap_or(self.records.len() as u32);

        let mut out = vec![if self.long_header { 14 } else { 12 }, 0x20];
        out.extend(2132u16.to_le_bytes());
        out.extend(size.to_le_bytes());
        out.extend(b".FIT");
        if self.long_header {
            let crc = self.header_crc.unwrap_or_else(|| compute_crc(0, &out));
            out.extend(crc.to_le_bytes());
        }

        out.extend_from_slice(&self.records);

        let crc = match self.trailer {
            Trailer::Valid => compute_crc(0, &out),
            Trailer::Zero => 0,
            Trailer::Corrupt => compute_crc(0, &out) ^ 0x5A5A,
        };
        out.extend(crc.to_le_bytes());
        out
    }
}

/// A short activity: a file_id, three heart rate records (one of them without
/// a reading) and two records with compressed timestamps.
pub fn activity() -> Vec<u8> {
    let mut fit = Fit::new()
        .definition(0, 0, &[(0, 1, ENUM), (4, 4, UINT32)])
        .data(0, &[4, 0x00, 0xCA, 0x9A, 0x3B])
        .definition(1, 20, &[(253, 4, UINT32), (3, 1, UINT8)]);

    for (i, heart_rate) in [(0u32, 121u8), (1, 0xFF), (2, 123)] {
        let mut body = (1_000_000_000 + i).to_le_bytes().to_vec();
        body.push(heart_rate);
        fit = fit.data(1, &body);
    }

    fit.definition(2, 20, &[(3, 1, UINT8)])
        .compressed(2, 3, &[124])
        .compressed(2, 4, &[125])
        .build()
}
