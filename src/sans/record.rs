//! Decoding of individual records.

use alloc::vec::Vec;

use either::Either::{self, Left, Right};
use tracing::{trace, warn};

use super::{
    cursor::Cursor,
    data::{BaseType, DataField, DataRecord, DeveloperField, Value},
    definition::{MessageDefinition, Registry},
    error::DecodeError,
    header::{RecordHeader, RecordKind},
};

/// Field number of the `timestamp` field, shared by all messages.
pub const TIMESTAMP_FIELD: u8 = 253;

/// Decodes one record at a time, keeping the definitions and timestamp
/// state a document accumulates.
#[derive(Debug, Default)]
pub struct RecordDecoder {
    registry: Registry,
    last_timestamp: Option<u32>,
}

impl RecordDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active definitions.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Forget all state, as at the start of a document.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.last_timestamp = None;
    }

    /// Decode the record at the cursor.
    ///
    /// Returns the local message type of a definition record, or a data
    /// record. Non-fatal conditions met while decoding a data record are
    /// appended to `warnings`.
    ///
    /// Decoding is transactional: on error the decoder's state is unchanged,
    /// so a record cut short by the end of the available input can be
    /// retried once more input arrives. The cursor's position is then
    /// unspecified.
    pub fn decode(
        &mut self,
        c: &mut Cursor<'_>,
        warnings: &mut Vec<DecodeError>,
    ) -> Result<Either<u8, DataRecord>, DecodeError> {
        let start = c.offset();
        let RecordHeader { local, kind } = RecordHeader::parse(c.read_u8()?);

        let time_offset = match kind {
            RecordKind::Definition { developer } => {
                let definition = MessageDefinition::decode(local, developer, c)?;
                trace!(
                    local,
                    global = definition.global,
                    fields = definition.fields.len(),
                    developer_fields = definition.developer_fields.len(),
                    "definition"
                );
                self.registry.define(definition);
                return Ok(Left(local));
            }
            RecordKind::Data => None,
            RecordKind::CompressedTimestamp { time_offset } => Some(time_offset),
        };

        let definition = self
            .registry
            .lookup(local)
            .ok_or(DecodeError::UndefinedMessageType {
                local,
                offset: start,
            })?;

        let mut record_warnings = Vec::new();
        let record = decode_data(definition, time_offset, c, &mut record_warnings)?;

        let record = self.resolve_timestamp(record);
        warnings.append(&mut record_warnings);

        Ok(Right(record))
    }

    fn resolve_timestamp(&mut self, mut record: DataRecord) -> DataRecord {
        if let Some(offset) = record.time_offset {
            record.timestamp = self
                .last_timestamp
                .map(|last| last.wrapping_add(u32::from(offset).wrapping_sub(last) & 0x1F));
        } else if let Some(Value::UInt32(timestamp)) = record.field(TIMESTAMP_FIELD) {
            record.timestamp = Some(*timestamp);
        }

        if record.timestamp.is_some() {
            self.last_timestamp = record.timestamp;
        }

        record
    }
}

fn decode_data(
    definition: &MessageDefinition,
    time_offset: Option<u8>,
    c: &mut Cursor<'_>,
    warnings: &mut Vec<DecodeError>,
) -> Result<DataRecord, DecodeError> {
    let global = definition.global;

    let mut fields = Vec::with_capacity(definition.fields.len());
    for f in &definition.fields {
        let value = match Value::decode(c, f.base_type, f.size, definition.endian)? {
            Some(value) => value,
            None => {
                let warning = match f.base_type {
                    BaseType::Unknown(base_type) => DecodeError::UnsupportedBaseType {
                        global,
                        field: f.number,
                        base_type,
                    },
                    base_type => DecodeError::InvalidFieldSize {
                        global,
                        field: f.number,
                        size: f.size,
                        base_type: base_type.code(),
                    },
                };
                warn!(%warning, "field decoded as absent");
                warnings.push(warning);
                Value::Absent
            }
        };

        fields.push(DataField {
            number: f.number,
            value,
        });
    }

    let developer_fields = definition
        .developer_fields
        .iter()
        .map(|f| -> Result<_, DecodeError> {
            Ok(DeveloperField {
                developer_index: f.developer_index,
                number: f.number,
                bytes: c.read_bytes(f.size as usize)?.to_vec(),
            })
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;

    Ok(DataRecord {
        local: definition.local,
        global,
        time_offset,
        timestamp: None,
        fields,
        developer_fields,
    })
}
