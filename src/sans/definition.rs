//! Definition records and the table of active definitions.

use alloc::vec::Vec;

use zerocopy::FromBytes;

use super::{
    cursor::{Cursor, Endian, Truncated},
    data::BaseType,
};

/// Number of local message types addressable by a record header.
pub const LOCAL_MESSAGE_TYPES: usize = 16;

/// Layout of one field in a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    pub number: u8,
    /// Size of the field in bytes.
    pub size: u8,
    pub base_type: BaseType,
}

/// Layout of one developer field in a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeveloperFieldDefinition {
    pub number: u8,
    pub size: u8,
    pub developer_index: u8,
}

/// Layout of the data records bound to a local message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDefinition {
    pub local: u8,
    pub global: u16,
    pub endian: Endian,
    pub fields: Vec<FieldDefinition>,
    pub developer_fields: Vec<DeveloperFieldDefinition>,
}

#[repr(C, packed)]
#[derive(Debug, FromBytes)]
struct DefinitionMessage {
    _reserved: u8,
    architecture: u8,
    global_message: [u8; 2],
    fields: u8,
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct FieldHeader {
    field: u8,
    size: u8,
    base_type: u8,
}

impl MessageDefinition {
    /// Decode the body of a definition record, following its header byte.
    pub fn decode(local: u8, developer: bool, c: &mut Cursor<'_>) -> Result<Self, Truncated> {
        let DefinitionMessage {
            architecture,
            global_message,
            fields,
            ..
        } = zerocopy::transmute!(c.read_array::<5>()?);

        let endian = Endian::from_architecture(architecture);
        let global = match endian {
            Endian::Little => u16::from_le_bytes(global_message),
            Endian::Big => u16::from_be_bytes(global_message),
        };

        let fields = (0..fields)
            .map(|_| -> Result<_, Truncated> {
                let FieldHeader {
                    field,
                    size,
                    base_type,
                } = zerocopy::transmute!(c.read_array::<3>()?);

                Ok(FieldDefinition {
                    number: field,
                    size,
                    base_type: BaseType::from_code(base_type),
                })
            })
            .collect::<Result<Vec<_>, Truncated>>()?;

        let developer_fields = if developer {
            let count = c.read_u8()?;
            (0..count)
                .map(|_| -> Result<_, Truncated> {
                    let [number, size, developer_index] = c.read_array()?;
                    Ok(DeveloperFieldDefinition {
                        number,
                        size,
                        developer_index,
                    })
                })
                .collect::<Result<Vec<_>, Truncated>>()?
        } else {
            Vec::new()
        };

        Ok(Self {
            local,
            global,
            endian,
            fields,
            developer_fields,
        })
    }

    /// Number of bytes in a data record body using this definition.
    pub fn data_size(&self) -> usize {
        let fields: usize = self.fields.iter().map(|f| f.size as usize).sum();
        let developer: usize = self.developer_fields.iter().map(|f| f.size as usize).sum();
        fields + developer
    }
}

/// Active definitions, indexed by local message type.
///
/// Definitions are replaced whenever a new definition record names the same
/// local message type.
#[derive(Debug, Default)]
pub struct Registry {
    slots: [Option<MessageDefinition>; LOCAL_MESSAGE_TYPES],
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a definition in its local message type's slot, returning the
    /// definition it replaced.
    pub fn define(&mut self, definition: MessageDefinition) -> Option<MessageDefinition> {
        let slot = &mut self.slots[definition.local as usize % LOCAL_MESSAGE_TYPES];
        slot.replace(definition)
    }

    pub fn lookup(&self, local: u8) -> Option<&MessageDefinition> {
        self.slots.get(local as usize)?.as_ref()
    }

    /// Forget all definitions, as at the start of a document.
    pub fn clear(&mut self) {
        self.slots = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn decodes_big_endian_definition() {
        let body = [0, 1, 0x00, 0x14, 2, 253, 4, 0x86, 3, 1, 0x02];
        let mut c = Cursor::new(&body);
        let d = MessageDefinition::decode(4, false, &mut c).unwrap();
        assert_eq!(d.global, 20);
        assert_eq!(d.endian, Endian::Big);
        assert_eq!(
            d.fields,
            vec![
                FieldDefinition {
                    number: 253,
                    size: 4,
                    base_type: BaseType::UInt32
                },
                FieldDefinition {
                    number: 3,
                    size: 1,
                    base_type: BaseType::UInt8
                },
            ]
        );
        assert_eq!(d.data_size(), 5);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn decodes_developer_fields() {
        let body = [0, 0, 20, 0, 1, 3, 1, 0x02, 1, 0, 2, 0];
        let mut c = Cursor::new(&body);
        let d = MessageDefinition::decode(0, true, &mut c).unwrap();
        assert_eq!(
            d.developer_fields,
            vec![DeveloperFieldDefinition {
                number: 0,
                size: 2,
                developer_index: 0
            }]
        );
        assert_eq!(d.data_size(), 3);
    }

    #[test]
    fn truncated_definition() {
        let body = [0, 0, 20, 0, 2, 3, 1, 0x02];
        let mut c = Cursor::new(&body);
        assert_eq!(
            MessageDefinition::decode(0, false, &mut c),
            Err(Truncated {
                offset: 8,
                needed: 3
            })
        );
    }

    #[test]
    fn redefinition_replaces_slot() {
        let mut registry = Registry::new();
        let first = MessageDefinition {
            local: 1,
            global: 0,
            endian: Endian::Little,
            fields: vec![],
            developer_fields: vec![],
        };
        let second = MessageDefinition {
            global: 20,
            ..first.clone()
        };

        assert!(registry.define(first.clone()).is_none());
        assert_eq!(registry.define(second), Some(first));
        assert_eq!(registry.lookup(1).map(|d| d.global), Some(20));
        assert!(registry.lookup(0).is_none());
        assert!(registry.lookup(200).is_none());

        registry.clear();
        assert!(registry.lookup(1).is_none());
    }
}
