//! Summaries of the devices described by `device_info` records.

use alloc::{collections::BTreeMap, vec::Vec};

use tracing::warn;

use crate::{
    avec::FromValue,
    profile::{device_info, message},
    sans::{DataRecord, Value},
};

/// How a device other than the creator is told apart from the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DeviceKey {
    AntDeviceNumber(u16),
    SerialNumber(u32),
}

impl DeviceKey {
    fn of(record: &DataRecord) -> Option<Self> {
        let field = |number| record.field(number);

        field(device_info::ANT_DEVICE_NUMBER)
            .and_then(u16::from_value)
            .map(Self::AntDeviceNumber)
            .or_else(|| {
                field(device_info::SERIAL_NUMBER)
                    .and_then(u32::from_value)
                    .map(Self::SerialNumber)
            })
    }
}

/// The fields describing a device, merged across its `device_info` records.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Device {
    pub key: Option<DeviceKey>,
    /// Timestamp of the record the fields were last merged from.
    pub timestamp: Option<u32>,
    pub fields: BTreeMap<u8, Value>,
}

impl Device {
    pub fn new(record: &DataRecord) -> Self {
        let mut device = Self::default();
        device.merge(record);
        device
    }

    pub fn field(&self, number: u8) -> Option<&Value> {
        self.fields.get(&number)
    }

    /// Merge the fields of a record, unless it is older than the fields held.
    pub fn extend(&mut self, record: &DataRecord) {
        let newer = match (self.timestamp, record.timestamp) {
            (Some(held), Some(other)) => held < other,
            (None, _) => true,
            (Some(_), None) => false,
        };

        if newer {
            self.merge(record);
        }
    }

    fn merge(&mut self, record: &DataRecord) {
        self.timestamp = record.timestamp.or(self.timestamp);
        self.key = DeviceKey::of(record).or(self.key);
        self.fields.extend(
            record
                .fields
                .iter()
                .filter(|f| !f.value.is_absent())
                .map(|f| (f.number, f.value.clone())),
        );
    }
}

/// Collect the creator device and the other devices from a file's records.
///
/// Records other than `device_info` are ignored. Other devices are keyed by
/// ANT device number or, failing that, serial number, and are returned in
/// order of first appearance; records with neither are skipped.
pub fn extract_devices(records: impl IntoIterator<Item = DataRecord>) -> (Device, Vec<Device>) {
    let mut creator = Device::default();
    let mut devices: Vec<Device> = Vec::new();

    for record in records
        .into_iter()
        .filter(|r| r.global == message::DEVICE_INFO)
    {
        let index = record
            .field(device_info::DEVICE_INDEX)
            .and_then(u8::from_value);

        if index == Some(device_info::CREATOR) {
            creator.extend(&record);
            continue;
        }

        let Some(key) = DeviceKey::of(&record) else {
            warn!(
                device_index = ?index,
                timestamp = ?record.timestamp,
                "device_info without ant_device_number or serial_number"
            );
            continue;
        };

        match devices.iter_mut().find(|d| d.key == Some(key)) {
            Some(device) => device.extend(&record),
            None => devices.push(Device::new(&record)),
        }
    }

    (creator, devices)
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec};

    use super::*;
    use crate::sans::DataField;

    fn device_info(timestamp: u32, fields: &[(u8, Value)]) -> DataRecord {
        DataRecord {
            local: 1,
            global: message::DEVICE_INFO,
            time_offset: None,
            timestamp: Some(timestamp),
            fields: fields
                .iter()
                .map(|(number, value)| DataField {
                    number: *number,
                    value: value.clone(),
                })
                .collect(),
            developer_fields: vec![],
        }
    }

    #[test]
    fn creator_and_keyed_devices() {
        let records = vec![
            device_info(
                10,
                &[
                    (0, Value::UInt8(0)),
                    (2, Value::UInt16(1)),
                    (5, Value::UInt16(1010)),
                ],
            ),
            device_info(10, &[(0, Value::UInt8(1)), (21, Value::UInt16z(4321))]),
            device_info(10, &[(0, Value::UInt8(2)), (3, Value::UInt32z(99))]),
            device_info(20, &[(0, Value::UInt8(0)), (5, Value::UInt16(1020))]),
            device_info(
                30,
                &[
                    (0, Value::UInt8(1)),
                    (21, Value::UInt16z(4321)),
                    (4, Value::UInt16(7)),
                ],
            ),
        ];

        let (creator, devices) = extract_devices(records);

        assert_eq!(creator.timestamp, Some(20));
        assert_eq!(creator.field(5), Some(&Value::UInt16(1020)));
        assert_eq!(creator.field(2), Some(&Value::UInt16(1)));

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].key, Some(DeviceKey::AntDeviceNumber(4321)));
        assert_eq!(devices[0].field(4), Some(&Value::UInt16(7)));
        assert_eq!(devices[1].key, Some(DeviceKey::SerialNumber(99)));
    }

    #[test]
    fn older_records_do_not_override() {
        let mut device = Device::new(&device_info(
            50,
            &[(21, Value::UInt16z(1)), (5, Value::UInt16(2))],
        ));
        device.extend(&device_info(40, &[(21, Value::UInt16z(1)), (5, Value::UInt16(1))]));
        assert_eq!(device.field(5), Some(&Value::UInt16(2)));
        assert_eq!(device.timestamp, Some(50));
    }

    #[test]
    fn unkeyed_and_unrelated_records_are_skipped() {
        let mut other = device_info(1, &[(27, Value::String("Edge".to_string()))]);
        other.global = message::RECORD;

        let (creator, devices) = extract_devices(vec![
            device_info(1, &[(0, Value::UInt8(3)), (2, Value::UInt16(1))]),
            other,
        ]);

        assert_eq!(creator, Device::default());
        assert!(devices.is_empty());
    }
}
