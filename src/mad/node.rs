use crate::mad::helpers::wire_bytes;

/// NodeInfo as it sits on the wire; multi-byte fields are network order,
/// use the `_ho` accessors.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[allow(non_camel_case_types)]
pub struct node_info {
    pub base_version: u8,
    pub class_version: u8,
    pub node_type: u8,
    pub nports: u8,
    pub system_guid: u64,
    pub node_guid: u64,
    pub port_guid: u64,
    pub partition_cap: u16,
    pub device_id: u16,
    pub revision: u32,
    pub local_port: u8,
    pub vendor_id: [u8; 3],
    pub reserved: [u8; 24],
}

wire_bytes!(node_info);

impl node_info {
    pub fn node_guid_ho(&self) -> u64 {
        u64::from_be(self.node_guid)
    }

    pub fn port_guid_ho(&self) -> u64 {
        u64::from_be(self.port_guid)
    }

    pub fn partition_cap_ho(&self) -> u16 {
        u16::from_be(self.partition_cap)
    }

    pub fn vendor_id_ho(&self) -> u32 {
        let v = self.vendor_id;
        u32::from_be_bytes([0, v[0], v[1], v[2]])
    }
}
