use crate::mad::helpers::wire_bytes;

/// Common MAD header followed by the class-specific body.
#[derive(Debug, Copy, Clone)]
#[repr(C, packed)]
#[allow(non_camel_case_types)]
pub struct ib_mad {
    pub base_version: u8,
    pub mgmt_class: u8,
    pub class_version: u8,
    pub method: u8,
    pub status: u16,
    pub hop_ptr: u8,
    pub hop_cnt: u8,
    pub tid: u64,
    pub attr_id: u16,
    pub additional_status: u16,
    pub attr_mod: u32,
    pub data: [u8; 232],
}

wire_bytes!(ib_mad);

impl ib_mad {
    pub fn status_ho(&self) -> u16 {
        u16::from_be(self.status)
    }

    pub fn tid_ho(&self) -> u64 {
        u64::from_be(self.tid)
    }

    pub fn attr_id_ho(&self) -> u16 {
        u16::from_be(self.attr_id)
    }

    pub fn attr_mod_ho(&self) -> u32 {
        u32::from_be(self.attr_mod)
    }

    /// Directed route view of the body; `None` for a LID-routed MAD.
    pub fn dr_smp(&self) -> Option<crate::mad::dr_smp_mad> {
        if self.mgmt_class != crate::mad::IB_MGMT_CLASS_DIRECT_ROUTED_SMP {
            return None;
        }
        let body = self.data;
        crate::mad::dr_smp_mad::from_bytes(&body)
    }
}
