use crate::mad::helpers::{bitfield, wire_bytes};

pub const IB_SMINFO_STATE_NOTACTIVE: u8 = 0;
pub const IB_SMINFO_STATE_DISCOVERING: u8 = 1;
pub const IB_SMINFO_STATE_STANDBY: u8 = 2;
pub const IB_SMINFO_STATE_MASTER: u8 = 3;

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub struct sm_info {
    pub data: [u8; 64],
}

wire_bytes!(sm_info);

impl Default for sm_info {
    fn default() -> Self {
        sm_info { data: [0; 64] }
    }
}

impl sm_info {
    bitfield!(guid,       set_guid,         0, 64, u64);
    bitfield!(sm_key,     set_sm_key,      64, 64, u64);
    bitfield!(act_count,  set_act_count,  128, 32, u32);
    bitfield!(priority,   set_priority,   160,  4, u8 );
    bitfield!(sm_state,   set_sm_state,   164,  4, u8 );

    /// Priority in the high nibble, state in the low one.
    pub fn pri_state(&self) -> u8 {
        self.data[20]
    }
}
