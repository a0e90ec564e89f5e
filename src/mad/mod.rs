pub mod dr_smp;
pub mod helpers;
pub mod node;
pub mod port;
pub mod sminfo;
pub mod switch;
pub mod tables;
pub mod types;

pub use dr_smp::{build_dr_resp, build_dr_smp, dr_smp_mad};
pub use node::node_info;
pub use port::port_info;
pub use sminfo::sm_info;
pub use switch::switch_info;
pub use tables::{lft_block, pkey_table};
pub use types::ib_mad;

pub const IB_MGMT_CLASS_LID_ROUTED_SMP: u8 = 0x1;
pub const IB_MGMT_CLASS_DIRECT_ROUTED_SMP: u8 = 0x81;

pub const IB_SMP_DATA_SIZE: usize = 64;

/// MAD status without the DR direction bit.
pub const IB_SMP_STATUS_MASK: u16 = 0x7fff;
/// Status code 7, "invalid value in attribute or modifier".
pub const IB_SMP_STATUS_INVALID_FIELD: u16 = 0x1c;

pub const IB_PORT_CAP_IS_SM: u32 = 0x0000_0002;

pub const IB_LID_UCAST_START: u16 = 0x0001;
pub const IB_LID_UCAST_END: u16 = 0xbfff;

pub const IB_NUM_PKEY_ELEMENTS_IN_BLOCK: usize = 32;
pub const IB_PKEY_BASE_MASK: u16 = 0x7fff;
pub const IB_PKEY_FULL_MEMBER: u16 = 0x8000;

pub const IB_LFT_BLOCK_SIZE: usize = 64;
pub const IB_LFT_NO_PATH: u8 = 0xff;
