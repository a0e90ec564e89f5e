use crate::mad::helpers::{bitfield, wire_bytes};

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub struct switch_info {
    pub data: [u8; 64],
}

wire_bytes!(switch_info);

impl Default for switch_info {
    fn default() -> Self {
        switch_info { data: [0; 64] }
    }
}

impl switch_info {
    bitfield!(linear_fdb_cap,             set_linear_fdb_cap,              0, 16, u16);
    bitfield!(random_fdb_cap,             set_random_fdb_cap,             16, 16, u16);
    bitfield!(mcast_fdb_cap,              set_mcast_fdb_cap,              32, 16, u16);
    bitfield!(linear_fdb_top,             set_linear_fdb_top,             48, 16, u16);
    bitfield!(default_port,               set_default_port,               64,  8, u8 );
    bitfield!(lids_per_port,              set_lids_per_port,              96, 16, u16);
    bitfield!(enforce_cap,                set_enforce_cap,               112, 16, u16);
    bitfield!(inbound_enforcement_cap,    set_inbound_enforcement_cap,   128,  1, u8 );
    bitfield!(outbound_enforcement_cap,   set_outbound_enforcement_cap,  129,  1, u8 );
    bitfield!(enhanced_port0,             set_enhanced_port0,            132,  1, u8 );
}
