use crate::enums::{IbMtu, IbRate};
use crate::mad::helpers::{bitfield, wire_bytes};
use crate::mad::{IB_LID_UCAST_END, IB_LID_UCAST_START, IB_PORT_CAP_IS_SM};

// LinkWidthActive
pub const IB_LINK_WIDTH_ACTIVE_1X: u8 = 1;
pub const IB_LINK_WIDTH_ACTIVE_4X: u8 = 2;
pub const IB_LINK_WIDTH_ACTIVE_8X: u8 = 4;
pub const IB_LINK_WIDTH_ACTIVE_12X: u8 = 8;

// LinkSpeedActive
pub const IB_LINK_SPEED_ACTIVE_2_5: u8 = 1;
pub const IB_LINK_SPEED_ACTIVE_5: u8 = 2;
pub const IB_LINK_SPEED_ACTIVE_10: u8 = 4;

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub struct port_info {
    pub data: [u8; 64],
}

wire_bytes!(port_info);

impl Default for port_info {
    fn default() -> Self {
        port_info { data: [0; 64] }
    }
}

impl port_info {
    bitfield!(lid,                     set_lid,                     128, 16, u16);
    bitfield!(master_sm_lid,           set_master_sm_lid,           144, 16, u16);
    bitfield!(capability_mask,         set_capability_mask,         160, 32, u32);
    bitfield!(local_portnum,           set_local_portnum,           224,  8, u8 );
    bitfield!(link_width_enabled,      set_link_width_enabled,      232,  8, u8 );
    bitfield!(link_width_supported,    set_link_width_supported,    240,  8, u8 );
    bitfield!(link_width_active,       set_link_width_active,       248,  8, u8 );
    bitfield!(link_speed_supported,    set_link_speed_supported,    256,  4, u8 );
    bitfield!(port_state,              set_port_state,              260,  4, u8 );
    bitfield!(port_physical_state,     set_port_physical_state,     264,  4, u8 );
    bitfield!(lmc,                     set_lmc,                     277,  3, u8 );
    bitfield!(link_speed_active,       set_link_speed_active,       280,  4, u8 );
    bitfield!(link_speed_enabled,      set_link_speed_enabled,      284,  4, u8 );
    bitfield!(neighbor_mtu,            set_neighbor_mtu,            288,  4, u8 );
    bitfield!(mtu_cap,                 set_mtu_cap,                 332,  4, u8 );
    bitfield!(client_register,         set_client_register,         408,  1, u8 );

    pub fn is_sm(&self) -> bool {
        self.capability_mask() & IB_PORT_CAP_IS_SM != 0
    }

    pub fn mtu(&self) -> Option<IbMtu> {
        IbMtu::try_from(self.mtu_cap()).ok()
    }

    /// Static rate of the link from the active speed and width, 2.5 Gb/s
    /// when either is unrecognised.
    pub fn compute_rate(&self) -> IbRate {
        let width = self.link_width_active();
        match self.link_speed_active() {
            IB_LINK_SPEED_ACTIVE_2_5 => match width {
                IB_LINK_WIDTH_ACTIVE_4X => IbRate::Rate10,
                IB_LINK_WIDTH_ACTIVE_8X => IbRate::Rate20,
                IB_LINK_WIDTH_ACTIVE_12X => IbRate::Rate30,
                _ => IbRate::Rate2_5,
            },
            IB_LINK_SPEED_ACTIVE_5 => match width {
                IB_LINK_WIDTH_ACTIVE_1X => IbRate::Rate5,
                IB_LINK_WIDTH_ACTIVE_4X => IbRate::Rate20,
                IB_LINK_WIDTH_ACTIVE_8X => IbRate::Rate40,
                IB_LINK_WIDTH_ACTIVE_12X => IbRate::Rate60,
                _ => IbRate::Rate2_5,
            },
            IB_LINK_SPEED_ACTIVE_10 => match width {
                IB_LINK_WIDTH_ACTIVE_1X => IbRate::Rate10,
                IB_LINK_WIDTH_ACTIVE_4X => IbRate::Rate40,
                IB_LINK_WIDTH_ACTIVE_8X => IbRate::Rate80,
                IB_LINK_WIDTH_ACTIVE_12X => IbRate::Rate120,
                _ => IbRate::Rate2_5,
            },
            _ => IbRate::Rate2_5,
        }
    }

    /// Zeroes a base LID outside the unicast range. Returns the rejected LID
    /// when it was non-zero.
    pub fn trim_base_lid(&mut self) -> Option<u16> {
        let lid = self.lid();
        if (IB_LID_UCAST_START..=IB_LID_UCAST_END).contains(&lid) {
            return None;
        }
        self.set_lid(0);
        if lid != 0 { Some(lid) } else { None }
    }
}
