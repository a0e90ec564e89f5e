use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IbPortPhyState {
    Sleep = 1,
    Polling = 2,
    Disabled = 3,
    PortConfigurationTraining = 4,
    LinkUp = 5,
    LinkErrorRecovery = 6,
    PhyTest = 7,
}

impl TryFrom<u8> for IbPortPhyState {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(IbPortPhyState::Sleep),
            2 => Ok(IbPortPhyState::Polling),
            3 => Ok(IbPortPhyState::Disabled),
            4 => Ok(IbPortPhyState::PortConfigurationTraining),
            5 => Ok(IbPortPhyState::LinkUp),
            6 => Ok(IbPortPhyState::LinkErrorRecovery),
            7 => Ok(IbPortPhyState::PhyTest),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IbPortLinkLayerState {
    Nop = 0,
    Down = 1,
    Init = 2,
    Armed = 3,
    Active = 4,
    ActiveDeferred = 5,
}

impl TryFrom<u8> for IbPortLinkLayerState {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(IbPortLinkLayerState::Nop),
            1 => Ok(IbPortLinkLayerState::Down),
            2 => Ok(IbPortLinkLayerState::Init),
            3 => Ok(IbPortLinkLayerState::Armed),
            4 => Ok(IbPortLinkLayerState::Active),
            5 => Ok(IbPortLinkLayerState::ActiveDeferred),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IbNodeType {
    CA = 1,
    Switch = 2,
    Router = 3,
    Rnic = 4,
}

impl TryFrom<u8> for IbNodeType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(IbNodeType::CA),
            2 => Ok(IbNodeType::Switch),
            3 => Ok(IbNodeType::Router),
            4 => Ok(IbNodeType::Rnic),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Methods {
    Get = 0x01,
    Set = 0x02,
    GetResp = 0x81,
}

/// SMP attribute identifiers, host order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmiAttrID {
    NodeDesc = 0x10,
    NodeInfo = 0x11,
    SwitchInfo = 0x12,
    PortInfo = 0x15,
    PKeyTable = 0x16,
    LinearFwdTable = 0x19,
    SmInfo = 0x20,
}

impl TryFrom<u16> for SmiAttrID {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x10 => Ok(SmiAttrID::NodeDesc),
            0x11 => Ok(SmiAttrID::NodeInfo),
            0x12 => Ok(SmiAttrID::SwitchInfo),
            0x15 => Ok(SmiAttrID::PortInfo),
            0x16 => Ok(SmiAttrID::PKeyTable),
            0x19 => Ok(SmiAttrID::LinearFwdTable),
            0x20 => Ok(SmiAttrID::SmInfo),
            _ => Err(()),
        }
    }
}

/// PortInfo:MTUCap encoding. Declaration order is size order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IbMtu {
    Mtu256 = 1,
    Mtu512 = 2,
    Mtu1024 = 3,
    Mtu2048 = 4,
    Mtu4096 = 5,
}

impl TryFrom<u8> for IbMtu {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(IbMtu::Mtu256),
            2 => Ok(IbMtu::Mtu512),
            3 => Ok(IbMtu::Mtu1024),
            4 => Ok(IbMtu::Mtu2048),
            5 => Ok(IbMtu::Mtu4096),
            _ => Err(()),
        }
    }
}

/// PathRecord rate codes. The codes are not monotonic in bandwidth, so
/// ordering goes through `mbps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IbRate {
    Rate2_5 = 2,
    Rate10 = 3,
    Rate30 = 4,
    Rate5 = 5,
    Rate20 = 6,
    Rate40 = 7,
    Rate60 = 8,
    Rate80 = 9,
    Rate120 = 10,
}

impl IbRate {
    pub const MAX: IbRate = IbRate::Rate120;

    pub fn mbps(&self) -> u32 {
        match self {
            IbRate::Rate2_5 => 2_500,
            IbRate::Rate5 => 5_000,
            IbRate::Rate10 => 10_000,
            IbRate::Rate20 => 20_000,
            IbRate::Rate30 => 30_000,
            IbRate::Rate40 => 40_000,
            IbRate::Rate60 => 60_000,
            IbRate::Rate80 => 80_000,
            IbRate::Rate120 => 120_000,
        }
    }
}

impl PartialOrd for IbRate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IbRate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.mbps().cmp(&other.mbps())
    }
}
