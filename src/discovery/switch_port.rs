//! Switch ports: link state drives topology changes and onward probing.

use crate::context::{MadContext, NodeInfoContext};
use crate::discovery::{Discovery, endport};
use crate::enums::{IbPortLinkLayerState, SmiAttrID};
use crate::mad::port_info;
use crate::subnet::{PortKey, Subnet};

/// What a switch port's link state means for discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkClass {
    Down,
    /// Init, Armed or Active: something is attached to probe.
    Live,
    Unknown,
}

pub fn classify(port_state: u8) -> LinkClass {
    match IbPortLinkLayerState::try_from(port_state) {
        Ok(IbPortLinkLayerState::Down) => LinkClass::Down,
        Ok(IbPortLinkLayerState::Init) | Ok(IbPortLinkLayerState::Armed) | Ok(IbPortLinkLayerState::Active) => {
            LinkClass::Live
        }
        _ => LinkClass::Unknown,
    }
}

pub(crate) fn process(d: &Discovery, subn: &mut Subnet, key: PortKey, pi: &port_info) {
    // Port 0 is the switch management port and has no physical link
    if key.port_num != 0 && !subn.in_sweep_hop_0 {
        probe_link(d, subn, key, pi);
    }

    if let Some(physp) = subn.physp_mut(key) {
        physp.set_port_info(pi);
    }

    if key.port_num == 0 {
        process_management_port(d, subn, key, pi);
    }
}

fn probe_link(d: &Discovery, subn: &mut Subnet, key: PortKey, pi: &port_info) {
    match classify(pi.port_state()) {
        LinkClass::Down => {
            if let Some(peer) = subn.unlink(key) {
                log::debug!(
                    "[pi_rcv] Unlinking local node 0x{:016x}, port {} and remote node 0x{:016x}, port {}",
                    key.node_guid,
                    key.port_num,
                    peer.node_guid,
                    peer.port_num
                );
            }
        }
        LinkClass::Live => {
            // The SMP came in through this port; its far side is already known
            if pi.local_portnum() == key.port_num {
                log::trace!("[pi_rcv] Skipping SMP responder port {}", pi.local_portnum());
                return;
            }

            let Some(physp) = subn.physp(key) else {
                return;
            };
            let path = physp.dr_path.extend(key.port_num);
            let ctx = MadContext::NodeInfo(NodeInfoContext { node_guid: key.node_guid, port_num: key.port_num });

            log::trace!("[pi_rcv] Probing port {} of 0x{:016x} via [{}]", key.port_num, key.node_guid, path);
            if let Err(e) = d.req.get(&path, SmiAttrID::NodeInfo, 0, ctx) {
                log::error!("[pi_rcv] ERR 0F02: Failure initiating NodeInfo request ({})", e);
            }
        }
        LinkClass::Unknown => {
            log::error!(
                "[pi_rcv] ERR 0F03: Unknown link state = {}, port = {}",
                pi.port_state(),
                pi.local_portnum()
            );
        }
    }
}

/// Port 0 already holds the full PortInfo image, whatever its state, so a
/// base port 0 needs nothing beyond the LID check.
fn process_management_port(d: &Discovery, subn: &mut Subnet, key: PortKey, pi: &port_info) {
    if let Some(physp) = subn.physp_mut(key) {
        if let Some(orig_lid) = physp.port_info.trim_base_lid() {
            log::error!("[pi_rcv] ERR 0F04: Invalid base LID 0x{:x} corrected", orig_lid);
        }
    }

    endport::process(d, subn, key, pi);
}
