#![allow(dead_code)]

use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use ibsm::context::{MadContext, PortInfoContext};
use ibsm::discovery::{Discovery, Response};
use ibsm::dr_path::{BindHandle, DrPath};
use ibsm::enums::{IbNodeType, Methods, SmiAttrID};
use ibsm::mad::{self, node_info, port_info};
use ibsm::req::{ChannelSignal, Signal};
use ibsm::sim::SimFabric;
use ibsm::subnet::{Node, Port, PortKey, Subnet, SubnetOptions};

pub const SM_PORT_GUID: u64 = 0x0002_c903_0000_0001;

/// An engine wired to a simulator that only records what it is asked, plus
/// the receiving end of the scheduler signal.
pub struct Harness {
    pub sim: Arc<SimFabric>,
    pub engine: Discovery,
    pub signals: mpsc::UnboundedReceiver<Signal>,
}

impl Harness {
    pub fn new(opt: SubnetOptions) -> Self {
        Harness::with_sim(opt, SimFabric::new())
    }

    pub fn with_sim(opt: SubnetOptions, sim: SimFabric) -> Self {
        let sim = Arc::new(sim);
        let subnet = Arc::new(RwLock::new(Subnet::new(opt, SM_PORT_GUID)));
        let (signal, signals) = ChannelSignal::channel();
        let engine = Discovery::new(subnet, sim.clone(), Arc::new(signal));
        Harness { sim, engine, signals }
    }

    pub fn subnet(&self) -> std::sync::RwLockWriteGuard<'_, Subnet> {
        self.engine.subnet().write().unwrap()
    }
}

pub fn path(hops: &[u8]) -> DrPath {
    hops.iter().fold(DrPath::local(BindHandle(1)), |p, &hop| p.extend(hop))
}

pub fn make_node_info(node_type: IbNodeType, node_guid: u64, port_guid: u64, nports: u8) -> node_info {
    let mut ni = node_info::default();
    ni.base_version = 1;
    ni.class_version = 1;
    ni.node_type = node_type as u8;
    ni.nports = nports;
    ni.node_guid = node_guid.to_be();
    ni.port_guid = port_guid.to_be();
    ni.partition_cap = 64u16.to_be();
    ni
}

/// Puts a switch with all of its ports already discovered into the store.
pub fn seed_switch(subn: &mut Subnet, guid: u64, nports: u8, at: &DrPath) {
    let mut node = Node::new(make_node_info(IbNodeType::Switch, guid, guid, nports));
    for physp in node.physps.iter_mut() {
        physp.init(guid, *at);
    }
    subn.node_guid_tbl.insert(guid, node);

    let mut port = Port::new(guid, guid, 0);
    for n in 1..=nports {
        port.add_new_physp(n);
    }
    subn.port_guid_tbl.insert(guid, port);
}

/// Puts a single port CA into the store. Its port 1 is left undiscovered.
pub fn seed_ca(subn: &mut Subnet, guid: u64, port_guid: u64) {
    subn.node_guid_tbl.insert(guid, Node::new(make_node_info(IbNodeType::CA, guid, port_guid, 1)));
    subn.port_guid_tbl.insert(port_guid, Port::new(port_guid, guid, 1));
}

pub fn active_port_info(local_portnum: u8) -> port_info {
    let mut pi = port_info::default();
    pi.set_lid(10);
    pi.set_local_portnum(local_portnum);
    pi.set_port_state(4);
    pi.set_port_physical_state(5);
    pi.set_mtu_cap(5);
    pi.set_link_width_active(2);
    pi.set_link_speed_active(4);
    pi
}

pub fn response(
    path: &DrPath,
    attr_id: SmiAttrID,
    attr_mod: u32,
    context: MadContext,
    payload: &[u8],
    status: u16,
) -> Response {
    let request = mad::build_dr_smp(path, Methods::Get, attr_id, attr_mod, 0x1337, &[]);
    let mad = mad::build_dr_resp(&request, status, payload).unwrap();
    Response { bind: path.bind, context, mad }
}

pub fn pi_response(path: &DrPath, ctx: PortInfoContext, pi: &port_info) -> Response {
    pi_response_status(path, ctx, pi, 0)
}

pub fn pi_response_status(path: &DrPath, ctx: PortInfoContext, pi: &port_info, status: u16) -> Response {
    response(
        path,
        SmiAttrID::PortInfo,
        ctx.port_num as u32,
        MadContext::PortInfo(ctx),
        &pi.to_bytes(),
        status,
    )
}

pub fn pi_ctx(node_guid: u64, port_guid: u64, port_num: u8) -> PortInfoContext {
    PortInfoContext { node_guid, port_guid, port_num, ..Default::default() }
}

/// Every physical port with a peer points back at it.
pub fn assert_symmetric(subn: &Subnet) {
    for node in subn.node_guid_tbl.values() {
        for physp in &node.physps {
            if let Some(peer) = physp.remote {
                let back = subn.physp(peer).and_then(|p| p.remote);
                assert_eq!(
                    back,
                    Some(physp.key()),
                    "{:?} points at {:?} which points at {:?}",
                    physp.key(),
                    peer,
                    back
                );
            }
        }
    }
}

pub fn key(node_guid: u64, port_num: u8) -> PortKey {
    PortKey::new(node_guid, port_num)
}
