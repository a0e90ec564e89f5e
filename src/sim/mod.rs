//! In-process fabric simulator. Records every request the engine issues and
//! answers them with DR SMP responses built from a static topology.

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use hashbrown::HashMap;

use crate::context::MadContext;
use crate::discovery::{Discovery, Response};
use crate::dr_path::{BindHandle, DrPath};
use crate::enums::{IbNodeType, IbPortLinkLayerState, IbPortPhyState, Methods, SmiAttrID};
use crate::lock_err;
use crate::mad::port::{IB_LINK_SPEED_ACTIVE_10, IB_LINK_WIDTH_ACTIVE_4X};
use crate::mad::{
    self, IB_LFT_BLOCK_SIZE, IB_LFT_NO_PATH, IB_NUM_PKEY_ELEMENTS_IN_BLOCK, IB_PORT_CAP_IS_SM, ib_mad, node_info,
    pkey_table, port_info, sm_info, switch_info,
};
use crate::req::Requester;

const DEFAULT_PKEY: u16 = 0xffff;

#[derive(Debug, Clone)]
pub struct SimPort {
    pub num: u8,
    pub port_info: port_info,
    /// Node index and port number at the far end of the cable.
    pub remote: Option<(usize, u8)>,
    pub pkeys: Vec<u16>,
}

impl SimPort {
    fn new(num: u8, lid: u16) -> Self {
        let mut pi = port_info::default();
        pi.set_lid(lid);
        pi.set_local_portnum(num);
        pi.set_port_state(IbPortLinkLayerState::Down as u8);
        pi.set_port_physical_state(IbPortPhyState::Polling as u8);
        pi.set_mtu_cap(crate::enums::IbMtu::Mtu4096 as u8);
        pi.set_link_width_active(IB_LINK_WIDTH_ACTIVE_4X);
        pi.set_link_speed_active(IB_LINK_SPEED_ACTIVE_10);
        SimPort { num, port_info: pi, remote: None, pkeys: vec![DEFAULT_PKEY] }
    }
}

#[derive(Debug, Clone)]
pub struct SimNode {
    pub description: String,
    pub node_info: node_info,
    pub switch_info: Option<switch_info>,
    pub sm_info: Option<sm_info>,
    pub lft: Vec<u8>,
    /// Indexed by port number; slot 0 is the switch management port or, on a
    /// CA, unused.
    pub ports: Vec<SimPort>,
}

impl SimNode {
    pub fn port_mut(&mut self, num: u8) -> Option<&mut SimPort> {
        self.ports.get_mut(num as usize)
    }

    fn is_switch(&self) -> bool {
        self.node_info.node_type == IbNodeType::Switch as u8
    }
}

/// A request as the simulator saw it.
#[derive(Debug, Clone, Copy)]
pub struct IssuedRequest {
    pub tid: u64,
    pub path: DrPath,
    pub attr_id: SmiAttrID,
    pub attr_mod: u32,
    pub context: MadContext,
}

#[derive(Debug, Default)]
pub struct SimFabric {
    nodes: Vec<SimNode>,
    root: Option<(usize, u8)>,
    next_lid: u16,
    /// Deliver outstanding responses in random order.
    pub shuffle: bool,
    tid: AtomicU64,
    pending: DashMap<u64, IssuedRequest>,
    queue: Mutex<VecDeque<u64>>,
    issued: Mutex<Vec<IssuedRequest>>,
    failures: Mutex<HashMap<SmiAttrID, u32>>,
    failed: AtomicU64,
    local_sm: Mutex<Vec<(BindHandle, bool)>>,
    root_is_sm: AtomicBool,
}

impl SimFabric {
    pub fn new() -> Self {
        SimFabric { next_lid: 1, tid: AtomicU64::new(1), ..Default::default() }
    }

    fn add_node(&mut self, description: &str, node_type: IbNodeType, guid: u64, nports: u8) -> usize {
        let mut ni = node_info::default();
        ni.base_version = 1;
        ni.class_version = 1;
        ni.node_type = node_type as u8;
        ni.nports = nports;
        ni.system_guid = guid.to_be();
        ni.node_guid = guid.to_be();
        ni.partition_cap = (IB_NUM_PKEY_ELEMENTS_IN_BLOCK as u16).to_be();
        ni.vendor_id = [0x00, 0x02, 0xc9];

        let mut ports = Vec::with_capacity(nports as usize + 1);
        for num in 0..=nports {
            let lid = match node_type {
                IbNodeType::Switch if num == 0 => self.alloc_lid(),
                IbNodeType::Switch => 0,
                _ if num == 0 => 0,
                _ => self.alloc_lid(),
            };
            ports.push(SimPort::new(num, lid));
        }

        self.nodes.push(SimNode {
            description: description.to_string(),
            node_info: ni,
            switch_info: None,
            sm_info: None,
            lft: Vec::new(),
            ports,
        });
        self.nodes.len() - 1
    }

    fn alloc_lid(&mut self) -> u16 {
        let lid = self.next_lid;
        self.next_lid += 1;
        lid
    }

    /// Single or multi port HCA. Port GUIDs are `guid + port number`.
    pub fn add_hca(&mut self, description: &str, guid: u64, nports: u8) -> usize {
        let idx = self.add_node(description, IbNodeType::CA, guid, nports);
        self.nodes[idx].node_info.port_guid = (guid + 1).to_be();
        idx
    }

    /// Switch with an enforcing, base port 0 and a 128 entry LFT.
    pub fn add_switch(&mut self, description: &str, guid: u64, nports: u8) -> usize {
        let idx = self.add_node(description, IbNodeType::Switch, guid, nports);
        let node = &mut self.nodes[idx];
        node.node_info.port_guid = guid.to_be();

        let mut si = switch_info::default();
        si.set_linear_fdb_cap(0xc000);
        si.set_linear_fdb_top(2 * IB_LFT_BLOCK_SIZE as u16 - 1);
        si.set_enforce_cap(IB_NUM_PKEY_ELEMENTS_IN_BLOCK as u16);
        node.switch_info = Some(si);
        node.lft = vec![IB_LFT_NO_PATH; 2 * IB_LFT_BLOCK_SIZE];

        if let Some(p0) = node.port_mut(0) {
            p0.port_info.set_port_state(IbPortLinkLayerState::Active as u8);
            p0.port_info.set_port_physical_state(IbPortPhyState::LinkUp as u8);
        }
        idx
    }

    pub fn connect_ports(&mut self, a: usize, port_a: u8, b: usize, port_b: u8) {
        for (node, port, remote) in [(a, port_a, (b, port_b)), (b, port_b, (a, port_a))] {
            if let Some(p) = self.nodes.get_mut(node).and_then(|n| n.port_mut(port)) {
                p.remote = Some(remote);
                p.port_info.set_port_state(IbPortLinkLayerState::Active as u8);
                p.port_info.set_port_physical_state(IbPortPhyState::LinkUp as u8);
            }
        }

        log::info!(
            "Connected port {} on node '{}' to port {} on node '{}'",
            port_a,
            self.nodes.get(a).map_or("?", |n| n.description.as_str()),
            port_b,
            self.nodes.get(b).map_or("?", |n| n.description.as_str())
        );
    }

    /// Where the manager sits: hop 0 of every path.
    pub fn set_root(&mut self, node: usize, port: u8) {
        self.root = Some((node, port));
    }

    pub fn node(&self, idx: usize) -> &SimNode {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: usize) -> &mut SimNode {
        &mut self.nodes[idx]
    }

    /// Makes the next `count` requests for `attr_id` fail as if the
    /// transport had no buffer.
    pub fn fail_next(&self, attr_id: SmiAttrID, count: u32) -> io::Result<()> {
        self.failures.lock().map_err(lock_err)?.insert(attr_id, count);
        Ok(())
    }

    pub fn issued(&self) -> Vec<IssuedRequest> {
        self.issued.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn issued_for(&self, attr_id: SmiAttrID) -> Vec<IssuedRequest> {
        self.issued().into_iter().filter(|r| r.attr_id == attr_id).collect()
    }

    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn local_sm_sets(&self) -> Vec<(BindHandle, bool)> {
        self.local_sm.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drops every outstanding request without answering it.
    pub fn drain(&self) -> io::Result<usize> {
        let mut queue = self.queue.lock().map_err(lock_err)?;
        let n = queue.len();
        queue.clear();
        self.pending.clear();
        Ok(n)
    }

    /// Answers outstanding requests, including the ones handling them
    /// produces, until none are left. Unreachable targets are dropped like
    /// a timed out SMP. Returns how many responses were delivered.
    pub fn run(&self, engine: &Discovery) -> io::Result<usize> {
        let mut delivered = 0;

        while let Some(tid) = self.next_tid()? {
            let Some((_, req)) = self.pending.remove(&tid) else {
                continue;
            };

            let Some(mad) = self.respond(&req) else {
                log::debug!("[tid: {}] No response for attr {:?} via [{}]", tid, req.attr_id, req.path);
                continue;
            };

            if log::log_enabled!(log::Level::Trace) {
                log::trace!("[tid: {}] Response:\n{}", tid, crate::dump_bytes(&mad.to_bytes()));
            }

            let resp = Response { bind: req.path.bind, context: req.context, mad };
            if let Err(e) = engine.process(&resp) {
                log::warn!("[tid: {}] Engine rejected response: {}", tid, e);
            }
            delivered += 1;
        }

        Ok(delivered)
    }

    fn next_tid(&self) -> io::Result<Option<u64>> {
        let mut queue = self.queue.lock().map_err(lock_err)?;
        if queue.is_empty() {
            return Ok(None);
        }
        let idx = if self.shuffle { rand::random_range(0..queue.len()) } else { 0 };
        Ok(queue.remove(idx))
    }

    /// Follows `path` from the root. Yields the node index reached and the
    /// port the SMP entered it through.
    pub fn resolve(&self, path: &DrPath) -> Option<(usize, u8)> {
        let (mut node, mut port) = self.root?;

        for (i, &egress) in path.hops().iter().enumerate() {
            let current = self.nodes.get(node)?;
            // Only switches forward; the root may still send out of its own port
            if i > 0 && !current.is_switch() {
                return None;
            }
            let out = current.ports.get(egress as usize)?;
            if out.port_info.port_state() < IbPortLinkLayerState::Init as u8 {
                return None;
            }
            (node, port) = out.remote?;
        }

        Some((node, port))
    }

    fn respond(&self, req: &IssuedRequest) -> Option<ib_mad> {
        let (node_idx, arrival) = self.resolve(&req.path)?;
        let node = self.nodes.get(node_idx)?;

        let payload: Vec<u8> = match req.attr_id {
            SmiAttrID::NodeDesc => node.description.as_bytes().to_vec(),
            SmiAttrID::NodeInfo => {
                let mut ni = node.node_info;
                ni.local_port = arrival;
                if !node.is_switch() {
                    let guid = u64::from_be(ni.node_guid);
                    ni.port_guid = (guid + arrival as u64).to_be();
                }
                ni.to_bytes()
            }
            SmiAttrID::SwitchInfo => node.switch_info?.to_bytes(),
            SmiAttrID::PortInfo => {
                let num = if node.is_switch() { req.attr_mod as u8 } else { arrival };
                let mut pi = node.ports.get(num as usize)?.port_info;
                pi.set_local_portnum(arrival);
                if Some((node_idx, num)) == self.root && self.root_is_sm.load(Ordering::Relaxed) {
                    pi.set_capability_mask(pi.capability_mask() | IB_PORT_CAP_IS_SM);
                }
                pi.to_bytes()
            }
            SmiAttrID::PKeyTable => {
                let (num, block) = if node.is_switch() {
                    ((req.attr_mod >> 16) as u8, (req.attr_mod & 0xffff) as usize)
                } else {
                    (arrival, (req.attr_mod & 0xffff) as usize)
                };
                let pkeys = &node.ports.get(num as usize)?.pkeys;
                let start = (block * IB_NUM_PKEY_ELEMENTS_IN_BLOCK).min(pkeys.len());
                pkey_table::from_pkeys(&pkeys[start..]).to_bytes()
            }
            SmiAttrID::SmInfo => node.sm_info?.to_bytes(),
            SmiAttrID::LinearFwdTable => {
                let base = req.attr_mod as usize * IB_LFT_BLOCK_SIZE;
                (base..base + IB_LFT_BLOCK_SIZE)
                    .map(|lid| node.lft.get(lid).copied().unwrap_or(IB_LFT_NO_PATH))
                    .collect()
            }
        };

        log::trace!(
            "[tid: {}] '{}' answers {:?} arriving on port {}",
            req.tid,
            node.description,
            req.attr_id,
            arrival
        );

        let request = mad::build_dr_smp(&req.path, Methods::Get, req.attr_id, req.attr_mod, req.tid, &[]);
        mad::build_dr_resp(&request, 0, &payload)
    }

    fn take_failure(&self, attr_id: SmiAttrID) -> io::Result<bool> {
        let mut failures = self.failures.lock().map_err(lock_err)?;
        match failures.get_mut(&attr_id) {
            Some(n) if *n > 0 => {
                *n -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl Requester for SimFabric {
    fn get(&self, path: &DrPath, attr_id: SmiAttrID, attr_mod: u32, context: MadContext) -> io::Result<()> {
        if !path.is_routable() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path exceeds hop limit: {} hops", path.hop_count),
            ));
        }

        if self.take_failure(attr_id)? {
            self.failed.fetch_add(1, Ordering::Relaxed);
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "no request buffer available"));
        }

        let tid = self.tid.fetch_add(1, Ordering::Relaxed);
        let req = IssuedRequest { tid, path: *path, attr_id, attr_mod, context };
        log::trace!("[tid: {}] Issued {:?} mod 0x{:x} via [{}]", tid, attr_id, attr_mod, path);

        self.pending.insert(tid, req);
        self.queue.lock().map_err(lock_err)?.push_back(tid);
        self.issued.lock().map_err(lock_err)?.push(req);
        Ok(())
    }

    fn set_local_sm(&self, bind: BindHandle, is_sm: bool) -> io::Result<()> {
        self.root_is_sm.store(is_sm, Ordering::Relaxed);
        self.local_sm.lock().map_err(lock_err)?.push((bind, is_sm));
        Ok(())
    }
}
