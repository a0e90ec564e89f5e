//! Response-driven fabric discovery.
//!
//! The transport calls [`Discovery::process`] once per correlated SMP
//! response. Each attribute handler takes the subnet lock exclusively for as
//! long as it mutates the store, issues its follow-up requests before
//! releasing it, and never blocks on the transport.

pub mod endport;
pub mod lft;
pub mod node_info;
pub mod pkey;
pub mod port_info;
pub mod sm_info;
pub mod switch_info;
pub mod switch_port;

use std::io;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::context::{MadContext, NodeInfoContext};
use crate::dr_path::{BindHandle, DrPath};
use crate::enums::SmiAttrID;
use crate::lock_err;
use crate::mad::{IB_SMP_STATUS_MASK, dr_smp_mad, ib_mad};
use crate::req::{Requester, StateSignal};
use crate::subnet::Subnet;

/// A correlated response as delivered by the transport: the SMP, the
/// binding it arrived on, and the context of the request it answers.
#[derive(Debug, Clone, Copy)]
pub struct Response {
    pub bind: BindHandle,
    pub context: MadContext,
    pub mad: ib_mad,
}

impl Response {
    /// Path the response travelled, taken from the SMP envelope.
    pub fn envelope_path(&self, dr: &dr_smp_mad) -> DrPath {
        DrPath::new(self.bind, self.mad.hop_cnt, dr.initial_path)
    }

    pub fn status(&self) -> u16 {
        self.mad.status_ho() & IB_SMP_STATUS_MASK
    }
}

pub struct Discovery {
    pub(crate) subnet: Arc<RwLock<Subnet>>,
    pub(crate) req: Arc<dyn Requester>,
    pub(crate) state_mgr: Arc<dyn StateSignal>,
}

impl Discovery {
    pub fn new(subnet: Arc<RwLock<Subnet>>, req: Arc<dyn Requester>, state_mgr: Arc<dyn StateSignal>) -> Self {
        Discovery { subnet, req, state_mgr }
    }

    pub fn subnet(&self) -> &Arc<RwLock<Subnet>> {
        &self.subnet
    }

    pub fn process(&self, resp: &Response) -> io::Result<()> {
        match &resp.context {
            MadContext::NodeInfo(ctx) => node_info::process(self, ctx, resp),
            MadContext::SwitchInfo(ctx) => switch_info::process(self, ctx, resp),
            MadContext::PortInfo(ctx) => port_info::process(self, ctx, resp),
            MadContext::PKey(ctx) => pkey::process_block(self, ctx, resp),
            MadContext::SmInfo(ctx) => sm_info::process(self, ctx, resp),
            MadContext::Lft(ctx) => lft::process(self, ctx, resp),
        }
    }

    /// Starts a heavy sweep: clears the endport minimums and probes the
    /// manager's own node at hop 0.
    pub fn begin_heavy_sweep(&self, bind: BindHandle) -> io::Result<()> {
        {
            let mut subn = self.subnet.write().map_err(lock_err)?;
            subn.begin_sweep();
        }
        log::info!("[discovery] starting heavy sweep on bind {:?}", bind);
        self.req.get(
            &DrPath::local(bind),
            SmiAttrID::NodeInfo,
            0,
            MadContext::NodeInfo(NodeInfoContext::default()),
        )
    }

    /// Consumes correlated responses until the channel closes. Each one is
    /// handled on the blocking pool, so responses for different ports run
    /// concurrently and serialize on the subnet lock. Returns how many were
    /// handled without error.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<Response>) -> u64 {
        let mut tasks: JoinSet<io::Result<()>> = JoinSet::new();
        let mut handled = 0;

        while let Some(resp) = rx.recv().await {
            let engine = self.clone();
            tasks.spawn_blocking(move || engine.process(&resp));

            while let Some(done) = tasks.try_join_next() {
                handled += reap(done);
            }
        }

        while let Some(done) = tasks.join_next().await {
            handled += reap(done);
        }

        log::debug!("[discovery] response channel closed, {} responses handled", handled);
        handled
    }
}

fn reap(done: Result<io::Result<()>, JoinError>) -> u64 {
    match done {
        Ok(Ok(())) => 1,
        Ok(Err(e)) => {
            log::error!("[discovery] response handling failed: {}", e);
            0
        }
        Err(e) => {
            log::error!("[discovery] response handler aborted: {}", e);
            0
        }
    }
}

/// DR body of a response routed to the handler for `expected`. Handing a
/// handler another attribute is a caller bug.
pub(crate) fn dr_payload(resp: &Response, expected: SmiAttrID) -> io::Result<dr_smp_mad> {
    let attr_id = resp.mad.attr_id_ho();
    assert_eq!(
        attr_id,
        expected as u16,
        "{:?} handler given attribute 0x{:04x}",
        expected,
        attr_id
    );

    resp.mad.dr_smp().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{:?} response is not a directed route SMP", expected),
        )
    })
}
