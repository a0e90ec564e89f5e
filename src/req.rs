//! Seams to the outside: the request layer that sends SMPs along directed
//! routes, and the sweep scheduler that is told when rediscovery is due.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::context::MadContext;
use crate::dr_path::{BindHandle, DrPath};
use crate::enums::{Methods, SmiAttrID};
use crate::mad::{self, ib_mad};

/// Issues SMPs. Calls must not block: handlers invoke them while holding the
/// topology lock. Completion comes back later as a [`crate::Response`]
/// carrying `context` unchanged.
pub trait Requester: Send + Sync {
    fn get(&self, path: &DrPath, attr_id: SmiAttrID, attr_mod: u32, context: MadContext) -> io::Result<()>;

    /// Sets or clears the IsSM capability bit on the local port.
    fn set_local_sm(&self, bind: BindHandle, is_sm: bool) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Something changed on the fabric, a heavy sweep is warranted.
    ChangeDetected,
}

pub trait StateSignal: Send + Sync {
    fn signal(&self, signal: Signal);
}

/// An SMP ready for the wire together with what it was sent for.
#[derive(Debug, Clone, Copy)]
pub struct OutboundSmp {
    pub bind: BindHandle,
    pub path: DrPath,
    pub context: MadContext,
    pub mad: ib_mad,
}

impl OutboundSmp {
    pub fn attr_id(&self) -> u16 {
        self.mad.attr_id_ho()
    }

    pub fn attr_mod(&self) -> u32 {
        self.mad.attr_mod_ho()
    }

    pub fn tid(&self) -> u64 {
        self.mad.tid_ho()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SmpRequest {
    Get(OutboundSmp),
    SetLocalSm { bind: BindHandle, is_sm: bool },
}

/// Hands requests to a send task over a bounded tokio channel. A full queue
/// surfaces as `WouldBlock`, the "no buffer available" case.
#[derive(Debug)]
pub struct ChannelRequester {
    tx: mpsc::Sender<SmpRequest>,
    tid: AtomicU64,
}

impl ChannelRequester {
    pub fn new(tx: mpsc::Sender<SmpRequest>) -> Self {
        ChannelRequester { tx, tid: AtomicU64::new(1) }
    }

    /// Requester plus the receiving end for the send task.
    pub fn channel(depth: usize) -> (Self, mpsc::Receiver<SmpRequest>) {
        let (tx, rx) = mpsc::channel(depth);
        (ChannelRequester::new(tx), rx)
    }

    fn push(&self, req: SmpRequest) -> io::Result<()> {
        self.tx.try_send(req).map_err(|e| match e {
            TrySendError::Full(_) => io::Error::new(io::ErrorKind::WouldBlock, "no request buffer available"),
            TrySendError::Closed(_) => io::Error::new(io::ErrorKind::BrokenPipe, "request channel closed"),
        })
    }
}

impl Requester for ChannelRequester {
    fn get(&self, path: &DrPath, attr_id: SmiAttrID, attr_mod: u32, context: MadContext) -> io::Result<()> {
        if !path.is_routable() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path exceeds hop limit: {} hops", path.hop_count),
            ));
        }

        let tid = self.tid.fetch_add(1, Ordering::Relaxed);
        let mad = mad::build_dr_smp(path, Methods::Get, attr_id, attr_mod, tid, &[]);

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "[ChannelRequester] TID:{} attr 0x{:04x} mod 0x{:x} path [{}]",
                tid,
                attr_id as u16,
                attr_mod,
                path
            );
        }

        self.push(SmpRequest::Get(OutboundSmp { bind: path.bind, path: *path, context, mad }))
    }

    fn set_local_sm(&self, bind: BindHandle, is_sm: bool) -> io::Result<()> {
        self.push(SmpRequest::SetLocalSm { bind, is_sm })
    }
}

/// Forwards scheduler signals over an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSignal {
    tx: mpsc::UnboundedSender<Signal>,
}

impl ChannelSignal {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Signal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelSignal { tx }, rx)
    }
}

impl StateSignal for ChannelSignal {
    fn signal(&self, signal: Signal) {
        if self.tx.send(signal).is_err() {
            log::warn!("[ChannelSignal] state manager gone, dropping {:?}", signal);
        }
    }
}
