use std::fmt;

/// Wire slots in a DR SMP path; slot 0 is always the local port.
pub const IB_SUBNET_PATH_HOPS_MAX: usize = 64;

/// Transport binding the path was learned through (the MAD agent a request
/// along this path must be sent on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BindHandle(pub u32);

/// Directed route from the manager's port to some port in the fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrPath {
    pub bind: BindHandle,
    pub hop_count: u8,
    pub path: [u8; IB_SUBNET_PATH_HOPS_MAX],
}

impl DrPath {
    pub fn new(bind: BindHandle, hop_count: u8, path: [u8; IB_SUBNET_PATH_HOPS_MAX]) -> Self {
        DrPath { bind, hop_count, path }
    }

    /// The zero-hop path: the manager's own port.
    pub fn local(bind: BindHandle) -> Self {
        DrPath { bind, hop_count: 0, path: [0; IB_SUBNET_PATH_HOPS_MAX] }
    }

    /// Copy of this path one hop further out through `port_num`. The hop
    /// count keeps counting past the last slot; such a path is refused by
    /// the transport (see [`DrPath::is_routable`]).
    pub fn extend(&self, port_num: u8) -> DrPath {
        let mut next = *self;
        next.hop_count = self.hop_count.saturating_add(1);
        let slot = next.hop_count as usize;
        if slot < IB_SUBNET_PATH_HOPS_MAX {
            next.path[slot] = port_num;
        }
        next
    }

    pub fn is_routable(&self) -> bool {
        (self.hop_count as usize) < IB_SUBNET_PATH_HOPS_MAX
    }

    pub fn hops(&self) -> &[u8] {
        let end = (self.hop_count as usize + 1).min(IB_SUBNET_PATH_HOPS_MAX);
        &self.path[1..end]
    }
}

impl fmt::Display for DrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0")?;
        for hop in self.hops() {
            write!(f, " -> {}", hop)?;
        }
        Ok(())
    }
}
