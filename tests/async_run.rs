mod common;

#[cfg(test)]
mod async_run_tests {
    use std::io;
    use std::sync::{Arc, RwLock};

    use tokio::sync::mpsc;

    use ibsm::context::{MadContext, NodeInfoContext};
    use ibsm::discovery::{Discovery, Response};
    use ibsm::dr_path::{BindHandle, DrPath};
    use ibsm::enums::SmiAttrID;
    use ibsm::mad::IB_MGMT_CLASS_LID_ROUTED_SMP;
    use ibsm::req::{ChannelRequester, ChannelSignal, Requester, Signal, SmpRequest};
    use ibsm::subnet::{Subnet, SubnetOptions};

    use crate::common::*;

    const SW: u64 = 0x7ffc_0000_0000_1000;

    fn node_info_ctx() -> MadContext {
        MadContext::NodeInfo(NodeInfoContext { node_guid: SW, port_num: 2 })
    }

    #[test]
    fn channel_requester_builds_smp() {
        let _ = env_logger::try_init();
        let (req, mut rx) = ChannelRequester::channel(4);

        let at = path(&[1, 3]);
        req.get(&at, SmiAttrID::NodeInfo, 0, node_info_ctx()).unwrap();
        req.get(&at, SmiAttrID::PKeyTable, 0x0003_0001, node_info_ctx()).unwrap();

        let Some(SmpRequest::Get(first)) = rx.try_recv().ok() else {
            panic!("expected a Get");
        };
        assert_eq!(first.attr_id(), SmiAttrID::NodeInfo as u16);
        assert_eq!(first.path, at);
        assert_eq!(first.bind, BindHandle(1));
        assert_eq!(first.context, node_info_ctx());
        assert_eq!(first.mad.hop_cnt, 2);
        let dr = first.mad.dr_smp().unwrap();
        assert_eq!(&dr.initial_path[..3], &[0, 1, 3]);

        let Some(SmpRequest::Get(second)) = rx.try_recv().ok() else {
            panic!("expected a Get");
        };
        assert_eq!(second.attr_mod(), 0x0003_0001);
        assert_eq!(second.tid(), first.tid() + 1);
    }

    #[test]
    fn channel_requester_never_blocks() {
        let _ = env_logger::try_init();
        let (req, rx) = ChannelRequester::channel(1);
        let at = path(&[1]);

        req.get(&at, SmiAttrID::NodeInfo, 0, node_info_ctx()).unwrap();
        let full = req.get(&at, SmiAttrID::NodeInfo, 0, node_info_ctx()).unwrap_err();
        assert_eq!(full.kind(), io::ErrorKind::WouldBlock);

        drop(rx);
        let closed = req.set_local_sm(BindHandle(1), true).unwrap_err();
        assert_eq!(closed.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn channel_requester_refuses_overlong_path() {
        let _ = env_logger::try_init();
        let (req, mut rx) = ChannelRequester::channel(4);

        let at = (0..64).fold(DrPath::local(BindHandle(1)), |p, _| p.extend(1));
        let err = req.get(&at, SmiAttrID::NodeInfo, 0, node_info_ctx()).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_handles_responses_until_closed() {
        let _ = env_logger::try_init();

        let (req, mut req_rx) = ChannelRequester::channel(256);
        let (signal, mut signal_rx) = ChannelSignal::channel();
        let subnet = Arc::new(RwLock::new(Subnet::new(SubnetOptions::default(), SM_PORT_GUID)));
        seed_switch(&mut subnet.write().unwrap(), SW, 8, &path(&[1]));
        let engine = Arc::new(Discovery::new(subnet.clone(), Arc::new(req), Arc::new(signal)));

        let (tx, rx) = mpsc::channel::<Response>(16);
        let runner = tokio::spawn(engine.clone().run(rx));

        // ports 2..=5 are live, the probe arrived on port 1
        for port_num in 2..=5 {
            tx.send(pi_response(&path(&[1]), pi_ctx(SW, SW, port_num), &active_port_info(1)))
                .await
                .unwrap();
        }
        let mut light = pi_ctx(SW, SW, 6);
        light.light_sweep = true;
        tx.send(pi_response(&path(&[1]), light, &active_port_info(1))).await.unwrap();

        // not a directed route SMP: rejected, not counted
        let mut bogus = pi_response(&path(&[1]), pi_ctx(SW, SW, 7), &active_port_info(1));
        bogus.mad.mgmt_class = IB_MGMT_CLASS_LID_ROUTED_SMP;
        tx.send(bogus).await.unwrap();
        drop(tx);

        let handled = runner.await.unwrap();
        assert_eq!(handled, 5);
        assert_eq!(signal_rx.recv().await, Some(Signal::ChangeDetected));

        let mut probed = Vec::new();
        while let Ok(req) = req_rx.try_recv() {
            if let SmpRequest::Get(smp) = req {
                if smp.attr_id() == SmiAttrID::NodeInfo as u16 {
                    probed.push(smp.path.hops().to_vec());
                }
            }
        }
        probed.sort();
        assert_eq!(probed, vec![vec![1, 2], vec![1, 3], vec![1, 4], vec![1, 5]]);

        let subn = subnet.read().unwrap();
        assert_eq!(subn.port(SW).unwrap().discovery_count, 4);
    }

    #[tokio::test]
    async fn heavy_sweep_starts_at_hop_zero() {
        let _ = env_logger::try_init();

        let (req, mut req_rx) = ChannelRequester::channel(4);
        let (signal, _signal_rx) = ChannelSignal::channel();
        let subnet = Arc::new(RwLock::new(Subnet::new(SubnetOptions::default(), SM_PORT_GUID)));
        let engine = Discovery::new(subnet, Arc::new(req), Arc::new(signal));

        engine.begin_heavy_sweep(BindHandle(3)).unwrap();

        let Some(SmpRequest::Get(smp)) = req_rx.recv().await else {
            panic!("expected a Get");
        };
        assert_eq!(smp.path, DrPath::local(BindHandle(3)));
        assert_eq!(smp.attr_id(), SmiAttrID::NodeInfo as u16);
        assert_eq!(smp.context, MadContext::NodeInfo(NodeInfoContext::default()));
    }
}
