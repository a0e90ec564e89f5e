mod common;

#[cfg(test)]
mod port_info_rcv_tests {
    use ibsm::context::{MadContext, NodeInfoContext};
    use ibsm::discovery::switch_port::{LinkClass, classify};
    use ibsm::enums::{IbMtu, IbRate, SmiAttrID};
    use ibsm::mad::{IB_PORT_CAP_IS_SM, port_info, switch_info};
    use ibsm::req::Signal;
    use ibsm::subnet::{RemoteSm, SubnetOptions, Switch};

    use crate::common::*;

    const SW_A: u64 = 0x7ffc_0000_0000_1000;
    const SW_B: u64 = 0x7ffc_0000_0000_2000;
    const CA_GUID: u64 = 0x0002_c903_00aa_0000;
    const CA_PORT_GUID: u64 = 0x0002_c903_00aa_0001;

    fn switch_harness() -> Harness {
        let h = Harness::new(SubnetOptions::default());
        {
            let mut subn = h.subnet();
            seed_switch(&mut subn, SW_A, 8, &path(&[1]));
            seed_switch(&mut subn, SW_B, 8, &path(&[1, 3]));
        }
        h
    }

    fn port_state(state: u8, local_portnum: u8) -> port_info {
        let mut pi = active_port_info(local_portnum);
        pi.set_port_state(state);
        pi
    }

    #[test]
    fn self_responder_port_is_not_probed() {
        let _ = env_logger::try_init();
        let h = switch_harness();

        // came in through port 3 and reports on port 3
        let pi = port_state(4, 3);
        h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, 3), &pi)).unwrap();

        assert!(h.sim.issued_for(SmiAttrID::NodeInfo).is_empty());
        let subn = h.subnet();
        assert_eq!(subn.physp(key(SW_A, 3)).unwrap().port_info, pi);
    }

    #[test]
    fn down_unlinks_then_active_probes_once() {
        let _ = env_logger::try_init();
        let h = switch_harness();
        h.subnet().link(key(SW_A, 2), key(SW_B, 5)).unwrap();

        h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, 2), &port_state(1, 1))).unwrap();
        {
            let subn = h.subnet();
            assert_eq!(subn.remote_of(key(SW_A, 2)), None);
            assert_eq!(subn.remote_of(key(SW_B, 5)), None);
            assert_symmetric(&subn);
        }
        assert!(h.sim.issued_for(SmiAttrID::NodeInfo).is_empty());

        h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, 2), &port_state(4, 1))).unwrap();

        let probes = h.sim.issued_for(SmiAttrID::NodeInfo);
        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0].path, path(&[1, 2]));
        assert_eq!(
            probes[0].context,
            MadContext::NodeInfo(NodeInfoContext { node_guid: SW_A, port_num: 2 })
        );
    }

    #[test]
    fn init_and_armed_count_as_live() {
        let _ = env_logger::try_init();
        let h = switch_harness();

        h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, 4), &port_state(2, 1))).unwrap();
        h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, 5), &port_state(3, 1))).unwrap();

        assert_eq!(h.sim.issued_for(SmiAttrID::NodeInfo).len(), 2);
        assert_eq!(classify(0), LinkClass::Unknown);
        assert_eq!(classify(5), LinkClass::Unknown);
        assert_eq!(classify(1), LinkClass::Down);
    }

    #[test]
    fn never_probes_back_through_responder_port() {
        let _ = env_logger::try_init();
        let h = switch_harness();
        let responder = 6;

        for port_num in 1..=8 {
            let pi = port_state(4, responder);
            h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, port_num), &pi)).unwrap();
        }

        let probes = h.sim.issued_for(SmiAttrID::NodeInfo);
        assert_eq!(probes.len(), 7);
        for probe in probes {
            assert_ne!(probe.path.hops().last(), Some(&responder), "probe via [{}]", probe.path);
        }
    }

    #[test]
    fn unknown_link_state_stores_snapshot_only() {
        let _ = env_logger::try_init();
        let h = switch_harness();
        let pi = port_state(0, 1);

        h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, 7), &pi)).unwrap();

        assert!(h.sim.issued_for(SmiAttrID::NodeInfo).is_empty());
        assert_eq!(h.subnet().physp(key(SW_A, 7)).unwrap().port_info, pi);
    }

    #[test]
    fn hop_zero_sweep_skips_graph_walk() {
        let _ = env_logger::try_init();
        let h = switch_harness();
        h.subnet().in_sweep_hop_0 = true;

        h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, 2), &port_state(4, 1))).unwrap();

        assert!(h.sim.issued_for(SmiAttrID::NodeInfo).is_empty());
    }

    #[test]
    fn light_sweep_only_signals() {
        let _ = env_logger::try_init();
        let mut h = switch_harness();
        let before = h.subnet().physp(key(SW_A, 2)).unwrap().clone();
        let count = h.subnet().port(SW_A).unwrap().discovery_count;

        let mut ctx = pi_ctx(SW_A, SW_A, 2);
        ctx.light_sweep = true;
        ctx.update_master_sm_base_lid = true;
        let mut pi = port_state(1, 1);
        pi.set_master_sm_lid(77);
        h.engine.process(&pi_response(&path(&[1, 4]), ctx, &pi)).unwrap();

        assert_eq!(h.signals.try_recv().ok(), Some(Signal::ChangeDetected));
        assert!(h.sim.issued().is_empty());

        let subn = h.subnet();
        let after = subn.physp(key(SW_A, 2)).unwrap();
        assert_eq!(after.port_info, before.port_info);
        assert_eq!(after.dr_path, before.dr_path);
        assert_eq!(subn.port(SW_A).unwrap().discovery_count, count);
        assert_eq!(subn.master_sm_base_lid, 0);
    }

    #[test]
    fn light_sweep_leaves_endport_state_alone() {
        let _ = env_logger::try_init();
        let mut h = Harness::new(SubnetOptions::default());
        {
            let mut subn = h.subnet();
            seed_ca(&mut subn, CA_GUID, CA_PORT_GUID);
            subn.physp_mut(key(CA_GUID, 1)).unwrap().init(CA_PORT_GUID, path(&[1, 2]));
            subn.sm_guid_tbl.insert(CA_PORT_GUID, RemoteSm::new(CA_PORT_GUID, 0x53));
        }

        let mut ctx = pi_ctx(CA_GUID, CA_PORT_GUID, 1);
        ctx.light_sweep = true;
        let mut pi = active_port_info(1);
        pi.set_mtu_cap(IbMtu::Mtu256 as u8);
        pi.set_link_width_active(1);
        pi.set_link_speed_active(1);
        pi.set_capability_mask(IB_PORT_CAP_IS_SM);
        h.engine.process(&pi_response(&path(&[1, 2]), ctx, &pi)).unwrap();

        assert_eq!(h.signals.try_recv().ok(), Some(Signal::ChangeDetected));
        assert!(h.sim.issued().is_empty());
        assert!(h.sim.local_sm_sets().is_empty());

        let subn = h.subnet();
        assert_eq!(subn.sm_guid_tbl.get(&CA_PORT_GUID).unwrap().pri_state, 0x53);
        assert_eq!(subn.min_ca_mtu, IbMtu::Mtu4096);
        assert_eq!(subn.min_ca_rate, IbRate::MAX);
        assert_eq!(subn.physp(key(CA_GUID, 1)).unwrap().port_info.mtu_cap(), 0);
    }

    #[test]
    fn light_sweep_for_unknown_port_still_signals() {
        let _ = env_logger::try_init();
        let mut h = Harness::new(SubnetOptions::default());

        let mut ctx = pi_ctx(SW_A, 0xdead, 1);
        ctx.light_sweep = true;
        h.engine.process(&pi_response(&path(&[1]), ctx, &port_state(4, 1))).unwrap();

        assert_eq!(h.signals.try_recv().ok(), Some(Signal::ChangeDetected));
        assert!(h.subnet().node_guid_tbl.is_empty());
    }

    #[test]
    fn unknown_port_guid_is_abandoned() {
        let _ = env_logger::try_init();
        let h = switch_harness();

        h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, 0xdead, 2), &port_state(4, 1))).unwrap();

        assert!(h.sim.issued().is_empty());
        let subn = h.subnet();
        assert_eq!(subn.port(SW_A).unwrap().discovery_count, 0);
        assert_eq!(subn.physp(key(SW_A, 2)).unwrap().port_info, port_info::default());
    }

    #[test]
    fn port_beyond_node_is_abandoned() {
        let _ = env_logger::try_init();
        let h = switch_harness();

        h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, 40), &port_state(4, 1))).unwrap();

        assert!(h.sim.issued().is_empty());
        assert_eq!(h.subnet().port(SW_A).unwrap().discovery_count, 0);
    }

    #[test]
    fn last_response_wins() {
        let _ = env_logger::try_init();
        let h = switch_harness();

        let mut last = port_info::default();
        for lid in [5u16, 9, 3, 12] {
            let mut pi = port_state(4, 1);
            pi.set_lid(lid);
            pi.set_neighbor_mtu((lid % 5 + 1) as u8);
            h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, 1), &pi)).unwrap();
            last = pi;
        }

        assert_eq!(h.subnet().physp(key(SW_A, 1)).unwrap().port_info, last);
    }

    #[test]
    fn first_response_materializes_port_and_later_ones_refresh_path() {
        let _ = env_logger::try_init();
        let h = Harness::new(SubnetOptions::default());
        seed_ca(&mut h.subnet(), CA_GUID, CA_PORT_GUID);

        let first = path(&[1, 2]);
        h.engine.process(&pi_response(&first, pi_ctx(CA_GUID, CA_PORT_GUID, 1), &active_port_info(1))).unwrap();
        {
            let subn = h.subnet();
            let physp = subn.physp(key(CA_GUID, 1)).unwrap();
            assert!(physp.valid);
            assert_eq!(physp.port_guid, CA_PORT_GUID);
            assert_eq!(physp.dr_path, first);
        }

        let second = path(&[1, 3, 7]);
        h.engine.process(&pi_response(&second, pi_ctx(CA_GUID, CA_PORT_GUID, 1), &active_port_info(1))).unwrap();

        let subn = h.subnet();
        assert_eq!(subn.physp(key(CA_GUID, 1)).unwrap().dr_path, second);
        assert_eq!(subn.port(CA_PORT_GUID).unwrap().discovery_count, 2);
    }

    #[test]
    fn master_sm_base_lid_follows_flag() {
        let _ = env_logger::try_init();
        let h = switch_harness();
        let mut pi = port_state(4, 1);
        pi.set_master_sm_lid(42);

        h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, 1), &pi)).unwrap();
        assert_eq!(h.subnet().master_sm_base_lid, 0);

        let mut ctx = pi_ctx(SW_A, SW_A, 1);
        ctx.update_master_sm_base_lid = true;
        h.engine.process(&pi_response(&path(&[1]), ctx, &pi)).unwrap();
        assert_eq!(h.subnet().master_sm_base_lid, 42);
    }

    #[test]
    fn base_port_zero_keeps_whole_snapshot() {
        let _ = env_logger::try_init();
        let h = switch_harness();
        {
            let mut subn = h.subnet();
            let mut si = switch_info::default();
            si.set_linear_fdb_top(63);
            si.set_enhanced_port0(0);
            subn.node_mut(SW_A).unwrap().sw = Some(Switch::new(si));
        }

        let mut pi = port_state(1, 0);
        pi.set_lid(12);
        pi.set_lmc(1);
        pi.set_mtu_cap(IbMtu::Mtu2048 as u8);
        h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, 0), &pi)).unwrap();

        let subn = h.subnet();
        assert_eq!(subn.physp(key(SW_A, 0)).unwrap().port_info, pi);
    }

    #[test]
    fn out_of_range_base_lid_is_cleared() {
        let _ = env_logger::try_init();
        let h = Harness::new(SubnetOptions::default());
        seed_ca(&mut h.subnet(), CA_GUID, CA_PORT_GUID);

        let mut pi = active_port_info(1);
        pi.set_lid(0xc001);
        h.engine.process(&pi_response(&path(&[1]), pi_ctx(CA_GUID, CA_PORT_GUID, 1), &pi)).unwrap();

        assert_eq!(h.subnet().physp(key(CA_GUID, 1)).unwrap().port_info.lid(), 0);
    }

    #[test]
    fn switch_port_zero_lid_is_checked() {
        let _ = env_logger::try_init();
        let h = switch_harness();

        let mut pi = port_state(4, 1);
        pi.set_lid(0xffff);
        h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, 0), &pi)).unwrap();

        assert_eq!(h.subnet().physp(key(SW_A, 0)).unwrap().port_info.lid(), 0);
        assert!(h.sim.issued_for(SmiAttrID::NodeInfo).is_empty());
    }

    #[test]
    fn client_reregister_is_not_stored() {
        let _ = env_logger::try_init();
        let h = switch_harness();
        let mut pi = port_state(4, 1);
        pi.set_client_register(1);

        h.engine.process(&pi_response(&path(&[1]), pi_ctx(SW_A, SW_A, 1), &pi)).unwrap();

        assert_eq!(h.subnet().physp(key(SW_A, 1)).unwrap().port_info.client_register(), 0);
    }

    #[test]
    fn benign_status_during_activation_is_recorded() {
        let _ = env_logger::try_init();
        let h = switch_harness();

        let mut pi = port_state(3, 1);
        pi.set_lid(33);
        let mut ctx = pi_ctx(SW_A, SW_A, 4);
        ctx.set_method = true;
        ctx.active_transition = true;
        h.engine.process(&pi_response_status(&path(&[1]), ctx, &pi, 0x1c)).unwrap();

        let subn = h.subnet();
        let physp = subn.physp(key(SW_A, 4)).unwrap();
        assert!(physp.got_set_resp);
        assert_eq!(physp.port_info, pi);
        assert_eq!(subn.port(SW_A).unwrap().discovery_count, 0);
        drop(subn);
        assert!(h.sim.issued().is_empty());
    }

    #[test]
    fn failed_set_is_still_recorded() {
        let _ = env_logger::try_init();
        let h = switch_harness();

        let pi = port_state(4, 1);
        let mut ctx = pi_ctx(SW_A, SW_A, 5);
        ctx.set_method = true;
        h.engine.process(&pi_response_status(&path(&[1]), ctx, &pi, 0x1c)).unwrap();

        let subn = h.subnet();
        let physp = subn.physp(key(SW_A, 5)).unwrap();
        assert!(physp.got_set_resp);
        assert_eq!(physp.port_info, pi);
    }

    #[test]
    fn set_with_errors_ignored_is_recorded_quietly() {
        let _ = env_logger::try_init();
        let h = switch_harness();

        let mut pi = port_state(2, 1);
        pi.set_lid(44);
        let mut ctx = pi_ctx(SW_A, SW_A, 6);
        ctx.set_method = true;
        ctx.ignore_errors = true;
        h.engine.process(&pi_response_status(&path(&[1]), ctx, &pi, 0x1c)).unwrap();

        let subn = h.subnet();
        let physp = subn.physp(key(SW_A, 6)).unwrap();
        assert!(physp.got_set_resp);
        assert_eq!(physp.port_info, pi);
        assert_eq!(physp.remote, None);
        assert_eq!(subn.port(SW_A).unwrap().discovery_count, 0);
        drop(subn);
        assert!(h.sim.issued().is_empty());
    }

    #[test]
    fn set_for_undiscovered_port_changes_nothing() {
        let _ = env_logger::try_init();
        let h = Harness::new(SubnetOptions::default());
        seed_ca(&mut h.subnet(), CA_GUID, CA_PORT_GUID);

        let mut ctx = pi_ctx(CA_GUID, CA_PORT_GUID, 1);
        ctx.set_method = true;
        h.engine.process(&pi_response(&path(&[1]), ctx, &active_port_info(1))).unwrap();

        let subn = h.subnet();
        let physp = subn.physp(key(CA_GUID, 1)).unwrap();
        assert!(!physp.valid);
        assert!(!physp.got_set_resp);
    }

    #[test]
    fn data_ports_fetch_partition_tables() {
        let _ = env_logger::try_init();
        let h = Harness::new(SubnetOptions::default());
        seed_ca(&mut h.subnet(), CA_GUID, CA_PORT_GUID);

        h.engine.process(&pi_response(&path(&[1]), pi_ctx(CA_GUID, CA_PORT_GUID, 1), &active_port_info(1))).unwrap();

        // partition cap of 64 is two blocks
        assert_eq!(h.sim.issued_for(SmiAttrID::PKeyTable).len(), 2);
    }

    #[test]
    #[should_panic]
    fn attribute_mismatch_panics() {
        let _ = env_logger::try_init();
        let h = switch_harness();

        let ctx = MadContext::PortInfo(pi_ctx(SW_A, SW_A, 1));
        let resp = response(&path(&[1]), SmiAttrID::NodeInfo, 0, ctx, &[0; 64], 0);
        let _ = h.engine.process(&resp);
    }
}
