use super::*;

#[test]
fn register_cross_chain_agent_works() {
    new_test_ext().execute_with(|| {
        assert_ok!(PacketRelay::register_cross_chain_agent(
            RuntimeOrigin::root(),
            CHAIN_B.to_vec(),
            b"remote-7".to_vec(),
            3,
        ));

        assert_eq!(PacketRelay::resolve_remote_agent(CHAIN_B, b"remote-7"), Some(3));
        assert_eq!(PacketRelay::resolve_remote_agent(b"chain-C", b"remote-7"), None);
        let chain: ChainId<Runtime> = bounded(CHAIN_B);
        assert_eq!(AgentMappingCount::<Runtime>::get(chain), 1);
        System::assert_last_event(
            Event::CrossChainAgentRegistered {
                chain_id: CHAIN_B.to_vec(),
                remote_agent_id: b"remote-7".to_vec(),
                local_agent_id: 3,
            }
            .into(),
        );
    });
}

#[test]
fn register_requires_mapping_origin() {
    new_test_ext().execute_with(|| {
        assert_noop!(
            PacketRelay::register_cross_chain_agent(
                RuntimeOrigin::signed(ALICE),
                CHAIN_B.to_vec(),
                b"remote-7".to_vec(),
                3,
            ),
            DispatchError::BadOrigin
        );
    });
}

#[test]
fn register_requires_existing_local_agent() {
    new_test_ext().execute_with(|| {
        assert_noop!(
            PacketRelay::register_cross_chain_agent(
                RuntimeOrigin::root(),
                CHAIN_B.to_vec(),
                b"remote-7".to_vec(),
                500,
            ),
            Error::<Runtime>::AgentNotFound
        );
    });
}

#[test]
fn mapping_is_never_overwritten() {
    new_test_ext().execute_with(|| {
        assert_ok!(PacketRelay::register_cross_chain_agent(
            RuntimeOrigin::root(),
            CHAIN_B.to_vec(),
            b"remote-7".to_vec(),
            3,
        ));
        assert_noop!(
            PacketRelay::register_cross_chain_agent(
                RuntimeOrigin::root(),
                CHAIN_B.to_vec(),
                b"remote-7".to_vec(),
                4,
            ),
            Error::<Runtime>::CrossChainAgentAlreadyMapped
        );
        assert_eq!(PacketRelay::resolve_remote_agent(CHAIN_B, b"remote-7"), Some(3));
    });
}

#[test]
fn mappings_per_chain_are_capped() {
    new_test_ext().execute_with(|| {
        for (remote, local) in [(b"r-1", 1), (b"r-2", 2)] {
            assert_ok!(PacketRelay::register_cross_chain_agent(
                RuntimeOrigin::root(),
                CHAIN_B.to_vec(),
                remote.to_vec(),
                local,
            ));
        }
        assert_noop!(
            PacketRelay::register_cross_chain_agent(
                RuntimeOrigin::root(),
                CHAIN_B.to_vec(),
                b"r-3".to_vec(),
                3,
            ),
            Error::<Runtime>::TooManyAgentMappings
        );

        // Removing one frees room.
        assert_ok!(PacketRelay::remove_cross_chain_agent(
            RuntimeOrigin::root(),
            CHAIN_B.to_vec(),
            b"r-1".to_vec(),
        ));
        assert_ok!(PacketRelay::register_cross_chain_agent(
            RuntimeOrigin::root(),
            CHAIN_B.to_vec(),
            b"r-3".to_vec(),
            3,
        ));
    });
}

#[test]
fn remove_cross_chain_agent_works() {
    new_test_ext().execute_with(|| {
        assert_ok!(PacketRelay::register_cross_chain_agent(
            RuntimeOrigin::root(),
            CHAIN_B.to_vec(),
            b"remote-7".to_vec(),
            3,
        ));
        assert_ok!(PacketRelay::remove_cross_chain_agent(
            RuntimeOrigin::root(),
            CHAIN_B.to_vec(),
            b"remote-7".to_vec(),
        ));

        assert_eq!(PacketRelay::resolve_remote_agent(CHAIN_B, b"remote-7"), None);
        System::assert_last_event(
            Event::CrossChainAgentRemoved {
                chain_id: CHAIN_B.to_vec(),
                remote_agent_id: b"remote-7".to_vec(),
                local_agent_id: 3,
            }
            .into(),
        );

        assert_noop!(
            PacketRelay::remove_cross_chain_agent(
                RuntimeOrigin::root(),
                CHAIN_B.to_vec(),
                b"remote-7".to_vec(),
            ),
            Error::<Runtime>::CrossChainAgentNotFound
        );
    });
}

#[test]
fn oversized_agent_identifiers_are_rejected() {
    new_test_ext().execute_with(|| {
        assert_noop!(
            PacketRelay::register_cross_chain_agent(
                RuntimeOrigin::root(),
                CHAIN_B.to_vec(),
                vec![b'r'; 17],
                3,
            ),
            Error::<Runtime>::RemoteAgentIdTooLong
        );
        assert_noop!(
            PacketRelay::register_cross_chain_agent(
                RuntimeOrigin::root(),
                vec![b'c'; 17],
                b"remote-7".to_vec(),
                3,
            ),
            Error::<Runtime>::ChainIdTooLong
        );
    });
}
