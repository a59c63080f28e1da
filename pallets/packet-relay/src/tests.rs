//! Packet relay pallet unit tests.

#![cfg(test)]

use super::*;
use crate::mock::*;
use crate::types::ack_codes;
use frame_support::{assert_err, assert_noop, assert_ok, traits::Get, BoundedVec};
use sp_core::H256;
use sp_runtime::{BuildStorage, DispatchError};

mod test_agents;

// =========================================================
// Helper Functions
// =========================================================

pub const CHAIN_B: &[u8] = b"chain-B";

fn bounded<S: Get<u32>>(bytes: &[u8]) -> BoundedVec<u8, S> {
    bytes.to_vec().try_into().unwrap()
}

fn channel_key(channel_id: &[u8]) -> ChannelId<Runtime> {
    bounded(channel_id)
}

fn raw(bytes: &[u8]) -> PacketPayload<Runtime> {
    crate::raw_payload::<Runtime>(bytes.to_vec()).unwrap()
}

/// Open a channel (left in `Init`) and return its local ID.
fn open_channel(chain: &[u8], counterparty_channel: &[u8]) -> Vec<u8> {
    let expected = format!("channel-{}", ChannelCounter::<Runtime>::get()).into_bytes();
    assert_ok!(PacketRelay::open_channel(
        RuntimeOrigin::root(),
        chain.to_vec(),
        counterparty_channel.to_vec(),
    ));
    expected
}

/// Open a channel and have the relayer confirm it.
fn open_confirmed_channel(chain: &[u8], counterparty_channel: &[u8]) -> Vec<u8> {
    let channel_id = open_channel(chain, counterparty_channel);
    assert_ok!(PacketRelay::open_channel_confirm(
        RuntimeOrigin::signed(RELAYER),
        channel_id.clone(),
    ));
    channel_id
}

/// An open `channel-0` on chain-B whose counterparty is itself, so packets
/// sent on it can be received on it.
fn loopback_channel() -> Vec<u8> {
    assert_eq!(ChannelCounter::<Runtime>::get(), 0);
    open_confirmed_channel(CHAIN_B, b"channel-0")
}

fn send_to(channel_id: &[u8], dst_agent: Option<&str>, payload: PacketPayload<Runtime>) -> Sequence {
    let channel = PacketRelay::channel(channel_id).expect("channel exists");
    let next = channel_sequences(channel_id).next_send;
    assert_ok!(PacketRelay::send_packet(
        RuntimeOrigin::signed(ALICE),
        channel_id.to_vec(),
        channel.counterparty_chain_id.to_vec(),
        channel.counterparty_channel_id.to_vec(),
        dst_agent.map(|a| a.as_bytes().to_vec()),
        payload,
    ));
    next
}

fn send(channel_id: &[u8], payload: PacketPayload<Runtime>) -> Sequence {
    send_to(channel_id, None, payload)
}

fn channel_sequences(channel_id: &[u8]) -> SequenceState {
    PacketRelay::sequences(channel_id).expect("sequences exist")
}

/// The packet carried by the most recent `PacketSent` event.
fn last_sent_packet() -> Packet<Runtime> {
    System::events()
        .into_iter()
        .rev()
        .find_map(|record| match record.event {
            RuntimeEvent::PacketRelay(Event::PacketSent { packet, .. }) => Some(packet),
            _ => None,
        })
        .expect("a packet was sent")
}

/// A packet arriving on `channel_id` from its counterparty.
fn inbound(
    channel_id: &[u8],
    sequence: Sequence,
    dst_agent: Option<&str>,
    payload: PacketPayload<Runtime>,
    timeout_height: u32,
) -> Packet<Runtime> {
    let channel = PacketRelay::channel(channel_id).expect("channel exists");
    Packet::<Runtime> {
        sequence,
        src_channel_id: channel.counterparty_channel_id,
        dst_chain_id: bounded(b"clawchain"),
        dst_channel_id: channel_key(channel_id),
        dst_agent_id: dst_agent.map(|a| bounded(a.as_bytes())),
        payload,
        timeout_height,
    }
}

fn receive(packet: Packet<Runtime>) {
    assert_ok!(PacketRelay::receive_packet(RuntimeOrigin::signed(RELAYER), packet));
}

fn receipt_ack(channel_id: &[u8], sequence: Sequence) -> Acknowledgement<Runtime> {
    PacketRelay::receipt(channel_id, sequence)
        .expect("receipt recorded")
        .ack
}

fn ack_ok() -> Acknowledgement<Runtime> {
    Acknowledgement::ok()
}

// =========================================================
// Configuration
// =========================================================

#[test]
fn mock_configuration_passes_integrity_test() {
    new_test_ext().execute_with(|| {
        use frame_support::traits::Hooks;
        <PacketRelay as Hooks<u32>>::integrity_test();
    });
}

#[test]
fn genesis_relayers_are_deduplicated() {
    let mut storage = frame_system::GenesisConfig::<Runtime>::default()
        .build_storage()
        .unwrap();
    crate::GenesisConfig::<Runtime> {
        relayers: vec![RELAYER, RELAYER, OTHER_RELAYER],
    }
    .assimilate_storage(&mut storage)
    .unwrap();

    sp_io::TestExternalities::from(storage).execute_with(|| {
        assert_eq!(PacketRelay::relayers(), vec![RELAYER, OTHER_RELAYER]);
    });
}

#[test]
#[should_panic(expected = "genesis relayers exceed MaxRelayers")]
fn genesis_rejects_too_many_relayers() {
    let mut storage = frame_system::GenesisConfig::<Runtime>::default()
        .build_storage()
        .unwrap();
    let _ = crate::GenesisConfig::<Runtime> {
        relayers: vec![1, 2, 3, 4],
    }
    .assimilate_storage(&mut storage);
}
