//! Mock runtime for packet relay pallet tests.

#![cfg(test)]

use super::*;
use crate::traits::{
    AgentRegistryInterface, DidProofHandler, RawPacketHandler, ReputationUpdateHandler,
    TaskDelegationHandler,
};
use core::cell::RefCell;
use frame_support::derive_impl;
use frame_support::pallet_prelude::DispatchResult;
use frame_support::traits::ConstU32;
use sp_core::H256;
use sp_runtime::{BuildStorage, DispatchError};

pub const RELAYER: u64 = 10;
pub const OTHER_RELAYER: u64 = 11;
pub const ALICE: u64 = 1;
pub const TIMEOUT_BLOCKS: u32 = 100;
pub const RETENTION_BLOCKS: u32 = 50;

// =========================================================
// Mock Agent Registry
// =========================================================

/// Agents 1..=100 exist; agent 99 is suspended.
pub const INACTIVE_AGENT: AgentId = 99;

pub struct MockAgentRegistry;

impl AgentRegistryInterface<u64> for MockAgentRegistry {
    fn agent_exists(agent_id: AgentId) -> bool {
        agent_id > 0 && agent_id <= 100
    }

    fn is_agent_active(agent_id: AgentId) -> bool {
        Self::agent_exists(agent_id) && agent_id != INACTIVE_AGENT
    }
}

// =========================================================
// Recording Handlers
// =========================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivered {
    Raw {
        source_chain: Vec<u8>,
        sequence: Sequence,
        data: Vec<u8>,
    },
    Task {
        source_chain: Vec<u8>,
        task_id: u64,
        requester_agent: AgentId,
        assignee: Option<AgentId>,
        payload_hash: H256,
    },
    Reputation {
        agent_id: AgentId,
        delta: i32,
    },
    Did {
        agent: Option<AgentId>,
        did: Vec<u8>,
    },
}

thread_local! {
    static DELIVERED: RefCell<Vec<Delivered>> = RefCell::new(Vec::new());
    static REJECT_HANDLERS: RefCell<bool> = RefCell::new(false);
}

/// Payloads handed to application handlers so far.
pub fn delivered() -> Vec<Delivered> {
    DELIVERED.with(|d| d.borrow().clone())
}

/// Make every handler write a record and then fail.
pub fn reject_handlers(reject: bool) {
    REJECT_HANDLERS.with(|r| *r.borrow_mut() = reject);
}

/// Storage key a rejecting handler writes before failing; must be rolled back.
pub const HANDLER_SCRATCH_KEY: &[u8] = b":packet-relay-test:scratch";

fn record(item: Delivered) -> DispatchResult {
    if REJECT_HANDLERS.with(|r| *r.borrow()) {
        sp_io::storage::set(HANDLER_SCRATCH_KEY, &[1]);
        return Err(DispatchError::Other("handler rejected payload"));
    }
    DELIVERED.with(|d| d.borrow_mut().push(item));
    Ok(())
}

pub struct RecordingHandlers;

impl TaskDelegationHandler for RecordingHandlers {
    fn on_task_delegated(
        source_chain: &[u8],
        task_id: u64,
        requester_agent: AgentId,
        assignee: Option<AgentId>,
        payload_hash: H256,
    ) -> DispatchResult {
        record(Delivered::Task {
            source_chain: source_chain.to_vec(),
            task_id,
            requester_agent,
            assignee,
            payload_hash,
        })
    }
}

impl ReputationUpdateHandler for RecordingHandlers {
    fn on_reputation_update(
        _source_chain: &[u8],
        agent_id: AgentId,
        delta: i32,
        _reason_hash: H256,
    ) -> DispatchResult {
        record(Delivered::Reputation { agent_id, delta })
    }
}

impl DidProofHandler for RecordingHandlers {
    fn on_did_proof(
        _source_chain: &[u8],
        agent: Option<AgentId>,
        did: &[u8],
        _proof: &[u8],
    ) -> DispatchResult {
        record(Delivered::Did {
            agent,
            did: did.to_vec(),
        })
    }
}

impl RawPacketHandler for RecordingHandlers {
    fn on_raw(
        source_chain: &[u8],
        _channel_id: &[u8],
        sequence: Sequence,
        data: &[u8],
    ) -> DispatchResult {
        record(Delivered::Raw {
            source_chain: source_chain.to_vec(),
            sequence,
            data: data.to_vec(),
        })
    }
}

// =========================================================
// Mock Runtime
// =========================================================

frame_support::construct_runtime!(
    pub enum Runtime {
        System: frame_system,
        PacketRelay: crate,
    }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Runtime {
    type Block = frame_system::mocking::MockBlockU32<Runtime>;
    type AccountData = ();
}

impl Config for Runtime {
    type RuntimeEvent = RuntimeEvent;
    type WeightInfo = ();
    type RelayerManagerOrigin = frame_system::EnsureRoot<u64>;
    type AgentMappingOrigin = frame_system::EnsureRoot<u64>;
    type MaxRelayers = ConstU32<3>;
    type MaxChannelsPerChain = ConstU32<2>;
    type MaxChannelIdLen = ConstU32<32>;
    type MaxChainIdLen = ConstU32<16>;
    type MaxRemoteAgentIdLen = ConstU32<16>;
    type MaxPayloadLen = ConstU32<64>;
    type MaxPendingPackets = ConstU32<3>;
    type PacketTimeoutBlocks = ConstU32<TIMEOUT_BLOCKS>;
    type ReceiptRetentionBlocks = ConstU32<RETENTION_BLOCKS>;
    type MaxPruneBatch = ConstU32<4>;
    type MaxAgentMappingsPerChain = ConstU32<2>;
    type AgentRegistry = MockAgentRegistry;
    type Admission = RelayerSetAdmission<Runtime>;
    type TaskHandler = RecordingHandlers;
    type ReputationHandler = RecordingHandlers;
    type DidHandler = RecordingHandlers;
    type RawHandler = RecordingHandlers;
}

// =========================================================
// Test Externalities
// =========================================================

/// Fresh state at block 1 with `RELAYER` trusted from genesis.
pub fn new_test_ext() -> sp_io::TestExternalities {
    let mut storage = frame_system::GenesisConfig::<Runtime>::default()
        .build_storage()
        .unwrap();
    crate::GenesisConfig::<Runtime> {
        relayers: vec![RELAYER],
    }
    .assimilate_storage(&mut storage)
    .unwrap();

    DELIVERED.with(|d| d.borrow_mut().clear());
    reject_handlers(false);

    let mut ext: sp_io::TestExternalities = storage.into();
    ext.execute_with(|| System::set_block_number(1));
    ext
}

pub fn run_to_block(n: u32) {
    System::set_block_number(n);
}
