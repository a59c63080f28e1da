//! Packet relay traits and interfaces.
//!
//! Everything the pallet needs from the rest of the runtime goes through one
//! of these seams: the local agent registry, the packet admission policy, and
//! the application handlers that consume inbound payloads.

use crate::types::{AgentId, Packet, Sequence};
use crate::Config;
use frame_support::pallet_prelude::*;
use sp_core::H256;

// =========================================================
// Agent Registry Interface
// =========================================================

/// Interface to agent-registry for cross-chain agent identity validation.
pub trait AgentRegistryInterface<AccountId> {
    /// Check if an agent exists.
    fn agent_exists(agent_id: AgentId) -> bool;

    /// Check if an agent is active.
    fn is_agent_active(agent_id: AgentId) -> bool;
}

// =========================================================
// Packet Admission
// =========================================================

/// Decides who may carry packets and handshake confirmations into this chain.
///
/// The trusted relayer set (`RelayerSetAdmission`) is the only policy today. A
/// light-client verifier would implement this trait instead and leave
/// sequencing, commitments and receipts untouched.
pub trait PacketAdmission<T: Config> {
    /// Authorize a relayer-gated call that does not carry a packet body
    /// (handshake confirmations, acknowledgements).
    fn ensure_relayer(who: &T::AccountId) -> DispatchResult;

    /// Authorize delivery of `packet` by `who`.
    fn admit_packet(who: &T::AccountId, packet: &Packet<T>) -> DispatchResult;
}

// =========================================================
// Inbound Payload Handlers
// =========================================================

/// Task market hook for `TaskDelegate` payloads.
pub trait TaskDelegationHandler {
    /// `assignee` is the local agent the packet was addressed to, if any.
    fn on_task_delegated(
        source_chain: &[u8],
        task_id: u64,
        requester_agent: AgentId,
        assignee: Option<AgentId>,
        payload_hash: H256,
    ) -> DispatchResult;
}

/// Reputation ledger hook for `ReputationUpdate` payloads.
pub trait ReputationUpdateHandler {
    fn on_reputation_update(
        source_chain: &[u8],
        agent_id: AgentId,
        delta: i32,
        reason_hash: H256,
    ) -> DispatchResult;
}

/// DID registry hook for `DidProof` payloads.
pub trait DidProofHandler {
    fn on_did_proof(
        source_chain: &[u8],
        agent: Option<AgentId>,
        did: &[u8],
        proof: &[u8],
    ) -> DispatchResult;
}

/// Consumer of opaque `Raw` payloads.
pub trait RawPacketHandler {
    fn on_raw(
        source_chain: &[u8],
        channel_id: &[u8],
        sequence: Sequence,
        data: &[u8],
    ) -> DispatchResult;
}

impl TaskDelegationHandler for () {
    fn on_task_delegated(
        _source_chain: &[u8],
        _task_id: u64,
        _requester_agent: AgentId,
        _assignee: Option<AgentId>,
        _payload_hash: H256,
    ) -> DispatchResult {
        Ok(())
    }
}

impl ReputationUpdateHandler for () {
    fn on_reputation_update(
        _source_chain: &[u8],
        _agent_id: AgentId,
        _delta: i32,
        _reason_hash: H256,
    ) -> DispatchResult {
        Ok(())
    }
}

impl DidProofHandler for () {
    fn on_did_proof(
        _source_chain: &[u8],
        _agent: Option<AgentId>,
        _did: &[u8],
        _proof: &[u8],
    ) -> DispatchResult {
        Ok(())
    }
}

impl RawPacketHandler for () {
    fn on_raw(
        _source_chain: &[u8],
        _channel_id: &[u8],
        _sequence: Sequence,
        _data: &[u8],
    ) -> DispatchResult {
        Ok(())
    }
}
