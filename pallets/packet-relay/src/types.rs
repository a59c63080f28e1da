//! Packet relay types and data structures.

use super::Config;
use codec::{Decode, Encode, MaxEncodedLen};
use frame_support::pallet_prelude::*;
use frame_system::pallet_prelude::BlockNumberFor;
use sp_core::H256;

// =========================================================
// Type Aliases
// =========================================================

pub type Sequence = u64;
pub type AgentId = u64;
pub type AckErrorCode = u16;
pub type ChannelId<T> = BoundedVec<u8, <T as Config>::MaxChannelIdLen>;
pub type ChainId<T> = BoundedVec<u8, <T as Config>::MaxChainIdLen>;
pub type RemoteAgentId<T> = BoundedVec<u8, <T as Config>::MaxRemoteAgentIdLen>;
pub type PayloadBytes<T> = BoundedVec<u8, <T as Config>::MaxPayloadLen>;

/// Error codes carried by negative acknowledgements.
pub mod ack_codes {
    use super::AckErrorCode;

    /// `dst_agent` (or an assignee hint) names a remote agent with no local mapping.
    pub const UNKNOWN_REMOTE_AGENT: AckErrorCode = 1;
    /// The resolved local agent is not in the agent registry.
    pub const LOCAL_AGENT_NOT_FOUND: AckErrorCode = 2;
    /// The resolved local agent exists but is not active.
    pub const LOCAL_AGENT_INACTIVE: AckErrorCode = 3;
    /// The application handler refused the payload.
    pub const HANDLER_REJECTED: AckErrorCode = 4;
    /// The payload variant cannot be delivered as an inbound packet.
    pub const UNSUPPORTED_PAYLOAD: AckErrorCode = 5;
}

// =========================================================
// Channel State Machine
// =========================================================

/// Channel lifecycle state.
#[derive(
    Clone, Copy, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen,
    codec::DecodeWithMemTracking,
)]
pub enum ChannelState {
    /// Created by governance, awaiting relayer confirmation of the pairing.
    Init,
    /// Confirmed by a relayer; packets flow in both directions.
    Open,
    /// Close requested by governance, awaiting relayer confirmation.
    CloseInit,
    /// Terminal.
    Closed,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::Init
    }
}

/// Handshake steps that move a channel between states.
#[derive(Clone, Copy, Eq, PartialEq, RuntimeDebug)]
pub enum ChannelTransition {
    /// Relayer confirms the counterparty accepted the pairing.
    ConfirmOpen,
    /// Governance asks to close the channel.
    InitClose,
    /// Relayer confirms the counterparty closed its end.
    ConfirmClose,
}

impl ChannelState {
    /// Next state for `transition`, or `None` if the step is illegal from here.
    pub fn transition(self, transition: ChannelTransition) -> Option<Self> {
        use ChannelState::*;
        use ChannelTransition::*;

        match (self, transition) {
            (Init, ConfirmOpen) => Some(Open),
            (Init, InitClose) | (Open, InitClose) => Some(CloseInit),
            (CloseInit, ConfirmClose) => Some(Closed),
            (Open, ConfirmOpen)
            | (CloseInit, ConfirmOpen)
            | (Closed, ConfirmOpen)
            | (CloseInit, InitClose)
            | (Closed, InitClose)
            | (Init, ConfirmClose)
            | (Open, ConfirmClose)
            | (Closed, ConfirmClose) => None,
        }
    }

    /// Whether new packets may be sent or received on a channel in this state.
    pub fn is_open(self) -> bool {
        match self {
            ChannelState::Open => true,
            ChannelState::Init | ChannelState::CloseInit | ChannelState::Closed => false,
        }
    }
}

// =========================================================
// Channel Info
// =========================================================

/// Channel information stored on-chain.
#[derive(
    Encode,
    Decode,
    CloneNoBound,
    EqNoBound,
    PartialEqNoBound,
    RuntimeDebugNoBound,
    TypeInfo,
    MaxEncodedLen,
)]
#[scale_info(skip_type_params(T))]
pub struct ChannelInfo<T: Config> {
    /// Channel identifier on this chain.
    pub channel_id: ChannelId<T>,
    /// Counterparty chain identifier.
    pub counterparty_chain_id: ChainId<T>,
    /// Channel identifier on the counterparty chain.
    pub counterparty_channel_id: ChannelId<T>,
    pub state: ChannelState,
    pub created_at: BlockNumberFor<T>,
    pub opened_at: Option<BlockNumberFor<T>>,
    pub closed_at: Option<BlockNumberFor<T>>,
}

impl<T: Config> codec::DecodeWithMemTracking for ChannelInfo<T> {}

// =========================================================
// Sequences
// =========================================================

/// Per-channel sequence counters. All three start at 1 and never decrease.
#[derive(
    Clone, Copy, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen,
    codec::DecodeWithMemTracking,
)]
pub struct SequenceState {
    /// Sequence assigned to the next outbound packet.
    pub next_send: Sequence,
    /// One past the highest inbound sequence received so far.
    pub next_recv: Sequence,
    /// One past the number of outbound packets acknowledged so far.
    pub next_ack: Sequence,
}

impl Default for SequenceState {
    fn default() -> Self {
        Self {
            next_send: 1,
            next_recv: 1,
            next_ack: 1,
        }
    }
}

impl SequenceState {
    /// Hand out the next send sequence.
    pub fn issue_send(&mut self) -> Sequence {
        let sequence = self.next_send;
        self.next_send = sequence.saturating_add(1);
        sequence
    }

    pub fn record_recv(&mut self, sequence: Sequence) {
        self.next_recv = self.next_recv.max(sequence.saturating_add(1));
    }

    pub fn record_ack(&mut self) {
        self.next_ack = self.next_ack.saturating_add(1);
    }
}

// =========================================================
// Packet
// =========================================================

/// A cross-chain packet as seen by relayers.
///
/// On the sending chain `src_channel_id` is the local channel; on the receiving
/// chain `dst_channel_id` is.
#[derive(
    Encode,
    Decode,
    CloneNoBound,
    EqNoBound,
    PartialEqNoBound,
    RuntimeDebugNoBound,
    TypeInfo,
    MaxEncodedLen,
)]
#[scale_info(skip_type_params(T))]
pub struct Packet<T: Config> {
    pub sequence: Sequence,
    pub src_channel_id: ChannelId<T>,
    /// Chain the packet is addressed to.
    pub dst_chain_id: ChainId<T>,
    pub dst_channel_id: ChannelId<T>,
    /// Destination agent, expressed in the sending chain's remote-agent namespace.
    pub dst_agent_id: Option<RemoteAgentId<T>>,
    pub payload: PacketPayload<T>,
    /// First block at which the packet is expired.
    pub timeout_height: BlockNumberFor<T>,
}

impl<T: Config> codec::DecodeWithMemTracking for Packet<T> {}

impl<T: Config> Packet<T> {
    pub fn is_expired_at(&self, now: BlockNumberFor<T>) -> bool {
        now >= self.timeout_height
    }
}

// =========================================================
// Packet Payload
// =========================================================

/// Closed set of payload kinds. Adding a kind is a protocol upgrade.
#[derive(
    Encode,
    Decode,
    CloneNoBound,
    EqNoBound,
    PartialEqNoBound,
    RuntimeDebugNoBound,
    TypeInfo,
    MaxEncodedLen,
)]
#[scale_info(skip_type_params(T))]
pub enum PacketPayload<T: Config> {
    /// Opaque bytes.
    Raw(PayloadBytes<T>),
    /// Delegate a task to an agent on the destination chain.
    TaskDelegate {
        task_id: u64,
        requester_agent: AgentId,
        assignee_hint: Option<RemoteAgentId<T>>,
        payload_hash: H256,
    },
    /// Propagate a reputation change.
    ReputationUpdate {
        agent_id: AgentId,
        delta: i32,
        reason_hash: H256,
    },
    /// Prove an agent's DID across chains.
    DidProof {
        did: PayloadBytes<T>,
        proof: PayloadBytes<T>,
    },
    /// Acknowledgement body. Only valid on the acknowledge path.
    Ack(Acknowledgement<T>),
}

impl<T: Config> codec::DecodeWithMemTracking for PacketPayload<T> {}

// =========================================================
// Acknowledgement
// =========================================================

/// Resolution of a delivered packet, written by the receiver and carried back by a relayer.
#[derive(
    Encode,
    Decode,
    CloneNoBound,
    EqNoBound,
    PartialEqNoBound,
    RuntimeDebugNoBound,
    TypeInfo,
    MaxEncodedLen,
)]
#[scale_info(skip_type_params(T))]
pub struct Acknowledgement<T: Config> {
    pub success: bool,
    pub error_code: Option<AckErrorCode>,
    pub data: PayloadBytes<T>,
}

impl<T: Config> codec::DecodeWithMemTracking for Acknowledgement<T> {}

impl<T: Config> Acknowledgement<T> {
    pub fn ok() -> Self {
        Self {
            success: true,
            error_code: None,
            data: BoundedVec::default(),
        }
    }

    pub fn error(code: AckErrorCode) -> Self {
        Self {
            success: false,
            error_code: Some(code),
            data: BoundedVec::default(),
        }
    }
}

// =========================================================
// Stored Records
// =========================================================

/// Proof-of-send. Present while the packet is unresolved.
#[derive(
    Encode,
    Decode,
    CloneNoBound,
    EqNoBound,
    PartialEqNoBound,
    RuntimeDebugNoBound,
    TypeInfo,
    MaxEncodedLen,
)]
#[scale_info(skip_type_params(T))]
pub struct PacketCommitment<T: Config> {
    pub hash: H256,
    pub timeout_height: BlockNumberFor<T>,
}

impl<T: Config> codec::DecodeWithMemTracking for PacketCommitment<T> {}

/// Proof-of-receive plus the acknowledgement the relayer should carry back.
#[derive(
    Encode,
    Decode,
    CloneNoBound,
    EqNoBound,
    PartialEqNoBound,
    RuntimeDebugNoBound,
    TypeInfo,
    MaxEncodedLen,
)]
#[scale_info(skip_type_params(T))]
pub struct PacketReceipt<T: Config> {
    pub received_at: BlockNumberFor<T>,
    /// Timeout height of the received packet; bounds how long the receipt must live.
    pub timeout_height: BlockNumberFor<T>,
    pub ack: Acknowledgement<T>,
}

impl<T: Config> codec::DecodeWithMemTracking for PacketReceipt<T> {}

/// Resolved acknowledgement on the sending side.
#[derive(
    Encode,
    Decode,
    CloneNoBound,
    EqNoBound,
    PartialEqNoBound,
    RuntimeDebugNoBound,
    TypeInfo,
    MaxEncodedLen,
)]
#[scale_info(skip_type_params(T))]
pub struct AckRecord<T: Config> {
    pub ack: Acknowledgement<T>,
    pub resolved_at: BlockNumberFor<T>,
}

impl<T: Config> codec::DecodeWithMemTracking for AckRecord<T> {}
