//! # Packet Relay Pallet
//!
//! Sequenced, relayer-authenticated cross-chain packets for ClawChain agents.
//!
//! ## Overview
//!
//! Two ledgers exchange packets over named channels. Each side keeps a
//! commitment for every packet it sent and a receipt for every packet it
//! received; a trusted relayer set carries packets, acknowledgements and
//! handshake confirmations between them. Commitments are released by an
//! acknowledgement or, once the timeout height has passed, by anyone.
//!
//! Every store is bounded by a `Config` constant and checked in the same
//! storage mutation that grows it.
//!
//! ## Dispatchable Functions
//!
//! ### Channel Management
//! - `open_channel` - Create a channel in `Init` towards a counterparty chain
//! - `open_channel_confirm` - Relayer confirms the pairing (`Init` → `Open`)
//! - `close_channel_init` - Request closure (`Init`/`Open` → `CloseInit`)
//! - `close_channel_confirm` - Relayer confirms closure (`CloseInit` → `Closed`)
//!
//! ### Packet Operations
//! - `send_packet` - Sequence and commit an outbound packet
//! - `receive_packet` - Deliver an inbound packet (replay and timeout guarded)
//! - `acknowledge_packet` - Resolve an outbound packet with its acknowledgement
//! - `timeout_packet` - Release an expired outbound packet (anyone)
//! - `prune_receipts` - Drop receipts that can no longer protect against replay
//!
//! ### Relayer Management
//! - `add_relayer` / `remove_relayer`
//!
//! ### Cross-Chain Agents
//! - `register_cross_chain_agent` / `remove_cross_chain_agent`
//!
//! ## Design decisions
//!
//! - Packets may only be sent on, and received into, `Open` channels.
//! - Channels are unordered: any unreceived, unexpired sequence may be delivered.
//! - A receipt is recorded even when the application handler rejects the
//!   payload; the rejection is returned as a negative acknowledgement.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod bounded;
pub mod traits;
pub mod types;
pub mod weights;

mod agents;
mod channel;
mod packet;
mod relayers;

pub use packet::raw_payload;
pub use relayers::RelayerSetAdmission;

#[cfg(test)]
mod mock;
#[cfg(test)]
mod tests;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub(crate) const LOG_TARGET: &str = "runtime::packet-relay";

/// Render an identifier for log output.
pub(crate) fn ident(bytes: &[u8]) -> &str {
    core::str::from_utf8(bytes).unwrap_or("<non-utf8>")
}

#[frame_support::pallet]
pub mod pallet {
    use super::*;
    use crate::bounded::{self, InsertError};
    use crate::traits::{
        AgentRegistryInterface, DidProofHandler, PacketAdmission, RawPacketHandler,
        ReputationUpdateHandler, TaskDelegationHandler,
    };
    use alloc::vec::Vec;
    use frame_support::pallet_prelude::*;
    use frame_system::pallet_prelude::*;
    use sp_core::H256;

    pub use crate::types::{
        AckErrorCode, AckRecord, Acknowledgement, AgentId, ChainId, ChannelId, ChannelInfo,
        ChannelState, Packet, PacketCommitment, PacketPayload, PacketReceipt, RemoteAgentId,
        Sequence, SequenceState,
    };
    pub use crate::weights::WeightInfo;

    // =========================================================
    // Config
    // =========================================================

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;
        type WeightInfo: WeightInfo;

        /// Origin that opens/closes channels and manages relayers (e.g. governance or sudo).
        type RelayerManagerOrigin: EnsureOrigin<Self::RuntimeOrigin>;

        /// Origin that may register or remove cross-chain agent mappings.
        type AgentMappingOrigin: EnsureOrigin<Self::RuntimeOrigin>;

        /// Maximum number of trusted relayers.
        #[pallet::constant]
        type MaxRelayers: Get<u32>;

        /// Maximum number of channels per counterparty chain.
        #[pallet::constant]
        type MaxChannelsPerChain: Get<u32>;

        /// Maximum byte length of a channel identifier.
        #[pallet::constant]
        type MaxChannelIdLen: Get<u32>;

        /// Maximum byte length of a chain identifier.
        #[pallet::constant]
        type MaxChainIdLen: Get<u32>;

        /// Maximum byte length of a remote agent identifier.
        #[pallet::constant]
        type MaxRemoteAgentIdLen: Get<u32>;

        /// Maximum encoded length of a packet payload.
        #[pallet::constant]
        type MaxPayloadLen: Get<u32>;

        /// Maximum unresolved outbound packets per channel. Also caps the
        /// acknowledgement records retained per channel.
        #[pallet::constant]
        type MaxPendingPackets: Get<u32>;

        /// Number of blocks after sending at which an unresolved packet times out.
        #[pallet::constant]
        type PacketTimeoutBlocks: Get<u32>;

        /// Blocks a receipt is kept past its packet's timeout height before it may be pruned.
        #[pallet::constant]
        type ReceiptRetentionBlocks: Get<u32>;

        /// Maximum receipts dropped by one `prune_receipts` call.
        #[pallet::constant]
        type MaxPruneBatch: Get<u32>;

        /// Maximum cross-chain agent mappings per counterparty chain.
        #[pallet::constant]
        type MaxAgentMappingsPerChain: Get<u32>;

        /// Interface to agent-registry for local agent identity validation.
        type AgentRegistry: AgentRegistryInterface<Self::AccountId>;

        /// Who may carry packets and confirmations into this chain.
        type Admission: PacketAdmission<Self>;

        /// Inbound `TaskDelegate` consumer.
        type TaskHandler: TaskDelegationHandler;

        /// Inbound `ReputationUpdate` consumer.
        type ReputationHandler: ReputationUpdateHandler;

        /// Inbound `DidProof` consumer.
        type DidHandler: DidProofHandler;

        /// Inbound `Raw` consumer.
        type RawHandler: RawPacketHandler;
    }

    // =========================================================
    // Pallet
    // =========================================================

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    // =========================================================
    // Storage
    // =========================================================

    /// Number used for the next generated channel ID.
    #[pallet::storage]
    pub type ChannelCounter<T: Config> = StorageValue<_, u64, ValueQuery>;

    /// All channels, keyed by local channel ID. Closed channels stay here.
    #[pallet::storage]
    pub type Channels<T: Config> =
        StorageMap<_, Blake2_128Concat, ChannelId<T>, ChannelInfo<T>, OptionQuery>;

    /// Channel IDs grouped by counterparty chain.
    #[pallet::storage]
    pub type ChannelsByChain<T: Config> = StorageMap<
        _,
        Blake2_128Concat,
        ChainId<T>,
        BoundedVec<ChannelId<T>, T::MaxChannelsPerChain>,
        ValueQuery,
    >;

    /// Send / receive / ack counters per channel.
    #[pallet::storage]
    pub type ChannelSequences<T: Config> =
        StorageMap<_, Blake2_128Concat, ChannelId<T>, SequenceState, OptionQuery>;

    /// Live commitment count per channel.
    #[pallet::storage]
    pub type PendingPackets<T: Config> =
        StorageMap<_, Blake2_128Concat, ChannelId<T>, u32, ValueQuery>;

    /// Outbound packets still in flight.
    #[pallet::storage]
    pub type PacketCommitments<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        ChannelId<T>,
        Blake2_128Concat,
        Sequence,
        PacketCommitment<T>,
        OptionQuery,
    >;

    /// Inbound packets already delivered.
    #[pallet::storage]
    pub type PacketReceipts<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        ChannelId<T>,
        Blake2_128Concat,
        Sequence,
        PacketReceipt<T>,
        OptionQuery,
    >;

    /// Resolved acknowledgements for outbound packets.
    #[pallet::storage]
    pub type PacketAcknowledgements<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        ChannelId<T>,
        Blake2_128Concat,
        Sequence,
        AckRecord<T>,
        OptionQuery,
    >;

    /// Sequences of retained acknowledgement records per channel, oldest first.
    #[pallet::storage]
    pub type AckRetention<T: Config> = StorageMap<
        _,
        Blake2_128Concat,
        ChannelId<T>,
        BoundedVec<Sequence, T::MaxPendingPackets>,
        ValueQuery,
    >;

    /// Accounts that may carry packets and confirmations.
    #[pallet::storage]
    pub type TrustedRelayers<T: Config> =
        StorageValue<_, BoundedVec<T::AccountId, T::MaxRelayers>, ValueQuery>;

    /// (counterparty chain, remote agent) → local agent.
    #[pallet::storage]
    pub type CrossChainAgentMap<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        ChainId<T>,
        Blake2_128Concat,
        RemoteAgentId<T>,
        AgentId,
        OptionQuery,
    >;

    /// Number of agent mappings per counterparty chain.
    #[pallet::storage]
    pub type AgentMappingCount<T: Config> =
        StorageMap<_, Blake2_128Concat, ChainId<T>, u32, ValueQuery>;

    // =========================================================
    // Genesis
    // =========================================================

    #[pallet::genesis_config]
    #[derive(frame_support::DefaultNoBound)]
    pub struct GenesisConfig<T: Config> {
        /// Relayers trusted from block zero. Duplicates are ignored.
        pub relayers: Vec<T::AccountId>,
    }

    #[pallet::genesis_build]
    impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
        fn build(&self) {
            let mut relayers = BoundedVec::<T::AccountId, T::MaxRelayers>::default();
            for relayer in &self.relayers {
                match bounded::try_insert_unique(&mut relayers, relayer.clone()) {
                    Ok(()) | Err(InsertError::Duplicate) => {}
                    Err(InsertError::Full) => panic!("genesis relayers exceed MaxRelayers"),
                }
            }
            TrustedRelayers::<T>::put(relayers);
        }
    }

    // =========================================================
    // Hooks
    // =========================================================

    #[pallet::hooks]
    impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
        fn integrity_test() {
            assert!(T::PacketTimeoutBlocks::get() > 0, "PacketTimeoutBlocks must be non-zero");
            assert!(T::MaxPendingPackets::get() > 0, "MaxPendingPackets must be non-zero");
            assert!(T::MaxRelayers::get() > 0, "MaxRelayers must be non-zero");
            assert!(T::MaxPruneBatch::get() > 0, "MaxPruneBatch must be non-zero");
            // "channel-" followed by up to 20 digits.
            assert!(
                T::MaxChannelIdLen::get() >= 28,
                "MaxChannelIdLen too small for generated channel IDs"
            );
        }
    }

    // =========================================================
    // Events
    // =========================================================

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        ChannelOpened {
            channel_id: Vec<u8>,
            counterparty_chain: Vec<u8>,
            counterparty_channel: Vec<u8>,
        },
        ChannelOpenConfirmed {
            channel_id: Vec<u8>,
            relayer: T::AccountId,
        },
        ChannelCloseInitiated {
            channel_id: Vec<u8>,
        },
        ChannelClosed {
            channel_id: Vec<u8>,
            relayer: T::AccountId,
        },
        /// Carries the whole packet so relayers can forward it without reading storage.
        PacketSent {
            sender: T::AccountId,
            packet: Packet<T>,
            commitment: H256,
        },
        PacketReceived {
            channel_id: Vec<u8>,
            sequence: Sequence,
            relayer: T::AccountId,
            local_agent: Option<AgentId>,
            success: bool,
            error_code: Option<AckErrorCode>,
        },
        PacketAcknowledged {
            channel_id: Vec<u8>,
            sequence: Sequence,
            success: bool,
            error_code: Option<AckErrorCode>,
        },
        PacketTimeout {
            channel_id: Vec<u8>,
            sequence: Sequence,
        },
        ReceiptsPruned {
            channel_id: Vec<u8>,
            count: u32,
        },
        RelayerAdded {
            relayer: T::AccountId,
        },
        RelayerRemoved {
            relayer: T::AccountId,
        },
        CrossChainAgentRegistered {
            chain_id: Vec<u8>,
            remote_agent_id: Vec<u8>,
            local_agent_id: AgentId,
        },
        CrossChainAgentRemoved {
            chain_id: Vec<u8>,
            remote_agent_id: Vec<u8>,
            local_agent_id: AgentId,
        },
    }

    // =========================================================
    // Errors
    // =========================================================

    #[pallet::error]
    pub enum Error<T> {
        /// No channel with this ID.
        ChannelNotFound,
        /// Generated channel ID already in use.
        ChannelAlreadyExists,
        /// The channel is not `Open`.
        ChannelNotOpen,
        /// The handshake step is not legal from the channel's current state.
        InvalidChannelState,
        /// Counterparty identifiers do not match the channel's pairing.
        ChannelMismatch,
        /// No commitment for this (channel, sequence): never sent or already resolved.
        PacketNotFound,
        /// A receipt already exists for this (channel, sequence).
        PacketAlreadyReceived,
        /// The packet's timeout height has been reached.
        PacketTimedOut,
        /// The packet's timeout height has not been reached yet.
        PacketNotTimedOut,
        /// `Ack` payloads only travel through `acknowledge_packet`.
        UnexpectedAckPayload,
        /// No receipt for this (channel, sequence).
        ReceiptNotFound,
        /// The receipt may still be needed for replay protection.
        ReceiptStillLive,
        NotTrustedRelayer,
        TooManyRelayers,
        TooManyChannels,
        RelayerAlreadyRegistered,
        RelayerNotFound,
        PayloadTooLong,
        PendingPacketLimitExceeded,
        ChainIdTooLong,
        ChannelIdTooLong,
        RemoteAgentIdTooLong,
        /// Local agent is not in the agent registry.
        AgentNotFound,
        CrossChainAgentAlreadyMapped,
        CrossChainAgentNotFound,
        TooManyAgentMappings,
    }

    // =========================================================
    // Extrinsics
    // =========================================================

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Open a new channel to a counterparty chain.
        ///
        /// The channel starts in `Init`; packets flow once a relayer confirms it.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::open_channel())]
        pub fn open_channel(
            origin: OriginFor<T>,
            counterparty_chain_id: Vec<u8>,
            counterparty_channel_id: Vec<u8>,
        ) -> DispatchResult {
            T::RelayerManagerOrigin::ensure_origin(origin)?;

            let chain_id = Self::bound_chain_id(counterparty_chain_id)?;
            let counterparty_channel = Self::bound_channel_id(counterparty_channel_id)?;

            Self::do_open_channel(chain_id, counterparty_channel).map(|_| ())
        }

        /// Confirm the counterparty accepted the channel (trusted relayer only).
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::open_channel_confirm())]
        pub fn open_channel_confirm(origin: OriginFor<T>, channel_id: Vec<u8>) -> DispatchResult {
            let who = ensure_signed(origin)?;
            T::Admission::ensure_relayer(&who)?;

            let channel_id = Self::bound_channel_id(channel_id)?;
            Self::do_confirm_open(who, channel_id)
        }

        /// Initiate channel closure.
        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::close_channel_init())]
        pub fn close_channel_init(origin: OriginFor<T>, channel_id: Vec<u8>) -> DispatchResult {
            T::RelayerManagerOrigin::ensure_origin(origin)?;

            let channel_id = Self::bound_channel_id(channel_id)?;
            Self::do_close_init(channel_id)
        }

        /// Confirm channel closure (trusted relayer only).
        ///
        /// Commitments and receipts on the channel are left in place so in-flight
        /// packets can still be acknowledged or timed out.
        #[pallet::call_index(3)]
        #[pallet::weight(T::WeightInfo::close_channel_confirm())]
        pub fn close_channel_confirm(origin: OriginFor<T>, channel_id: Vec<u8>) -> DispatchResult {
            let who = ensure_signed(origin)?;
            T::Admission::ensure_relayer(&who)?;

            let channel_id = Self::bound_channel_id(channel_id)?;
            Self::do_close_confirm(who, channel_id)
        }

        /// Send a packet to the channel's counterparty.
        ///
        /// Any signed account may send; the counterparty identifiers must match
        /// the channel's pairing.
        #[pallet::call_index(4)]
        #[pallet::weight(T::WeightInfo::send_packet())]
        pub fn send_packet(
            origin: OriginFor<T>,
            channel_id: Vec<u8>,
            counterparty_chain_id: Vec<u8>,
            counterparty_channel_id: Vec<u8>,
            dst_agent_id: Option<Vec<u8>>,
            payload: PacketPayload<T>,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;

            let channel_id = Self::bound_channel_id(channel_id)?;
            let dst_chain_id = Self::bound_chain_id(counterparty_chain_id)?;
            let dst_channel_id = Self::bound_channel_id(counterparty_channel_id)?;
            let dst_agent_id = dst_agent_id
                .map(Self::bound_remote_agent_id)
                .transpose()?;

            Self::do_send_packet(who, channel_id, dst_chain_id, dst_channel_id, dst_agent_id, payload)
                .map(|_| ())
        }

        /// Deliver an inbound packet (admitted relayer only).
        #[pallet::call_index(5)]
        #[pallet::weight(T::WeightInfo::receive_packet())]
        pub fn receive_packet(origin: OriginFor<T>, packet: Packet<T>) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::do_receive_packet(who, packet)
        }

        /// Resolve an outbound packet with the counterparty's acknowledgement
        /// (trusted relayer only).
        #[pallet::call_index(6)]
        #[pallet::weight(T::WeightInfo::acknowledge_packet())]
        pub fn acknowledge_packet(
            origin: OriginFor<T>,
            channel_id: Vec<u8>,
            sequence: Sequence,
            ack: Acknowledgement<T>,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            T::Admission::ensure_relayer(&who)?;

            let channel_id = Self::bound_channel_id(channel_id)?;
            Self::do_acknowledge_packet(channel_id, sequence, ack)
        }

        /// Release an outbound packet whose timeout height has passed. Anyone may call.
        #[pallet::call_index(7)]
        #[pallet::weight(T::WeightInfo::timeout_packet())]
        pub fn timeout_packet(
            origin: OriginFor<T>,
            channel_id: Vec<u8>,
            sequence: Sequence,
        ) -> DispatchResult {
            ensure_signed(origin)?;

            let channel_id = Self::bound_channel_id(channel_id)?;
            Self::do_timeout_packet(channel_id, sequence)
        }

        /// Add a trusted relayer.
        #[pallet::call_index(8)]
        #[pallet::weight(T::WeightInfo::add_relayer())]
        pub fn add_relayer(origin: OriginFor<T>, relayer: T::AccountId) -> DispatchResult {
            T::RelayerManagerOrigin::ensure_origin(origin)?;
            Self::do_add_relayer(relayer)
        }

        /// Remove a trusted relayer. Removing the last one is allowed.
        #[pallet::call_index(9)]
        #[pallet::weight(T::WeightInfo::remove_relayer())]
        pub fn remove_relayer(origin: OriginFor<T>, relayer: T::AccountId) -> DispatchResult {
            T::RelayerManagerOrigin::ensure_origin(origin)?;
            Self::do_remove_relayer(relayer)
        }

        /// Map a counterparty chain's agent identifier to a local agent.
        ///
        /// Never overwrites: an existing mapping must be removed first.
        #[pallet::call_index(10)]
        #[pallet::weight(T::WeightInfo::register_cross_chain_agent())]
        pub fn register_cross_chain_agent(
            origin: OriginFor<T>,
            chain_id: Vec<u8>,
            remote_agent_id: Vec<u8>,
            local_agent_id: AgentId,
        ) -> DispatchResult {
            T::AgentMappingOrigin::ensure_origin(origin)?;

            let chain_id = Self::bound_chain_id(chain_id)?;
            let remote_agent_id = Self::bound_remote_agent_id(remote_agent_id)?;
            Self::do_register_cross_chain_agent(chain_id, remote_agent_id, local_agent_id)
        }

        /// Remove a cross-chain agent mapping.
        #[pallet::call_index(11)]
        #[pallet::weight(T::WeightInfo::remove_cross_chain_agent())]
        pub fn remove_cross_chain_agent(
            origin: OriginFor<T>,
            chain_id: Vec<u8>,
            remote_agent_id: Vec<u8>,
        ) -> DispatchResult {
            T::AgentMappingOrigin::ensure_origin(origin)?;

            let chain_id = Self::bound_chain_id(chain_id)?;
            let remote_agent_id = Self::bound_remote_agent_id(remote_agent_id)?;
            Self::do_remove_cross_chain_agent(chain_id, remote_agent_id)
        }

        /// Drop receipts whose packets are past timeout by at least
        /// `ReceiptRetentionBlocks`. Anyone may call; all-or-nothing.
        #[pallet::call_index(12)]
        #[pallet::weight(T::WeightInfo::prune_receipts(sequences.len() as u32))]
        pub fn prune_receipts(
            origin: OriginFor<T>,
            channel_id: Vec<u8>,
            sequences: BoundedVec<Sequence, T::MaxPruneBatch>,
        ) -> DispatchResult {
            ensure_signed(origin)?;

            let channel_id = Self::bound_channel_id(channel_id)?;
            Self::do_prune_receipts(channel_id, &sequences).map(|_| ())
        }
    }

    // =========================================================
    // Identifier bounding
    // =========================================================

    impl<T: Config> Pallet<T> {
        pub(crate) fn bound_channel_id(raw: Vec<u8>) -> Result<ChannelId<T>, Error<T>> {
            bounded::bound_bytes(raw, Error::<T>::ChannelIdTooLong)
        }

        pub(crate) fn bound_chain_id(raw: Vec<u8>) -> Result<ChainId<T>, Error<T>> {
            bounded::bound_bytes(raw, Error::<T>::ChainIdTooLong)
        }

        pub(crate) fn bound_remote_agent_id(raw: Vec<u8>) -> Result<RemoteAgentId<T>, Error<T>> {
            bounded::bound_bytes(raw, Error::<T>::RemoteAgentIdTooLong)
        }
    }
}
