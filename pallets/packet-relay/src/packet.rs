//! Packet flow: sequencing, commitments, receipts, acknowledgements and timeouts.

use crate::bounded;
use crate::traits::{
    AgentRegistryInterface, DidProofHandler, PacketAdmission, RawPacketHandler,
    ReputationUpdateHandler, TaskDelegationHandler,
};
use crate::types::{ack_codes, PayloadBytes, RemoteAgentId};
use crate::*;
use frame_support::{pallet_prelude::*, storage::with_storage_layer};
use frame_system::pallet_prelude::BlockNumberFor;
use sp_core::H256;
use sp_io::hashing::blake2_256;
use sp_runtime::traits::Saturating;

/// Domain tag mixed into every commitment hash.
const COMMITMENT_TAG: &[u8] = b"clawchain/packet-relay/commitment/v1";

impl<T: Config> Pallet<T> {
    // =========================================================
    // Send
    // =========================================================

    /// Assign the next send sequence and commit the packet.
    pub(crate) fn do_send_packet(
        sender: T::AccountId,
        channel_id: ChannelId<T>,
        dst_chain_id: ChainId<T>,
        dst_channel_id: ChannelId<T>,
        dst_agent_id: Option<RemoteAgentId<T>>,
        payload: PacketPayload<T>,
    ) -> Result<Sequence, DispatchError> {
        let channel = Channels::<T>::get(&channel_id).ok_or(Error::<T>::ChannelNotFound)?;
        ensure!(channel.state.is_open(), Error::<T>::ChannelNotOpen);
        ensure!(
            channel.counterparty_chain_id == dst_chain_id
                && channel.counterparty_channel_id == dst_channel_id,
            Error::<T>::ChannelMismatch
        );
        ensure!(
            !matches!(payload, PacketPayload::Ack(_)),
            Error::<T>::UnexpectedAckPayload
        );
        ensure!(
            payload.encoded_size() <= T::MaxPayloadLen::get() as usize,
            Error::<T>::PayloadTooLong
        );

        PendingPackets::<T>::try_mutate(&channel_id, |pending| -> Result<(), Error<T>> {
            if !bounded::try_increment(pending, T::MaxPendingPackets::get()) {
                log::debug!(
                    target: LOG_TARGET,
                    "send on {} refused: {} packet(s) pending",
                    ident(&channel_id),
                    pending,
                );
                return Err(Error::<T>::PendingPacketLimitExceeded);
            }
            Ok(())
        })?;

        let sequence = ChannelSequences::<T>::try_mutate(
            &channel_id,
            |maybe_seq| -> Result<Sequence, Error<T>> {
                let seq = maybe_seq.as_mut().ok_or(Error::<T>::ChannelNotFound)?;
                Ok(seq.issue_send())
            },
        )?;

        let now = frame_system::Pallet::<T>::block_number();
        let timeout_height = now.saturating_add(T::PacketTimeoutBlocks::get().into());
        let packet = Packet::<T> {
            sequence,
            src_channel_id: channel_id.clone(),
            dst_chain_id,
            dst_channel_id,
            dst_agent_id,
            payload,
            timeout_height,
        };

        let hash = Self::packet_commitment(&packet);
        PacketCommitments::<T>::insert(
            &channel_id,
            sequence,
            PacketCommitment::<T> {
                hash,
                timeout_height,
            },
        );

        log::debug!(
            target: LOG_TARGET,
            "packet {}#{} committed, times out at {:?}",
            ident(&channel_id),
            sequence,
            timeout_height,
        );
        Self::deposit_event(Event::PacketSent {
            sender,
            packet,
            commitment: hash,
        });

        Ok(sequence)
    }

    /// Commitment hash binding a packet's route, sequence, timeout and payload.
    pub fn packet_commitment(packet: &Packet<T>) -> H256 {
        let payload_hash = packet.payload.using_encoded(blake2_256);
        let preimage = (
            COMMITMENT_TAG,
            &packet.src_channel_id,
            packet.sequence,
            packet.timeout_height,
            &packet.dst_chain_id,
            &packet.dst_channel_id,
            &packet.dst_agent_id,
            payload_hash,
        );
        H256::from(preimage.using_encoded(blake2_256))
    }

    // =========================================================
    // Receive
    // =========================================================

    pub(crate) fn do_receive_packet(relayer: T::AccountId, packet: Packet<T>) -> DispatchResult {
        T::Admission::admit_packet(&relayer, &packet)?;

        let channel_id = packet.dst_channel_id.clone();
        let sequence = packet.sequence;
        let channel = Channels::<T>::get(&channel_id).ok_or(Error::<T>::ChannelNotFound)?;
        ensure!(channel.state.is_open(), Error::<T>::ChannelNotOpen);
        ensure!(
            channel.counterparty_channel_id == packet.src_channel_id,
            Error::<T>::ChannelMismatch
        );

        if PacketReceipts::<T>::contains_key(&channel_id, sequence) {
            log::debug!(
                target: LOG_TARGET,
                "replay of {}#{} from {:?} rejected",
                ident(&channel_id),
                sequence,
                relayer,
            );
            return Err(Error::<T>::PacketAlreadyReceived.into());
        }

        let now = frame_system::Pallet::<T>::block_number();
        if packet.is_expired_at(now) {
            log::debug!(
                target: LOG_TARGET,
                "late packet {}#{} rejected: timeout {:?}, now {:?}",
                ident(&channel_id),
                sequence,
                packet.timeout_height,
                now,
            );
            return Err(Error::<T>::PacketTimedOut.into());
        }

        let (local_agent, ack) = match Self::deliver(&channel, &packet) {
            Ok(local_agent) => (local_agent, Acknowledgement::<T>::ok()),
            Err(code) => {
                log::warn!(
                    target: LOG_TARGET,
                    "packet {}#{} delivered with negative ack {}",
                    ident(&channel_id),
                    sequence,
                    code,
                );
                (None, Acknowledgement::<T>::error(code))
            }
        };

        let (success, error_code) = (ack.success, ack.error_code);
        PacketReceipts::<T>::insert(
            &channel_id,
            sequence,
            PacketReceipt::<T> {
                received_at: now,
                timeout_height: packet.timeout_height,
                ack,
            },
        );
        ChannelSequences::<T>::mutate(&channel_id, |maybe_seq| {
            if let Some(seq) = maybe_seq {
                seq.record_recv(sequence);
            }
        });

        Self::deposit_event(Event::PacketReceived {
            channel_id: channel_id.to_vec(),
            sequence,
            relayer,
            local_agent,
            success,
            error_code,
        });

        Ok(())
    }

    /// Hand the payload to its application handler.
    ///
    /// Returns the local agent the packet was attributed to, or the error code
    /// for a negative acknowledgement. Handler writes are discarded on error.
    fn deliver(channel: &ChannelInfo<T>, packet: &Packet<T>) -> Result<Option<AgentId>, AckErrorCode> {
        let chain = &channel.counterparty_chain_id;

        match &packet.payload {
            PacketPayload::Raw(data) => {
                Self::run_handler(|| {
                    T::RawHandler::on_raw(chain, &channel.channel_id, packet.sequence, data)
                })?;
                Ok(None)
            }
            PacketPayload::TaskDelegate {
                task_id,
                requester_agent,
                assignee_hint,
                payload_hash,
            } => {
                let assignee = match packet.dst_agent_id.as_ref().or(assignee_hint.as_ref()) {
                    Some(remote) => Some(Self::resolve_active_agent(chain, remote)?),
                    None => None,
                };
                Self::run_handler(|| {
                    T::TaskHandler::on_task_delegated(
                        chain,
                        *task_id,
                        *requester_agent,
                        assignee,
                        *payload_hash,
                    )
                })?;
                Ok(assignee)
            }
            PacketPayload::ReputationUpdate {
                agent_id,
                delta,
                reason_hash,
            } => {
                let subject = match &packet.dst_agent_id {
                    Some(remote) => Self::resolve_active_agent(chain, remote)?,
                    None => Self::ensure_active_local_agent(*agent_id)?,
                };
                Self::run_handler(|| {
                    T::ReputationHandler::on_reputation_update(chain, subject, *delta, *reason_hash)
                })?;
                Ok(Some(subject))
            }
            PacketPayload::DidProof { did, proof } => {
                let agent = match &packet.dst_agent_id {
                    Some(remote) => Some(Self::resolve_active_agent(chain, remote)?),
                    None => None,
                };
                Self::run_handler(|| T::DidHandler::on_did_proof(chain, agent, did, proof))?;
                Ok(agent)
            }
            PacketPayload::Ack(_) => Err(ack_codes::UNSUPPORTED_PAYLOAD),
        }
    }

    fn run_handler(handler: impl FnOnce() -> DispatchResult) -> Result<(), AckErrorCode> {
        with_storage_layer(handler).map_err(|err| {
            log::warn!(target: LOG_TARGET, "inbound payload rejected by handler: {:?}", err);
            ack_codes::HANDLER_REJECTED
        })
    }

    fn resolve_active_agent(
        chain: &ChainId<T>,
        remote: &RemoteAgentId<T>,
    ) -> Result<AgentId, AckErrorCode> {
        let local = CrossChainAgentMap::<T>::get(chain, remote)
            .ok_or(ack_codes::UNKNOWN_REMOTE_AGENT)?;
        Self::ensure_active_local_agent(local)
    }

    fn ensure_active_local_agent(agent_id: AgentId) -> Result<AgentId, AckErrorCode> {
        if !T::AgentRegistry::agent_exists(agent_id) {
            return Err(ack_codes::LOCAL_AGENT_NOT_FOUND);
        }
        if !T::AgentRegistry::is_agent_active(agent_id) {
            return Err(ack_codes::LOCAL_AGENT_INACTIVE);
        }
        Ok(agent_id)
    }

    // =========================================================
    // Acknowledge / Timeout
    // =========================================================

    pub(crate) fn do_acknowledge_packet(
        channel_id: ChannelId<T>,
        sequence: Sequence,
        ack: Acknowledgement<T>,
    ) -> DispatchResult {
        let Some(_commitment) = PacketCommitments::<T>::take(&channel_id, sequence) else {
            log::debug!(
                target: LOG_TARGET,
                "ack for {}#{} without commitment",
                ident(&channel_id),
                sequence,
            );
            return Err(Error::<T>::PacketNotFound.into());
        };
        Self::release_pending_slot(&channel_id);
        ChannelSequences::<T>::mutate(&channel_id, |maybe_seq| {
            if let Some(seq) = maybe_seq {
                seq.record_ack();
            }
        });

        let (success, error_code) = (ack.success, ack.error_code);
        Self::retain_ack_record(
            &channel_id,
            sequence,
            AckRecord::<T> {
                ack,
                resolved_at: frame_system::Pallet::<T>::block_number(),
            },
        );

        Self::deposit_event(Event::PacketAcknowledged {
            channel_id: channel_id.to_vec(),
            sequence,
            success,
            error_code,
        });
        Ok(())
    }

    /// Expired commitments may be released by anyone. No receipt is written.
    pub(crate) fn do_timeout_packet(channel_id: ChannelId<T>, sequence: Sequence) -> DispatchResult {
        let commitment =
            PacketCommitments::<T>::get(&channel_id, sequence).ok_or(Error::<T>::PacketNotFound)?;
        let now = frame_system::Pallet::<T>::block_number();
        ensure!(
            now >= commitment.timeout_height,
            Error::<T>::PacketNotTimedOut
        );

        PacketCommitments::<T>::remove(&channel_id, sequence);
        Self::release_pending_slot(&channel_id);

        log::debug!(
            target: LOG_TARGET,
            "packet {}#{} timed out",
            ident(&channel_id),
            sequence,
        );
        Self::deposit_event(Event::PacketTimeout {
            channel_id: channel_id.to_vec(),
            sequence,
        });
        Ok(())
    }

    fn release_pending_slot(channel_id: &ChannelId<T>) {
        PendingPackets::<T>::mutate(channel_id, |pending| *pending = pending.saturating_sub(1));
    }

    /// Store an ack record, evicting the channel's oldest one past `MaxPendingPackets`.
    fn retain_ack_record(channel_id: &ChannelId<T>, sequence: Sequence, record: AckRecord<T>) {
        PacketAcknowledgements::<T>::insert(channel_id, sequence, record);
        AckRetention::<T>::mutate(channel_id, |retained| {
            if let Some(evicted) = bounded::push_evicting(retained, sequence) {
                PacketAcknowledgements::<T>::remove(channel_id, evicted);
            }
        });
    }

    // =========================================================
    // Receipt pruning
    // =========================================================

    pub(crate) fn do_prune_receipts(
        channel_id: ChannelId<T>,
        sequences: &[Sequence],
    ) -> Result<u32, DispatchError> {
        let now = frame_system::Pallet::<T>::block_number();
        let retention: BlockNumberFor<T> = T::ReceiptRetentionBlocks::get().into();

        for &sequence in sequences {
            let receipt = PacketReceipts::<T>::get(&channel_id, sequence)
                .ok_or(Error::<T>::ReceiptNotFound)?;
            ensure!(
                now >= receipt.timeout_height.saturating_add(retention),
                Error::<T>::ReceiptStillLive
            );
        }

        let mut pruned: u32 = 0;
        for &sequence in sequences {
            if PacketReceipts::<T>::take(&channel_id, sequence).is_some() {
                pruned = pruned.saturating_add(1);
            }
        }

        log::debug!(
            target: LOG_TARGET,
            "pruned {} receipt(s) on {}",
            pruned,
            ident(&channel_id),
        );
        Self::deposit_event(Event::ReceiptsPruned {
            channel_id: channel_id.to_vec(),
            count: pruned,
        });
        Ok(pruned)
    }

    // =========================================================
    // Queries
    // =========================================================

    pub fn pending_packets(channel_id: &[u8]) -> u32 {
        Self::bound_channel_id(channel_id.to_vec())
            .map(|channel_id| PendingPackets::<T>::get(channel_id))
            .unwrap_or_default()
    }

    pub fn commitment(channel_id: &[u8], sequence: Sequence) -> Option<PacketCommitment<T>> {
        let channel_id = Self::bound_channel_id(channel_id.to_vec()).ok()?;
        PacketCommitments::<T>::get(channel_id, sequence)
    }

    pub fn receipt(channel_id: &[u8], sequence: Sequence) -> Option<PacketReceipt<T>> {
        let channel_id = Self::bound_channel_id(channel_id.to_vec()).ok()?;
        PacketReceipts::<T>::get(channel_id, sequence)
    }

    pub fn acknowledgement(channel_id: &[u8], sequence: Sequence) -> Option<AckRecord<T>> {
        let channel_id = Self::bound_channel_id(channel_id.to_vec()).ok()?;
        PacketAcknowledgements::<T>::get(channel_id, sequence)
    }
}

/// Build a `Raw` payload, failing if it exceeds `MaxPayloadLen`.
pub fn raw_payload<T: Config>(bytes: alloc::vec::Vec<u8>) -> Result<PacketPayload<T>, Error<T>> {
    let data: PayloadBytes<T> = bounded::bound_bytes(bytes, Error::<T>::PayloadTooLong)?;
    Ok(PacketPayload::Raw(data))
}
