//! Packet relay pallet benchmarks.
//!
//! Each packet benchmark runs on a loopback channel (its counterparty channel
//! is itself) with the largest payload `MaxPayloadLen` admits.

#![cfg(feature = "runtime-benchmarks")]

use super::*;
use crate::types::PayloadBytes;
use alloc::{format, vec, vec::Vec};
use frame_benchmarking::v2::*;
use frame_support::pallet_prelude::*;
use frame_system::{pallet_prelude::BlockNumberFor, RawOrigin};

const BENCH_CHAIN: &[u8] = b"bench-chain";

/// Local agent the registry is expected to know about.
const BENCH_AGENT: AgentId = 1;

fn relayer<T: Config>() -> Result<T::AccountId, BenchmarkError> {
    let relayer: T::AccountId = account("relayer", 0, 0);
    if !Pallet::<T>::is_trusted_relayer(&relayer) {
        Pallet::<T>::do_add_relayer(relayer.clone())?;
    }
    Ok(relayer)
}

fn open_loopback<T: Config>(confirm: bool) -> Result<ChannelId<T>, BenchmarkError> {
    let own_id = format!("channel-{}", ChannelCounter::<T>::get()).into_bytes();
    let counterparty: ChannelId<T> = own_id.try_into().map_err(|_| "channel id too long")?;
    let chain: ChainId<T> = BENCH_CHAIN.to_vec().try_into().map_err(|_| "chain id too long")?;

    let channel_id = Pallet::<T>::do_open_channel(chain, counterparty)?;
    if confirm {
        Pallet::<T>::do_confirm_open(relayer::<T>()?, channel_id.clone())?;
    }
    Ok(channel_id)
}

fn largest_raw<T: Config>() -> PacketPayload<T> {
    let limit = T::MaxPayloadLen::get() as usize;
    let mut len = limit;
    loop {
        let data: PayloadBytes<T> = BoundedVec::truncate_from(vec![0xa5; len]);
        let payload = PacketPayload::Raw(data);
        if payload.encoded_size() <= limit || len == 0 {
            return payload;
        }
        len -= 1;
    }
}

fn send_one<T: Config>(channel_id: &ChannelId<T>) -> Result<Sequence, BenchmarkError> {
    let channel = Channels::<T>::get(channel_id).ok_or("channel missing")?;
    let sequence = Pallet::<T>::do_send_packet(
        whitelisted_caller(),
        channel_id.clone(),
        channel.counterparty_chain_id,
        channel.counterparty_channel_id,
        None,
        largest_raw::<T>(),
    )?;
    Ok(sequence)
}

fn bytes_of_len(len: u32) -> Vec<u8> {
    vec![b'a'; len as usize]
}

#[benchmarks]
mod benchmarks {
    use super::*;

    #[benchmark]
    fn open_channel() -> Result<(), BenchmarkError> {
        let origin =
            T::RelayerManagerOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
        let before = ChannelCounter::<T>::get();

        #[extrinsic_call]
        _(
            origin as T::RuntimeOrigin,
            BENCH_CHAIN.to_vec(),
            bytes_of_len(T::MaxChannelIdLen::get()),
        );

        assert_eq!(ChannelCounter::<T>::get(), before + 1);
        Ok(())
    }

    #[benchmark]
    fn open_channel_confirm() -> Result<(), BenchmarkError> {
        let relayer = relayer::<T>()?;
        let channel_id = open_loopback::<T>(false)?;

        #[extrinsic_call]
        _(RawOrigin::Signed(relayer), channel_id.to_vec());

        let channel = Channels::<T>::get(&channel_id).ok_or("channel missing")?;
        assert_eq!(channel.state, ChannelState::Open);
        Ok(())
    }

    #[benchmark]
    fn close_channel_init() -> Result<(), BenchmarkError> {
        let origin =
            T::RelayerManagerOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
        let channel_id = open_loopback::<T>(true)?;

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, channel_id.to_vec());

        let channel = Channels::<T>::get(&channel_id).ok_or("channel missing")?;
        assert_eq!(channel.state, ChannelState::CloseInit);
        Ok(())
    }

    #[benchmark]
    fn close_channel_confirm() -> Result<(), BenchmarkError> {
        let relayer = relayer::<T>()?;
        let channel_id = open_loopback::<T>(true)?;
        Pallet::<T>::do_close_init(channel_id.clone())?;

        #[extrinsic_call]
        _(RawOrigin::Signed(relayer), channel_id.to_vec());

        let channel = Channels::<T>::get(&channel_id).ok_or("channel missing")?;
        assert_eq!(channel.state, ChannelState::Closed);
        Ok(())
    }

    #[benchmark]
    fn send_packet() -> Result<(), BenchmarkError> {
        let channel_id = open_loopback::<T>(true)?;
        let channel = Channels::<T>::get(&channel_id).ok_or("channel missing")?;
        let caller: T::AccountId = whitelisted_caller();

        #[extrinsic_call]
        _(
            RawOrigin::Signed(caller),
            channel_id.to_vec(),
            channel.counterparty_chain_id.to_vec(),
            channel.counterparty_channel_id.to_vec(),
            Some(bytes_of_len(T::MaxRemoteAgentIdLen::get())),
            largest_raw::<T>(),
        );

        assert!(PacketCommitments::<T>::contains_key(&channel_id, 1));
        Ok(())
    }

    #[benchmark]
    fn receive_packet() -> Result<(), BenchmarkError> {
        let relayer = relayer::<T>()?;
        let channel_id = open_loopback::<T>(true)?;
        let channel = Channels::<T>::get(&channel_id).ok_or("channel missing")?;
        let window: BlockNumberFor<T> = T::PacketTimeoutBlocks::get().into();
        let now = frame_system::Pallet::<T>::block_number();
        let packet = Packet::<T> {
            sequence: 1,
            src_channel_id: channel.counterparty_channel_id,
            dst_chain_id: channel.counterparty_chain_id,
            dst_channel_id: channel_id.clone(),
            dst_agent_id: None,
            payload: largest_raw::<T>(),
            timeout_height: now + window,
        };

        #[extrinsic_call]
        _(RawOrigin::Signed(relayer), packet);

        assert!(PacketReceipts::<T>::contains_key(&channel_id, 1));
        Ok(())
    }

    #[benchmark]
    fn acknowledge_packet() -> Result<(), BenchmarkError> {
        let relayer = relayer::<T>()?;
        let channel_id = open_loopback::<T>(true)?;

        // Fill the ack history so the measured call evicts a record.
        for _ in 0..T::MaxPendingPackets::get() {
            let sequence = send_one::<T>(&channel_id)?;
            Pallet::<T>::do_acknowledge_packet(channel_id.clone(), sequence, Acknowledgement::ok())?;
        }
        let sequence = send_one::<T>(&channel_id)?;

        #[extrinsic_call]
        _(
            RawOrigin::Signed(relayer),
            channel_id.to_vec(),
            sequence,
            Acknowledgement::<T>::ok(),
        );

        assert!(!PacketCommitments::<T>::contains_key(&channel_id, sequence));
        assert!(!PacketAcknowledgements::<T>::contains_key(&channel_id, 1));
        Ok(())
    }

    #[benchmark]
    fn timeout_packet() -> Result<(), BenchmarkError> {
        let channel_id = open_loopback::<T>(true)?;
        let sequence = send_one::<T>(&channel_id)?;
        let commitment =
            PacketCommitments::<T>::get(&channel_id, sequence).ok_or("commitment missing")?;
        frame_system::Pallet::<T>::set_block_number(commitment.timeout_height);
        let caller: T::AccountId = whitelisted_caller();

        #[extrinsic_call]
        _(RawOrigin::Signed(caller), channel_id.to_vec(), sequence);

        assert!(!PacketCommitments::<T>::contains_key(&channel_id, sequence));
        Ok(())
    }

    #[benchmark]
    fn prune_receipts(n: Linear<1, { T::MaxPruneBatch::get() }>) -> Result<(), BenchmarkError> {
        let channel_id = open_loopback::<T>(true)?;
        let now = frame_system::Pallet::<T>::block_number();
        for sequence in 1..=n as Sequence {
            PacketReceipts::<T>::insert(
                &channel_id,
                sequence,
                PacketReceipt::<T> {
                    received_at: now,
                    timeout_height: now,
                    ack: Acknowledgement::ok(),
                },
            );
        }
        let retention: BlockNumberFor<T> = T::ReceiptRetentionBlocks::get().into();
        frame_system::Pallet::<T>::set_block_number(now + retention);

        let sequences: BoundedVec<Sequence, T::MaxPruneBatch> = (1..=n as Sequence)
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| "batch too large")?;
        let caller: T::AccountId = whitelisted_caller();

        #[extrinsic_call]
        _(RawOrigin::Signed(caller), channel_id.to_vec(), sequences);

        assert!(!PacketReceipts::<T>::contains_key(&channel_id, 1));
        Ok(())
    }

    #[benchmark]
    fn add_relayer() -> Result<(), BenchmarkError> {
        let origin =
            T::RelayerManagerOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
        let relayer: T::AccountId = account("relayer", 1, 0);

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, relayer.clone());

        assert!(Pallet::<T>::is_trusted_relayer(&relayer));
        Ok(())
    }

    #[benchmark]
    fn remove_relayer() -> Result<(), BenchmarkError> {
        let origin =
            T::RelayerManagerOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
        let relayer = relayer::<T>()?;

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, relayer.clone());

        assert!(!Pallet::<T>::is_trusted_relayer(&relayer));
        Ok(())
    }

    #[benchmark]
    fn register_cross_chain_agent() -> Result<(), BenchmarkError> {
        let origin =
            T::AgentMappingOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
        let remote = bytes_of_len(T::MaxRemoteAgentIdLen::get());

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, BENCH_CHAIN.to_vec(), remote.clone(), BENCH_AGENT);

        assert_eq!(
            Pallet::<T>::resolve_remote_agent(BENCH_CHAIN, &remote),
            Some(BENCH_AGENT)
        );
        Ok(())
    }

    #[benchmark]
    fn remove_cross_chain_agent() -> Result<(), BenchmarkError> {
        let origin =
            T::AgentMappingOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
        let remote = bytes_of_len(T::MaxRemoteAgentIdLen::get());
        let chain: ChainId<T> = BENCH_CHAIN.to_vec().try_into().map_err(|_| "chain id too long")?;
        let remote_id: RemoteAgentId<T> =
            remote.clone().try_into().map_err(|_| "remote agent id too long")?;
        Pallet::<T>::do_register_cross_chain_agent(chain, remote_id, BENCH_AGENT)?;

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, BENCH_CHAIN.to_vec(), remote.clone());

        assert_eq!(Pallet::<T>::resolve_remote_agent(BENCH_CHAIN, &remote), None);
        Ok(())
    }

    impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Runtime);
}
