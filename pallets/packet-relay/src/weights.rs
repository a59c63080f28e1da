//! Packet relay weight stubs.
//!
//! Placeholder weights sized from the storage each call touches. Replace with
//! output of the `runtime-benchmarks` suite before production use.

use frame_support::{traits::Get, weights::Weight};

pub trait WeightInfo {
    // Channel management
    fn open_channel() -> Weight;
    fn open_channel_confirm() -> Weight;
    fn close_channel_init() -> Weight;
    fn close_channel_confirm() -> Weight;

    // Packet operations
    fn send_packet() -> Weight;
    fn receive_packet() -> Weight;
    fn acknowledge_packet() -> Weight;
    fn timeout_packet() -> Weight;
    fn prune_receipts(n: u32) -> Weight;

    // Relayer management
    fn add_relayer() -> Weight;
    fn remove_relayer() -> Weight;

    // Cross-chain agents
    fn register_cross_chain_agent() -> Weight;
    fn remove_cross_chain_agent() -> Weight;
}

/// Storage-access based estimates for a runtime using `T::DbWeight`.
pub struct SubstrateWeight<T>(core::marker::PhantomData<T>);

impl<T: frame_system::Config> WeightInfo for SubstrateWeight<T> {
    fn open_channel() -> Weight {
        Weight::from_parts(25_000_000, 0).saturating_add(T::DbWeight::get().reads_writes(3, 4))
    }

    fn open_channel_confirm() -> Weight {
        Weight::from_parts(15_000_000, 0).saturating_add(T::DbWeight::get().reads_writes(2, 1))
    }

    fn close_channel_init() -> Weight {
        Weight::from_parts(15_000_000, 0).saturating_add(T::DbWeight::get().reads_writes(1, 1))
    }

    fn close_channel_confirm() -> Weight {
        Weight::from_parts(15_000_000, 0).saturating_add(T::DbWeight::get().reads_writes(2, 1))
    }

    fn send_packet() -> Weight {
        Weight::from_parts(40_000_000, 0).saturating_add(T::DbWeight::get().reads_writes(3, 3))
    }

    fn receive_packet() -> Weight {
        // Includes one application handler call.
        Weight::from_parts(60_000_000, 0).saturating_add(T::DbWeight::get().reads_writes(6, 3))
    }

    fn acknowledge_packet() -> Weight {
        Weight::from_parts(30_000_000, 0).saturating_add(T::DbWeight::get().reads_writes(5, 6))
    }

    fn timeout_packet() -> Weight {
        Weight::from_parts(20_000_000, 0).saturating_add(T::DbWeight::get().reads_writes(2, 2))
    }

    fn prune_receipts(n: u32) -> Weight {
        Weight::from_parts(10_000_000, 0)
            .saturating_add(Weight::from_parts(5_000_000, 0).saturating_mul(n.into()))
            .saturating_add(T::DbWeight::get().reads_writes(n.into(), n.into()))
    }

    fn add_relayer() -> Weight {
        Weight::from_parts(15_000_000, 0).saturating_add(T::DbWeight::get().reads_writes(1, 1))
    }

    fn remove_relayer() -> Weight {
        Weight::from_parts(15_000_000, 0).saturating_add(T::DbWeight::get().reads_writes(1, 1))
    }

    fn register_cross_chain_agent() -> Weight {
        Weight::from_parts(20_000_000, 0).saturating_add(T::DbWeight::get().reads_writes(3, 2))
    }

    fn remove_cross_chain_agent() -> Weight {
        Weight::from_parts(15_000_000, 0).saturating_add(T::DbWeight::get().reads_writes(1, 2))
    }
}

// Flat weights for tests and mock runtimes.
impl WeightInfo for () {
    fn open_channel() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn open_channel_confirm() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn close_channel_init() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn close_channel_confirm() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn send_packet() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn receive_packet() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn acknowledge_packet() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn timeout_packet() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn prune_receipts(n: u32) -> Weight {
        Weight::from_parts(10_000, 0).saturating_mul((n as u64).max(1))
    }

    fn add_relayer() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn remove_relayer() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn register_cross_chain_agent() -> Weight {
        Weight::from_parts(10_000, 0)
    }

    fn remove_cross_chain_agent() -> Weight {
        Weight::from_parts(10_000, 0)
    }
}
