//! Trusted relayer set and the admission policy built on it.

use crate::bounded::{self, InsertError};
use crate::traits::PacketAdmission;
use crate::*;
use core::marker::PhantomData;
use frame_support::pallet_prelude::*;

/// Admits packets and confirmations from members of `TrustedRelayers`.
pub struct RelayerSetAdmission<T>(PhantomData<T>);

impl<T: Config> PacketAdmission<T> for RelayerSetAdmission<T> {
    fn ensure_relayer(who: &T::AccountId) -> DispatchResult {
        if !Pallet::<T>::is_trusted_relayer(who) {
            log::debug!(target: LOG_TARGET, "{:?} is not a trusted relayer", who);
            return Err(Error::<T>::NotTrustedRelayer.into());
        }
        Ok(())
    }

    fn admit_packet(who: &T::AccountId, _packet: &Packet<T>) -> DispatchResult {
        Self::ensure_relayer(who)
    }
}

impl<T: Config> Pallet<T> {
    pub(crate) fn do_add_relayer(relayer: T::AccountId) -> DispatchResult {
        TrustedRelayers::<T>::try_mutate(|relayers| {
            bounded::try_insert_unique(relayers, relayer.clone()).map_err(|e| match e {
                InsertError::Duplicate => Error::<T>::RelayerAlreadyRegistered,
                InsertError::Full => Error::<T>::TooManyRelayers,
            })
        })?;

        log::info!(target: LOG_TARGET, "relayer {:?} added", relayer);
        Self::deposit_event(Event::RelayerAdded { relayer });
        Ok(())
    }

    pub(crate) fn do_remove_relayer(relayer: T::AccountId) -> DispatchResult {
        let remaining = TrustedRelayers::<T>::try_mutate(|relayers| -> Result<usize, Error<T>> {
            ensure!(
                bounded::remove_item(relayers, &relayer),
                Error::<T>::RelayerNotFound
            );
            Ok(relayers.len())
        })?;

        if remaining == 0 {
            log::warn!(
                target: LOG_TARGET,
                "last relayer {:?} removed: packets, acks and handshakes stall until one is added",
                relayer,
            );
        } else {
            log::info!(target: LOG_TARGET, "relayer {:?} removed", relayer);
        }
        Self::deposit_event(Event::RelayerRemoved { relayer });
        Ok(())
    }

    // =========================================================
    // Queries
    // =========================================================

    pub fn relayers() -> alloc::vec::Vec<T::AccountId> {
        TrustedRelayers::<T>::get().into_inner()
    }

    pub fn is_trusted_relayer(who: &T::AccountId) -> bool {
        TrustedRelayers::<T>::get().contains(who)
    }
}
