//! Channel lifecycle: creation and the open/close handshakes.

use crate::bounded::{self, InsertError};
use crate::types::ChannelTransition;
use crate::*;
use alloc::format;
use frame_support::pallet_prelude::*;

impl<T: Config> Pallet<T> {
    /// Create a channel in `Init` and index it under its counterparty chain.
    pub(crate) fn do_open_channel(
        counterparty_chain_id: ChainId<T>,
        counterparty_channel_id: ChannelId<T>,
    ) -> Result<ChannelId<T>, DispatchError> {
        let number = ChannelCounter::<T>::get();
        let channel_id = Self::bound_channel_id(format!("channel-{}", number).into_bytes())?;
        ensure!(
            !Channels::<T>::contains_key(&channel_id),
            Error::<T>::ChannelAlreadyExists
        );

        ChannelsByChain::<T>::try_mutate(&counterparty_chain_id, |ids| {
            bounded::try_insert_unique(ids, channel_id.clone()).map_err(|e| match e {
                InsertError::Full => Error::<T>::TooManyChannels,
                InsertError::Duplicate => Error::<T>::ChannelAlreadyExists,
            })
        })?;

        let now = frame_system::Pallet::<T>::block_number();
        Channels::<T>::insert(
            &channel_id,
            ChannelInfo::<T> {
                channel_id: channel_id.clone(),
                counterparty_chain_id: counterparty_chain_id.clone(),
                counterparty_channel_id: counterparty_channel_id.clone(),
                state: ChannelState::Init,
                created_at: now,
                opened_at: None,
                closed_at: None,
            },
        );
        ChannelSequences::<T>::insert(&channel_id, SequenceState::default());
        ChannelCounter::<T>::put(number.saturating_add(1));

        log::info!(
            target: LOG_TARGET,
            "channel {} created towards {}/{}",
            ident(&channel_id),
            ident(&counterparty_chain_id),
            ident(&counterparty_channel_id),
        );
        Self::deposit_event(Event::ChannelOpened {
            channel_id: channel_id.to_vec(),
            counterparty_chain: counterparty_chain_id.to_vec(),
            counterparty_channel: counterparty_channel_id.to_vec(),
        });

        Ok(channel_id)
    }

    pub(crate) fn do_confirm_open(relayer: T::AccountId, channel_id: ChannelId<T>) -> DispatchResult {
        Self::transition_channel(&channel_id, ChannelTransition::ConfirmOpen)?;

        log::info!(target: LOG_TARGET, "channel {} open", ident(&channel_id));
        Self::deposit_event(Event::ChannelOpenConfirmed {
            channel_id: channel_id.to_vec(),
            relayer,
        });
        Ok(())
    }

    pub(crate) fn do_close_init(channel_id: ChannelId<T>) -> DispatchResult {
        Self::transition_channel(&channel_id, ChannelTransition::InitClose)?;

        log::info!(target: LOG_TARGET, "channel {} closing", ident(&channel_id));
        Self::deposit_event(Event::ChannelCloseInitiated {
            channel_id: channel_id.to_vec(),
        });
        Ok(())
    }

    pub(crate) fn do_close_confirm(relayer: T::AccountId, channel_id: ChannelId<T>) -> DispatchResult {
        Self::transition_channel(&channel_id, ChannelTransition::ConfirmClose)?;

        log::info!(
            target: LOG_TARGET,
            "channel {} closed with {} packet(s) still pending",
            ident(&channel_id),
            PendingPackets::<T>::get(&channel_id),
        );
        Self::deposit_event(Event::ChannelClosed {
            channel_id: channel_id.to_vec(),
            relayer,
        });
        Ok(())
    }

    /// Apply one handshake step, stamping the open/close block.
    fn transition_channel(
        channel_id: &ChannelId<T>,
        step: ChannelTransition,
    ) -> Result<ChannelState, DispatchError> {
        Channels::<T>::try_mutate(channel_id, |maybe_channel| -> Result<ChannelState, DispatchError> {
            let channel = maybe_channel.as_mut().ok_or(Error::<T>::ChannelNotFound)?;
            let next = channel.state.transition(step).ok_or_else(|| {
                log::debug!(
                    target: LOG_TARGET,
                    "channel {}: {:?} rejected in state {:?}",
                    ident(channel_id),
                    step,
                    channel.state,
                );
                Error::<T>::InvalidChannelState
            })?;

            let now = frame_system::Pallet::<T>::block_number();
            match next {
                ChannelState::Open => channel.opened_at = Some(now),
                ChannelState::Closed => channel.closed_at = Some(now),
                ChannelState::Init | ChannelState::CloseInit => {}
            }
            channel.state = next;
            Ok(next)
        })
    }

    // =========================================================
    // Queries
    // =========================================================

    pub fn channel(channel_id: &[u8]) -> Option<ChannelInfo<T>> {
        let channel_id = Self::bound_channel_id(channel_id.to_vec()).ok()?;
        Channels::<T>::get(channel_id)
    }

    pub fn channels_for_chain(chain_id: &[u8]) -> alloc::vec::Vec<ChannelId<T>> {
        match Self::bound_chain_id(chain_id.to_vec()) {
            Ok(chain_id) => ChannelsByChain::<T>::get(chain_id).into_inner(),
            Err(_) => alloc::vec::Vec::new(),
        }
    }

    pub fn sequences(channel_id: &[u8]) -> Option<SequenceState> {
        let channel_id = Self::bound_channel_id(channel_id.to_vec()).ok()?;
        ChannelSequences::<T>::get(channel_id)
    }
}
