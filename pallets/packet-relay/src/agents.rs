//! Cross-chain agent mapping.

use crate::bounded;
use crate::traits::AgentRegistryInterface;
use crate::*;
use frame_support::pallet_prelude::*;

impl<T: Config> Pallet<T> {
    pub(crate) fn do_register_cross_chain_agent(
        chain_id: ChainId<T>,
        remote_agent_id: RemoteAgentId<T>,
        local_agent_id: AgentId,
    ) -> DispatchResult {
        ensure!(
            T::AgentRegistry::agent_exists(local_agent_id),
            Error::<T>::AgentNotFound
        );
        ensure!(
            !CrossChainAgentMap::<T>::contains_key(&chain_id, &remote_agent_id),
            Error::<T>::CrossChainAgentAlreadyMapped
        );

        AgentMappingCount::<T>::try_mutate(&chain_id, |count| -> Result<(), Error<T>> {
            ensure!(
                bounded::try_increment(count, T::MaxAgentMappingsPerChain::get()),
                Error::<T>::TooManyAgentMappings
            );
            Ok(())
        })?;
        CrossChainAgentMap::<T>::insert(&chain_id, &remote_agent_id, local_agent_id);

        log::info!(
            target: LOG_TARGET,
            "{}/{} mapped to local agent {}",
            ident(&chain_id),
            ident(&remote_agent_id),
            local_agent_id,
        );
        Self::deposit_event(Event::CrossChainAgentRegistered {
            chain_id: chain_id.to_vec(),
            remote_agent_id: remote_agent_id.to_vec(),
            local_agent_id,
        });
        Ok(())
    }

    pub(crate) fn do_remove_cross_chain_agent(
        chain_id: ChainId<T>,
        remote_agent_id: RemoteAgentId<T>,
    ) -> DispatchResult {
        let local_agent_id = CrossChainAgentMap::<T>::take(&chain_id, &remote_agent_id)
            .ok_or(Error::<T>::CrossChainAgentNotFound)?;
        AgentMappingCount::<T>::mutate(&chain_id, |count| *count = count.saturating_sub(1));

        Self::deposit_event(Event::CrossChainAgentRemoved {
            chain_id: chain_id.to_vec(),
            remote_agent_id: remote_agent_id.to_vec(),
            local_agent_id,
        });
        Ok(())
    }

    /// Local agent bound to `remote_agent_id` on `chain_id`, if any.
    pub fn resolve_remote_agent(chain_id: &[u8], remote_agent_id: &[u8]) -> Option<AgentId> {
        let chain_id = Self::bound_chain_id(chain_id.to_vec()).ok()?;
        let remote_agent_id = Self::bound_remote_agent_id(remote_agent_id.to_vec()).ok()?;
        CrossChainAgentMap::<T>::get(chain_id, remote_agent_id)
    }
}
