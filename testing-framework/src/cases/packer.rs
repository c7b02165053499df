use super::{
    Action, Case, MethodKind, MethodRegistry, NonceAllocator, PackingError, Query, RawAction,
    RawCase, SendTx, SigningError,
};
use crate::{backend::CallRequest, config::NetworkConfig};
use log::{debug, trace};
use std::sync::Arc;
use zion_common::transaction::LegacyTransaction;

/// Turns raw cases into executable ones
///
/// Holds only immutable inputs (network constants and the method registry),
/// so one packer can be shared by concurrent case packs. The nonce table is
/// created inside `pack` and never leaves it.
#[derive(Debug, Clone)]
pub struct CasePacker {
    network: NetworkConfig,
    registry: Arc<MethodRegistry>,
}

impl CasePacker {
    pub fn new(network: NetworkConfig, registry: MethodRegistry) -> Self {
        Self {
            network,
            registry: Arc::new(registry),
        }
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn classify(&self, method: &str) -> Result<MethodKind, PackingError> {
        self.registry
            .classify(method)
            .ok_or_else(|| PackingError::UnknownMethod(method.to_string()))
    }

    /// Pack a whole case
    ///
    /// Actions are processed strictly in declaration order. The first error
    /// aborts the pack and is returned with the action's position; no
    /// partial case is produced and the nonce table is dropped.
    pub fn pack(&self, raw: &RawCase) -> Result<Case, PackingError> {
        let mut nonces = NonceAllocator::new();
        let mut actions = Vec::with_capacity(raw.actions.len());

        for (index, action) in raw.actions.iter().enumerate() {
            let packed = self
                .pack_next(action, &mut nonces)
                .map_err(|source| PackingError::Action {
                    case: raw.index,
                    index,
                    method: action.method.clone(),
                    source: Box::new(source),
                })?;
            actions.push(packed);
        }

        debug!(
            "Packed case {}: {} actions, {} senders",
            raw.index,
            actions.len(),
            nonces.senders()
        );
        Ok(Case::new(raw.index, actions))
    }

    fn pack_next(
        &self,
        action: &RawAction,
        nonces: &mut NonceAllocator,
    ) -> Result<Action, PackingError> {
        // Encode and classify before allocating: a failing action reserves nothing
        let data = action.input.encode()?;
        let kind = self.classify(&action.method)?;
        let nonce = match kind {
            MethodKind::Mutating => nonces.allocate(action.sender.address()),
            MethodKind::ReadOnly => 0,
        };
        self.build(action, kind, data, nonce)
    }

    /// Pack a single action with an already allocated nonce
    ///
    /// `nonce` is ignored for read-only methods.
    pub fn pack_action(&self, action: &RawAction, nonce: u64) -> Result<Action, PackingError> {
        let data = action.input.encode()?;
        let kind = self.classify(&action.method)?;
        self.build(action, kind, data, nonce)
    }

    fn build(
        &self,
        action: &RawAction,
        kind: MethodKind,
        data: Vec<u8>,
        nonce: u64,
    ) -> Result<Action, PackingError> {
        let sender = action.sender.address();
        match kind {
            MethodKind::ReadOnly => {
                trace!("{} from {}: query", action.method, sender);
                Ok(Action::Query(Query {
                    base: action.base.clone(),
                    method: action.method.clone(),
                    sender,
                    request: CallRequest {
                        from: Some(sender),
                        to: self.network.contract,
                        data,
                    },
                    assertions: action.assertions.clone(),
                }))
            }
            MethodKind::Mutating => {
                let tx = LegacyTransaction {
                    nonce,
                    gas_price: self.network.gas_price,
                    gas_limit: self.network.gas_limit,
                    to: self.network.contract,
                    value: 0,
                    data,
                };
                let chain_id = self.network.chain_id;
                let signature = action.sender.sign_hash(&tx.signing_hash(chain_id))?;
                let tx = tx
                    .into_signed(chain_id, signature)
                    .map_err(SigningError::from)?;
                trace!(
                    "{} from {}: tx nonce={} hash={}",
                    action.method,
                    sender,
                    nonce,
                    tx.hash()
                );
                Ok(Action::SendTx(SendTx {
                    base: action.base.clone(),
                    method: action.method.clone(),
                    sender,
                    tx,
                    should_succeed: action.should_succeed,
                }))
            }
        }
    }
}
