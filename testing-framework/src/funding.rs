//! Case account funding
//!
//! Case accounts are derived fresh for every run and start with no balance.
//! Before a case runs, the funder sends `amount` wei to every sender of the
//! case's transactions, one plain transfer each, and waits for inclusion.

use crate::{
    backend::{Backend, TxOutcome},
    cases::{Action, Case},
    config::{HarnessConfig, NetworkConfig},
};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use zion_common::{
    crypto::{Address, KeyPair},
    transaction::LegacyTransaction,
};

/// Gas of a value transfer without call data
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

#[derive(Debug, Clone)]
pub struct Funder {
    key: KeyPair,
    amount: u128,
    network: NetworkConfig,
}

impl Funder {
    pub fn new(key: KeyPair, amount: u128, network: NetworkConfig) -> Self {
        Self {
            key,
            amount,
            network,
        }
    }

    /// Funder described by the config, `None` when no funder key is set
    pub fn from_config(config: &HarnessConfig) -> Result<Option<Self>> {
        let key = config.funder_key()?;
        Ok(key.map(|key| Self::new(key, config.fund_amount, config.network.clone())))
    }

    pub fn address(&self) -> Address {
        self.key.address()
    }

    pub fn amount(&self) -> u128 {
        self.amount
    }

    /// Distinct transaction senders of `case`, in order of first use
    ///
    /// Queries cost nothing, so their senders are not funded.
    pub fn recipients(case: &Case) -> Vec<Address> {
        let mut recipients = Vec::new();
        for action in case.actions() {
            if let Action::SendTx(send) = action {
                if !recipients.contains(&send.sender) {
                    recipients.push(send.sender);
                }
            }
        }
        recipients
    }

    /// Transfer `amount` to each recipient
    ///
    /// The funder's nonce is read from the node once; transfers are then
    /// submitted back to back and each one must succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if the node rejects a transfer or a transfer fails.
    pub async fn fund(
        &self,
        backend: &dyn Backend,
        recipients: &[Address],
    ) -> Result<Vec<TxOutcome>> {
        let funder = self.address();
        let mut nonce = backend
            .pending_nonce(&funder)
            .await
            .with_context(|| format!("Failed to read nonce of funder {}", funder))?;

        let mut outcomes = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let tx = LegacyTransaction {
                nonce,
                gas_price: self.network.gas_price,
                gas_limit: TRANSFER_GAS_LIMIT,
                to: *recipient,
                value: self.amount,
                data: Vec::new(),
            };
            let signature = self.key.sign_hash(&tx.signing_hash(self.network.chain_id))?;
            let signed = tx.into_signed(self.network.chain_id, signature)?;
            debug!("Funding {} from {} (nonce {})", recipient, funder, nonce);

            let outcome = backend
                .submit(&signed)
                .await
                .with_context(|| format!("Failed to fund {}", recipient))?;
            if !outcome.success {
                bail!("Funding transfer {} to {} failed", outcome.hash, recipient);
            }
            info!("Funded {} with {} wei", recipient, self.amount);

            nonce += 1;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Fund every transaction sender of `case`
    pub async fn fund_case(&self, backend: &dyn Backend, case: &Case) -> Result<Vec<TxOutcome>> {
        let recipients = Self::recipients(case);
        debug!("Case {}: funding {} sender(s)", case.index(), recipients.len());
        self.fund(backend, &recipients).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        accounts::{DevKeyring, SenderIdentity},
        backend::InMemoryBackend,
        cases::{CasePacker, MethodRegistry, RawAction, RawCase},
    };
    use std::sync::Arc;

    fn funder_key() -> KeyPair {
        KeyPair::from_hex("0x4646464646464646464646464646464646464646464646464646464646464646")
            .unwrap()
    }

    fn case() -> Case {
        let keyring = DevKeyring::new("funding-tests");
        let alice: Arc<dyn SenderIdentity> = Arc::new(keyring.derive(1, "alice").unwrap());
        let bob: Arc<dyn SenderIdentity> = Arc::new(keyring.derive(1, "bob").unwrap());
        let carol: Arc<dyn SenderIdentity> = Arc::new(keyring.derive(1, "carol").unwrap());
        let raw = RawCase::new(1)
            .with_action(RawAction::new("stake", vec![0x01], bob.clone()))
            .with_action(RawAction::new("getTotalPool", vec![0x02], carol))
            .with_action(RawAction::new("stake", vec![0x03], alice))
            .with_action(RawAction::new("stake", vec![0x04], bob));
        CasePacker::new(NetworkConfig::default(), MethodRegistry::node_manager())
            .pack(&raw)
            .unwrap()
    }

    #[test]
    fn test_recipients_are_distinct_transaction_senders() {
        let case = case();
        let actions = case.actions();
        assert_eq!(Funder::recipients(&case), vec![actions[0].sender(), actions[2].sender()]);
    }

    #[tokio::test]
    async fn test_fund_case() {
        let network = NetworkConfig::default();
        let key = funder_key();
        let backend = InMemoryBackend::new(&network)
            .with_balance(key.address(), 10u128.pow(20))
            .with_balance_checks();
        let funder = Funder::new(key, 10u128.pow(18), network);

        let case = case();
        let outcomes = funder.fund_case(&backend, &case).await.unwrap();
        assert_eq!(outcomes.len(), 2);

        for recipient in Funder::recipients(&case) {
            assert_eq!(backend.balance(&recipient), 10u128.pow(18));
        }
        let submitted = backend.submitted();
        assert_eq!(submitted[0].nonce(), 0);
        assert_eq!(submitted[1].nonce(), 1);
        assert_eq!(submitted[0].tx().gas_limit, TRANSFER_GAS_LIMIT);
        assert_eq!(backend.nonce(&funder.address()), 2);
    }

    #[tokio::test]
    async fn test_funder_nonce_comes_from_node() {
        let network = NetworkConfig::default();
        let key = funder_key();
        let backend = InMemoryBackend::new(&network).with_balance(key.address(), 10u128.pow(20));
        let funder = Funder::new(key, 1_000, network);

        funder.fund(&backend, &[Address::new([0x01; 20])]).await.unwrap();
        funder.fund(&backend, &[Address::new([0x02; 20])]).await.unwrap();

        let nonces: Vec<u64> = backend.submitted().iter().map(|tx| tx.nonce()).collect();
        assert_eq!(nonces, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_broke_funder_is_an_error() {
        let network = NetworkConfig::default();
        let backend = InMemoryBackend::new(&network).with_balance_checks();
        let funder = Funder::new(funder_key(), 1_000, network);

        let err = funder.fund(&backend, &[Address::new([0x01; 20])]).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Insufficient funds"));
    }

    #[test]
    fn test_from_config() {
        let config = HarnessConfig::default();
        assert!(Funder::from_config(&config).unwrap().is_none());

        let config = HarnessConfig {
            funder: Some(
                "0x4646464646464646464646464646464646464646464646464646464646464646".to_string(),
            ),
            fund_amount: 7,
            ..HarnessConfig::default()
        };
        let funder = Funder::from_config(&config).unwrap().unwrap();
        assert_eq!(funder.address(), funder_key().address());
        assert_eq!(funder.amount(), 7);
    }
}
