//! Contract factories backed by compiled artifacts and a live network.

use {
    crate::{
        artifacts::{Artifact, ArtifactStore},
        error::{DeploymentError, Error},
        network::{Connection, Network},
        traits::{ContractFactory, ContractFactoryProvider, DeployedContract},
    },
    alloy::{
        network::{Ethereum, ReceiptResponse, TransactionBuilder},
        primitives::{Address, B256},
        providers::{PendingTransactionBuilder, Provider},
        rpc::types::TransactionRequest,
        signers::local::PrivateKeySigner,
    },
    std::sync::Arc,
};

/// Hands out factories for the artifacts in an [`ArtifactStore`]. The network
/// gets connected to lazily when the first factory is requested and stays
/// alive as long as any factory or deployment handle uses it.
pub struct ArtifactProvider {
    artifacts: ArtifactStore,
    network: Network,
    signer: Option<PrivateKeySigner>,
    expected_chain_id: Option<u64>,
}

impl ArtifactProvider {
    pub fn new(
        artifacts: ArtifactStore,
        network: Network,
        signer: Option<PrivateKeySigner>,
        expected_chain_id: Option<u64>,
    ) -> Self {
        Self {
            artifacts,
            network,
            signer,
            expected_chain_id,
        }
    }
}

#[async_trait::async_trait]
impl ContractFactoryProvider for ArtifactProvider {
    async fn get_contract_factory(&self, name: &str) -> Result<Box<dyn ContractFactory>, Error> {
        let artifact = self.artifacts.load(name)?;
        let connection = self
            .network
            .connect(self.signer.as_ref(), self.expected_chain_id)
            .await?;
        Ok(Box::new(BytecodeFactory::new(artifact, Arc::new(connection))))
    }
}

/// Deploys the creation code of an artifact without constructor arguments.
pub struct BytecodeFactory {
    artifact: Artifact,
    connection: Arc<Connection>,
}

impl BytecodeFactory {
    pub fn new(artifact: Artifact, connection: Arc<Connection>) -> Self {
        Self {
            artifact,
            connection,
        }
    }
}

#[async_trait::async_trait]
impl ContractFactory for BytecodeFactory {
    async fn deploy(&self) -> Result<Box<dyn DeployedContract>, Error> {
        let tx = TransactionRequest::default()
            .with_from(self.connection.sender())
            .with_deploy_code(self.artifact.bytecode.clone());
        let pending = self
            .connection
            .provider()
            .send_transaction(tx)
            .await
            .map_err(DeploymentError::Rejected)?;
        tracing::info!(
            contract = self.artifact.name,
            tx_hash = ?pending.tx_hash(),
            "submitted deployment transaction"
        );
        Ok(Box::new(PendingDeployment {
            tx_hash: *pending.tx_hash(),
            pending: Some(pending),
            address: None,
            _connection: self.connection.clone(),
        }))
    }
}

struct PendingDeployment {
    tx_hash: B256,
    pending: Option<PendingTransactionBuilder<Ethereum>>,
    address: Option<Address>,
    _connection: Arc<Connection>,
}

#[async_trait::async_trait]
impl DeployedContract for PendingDeployment {
    async fn wait_for_deployment(&mut self) -> Result<(), Error> {
        let Some(pending) = self.pending.take() else {
            return match self.address {
                Some(_) => Ok(()),
                None => Err(DeploymentError::AddressUnavailable.into()),
            };
        };

        let tx_hash = self.tx_hash;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|source| DeploymentError::Unconfirmed { tx_hash, source })?;
        let address = deployed_address(tx_hash, &receipt)?;
        tracing::debug!(
            block = ?ReceiptResponse::block_number(&receipt),
            gas_used = ReceiptResponse::gas_used(&receipt),
            ?address,
            "deployment mined"
        );

        self.address = Some(address);
        Ok(())
    }

    fn address(&self) -> Option<String> {
        self.address.map(|address| address.to_string())
    }
}

/// Address of the contract created by the mined deployment transaction.
fn deployed_address(
    tx_hash: B256,
    receipt: &impl ReceiptResponse,
) -> Result<Address, DeploymentError> {
    if !receipt.status() {
        return Err(DeploymentError::Reverted { tx_hash });
    }
    receipt
        .contract_address()
        .ok_or(DeploymentError::MissingContractAddress { tx_hash })
}
