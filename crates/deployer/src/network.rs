use {
    alloy::{
        network::EthereumWallet,
        node_bindings::{Anvil, AnvilInstance},
        primitives::Address,
        providers::{DynProvider, Provider, ProviderBuilder},
        rpc::client::ClientBuilder,
        signers::local::PrivateKeySigner,
    },
    anyhow::{Context, Result, ensure},
    url::Url,
};

pub type AlloyProvider = DynProvider;

/// The network contracts get deployed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Network {
    /// A throwaway local node that only lives as long as the [`Connection`].
    Ephemeral,
    /// An already running node.
    Remote { url: Url },
}

/// An established connection to a network, including the account that pays
/// for deployments.
pub struct Connection {
    provider: AlloyProvider,
    sender: Address,
    /// Keeps the ephemeral node alive. Dropping it kills the node.
    _node: Option<AnvilInstance>,
}

impl Network {
    /// Connects to the network.
    ///
    /// Transactions get signed with `signer` if one is given. Otherwise the
    /// ephemeral node's first dev account is used, or on remote networks the
    /// first account the node has unlocked.
    pub async fn connect(
        &self,
        signer: Option<&PrivateKeySigner>,
        expected_chain_id: Option<u64>,
    ) -> Result<Connection> {
        let (url, signer, node) = match self {
            Network::Ephemeral => {
                let node = Anvil::new()
                    .try_spawn()
                    .context("failed to spawn ephemeral network")?;
                let signer = match signer {
                    Some(signer) => signer.clone(),
                    None => node
                        .keys()
                        .first()
                        .cloned()
                        .map(PrivateKeySigner::from)
                        .context("ephemeral network has no dev accounts")?,
                };
                tracing::info!(
                    url = %node.endpoint_url(),
                    chain_id = node.chain_id(),
                    "spawned ephemeral network"
                );
                (node.endpoint_url(), Some(signer), Some(node))
            }
            Network::Remote { url } => (url.clone(), signer.cloned(), None),
        };

        let provider = provider(url, signer.clone());
        let chain_id = provider
            .get_chain_id()
            .await
            .context("failed to query chain id")?;
        if let Some(expected_chain_id) = expected_chain_id {
            ensure!(
                chain_id == expected_chain_id,
                "connected to node with chain id {chain_id} but expected {expected_chain_id}"
            );
        }

        let sender = match signer {
            Some(signer) => signer.address(),
            None => provider
                .get_accounts()
                .await
                .context("failed to query unlocked accounts")?
                .first()
                .copied()
                .context("node has no unlocked accounts and no private key is configured")?,
        };
        tracing::info!(chain_id, ?sender, "connected to network");

        Ok(Connection {
            provider,
            sender,
            _node: node,
        })
    }
}

impl Connection {
    pub fn new(provider: AlloyProvider, sender: Address) -> Self {
        Self {
            provider,
            sender,
            _node: None,
        }
    }

    pub fn provider(&self) -> &AlloyProvider {
        &self.provider
    }

    pub fn sender(&self) -> Address {
        self.sender
    }
}

fn provider(url: Url, signer: Option<PrivateKeySigner>) -> AlloyProvider {
    let rpc = ClientBuilder::default().http(url);
    match signer {
        Some(signer) => ProviderBuilder::new()
            .wallet(EthereumWallet::new(signer))
            .connect_client(rpc)
            .erased(),
        None => ProviderBuilder::new().connect_client(rpc).erased(),
    }
}
