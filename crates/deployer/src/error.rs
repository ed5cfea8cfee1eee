use {
    alloy::{
        primitives::B256,
        providers::PendingTransactionError,
        transports::TransportError,
    },
    std::path::PathBuf,
    thiserror::Error,
};

/// Everything that can go wrong while deploying a contract.
///
/// All variants are transparent so the message of the underlying error
/// reaches the top-level handler unchanged.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

/// The named contract could not be located or instantiated.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("artifact for contract {name:?} not found in {}", .dir.display())]
    ArtifactNotFound { name: String, dir: PathBuf },
    #[error(
        "multiple artifacts for contract {name:?}, use one of the fully qualified names: {}",
        .candidates.join(", ")
    )]
    AmbiguousArtifact {
        name: String,
        candidates: Vec<String>,
    },
    #[error("contract {name:?} has no creation bytecode, it is abstract or an interface")]
    AbstractContract { name: String },
    #[error(
        "contract {name:?} references libraries that are not linked: {}",
        .libraries.join(", ")
    )]
    UnlinkedLibraries {
        name: String,
        libraries: Vec<String>,
    },
    #[error(
        "contract {name:?} expects {count} constructor argument(s) but is deployed without \
         arguments"
    )]
    ConstructorArguments { name: String, count: usize },
    #[error("failed to read artifact {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse artifact {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("artifact {} contains invalid bytecode", .path.display())]
    InvalidBytecode {
        path: PathBuf,
        #[source]
        source: const_hex::FromHexError,
    },
}

/// The deployment transaction was rejected or never confirmed.
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("deployment transaction was rejected by the node")]
    Rejected(#[source] TransportError),
    #[error("deployment transaction {tx_hash} was never confirmed")]
    Unconfirmed {
        tx_hash: B256,
        #[source]
        source: PendingTransactionError,
    },
    #[error("deployment transaction {tx_hash} reverted")]
    Reverted { tx_hash: B256 },
    #[error("receipt of deployment transaction {tx_hash} has no contract address")]
    MissingContractAddress { tx_hash: B256 },
    #[error("deployed contract has no address")]
    AddressUnavailable,
}
