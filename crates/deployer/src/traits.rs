//! Trait definitions for the contract deployment boundary.
//!
//! These traits abstract the toolchain and the network the contract gets
//! deployed to so the deployment sequence can be unit tested with mocks.

use crate::error::Error;

/// Hands out deployable contracts by name.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContractFactoryProvider: Send + Sync {
    /// Looks up the compiled contract called `name` and prepares it for
    /// deployment.
    ///
    /// Fails with a provisioning error if no such contract can be located or
    /// instantiated.
    async fn get_contract_factory(&self, name: &str) -> Result<Box<dyn ContractFactory>, Error>;
}

/// A compiled contract that can be deployed.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContractFactory: Send + Sync {
    /// Submits the deployment. Returning successfully does not mean the
    /// contract is live yet, see [`DeployedContract::wait_for_deployment`].
    async fn deploy(&self) -> Result<Box<dyn DeployedContract>, Error>;
}

/// Handle of a contract whose deployment was submitted.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DeployedContract: Send + Sync {
    /// Suspends until the network reports the contract as mined.
    async fn wait_for_deployment(&mut self) -> Result<(), Error>;

    /// Address of the contract. Only available once the deployment was
    /// confirmed.
    fn address(&self) -> Option<String>;
}
