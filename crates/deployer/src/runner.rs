use {
    crate::{
        error::{DeploymentError, Error},
        traits::ContractFactoryProvider,
    },
    anyhow::Context,
    std::{io::Write, process::ExitCode},
    tracing::instrument,
};

/// Outcome of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    contract_address: String,
}

impl DeploymentResult {
    pub fn new(contract_address: String) -> Result<Self, DeploymentError> {
        if contract_address.is_empty() {
            return Err(DeploymentError::AddressUnavailable);
        }
        Ok(Self { contract_address })
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }
}

/// How the process should terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    pub fn code(self) -> u8 {
        match self {
            Status::Success => 0,
            Status::Failure => 1,
        }
    }
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        ExitCode::from(status.code())
    }
}

/// Runs the one-shot deployment sequence of a single contract:
/// obtain the factory, deploy it, wait for the confirmation and read the
/// address. Nothing is retried.
pub struct DeploymentRunner<P> {
    provider: P,
    contract: String,
}

impl<P: ContractFactoryProvider> DeploymentRunner<P> {
    pub fn new(provider: P, contract: impl Into<String>) -> Self {
        Self {
            provider,
            contract: contract.into(),
        }
    }

    #[instrument(skip_all, fields(contract = %self.contract))]
    pub async fn deploy(&self) -> Result<DeploymentResult, Error> {
        let factory = self.provider.get_contract_factory(&self.contract).await?;
        tracing::debug!("obtained contract factory");

        let mut contract = factory.deploy().await?;
        tracing::debug!("deployment submitted, waiting for confirmation");

        contract.wait_for_deployment().await?;
        let address = contract
            .address()
            .ok_or(DeploymentError::AddressUnavailable)?;
        let result = DeploymentResult::new(address)?;
        tracing::info!(address = result.contract_address(), "deployment confirmed");
        Ok(result)
    }

    /// Deploys the contract and reports the outcome to `out`.
    pub async fn run(&self, out: &mut impl Write) -> Status {
        report(self.deploy().await, out)
    }
}

/// Converts the result of a deployment into the process status. On success
/// the address gets printed to `out`, on failure the whole error chain gets
/// logged on a single line.
pub fn report(result: Result<DeploymentResult, Error>, out: &mut impl Write) -> Status {
    let reported = result.map_err(anyhow::Error::from).and_then(|deployment| {
        writeln!(
            out,
            "Contract deployed to: {}",
            deployment.contract_address()
        )
        .and_then(|()| out.flush())
        .context("failed to print contract address")
    });

    match reported {
        Ok(()) => Status::Success,
        Err(err) => {
            tracing::error!("deployment failed: {err:#}");
            Status::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            error::ProvisioningError,
            traits::{
                ContractFactory,
                DeployedContract,
                MockContractFactory,
                MockContractFactoryProvider,
                MockDeployedContract,
            },
        },
        alloy::{primitives::B256, transports::TransportErrorKind},
        mockall::Sequence,
    };

    const ADDRESS: &str = "0xABCDEF1234567890000000000000000000000a";

    fn confirmed_contract(address: &str) -> MockDeployedContract {
        let mut contract = MockDeployedContract::new();
        contract
            .expect_wait_for_deployment()
            .times(1)
            .returning(|| Ok(()));
        contract
            .expect_address()
            .return_const(Some(address.to_string()));
        contract
    }

    fn factory_deploying(contract: MockDeployedContract) -> MockContractFactory {
        let mut factory = MockContractFactory::new();
        factory
            .expect_deploy()
            .times(1)
            .return_once(move || Ok(Box::new(contract) as Box<dyn DeployedContract>));
        factory
    }

    fn provider_returning(factory: MockContractFactory) -> MockContractFactoryProvider {
        let mut provider = MockContractFactoryProvider::new();
        provider
            .expect_get_contract_factory()
            .withf(|name| name == "MyEpicNFT")
            .times(1)
            .return_once(move |_| Ok(Box::new(factory) as Box<dyn ContractFactory>));
        provider
    }

    #[tokio::test]
    async fn prints_address_of_deployed_contract() {
        let provider = provider_returning(factory_deploying(confirmed_contract(ADDRESS)));
        let runner = DeploymentRunner::new(provider, "MyEpicNFT");

        let mut out = Vec::new();
        let status = runner.run(&mut out).await;

        assert_eq!(status, Status::Success);
        assert_eq!(status.code(), 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Contract deployed to: 0xABCDEF1234567890000000000000000000000a\n"
        );
    }

    #[tokio::test]
    async fn factory_error_is_surfaced_verbatim() {
        let mut provider = MockContractFactoryProvider::new();
        provider
            .expect_get_contract_factory()
            .times(1)
            .returning(|name| {
                Err(ProvisioningError::ArtifactNotFound {
                    name: name.to_string(),
                    dir: "artifacts".into(),
                }
                .into())
            });
        let runner = DeploymentRunner::new(provider, "MyEpicNFT");

        let err = runner.deploy().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Provisioning(ProvisioningError::ArtifactNotFound { .. })
        ));
        assert_eq!(
            err.to_string(),
            "artifact for contract \"MyEpicNFT\" not found in artifacts"
        );

        let mut out = Vec::new();
        assert_eq!(report(Err(err), &mut out), Status::Failure);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn failed_confirmation_prints_nothing() {
        let mut contract = MockDeployedContract::new();
        contract
            .expect_wait_for_deployment()
            .times(1)
            .returning(|| {
                Err(DeploymentError::Reverted {
                    tx_hash: B256::repeat_byte(1),
                }
                .into())
            });
        contract.expect_address().never();
        let provider = provider_returning(factory_deploying(contract));
        let runner = DeploymentRunner::new(provider, "MyEpicNFT");

        let mut out = Vec::new();
        let status = runner.run(&mut out).await;

        assert_eq!(status, Status::Failure);
        assert_eq!(status.code(), 1);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn rejected_deployment_fails() {
        let mut factory = MockContractFactory::new();
        factory.expect_deploy().times(1).returning(|| {
            Err(DeploymentError::Rejected(TransportErrorKind::custom_str("nonce too low")).into())
        });
        let runner = DeploymentRunner::new(provider_returning(factory), "MyEpicNFT");

        let err = runner.deploy().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Deployment(DeploymentError::Rejected(_))
        ));
        let chain = format!("{:#}", anyhow::Error::from(err));
        assert!(chain.starts_with("deployment transaction was rejected by the node: "));
        assert!(chain.contains("nonce too low"));
    }

    #[tokio::test]
    async fn unexpected_deploy_error_is_surfaced_verbatim() {
        let mut factory = MockContractFactory::new();
        factory
            .expect_deploy()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("nonce too low").into()));
        let runner = DeploymentRunner::new(provider_returning(factory), "MyEpicNFT");

        let err = runner.deploy().await.unwrap_err();
        assert!(matches!(err, Error::Unknown(_)));
        assert_eq!(err.to_string(), "nonce too low");
    }

    #[tokio::test]
    async fn missing_or_empty_address_is_a_deployment_error() {
        for address in [None, Some(String::new())] {
            let mut contract = MockDeployedContract::new();
            contract
                .expect_wait_for_deployment()
                .returning(|| Ok(()));
            contract.expect_address().return_const(address);
            let provider = provider_returning(factory_deploying(contract));
            let runner = DeploymentRunner::new(provider, "MyEpicNFT");

            let err = runner.deploy().await.unwrap_err();
            assert!(matches!(
                err,
                Error::Deployment(DeploymentError::AddressUnavailable)
            ));
        }
    }

    #[tokio::test]
    async fn independent_runs_do_not_share_state() {
        let first = DeploymentRunner::new(
            provider_returning(factory_deploying(confirmed_contract(ADDRESS))),
            "MyEpicNFT",
        );
        let second = DeploymentRunner::new(
            provider_returning(factory_deploying(confirmed_contract(
                "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            ))),
            "MyEpicNFT",
        );

        let first = first.deploy().await.unwrap();
        let second = second.deploy().await.unwrap();

        assert_eq!(first.contract_address(), ADDRESS);
        assert_eq!(
            second.contract_address(),
            "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn confirmation_waits_for_factory() {
        let mut seq = Sequence::new();
        let mut provider = MockContractFactoryProvider::new();
        let mut factory = MockContractFactory::new();
        let mut contract = MockDeployedContract::new();

        let provider_expectation = provider
            .expect_get_contract_factory()
            .times(1)
            .in_sequence(&mut seq);
        let factory_expectation = factory.expect_deploy().times(1).in_sequence(&mut seq);
        contract
            .expect_wait_for_deployment()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        contract
            .expect_address()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(Some(ADDRESS.to_string()));

        factory_expectation.return_once(move || Ok(Box::new(contract) as Box<dyn DeployedContract>));
        provider_expectation
            .return_once(move |_| Ok(Box::new(factory) as Box<dyn ContractFactory>));

        let runner = DeploymentRunner::new(provider, "MyEpicNFT");
        let result = runner.deploy().await.unwrap();
        assert_eq!(result.contract_address(), ADDRESS);
    }

    #[test]
    fn status_converts_into_exit_code() {
        assert_eq!(Status::Success.code(), 0);
        assert_eq!(Status::Failure.code(), 1);
        let _: ExitCode = Status::Failure.into();
    }
}
