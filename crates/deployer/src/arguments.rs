use {
    crate::network::Network,
    alloy::signers::local::PrivateKeySigner,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
    },
    url::Url,
};

#[derive(clap::Parser)]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    /// Name of the contract to deploy. Either the bare contract name or the
    /// fully qualified `<sourceName>:<ContractName>` if the name is not
    /// unique.
    #[clap(long, env, default_value = "MyEpicNFT")]
    pub contract: String,

    /// Directory containing the compiled contract artifacts.
    #[clap(long, env, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    /// The Ethereum node URL to connect to. If not set a throwaway local
    /// network gets spawned for the duration of the deployment.
    #[clap(long, env)]
    pub node_url: Option<Url>,

    /// Private key of the account paying for the deployment. Defaults to the
    /// first dev account of the local network or the first account unlocked
    /// on the node.
    #[clap(long, env)]
    pub private_key: Option<PrivateKeySigner>,

    /// If set, the node must report this chain ID.
    #[clap(long, env)]
    pub chain_id: Option<u64>,
}

#[derive(clap::Parser)]
pub struct LoggingArguments {
    #[clap(long, env, default_value = "warn,deployer=info,observe=info")]
    pub log_filter: String,

    /// Emit log lines as JSON.
    #[clap(long, env)]
    pub use_json_logs: bool,
}

impl Arguments {
    pub fn network(&self) -> Network {
        match &self.node_url {
            Some(url) => Network::Remote { url: url.clone() },
            None => Network::Ephemeral,
        }
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            logging,
            contract,
            artifacts_dir,
            node_url,
            private_key,
            chain_id,
        } = self;

        write!(f, "{logging}")?;
        writeln!(f, "contract: {contract}")?;
        writeln!(f, "artifacts_dir: {}", artifacts_dir.display())?;
        match node_url {
            Some(url) => writeln!(f, "node_url: {url}")?,
            None => writeln!(f, "node_url: None (ephemeral network)")?,
        }
        let private_key = private_key.as_ref().map(|_| "SECRET");
        writeln!(f, "private_key: {private_key:?}")?;
        writeln!(f, "chain_id: {chain_id:?}")?;
        Ok(())
    }
}

impl Display for LoggingArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log_filter,
            use_json_logs,
        } = self;

        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")?;
        Ok(())
    }
}
