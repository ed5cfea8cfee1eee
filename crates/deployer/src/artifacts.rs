//! Lookup of compiled contract artifacts.
//!
//! Artifacts are the JSON files a Solidity toolchain writes next to each
//! other in an artifacts directory, one file per contract:
//! `<artifacts>/<sourceName>/<ContractName>.json`. Both the Hardhat layout
//! (`bytecode` is a hex string) and the Foundry layout (`bytecode.object`)
//! are understood.

use {
    crate::error::ProvisioningError,
    alloy::{json_abi::JsonAbi, primitives::Bytes},
    serde::Deserialize,
    std::{
        collections::BTreeMap,
        fs,
        io,
        path::{Path, PathBuf},
    },
};

/// Directory holding the toolchain output for debugging purposes only.
const BUILD_INFO_DIR: &str = "build-info";
/// Library placeholders in unlinked bytecode always take the space of an
/// address, i.e. 40 hex characters.
const PLACEHOLDER_LEN: usize = 40;

/// A compiled contract ready to be deployed.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Fully qualified name, `<sourceName>:<ContractName>`.
    pub name: String,
    /// Creation code.
    pub bytecode: Bytes,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Loads the artifact of the contract called `name`. `name` is either the
    /// bare contract name or a fully qualified `<sourceName>:<ContractName>`.
    pub fn load(&self, name: &str) -> Result<Artifact, ProvisioningError> {
        let path = self.locate(name)?;
        tracing::debug!(path = %path.display(), "loading artifact");
        let contents = fs::read(&path).map_err(|source| ProvisioningError::Io {
            path: path.clone(),
            source,
        })?;
        Artifact::parse(&path, self.qualified_name(&path), &contents)
    }

    fn locate(&self, name: &str) -> Result<PathBuf, ProvisioningError> {
        let not_found = || ProvisioningError::ArtifactNotFound {
            name: name.to_string(),
            dir: self.root.clone(),
        };

        if let Some((source, contract)) = name.rsplit_once(':') {
            let path = self.root.join(source).join(format!("{contract}.json"));
            return if path.is_file() {
                Ok(path)
            } else {
                Err(not_found())
            };
        }

        let mut candidates = Vec::new();
        self.collect(&self.root, &format!("{name}.json"), &mut candidates)?;
        candidates.sort();
        match candidates.len() {
            0 => Err(not_found()),
            1 => Ok(candidates.remove(0)),
            _ => Err(ProvisioningError::AmbiguousArtifact {
                name: name.to_string(),
                candidates: candidates
                    .iter()
                    .map(|path| self.qualified_name(path))
                    .collect(),
            }),
        }
    }

    /// Recursively collects all files called `file_name` below `dir`. Debug
    /// files are named `<ContractName>.dbg.json` so they never match.
    fn collect(
        &self,
        dir: &Path,
        file_name: &str,
        found: &mut Vec<PathBuf>,
    ) -> Result<(), ProvisioningError> {
        let io_error = |source: io::Error| ProvisioningError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            // A missing artifacts directory simply contains no artifacts.
            Err(err) if err.kind() == io::ErrorKind::NotFound && dir == self.root => {
                return Ok(());
            }
            Err(err) => return Err(io_error(err)),
        };

        for entry in entries {
            let entry = entry.map_err(io_error)?;
            let path = entry.path();
            if entry.file_type().map_err(io_error)?.is_dir() {
                if entry.file_name() != BUILD_INFO_DIR {
                    self.collect(&path, file_name, found)?;
                }
            } else if entry.file_name() == file_name {
                found.push(path);
            }
        }
        Ok(())
    }

    fn qualified_name(&self, path: &Path) -> String {
        let contract = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source = path
            .strip_prefix(&self.root)
            .ok()
            .and_then(Path::parent)
            .map(|parent| parent.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        format!("{source}:{contract}")
    }
}

type LinkReferences = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    #[serde(default)]
    abi: JsonAbi,
    bytecode: RawBytecode,
    #[serde(default)]
    link_references: LinkReferences,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object {
        object: String,
        #[serde(default, rename = "linkReferences")]
        link_references: LinkReferences,
    },
}

impl Artifact {
    fn parse(path: &Path, name: String, contents: &[u8]) -> Result<Self, ProvisioningError> {
        let raw: RawArtifact =
            serde_json::from_slice(contents).map_err(|source| ProvisioningError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let (code, mut link_references) = match raw.bytecode {
            RawBytecode::Hex(code) => (code, raw.link_references),
            RawBytecode::Object {
                object,
                link_references,
            } => (object, link_references),
        };
        let code = code.trim();
        let code = code.strip_prefix("0x").unwrap_or(code);

        if code.is_empty() {
            return Err(ProvisioningError::AbstractContract { name });
        }

        link_references.retain(|_, libraries| !libraries.is_empty());
        if !link_references.is_empty() || code.contains("__") {
            let mut libraries: Vec<_> = link_references
                .iter()
                .flat_map(|(source, libraries)| {
                    libraries.keys().map(move |library| format!("{source}:{library}"))
                })
                .collect();
            if libraries.is_empty() {
                libraries = placeholders(code);
            }
            return Err(ProvisioningError::UnlinkedLibraries { name, libraries });
        }

        let bytecode =
            const_hex::decode(code).map_err(|source| ProvisioningError::InvalidBytecode {
                path: path.to_path_buf(),
                source,
            })?;

        let count = raw
            .abi
            .constructor
            .as_ref()
            .map_or(0, |constructor| constructor.inputs.len());
        if count > 0 {
            return Err(ProvisioningError::ConstructorArguments { name, count });
        }

        Ok(Self {
            name,
            bytecode: Bytes::from(bytecode),
        })
    }
}

/// Extracts the library placeholders of unlinked bytecode.
fn placeholders(code: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut rest = code;
    while let Some(start) = rest.find("__") {
        let end = (start + PLACEHOLDER_LEN).min(rest.len());
        let placeholder = rest.get(start..end).unwrap_or(&rest[start..]);
        found.push(placeholder.to_string());
        rest = &rest[start + placeholder.len()..];
    }
    found.sort();
    found.dedup();
    found
}
