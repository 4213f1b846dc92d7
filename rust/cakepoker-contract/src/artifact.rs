//! Compiled contract artifacts and library linking
//!
//! Artifacts follow the Hardhat layout: `<root>/<sourceName>/<ContractName>.json`, each
//! holding the ABI, the creation bytecode and the byte offsets of every library address
//! that must be substituted before the bytecode can be deployed.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    hex,
    json_abi::JsonAbi,
    primitives::{Address, Bytes, keccak256},
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("library `{0}` is referenced but no address was supplied")]
    UnlinkedLibrary(String),

    #[error("link reference for `{library}` at byte {start} exceeds bytecode length {len}")]
    OffsetOutOfRange {
        library: String,
        start: usize,
        len: usize,
    },

    #[error("invalid bytecode: {0}")]
    Hex(#[from] hex::FromHexError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LinkOffset {
    pub start: usize,
    pub length: usize,
}

const ADDRESS_LEN: usize = 20;

/// source file -> library name -> offsets
pub type LinkReferences = BTreeMap<String, BTreeMap<String, Vec<LinkOffset>>>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    #[serde(default)]
    pub abi: JsonAbi,
    pub bytecode: String,
    #[serde(default)]
    pub link_references: LinkReferences,
}

/// Solidity placeholder for an unlinked library: `__$` + 34 hex chars of
/// `keccak256(fully_qualified_name)` + `$__`.
pub fn placeholder(fully_qualified_name: &str) -> String {
    let digest = hex::encode(keccak256(fully_qualified_name.as_bytes()));
    format!("__${}$__", &digest[..34])
}

impl Artifact {
    pub fn from_json(path: &Path, json: &str) -> Result<Self, ArtifactError> {
        serde_json::from_str(json).map_err(|source| ArtifactError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `source:Name` as used by link references and placeholders.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Fully-qualified names of every library this bytecode links against.
    pub fn libraries(&self) -> Vec<String> {
        self.link_references
            .iter()
            .flat_map(|(source, libs)| libs.keys().map(move |name| format!("{source}:{name}")))
            .collect()
    }

    pub fn needs_linking(&self) -> bool {
        !self.link_references.is_empty() || self.bytecode.contains("__$")
    }

    /// Substitute library addresses into the creation bytecode.
    ///
    /// Libraries may be keyed by fully-qualified (`contracts/Helper.sol:Helper`) or
    /// bare (`Helper`) name. Extra libraries are ignored.
    pub fn link(&self, libraries: &[(&str, Address)]) -> Result<Bytes, ArtifactError> {
        let lookup = |source: &str, name: &str| {
            let fq = format!("{source}:{name}");
            libraries
                .iter()
                .find(|(key, _)| *key == fq || *key == name)
                .map(|(_, addr)| *addr)
        };

        let mut code = self.bytecode.trim_start_matches("0x").to_owned();
        for (source, libs) in &self.link_references {
            for (name, offsets) in libs {
                let addr = lookup(source, name)
                    .ok_or_else(|| ArtifactError::UnlinkedLibrary(format!("{source}:{name}")))?;
                let addr_hex = hex::encode(addr);
                for offset in offsets {
                    let range = offset.start * 2..(offset.start + offset.length) * 2;
                    if range.end > code.len() || offset.length != ADDRESS_LEN {
                        return Err(ArtifactError::OffsetOutOfRange {
                            library: format!("{source}:{name}"),
                            start: offset.start,
                            len: code.len() / 2,
                        });
                    }
                    code.replace_range(range, &addr_hex);
                }
                tracing::debug!(library = %name, %addr, count = offsets.len(), "linked library");
            }
        }

        // artifacts without offsets still carry placeholders
        for (key, addr) in libraries {
            let marker = placeholder(key);
            if code.contains(&marker) {
                code = code.replace(&marker, &hex::encode(addr));
            }
        }
        if let Some(pos) = code.find("__$") {
            let end = (pos + 40).min(code.len());
            return Err(ArtifactError::UnlinkedLibrary(code[pos..end].to_owned()));
        }

        Ok(hex::decode(code)?.into())
    }

    /// Linked bytecode followed by ABI-encoded constructor arguments.
    pub fn creation_code(
        &self,
        libraries: &[(&str, Address)],
        constructor_args: &[u8],
    ) -> Result<Bytes, ArtifactError> {
        let mut code = self.link(libraries)?.to_vec();
        code.extend_from_slice(constructor_args);
        Ok(code.into())
    }
}

/// A directory of compiled artifacts.
#[derive(Debug, Clone)]
pub struct Artifacts {
    root: PathBuf,
}

impl Artifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, source_name: &str, contract_name: &str) -> PathBuf {
        self.root
            .join(source_name)
            .join(format!("{contract_name}.json"))
    }

    pub fn load(&self, source_name: &str, contract_name: &str) -> Result<Artifact, ArtifactError> {
        let path = self.path_of(source_name, contract_name);
        let json = fs::read_to_string(&path).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        Artifact::from_json(&path, &json)
    }
}
