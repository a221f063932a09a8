//! Disassembler adapter boundary (spec §1, §4.7).
//!
//! The core engine never disassembles anything itself — it normalizes
//! and fingerprints whatever typed instruction stream an adapter hands
//! it. This trait is the seam; a real adapter (objdump/Ghidra/etc.
//! wrapper) lives outside this crate.

use crate::error::Result;
use crate::instruction::SymbolStream;

pub trait DisassemblerAdapter: Send + Sync {
    fn disassemble(&self, object_bytes: &[u8]) -> Result<Vec<SymbolStream>>;
}

/// Test/demo adapter: ignores `object_bytes` entirely and reads a JSON
/// sidecar file of `[SymbolStream]` instead of invoking a real
/// disassembler. Not a production adapter.
pub struct StubAdapter {
    sidecar_path: std::path::PathBuf,
}

impl StubAdapter {
    pub fn new(sidecar_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            sidecar_path: sidecar_path.into(),
        }
    }
}

impl DisassemblerAdapter for StubAdapter {
    fn disassemble(&self, _object_bytes: &[u8]) -> Result<Vec<SymbolStream>> {
        let bytes = std::fs::read(&self.sidecar_path)?;
        let streams: Vec<SymbolStream> = serde_json::from_slice(&bytes).map_err(|e| {
            crate::error::SymhoundError::InvalidArgument {
                message: format!("malformed stub sidecar {}: {e}", self.sidecar_path.display()),
            }
        })?;
        Ok(streams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Instruction;
    use std::io::Write;

    #[test]
    fn stub_adapter_reads_sidecar_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let streams = vec![SymbolStream {
            name: "foo".to_string(),
            symbol_idx: 0,
            is_decompiled: false,
            instructions: vec![Instruction::new("ret", vec![])],
        }];
        file.write_all(&serde_json::to_vec(&streams).unwrap()).unwrap();

        let adapter = StubAdapter::new(file.path());
        let out = adapter.disassemble(&[]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "foo");
    }

    #[test]
    fn stub_adapter_surfaces_malformed_sidecar_as_invalid_argument() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();
        let adapter = StubAdapter::new(file.path());
        let err = adapter.disassemble(&[]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::SymhoundError::InvalidArgument { .. }
        ));
    }
}
