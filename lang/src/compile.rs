use eyre::eyre;
use tracing::debug;

use crate::{
    assemble::assemble,
    parse::{parse, report, report_syntax},
};

/// Source text to bytecode. Errors come back as rendered diagnostics.
pub fn compile(src: &str) -> Result<Vec<u8>, eyre::Report> {
    let statements = parse(src).map_err(|errs| eyre!("{}", report_syntax(src, &errs)))?;

    let bytecode = assemble(&statements).map_err(|errs| {
        let rendered = report(
            src,
            errs.iter()
                .map(|(err, span)| (err.to_string(), err.label().to_string(), *span)),
        );
        eyre!("{rendered}")
    })?;

    debug!(len = bytecode.len(), "compiled track");
    Ok(bytecode)
}

/// Like [compile], padding with `HALT` up to `size` so a track that runs off the end stops.
///
/// Programs longer than `size` are left as they are.
pub fn compile_padded(src: &str, size: usize) -> Result<Vec<u8>, eyre::Report> {
    let mut bytecode = compile(src)?;
    if bytecode.len() < size {
        bytecode.resize(size, vm::Opcode::Halt as u8);
    }
    Ok(bytecode)
}
