//! QR and 1D barcode decoding with `zbarimg`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, trace};

use crate::error::DecodeError;
use crate::models::Crop;

use super::tools::{resolve, run, stage_png};
use super::{BarcodeDecoder, QrDecoder, Result};

/// `zbarimg` exit status when the image holds no symbol.
const NO_SYMBOL_FOUND: i32 = 4;

/// Symbologies accepted as 1D invoice barcodes.
const LINEAR_SYMBOLS: &[&str] = &["code128", "code39", "ean13", "ean8", "upca", "upce"];

/// Decoder backed by the zbar command line tool.
#[derive(Debug, Clone)]
pub struct ZbarDecoder {
    binary: PathBuf,
}

impl ZbarDecoder {
    /// Locate `zbarimg` by name or path.
    pub fn new(binary: &Path) -> Result<Self> {
        let binary = resolve(binary)?;
        debug!("Using zbarimg at {}", binary.display());
        Ok(Self { binary })
    }

    fn scan(&self, crop: &Crop, symbology: &[String]) -> Result<Vec<String>> {
        let staged = stage_png(crop, false)?;

        let mut command = Command::new(&self.binary);
        command.arg("--raw").arg("-q");
        for flag in symbology {
            command.arg(flag);
        }
        command.arg(staged.path());

        let output = run(&mut command, "zbarimg")?;
        let status = output.status.code().unwrap_or(-1);

        if status == NO_SYMBOL_FOUND {
            trace!("zbarimg found no symbol in {} crop", crop.kind.as_str());
            return Ok(Vec::new());
        }
        if !output.status.success() {
            return Err(DecodeError::ToolFailed {
                tool: "zbarimg".to_string(),
                status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_lines(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl QrDecoder for ZbarDecoder {
    fn decode_qr(&self, crop: &Crop) -> Result<Vec<String>> {
        let flags = vec!["-Sdisable".to_string(), "-Sqrcode.enable".to_string()];
        let lines = self.scan(crop, &flags)?;
        trace!("QR lines: {:?}", lines);
        Ok(lines)
    }
}

impl BarcodeDecoder for ZbarDecoder {
    fn decode_barcode(&self, crop: &Crop) -> Result<Option<String>> {
        let mut flags = vec!["-Sdisable".to_string()];
        flags.extend(LINEAR_SYMBOLS.iter().map(|s| format!("-S{}.enable", s)));

        let lines = self.scan(crop, &flags)?;
        trace!("Barcode lines: {:?}", lines);
        Ok(lines.into_iter().next())
    }
}

/// Split raw zbar output into trimmed, non-empty lines.
fn parse_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        let out = "NumFac: 206-581544\r\n\n  NitFac: 900123456  \n";
        assert_eq!(
            parse_lines(out),
            vec!["NumFac: 206-581544".to_string(), "NitFac: 900123456".to_string()]
        );
        assert!(parse_lines("   \n").is_empty());
    }
}
