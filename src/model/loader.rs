use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::{FormatError, QuantLinear, QuantMeta};

pub const MAGIC: &[u8; 8] = b"QVECLIN1";
pub const VERSION: u32 = 1;

impl QuantLinear {
    /// Reads a layer from disk.
    ///
    /// Layout, all little-endian:
    /// magic: 8 bytes b"QVECLIN1"
    /// u32 version
    /// u32 rows, u32 cols
    /// i32 multiplier, i32 shift
    /// u8 bias flag
    /// i8  weights[rows*cols]
    /// i64 bias[rows] when the flag is non-zero
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(&path)
            .with_context(|| format!("open quant layer file: {}", path.as_ref().display()))?;
        let mut r = BufReader::new(f);

        let mut magic = [0u8; 8];
        read_exact_or(&mut r, &mut magic, "magic")?;
        if &magic != MAGIC {
            return Err(FormatError::BadMagic.into());
        }
        let version = read_u32(&mut r, "version")?;
        if version != VERSION {
            return Err(FormatError::UnsupportedVersion(version).into());
        }
        let rows = read_u32(&mut r, "rows")? as usize;
        let cols = read_u32(&mut r, "cols")? as usize;
        let multiplier = read_i32(&mut r, "multiplier")?;
        let shift = read_i32(&mut r, "shift")?;
        let mut flag = [0u8; 1];
        read_exact_or(&mut r, &mut flag, "bias flag")?;

        let n = rows
            .checked_mul(cols)
            .ok_or(FormatError::DimensionOverflow { rows, cols })?;
        let mut wbytes = vec![0u8; n];
        read_exact_or(&mut r, &mut wbytes, "weights")?;
        let weights: Vec<i8> = wbytes.into_iter().map(|b| b as i8).collect();

        let bias = if flag[0] != 0 {
            let mut out = Vec::with_capacity(rows);
            let mut b8 = [0u8; 8];
            for _ in 0..rows {
                read_exact_or(&mut r, &mut b8, "bias")?;
                out.push(i64::from_le_bytes(b8));
            }
            Some(out)
        } else {
            None
        };

        info!("loaded quant layer: {}x{} bias={}", rows, cols, bias.is_some());
        Ok(Self {
            meta: QuantMeta { version, rows, cols },
            multiplier,
            shift,
            weights,
            bias,
        })
    }

    /// Serializes the layer in the layout [`QuantLinear::load`] reads.
    pub fn write_to(&self, w: &mut impl Write) -> Result<()> {
        w.write_all(MAGIC).context("write magic")?;
        w.write_all(&VERSION.to_le_bytes()).context("write version")?;
        w.write_all(&(self.meta.rows as u32).to_le_bytes()).context("write rows")?;
        w.write_all(&(self.meta.cols as u32).to_le_bytes()).context("write cols")?;
        w.write_all(&self.multiplier.to_le_bytes()).context("write multiplier")?;
        w.write_all(&self.shift.to_le_bytes()).context("write shift")?;
        w.write_all(&[self.bias.is_some() as u8]).context("write bias flag")?;
        let wbytes: Vec<u8> = self.weights.iter().map(|&v| v as u8).collect();
        w.write_all(&wbytes).context("write weights")?;
        if let Some(bias) = &self.bias {
            for v in bias {
                w.write_all(&v.to_le_bytes()).context("write bias")?;
            }
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let f = File::create(&path)
            .with_context(|| format!("create quant layer file: {}", path.as_ref().display()))?;
        let mut w = BufWriter::new(f);
        self.write_to(&mut w)?;
        w.flush().context("flush quant layer file")?;
        Ok(())
    }
}

fn read_exact_or(r: &mut impl Read, buf: &mut [u8], what: &'static str) -> Result<()> {
    match r.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(FormatError::Truncated(what).into())
        }
        Err(e) => Err(e).with_context(|| format!("read {}", what)),
    }
}

fn read_u32(r: &mut impl Read, what: &'static str) -> Result<u32> {
    let mut b = [0u8; 4];
    read_exact_or(r, &mut b, what)?;
    Ok(u32::from_le_bytes(b))
}

fn read_i32(r: &mut impl Read, what: &'static str) -> Result<i32> {
    let mut b = [0u8; 4];
    read_exact_or(r, &mut b, what)?;
    Ok(i32::from_le_bytes(b))
}
