use anyhow::{Result, bail};
use std::collections::HashSet;

/// Canned seed bank used when a sweep over many sessions is requested
/// without hand-picking values.
const SWEEP_SEEDS: &[u64] = &[
    0x0000_1337,
    0x5EED_CAFE,
    0xDEAD_BEEF,
    0xFACE_B00C,
    0x00C0_FFEE,
    0xBAD_5EED,
    0xFEED_FACE,
    0xD15_EA5E,
    0xAB1E_5EED,
    0x0DDB_A11,
    0x5AFE_FA2E,
    0x7A21_CAB5,
];

/// Seed metadata carried through logic scenarios and balance analysis.
#[derive(Debug, Clone)]
pub struct SeedInfo {
    pub seed: u64,
    /// The CLI token the seed came from, kept for report labelling.
    pub source: String,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            source: seed.to_string(),
        }
    }
}

/// Resolve a list of CLI seed arguments into canonical seed metadata.
///
/// Supports literal integers (negative values take their magnitude), `0x`
/// hexadecimal values, and the special keyword `sweep` which expands to the
/// built-in seed bank.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("sweep") {
            pending.extend(SWEEP_SEEDS.iter().copied().map(SeedInfo::from_numeric));
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            if let Ok(value) = u64::from_str_radix(hex, 16) {
                pending.push(SeedInfo {
                    seed: value,
                    source: token.clone(),
                });
                continue;
            }
            bail!("Unrecognized hex seed token: {token}");
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen: HashSet<u64> = HashSet::new();
    let mut deduped: Vec<SeedInfo> = Vec::new();
    for info in pending {
        if seen.insert(info.seed) {
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }

    log::debug!("resolved {} seed(s)", deduped.len());
    Ok(deduped)
}
