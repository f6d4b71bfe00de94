//! Output file naming.
//!
//! Auto-generated names come from a 64-bit FNV-1a hash of the expression text
//! reduced modulo 10000, so distinct expressions can and do share a name. What
//! happens then is decided by [`CollisionPolicy`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Number of distinct auto-generated names per prefix.
pub const HASH_SLOTS: u64 = 10_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Last write wins.
    #[default]
    Overwrite,
    /// Append `-1`, `-2`, ... to the stem until the path does not exist.
    Suffix,
}

pub fn expression_hash(expr: &str) -> u64 {
    let mut h = FNV_OFFSET;
    for &b in expr.as_bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

pub fn hash_slot(expr: &str) -> u64 {
    expression_hash(expr) % HASH_SLOTS
}

/// `{dir}/{prefix}{slot}.png`
pub fn auto_output_path(dir: &Path, prefix: &str, expr: &str) -> PathBuf {
    dir.join(format!("{prefix}{}.png", hash_slot(expr)))
}

/// Apply `policy` to a candidate path. Only checks the filesystem for
/// [`CollisionPolicy::Suffix`].
pub fn resolve_collision(path: PathBuf, policy: CollisionPolicy) -> PathBuf {
    match policy {
        CollisionPolicy::Overwrite => path,
        CollisionPolicy::Suffix => {
            if !path.exists() {
                return path;
            }
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let ext = path
                .extension()
                .map(|s| format!(".{}", s.to_string_lossy()))
                .unwrap_or_default();
            let mut n = 1u32;
            loop {
                let candidate = path.with_file_name(format!("{stem}-{n}{ext}"));
                if !candidate.exists() {
                    return candidate;
                }
                n += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_fnv1a_reference_values() {
        assert_eq!(expression_hash(""), 0xcbf29ce484222325);
        assert_eq!(expression_hash("a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn hash_is_deterministic_and_bounded() {
        let a = hash_slot("x^2 + y^2 = z^2");
        let b = hash_slot("x^2 + y^2 = z^2");
        assert_eq!(a, b);
        assert!(a < HASH_SLOTS);
        assert_ne!(expression_hash("a+b"), expression_hash("b+a"));
    }

    #[test]
    fn auto_path_uses_dir_prefix_and_slot() {
        let p = auto_output_path(Path::new("out"), "eq_", "a+b");
        assert_eq!(p, Path::new("out").join(format!("eq_{}.png", hash_slot("a+b"))));
    }

    #[test]
    fn distinct_expressions_can_share_a_slot() {
        // Pigeonhole: 10001 distinct inputs over 10000 slots must collide somewhere.
        let mut seen = std::collections::HashMap::new();
        let collision = (0..=HASH_SLOTS).find_map(|i| {
            let expr = format!("x_{{{i}}}");
            seen.insert(hash_slot(&expr), expr.clone())
                .map(|prev| (prev, expr))
        });
        let (a, b) = collision.expect("pigeonhole guarantees a collision");
        assert_ne!(a, b);
        assert_eq!(
            auto_output_path(Path::new("o"), "p", &a),
            auto_output_path(Path::new("o"), "p", &b)
        );
    }

    #[test]
    fn overwrite_keeps_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("equation_1.png");
        std::fs::write(&p, b"x").unwrap();
        assert_eq!(resolve_collision(p.clone(), CollisionPolicy::Overwrite), p);
    }

    #[test]
    fn suffix_picks_first_free_name() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("equation_1.png");
        assert_eq!(resolve_collision(p.clone(), CollisionPolicy::Suffix), p);

        std::fs::write(&p, b"x").unwrap();
        std::fs::write(dir.path().join("equation_1-1.png"), b"x").unwrap();
        assert_eq!(
            resolve_collision(p, CollisionPolicy::Suffix),
            dir.path().join("equation_1-2.png")
        );
    }
}
