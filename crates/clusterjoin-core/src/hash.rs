//! Stable hashing helpers for plans and manifests.

use blake3::Hasher;
use serde::Serialize;

use crate::cluster::ClusterPlan;
use crate::join::JoinSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{:02x}", b);
        }
        s
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    let mut h = Hasher::new();
    h.update(bytes);
    Hash256(h.finalize().into())
}

/// Hash any serde-serializable value deterministically (via JSON).
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256, crate::error::Error> {
    let bytes = serde_json::to_vec(v)?;
    Ok(hash_bytes(&bytes))
}

/// Digest identifying what a run computes: the join parameters and how the
/// inputs were clustered. Two runs with the same digest issue the same joins.
pub fn hash_plan(spec: &JoinSpec, plan: &ClusterPlan) -> Result<Hash256, crate::error::Error> {
    hash_serde(&(spec, plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::JoinType;

    #[test]
    fn plan_hash_tracks_inputs() {
        let spec = JoinSpec::new("id", JoinType::Inner);
        let a = hash_plan(&spec, &ClusterPlan::new(1000, 10, 10)).unwrap();
        let b = hash_plan(&spec, &ClusterPlan::new(1000, 10, 10)).unwrap();
        let c = hash_plan(&spec, &ClusterPlan::new(2, 10, 10)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_hex().len(), 64);
    }
}
