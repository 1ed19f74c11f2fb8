/// One splitmix64 finalisation round, used to derive a follow-up seed from
/// the previous one.
pub fn splitmix64_mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_is_deterministic() {
        assert_eq!(splitmix64_mix(42), splitmix64_mix(42));
    }

    #[test]
    fn neighbouring_seeds_diverge() {
        let a = splitmix64_mix(1);
        let b = splitmix64_mix(2);
        assert_ne!(a, b);
        assert!((a ^ b).count_ones() > 8);
    }
}
