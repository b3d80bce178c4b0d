//! End-to-end tests for the hashing primitive.

use crate::{hash, hash_batch, Ashmaize, Error, Params, MAX_DIGEST_LEN};

/// Smallest parameter set the validator accepts.
fn tiny() -> Params {
    Params {
        memory_cost_blocks: 8,
        time_cost: 1,
        lanes: 1,
        digest_length: 32,
    }
}

/// Small multi-lane, multi-pass set.
fn small_parallel() -> Params {
    Params {
        memory_cost_blocks: 64,
        time_cost: 2,
        lanes: 4,
        digest_length: 32,
    }
}

#[test]
fn test_basic_hash() {
    let digest = hash(b"test input data", b"salt", &tiny()).unwrap();
    assert_eq!(digest.len(), 32);

    let digest2 = hash(b"test input data", b"salt", &tiny()).unwrap();
    assert_eq!(digest, digest2);
}

#[test]
fn test_different_secrets_produce_different_digests() {
    let a = hash(b"secret 1", b"salt", &tiny()).unwrap();
    let b = hash(b"secret 2", b"salt", &tiny()).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_different_salts_produce_different_digests() {
    let a = hash(b"secret", b"salt 1", &tiny()).unwrap();
    let b = hash(b"secret", b"salt 2", &tiny()).unwrap();
    assert_ne!(a, b);
}

fn count_differing_bits(a: &[u8], b: &[u8]) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

#[test]
fn test_avalanche_on_secret() {
    // Changing one bit should change ~50% of output bits.
    let secret = b"avalanche test secret".to_vec();
    let base = hash(&secret, b"salt", &tiny()).unwrap();

    let mut flipped = secret.clone();
    flipped[0] ^= 1;
    let other = hash(&flipped, b"salt", &tiny()).unwrap();

    let diff = count_differing_bits(&base, &other);
    // Expect roughly 128 of 256 bits; allow 35%-65%.
    assert!(
        (90..=166).contains(&diff),
        "avalanche on secret: {} bits differ (expected ~128)",
        diff
    );
}

#[test]
fn test_avalanche_on_salt() {
    let base = hash(b"secret", b"avalanche salt", &tiny()).unwrap();
    let other = hash(b"secret", b"avalanche salu", &tiny()).unwrap();

    let diff = count_differing_bits(&base, &other);
    assert!(
        (90..=166).contains(&diff),
        "avalanche on salt: {} bits differ (expected ~128)",
        diff
    );
}

#[test]
fn test_digest_length_contract() {
    // Below, at and above the 32-byte compression width.
    for len in [1u32, 16, 31, 32, 33, 64, 100, 1024, MAX_DIGEST_LEN] {
        let params = Params {
            digest_length: len,
            ..tiny()
        };
        let digest = hash(b"secret", b"salt", &params).unwrap();
        assert_eq!(digest.len(), len as usize);
    }
}

#[test]
fn test_wide_digests_are_not_repetitions() {
    let params = Params {
        digest_length: 96,
        ..tiny()
    };
    let digest = hash(b"secret", b"salt", &params).unwrap();
    assert_ne!(digest[0..32], digest[32..64]);
    assert_ne!(digest[32..64], digest[64..96]);
}

#[test]
fn test_boundary_rejection() {
    let cases = [
        Params { lanes: 0, ..tiny() },
        Params {
            time_cost: 0,
            ..tiny()
        },
        Params {
            digest_length: 0,
            ..tiny()
        },
        Params {
            digest_length: MAX_DIGEST_LEN + 1,
            ..tiny()
        },
        // Fewer blocks than twice the lane count.
        Params {
            memory_cost_blocks: 6,
            lanes: 4,
            ..tiny()
        },
        Params {
            memory_cost_blocks: 0,
            ..tiny()
        },
    ];
    for params in cases {
        match hash(b"secret", b"salt", &params) {
            Err(Error::InvalidParameter { .. }) => {}
            other => panic!("expected InvalidParameter for {:?}, got {:?}", params, other),
        }
    }
}

#[test]
fn test_every_parameter_is_bound_into_the_digest() {
    let base = hash(b"secret", b"salt", &tiny()).unwrap();

    let more_time = Params {
        time_cost: 2,
        ..tiny()
    };
    assert_ne!(base, hash(b"secret", b"salt", &more_time).unwrap());

    let more_memory = Params {
        memory_cost_blocks: 16,
        ..tiny()
    };
    assert_ne!(base, hash(b"secret", b"salt", &more_memory).unwrap());

    let more_lanes = Params {
        memory_cost_blocks: 16,
        lanes: 2,
        ..tiny()
    };
    let fewer_lanes = Params {
        memory_cost_blocks: 16,
        lanes: 1,
        ..tiny()
    };
    assert_ne!(
        hash(b"secret", b"salt", &more_lanes).unwrap(),
        hash(b"secret", b"salt", &fewer_lanes).unwrap()
    );

    // A digest-length change re-keys the whole computation, so a shorter
    // digest is not a prefix of a longer one.
    let wide = Params {
        digest_length: 64,
        ..tiny()
    };
    assert_ne!(base[..], hash(b"secret", b"salt", &wide).unwrap()[..32]);
}

#[test]
fn test_multi_lane_determinism() {
    let a = hash(b"parallel secret", b"salt", &small_parallel()).unwrap();
    let b = hash(b"parallel secret", b"salt", &small_parallel()).unwrap();
    assert_eq!(a, b, "lane scheduling must not affect the digest");
}

#[test]
fn test_multi_pass_determinism() {
    let params = Params {
        time_cost: 3,
        ..small_parallel()
    };
    let a = hash(b"multi pass", b"salt", &params).unwrap();
    let b = hash(b"multi pass", b"salt", &params).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_engine_reuse_matches_fresh_engine() {
    let mut engine = Ashmaize::new(small_parallel()).unwrap();

    let first = engine.hash(b"first", b"salt").unwrap();
    let second = engine.hash(b"second", b"salt").unwrap();
    assert_ne!(first, second);

    // Reuse must not leak state between calls.
    assert_eq!(first, engine.hash(b"first", b"salt").unwrap());
    assert_eq!(first, hash(b"first", b"salt", &small_parallel()).unwrap());
}

#[test]
fn test_hash_batch_matches_individual_calls() {
    let secrets: [&[u8]; 3] = [b"alpha", b"beta", b"gamma"];
    let batch = hash_batch(&secrets, b"salt", &tiny()).unwrap();
    assert_eq!(batch.len(), 3);
    for (secret, digest) in secrets.iter().zip(&batch) {
        assert_eq!(digest, &hash(secret, b"salt", &tiny()).unwrap());
    }
}

#[test]
fn test_empty_secret_and_salt() {
    let digest = hash(b"", b"", &tiny()).unwrap();
    assert_eq!(digest.len(), 32);
    assert_eq!(digest, hash(b"", b"", &tiny()).unwrap());
}

#[test]
fn test_large_secret() {
    let secret = vec![0xABu8; 10_000];
    let digest = hash(&secret, b"salt", &tiny()).unwrap();
    assert_eq!(digest.len(), 32);
}

#[test]
fn test_scratch_buffer_is_wiped_after_hashing() {
    let params = tiny();
    let mut engine = Ashmaize::new(params).unwrap();
    engine.hash(b"sensitive material", b"salt").unwrap();
    let bytes = engine.memory_bytes();
    assert_eq!(
        bytes.len(),
        params.memory_cost_blocks as usize * 1024,
        "wiping must not shrink the scratch buffer"
    );
    assert!(
        bytes.iter().all(|&b| b == 0),
        "scratch buffer must hold only zeros after a call"
    );
}

/// Pins the smallest accepted parameter set to a recorded digest. The exact
/// bytes are a function of every internal constant, so any accidental change
/// to the seed encoding, the maze or the compression pipeline fails here.
/// The value was produced by an independent implementation of the same
/// construction built on the reference BLAKE3 C library.
#[test]
fn test_known_vector_stability() {
    let params = Params {
        memory_cost_blocks: 8,
        time_cost: 1,
        lanes: 1,
        digest_length: 32,
    };
    let digest = hash(b"ashmaize reference secret", b"ashmaize reference salt", &params).unwrap();
    assert_eq!(
        hex::encode(&digest),
        "546704b3d83f38df5440d1f753dddfd7a5e9c5fa395104149a167c84a4afcfc5"
    );
}

#[test]
#[ignore] // Run with: cargo test cost_scaling -- --ignored --nocapture
fn cost_scaling() {
    use std::time::Instant;

    fn time_of(params: &Params) -> std::time::Duration {
        // Warmup, then best-of-three to damp scheduler noise.
        let _ = hash(b"timing", b"salt", params).unwrap();
        (0..3)
            .map(|_| {
                let start = Instant::now();
                let _ = hash(b"timing", b"salt", params).unwrap();
                start.elapsed()
            })
            .min()
            .unwrap()
    }

    let base = Params {
        memory_cost_blocks: 4096, // 4 MiB
        time_cost: 1,
        lanes: 1,
        digest_length: 32,
    };
    let more_time = Params {
        time_cost: 4,
        ..base
    };
    let more_memory = Params {
        memory_cost_blocks: 16_384,
        ..base
    };

    let t_base = time_of(&base);
    let t_time = time_of(&more_time);
    let t_memory = time_of(&more_memory);

    println!("base:        {:?}", t_base);
    println!("4x passes:   {:?}", t_time);
    println!("4x memory:   {:?}", t_memory);

    assert!(t_time >= t_base, "more passes must not be cheaper");
    assert!(t_memory >= t_base, "more memory must not be cheaper");
}
