//! Fairness properties of the outcome engine and verifier

use fairflip::{
    errors::SequenceError,
    games::{
        seed::random_seed,
        sequence::SequenceRegistry,
        verify::{self, DIGEST_MISMATCH, OUTCOME_MISMATCH},
        CoinSide, FairOutcomeEngine, SeedCommitment,
    },
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const GOLDEN_DIGEST: &str = "2b1cf05b7055434ee54a65691e13dc8cf7f03984607f88b37320894076b99441";

/// Replace the character at `index` with a different hex digit
fn flip_char(s: &str, index: usize) -> String {
    s.char_indices()
        .map(|(i, c)| {
            if i != index {
                c
            } else if c == '0' {
                '1'
            } else {
                '0'
            }
        })
        .collect()
}

#[test]
fn test_golden_vector() {
    let commitment = SeedCommitment::from_parts("abc123de", "xyz789fg", 0).unwrap();
    assert_eq!(commitment.hash_input(), "abc123dexyz789fg0");

    let (digest, outcome) = FairOutcomeEngine::derive(&commitment);
    assert_eq!(digest, GOLDEN_DIGEST);
    assert_eq!(outcome, CoinSide::Tails);

    let verdict = verify::verify("abc123de", "xyz789fg", "0", GOLDEN_DIGEST, "TAILS");
    assert!(verdict.valid);

    let verdict = verify::verify("abc123de", "xyz789fg", "0", GOLDEN_DIGEST, "HEADS");
    assert!(!verdict.valid);
    assert_eq!(verdict.reason.as_deref(), Some(OUTCOME_MISMATCH));
}

#[test]
fn test_determinism() {
    let engine = FairOutcomeEngine::new().unwrap();

    for nonce in 0..50 {
        let server = random_seed();
        let player = random_seed();
        let a = engine.compute_outcome("m", SeedCommitment::from_parts(&*server, &*player, nonce).unwrap(), None);
        let b = engine.compute_outcome("m", SeedCommitment::from_parts(&*server, &*player, nonce).unwrap(), None);

        assert_eq!(a.digest, b.digest);
        assert_eq!(a.outcome, b.outcome);
    }
}

#[test]
fn test_verification_soundness() {
    let engine = FairOutcomeEngine::new().unwrap();

    for nonce in 0..200 {
        let record = engine.compute_outcome("m", SeedCommitment::generate(nonce), None);
        let verdict = verify::verify(
            &record.server_seed,
            &record.player_seed,
            &record.nonce.to_string(),
            &record.digest,
            record.outcome.as_str(),
        );
        assert!(verdict.valid, "record with nonce {} failed to verify", nonce);
    }
}

#[test]
fn test_single_character_tampering_is_detected() {
    let engine = FairOutcomeEngine::new().unwrap();
    let record = engine.compute_outcome("m", SeedCommitment::generate(1234), None);
    let nonce = record.nonce.to_string();
    let outcome = record.outcome.as_str();

    for i in 0..record.server_seed.len() {
        let tampered = flip_char(&record.server_seed, i);
        let verdict = verify::verify(&tampered, &record.player_seed, &nonce, &record.digest, outcome);
        assert!(!verdict.valid, "server seed change at {} went unnoticed", i);
        assert_eq!(verdict.reason.as_deref(), Some(DIGEST_MISMATCH));
    }

    for i in 0..record.player_seed.len() {
        let tampered = flip_char(&record.player_seed, i);
        let verdict = verify::verify(&record.server_seed, &tampered, &nonce, &record.digest, outcome);
        assert!(!verdict.valid, "player seed change at {} went unnoticed", i);
    }

    for i in 0..nonce.len() {
        let tampered = flip_char(&nonce, i);
        let verdict =
            verify::verify(&record.server_seed, &record.player_seed, &tampered, &record.digest, outcome);
        assert!(!verdict.valid, "nonce change at {} went unnoticed", i);
    }

    for i in 0..record.digest.len() {
        let tampered = flip_char(&record.digest, i);
        let verdict =
            verify::verify(&record.server_seed, &record.player_seed, &nonce, &tampered, outcome);
        assert!(!verdict.valid, "digest change at {} went unnoticed", i);
        assert_eq!(verdict.reason.as_deref(), Some(DIGEST_MISMATCH));
    }
}

#[test]
fn test_distribution_is_balanced() {
    const SAMPLES: u64 = 100_000;
    let mut rng = StdRng::seed_from_u64(0x5eed);

    let heads = (0..SAMPLES)
        .filter(|_| {
            let server = hex::encode(rng.gen::<[u8; 16]>());
            let player = hex::encode(rng.gen::<[u8; 16]>());
            let commitment = SeedCommitment::from_parts(server, player, 0).unwrap();
            FairOutcomeEngine::derive(&commitment).1 == CoinSide::Heads
        })
        .count() as u64;

    let lower = SAMPLES * 49 / 100;
    let upper = SAMPLES * 51 / 100;
    assert!(
        (lower..=upper).contains(&heads),
        "{} heads out of {} is outside 49%..51%",
        heads,
        SAMPLES
    );
}

#[test]
fn test_nonces_are_monotonic_and_never_reused() {
    let sequences = SequenceRegistry::new();
    let mut last = None;

    for _ in 0..20 {
        let nonce = sequences.begin("alice").unwrap();
        if let Some(last) = last {
            assert_eq!(nonce, last + 1);
        }
        sequences.finalize("alice", nonce).unwrap();
        last = Some(nonce);
    }

    let reused = last.unwrap();
    sequences.begin("alice").unwrap();
    assert_eq!(
        sequences.finalize("alice", reused).unwrap_err(),
        SequenceError::NonceReused { nonce: reused }
    );
}
