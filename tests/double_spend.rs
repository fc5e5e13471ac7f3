//! End-to-end protocol scenarios: mint, blind withdrawal, two merchant acceptances and
//! double-spend arbitration, exercised through the public API only.

use libtender::blind_signature::{blind, sign, unblind, BankKeyPair};
use libtender::coin::{Coin, RIS_LENGTH};
use libtender::detect::{detect_double_spend, DoubleSpendOutcome};
use libtender::spend::{spend, RngChallenge, Transcript};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The full owner-side withdrawal: blind the canonical string, have the bank sign it, unblind
/// and attach the result.
fn withdraw(coin: &mut Coin, keys: &BankKeyPair, rng: &mut StdRng) {
    let (blinded, factor) = blind(coin.canonical().as_bytes(), keys.public(), rng);
    let blinded_signature = sign(&blinded, keys);
    let signature = unblind(&blinded_signature, &factor, keys.public());
    assert!(libtender::blind_signature::verify(&signature, coin.canonical().as_bytes(), keys.public()));
    coin.attach_signature(signature);
}

fn spend_with_seed(coin: &Coin, keys: &BankKeyPair, seed: u64) -> Transcript {
    let mut challenges = RngChallenge::new(StdRng::seed_from_u64(seed));
    spend(coin, keys.public(), &mut challenges).expect("honest signed coin must be accepted")
}

#[test]
fn double_spender_is_identified_end_to_end() {
    init_logging();
    assert_eq!(RIS_LENGTH, 10);
    let mut rng = StdRng::seed_from_u64(0xa11ce);
    let keys = BankKeyPair::generate(256, &mut rng).unwrap();
    let mut coin = Coin::mint(b"alice", 20, &mut rng).unwrap();
    withdraw(&mut coin, &keys, &mut rng);

    let first = spend_with_seed(&coin, &keys, 1);
    // a fresh merchant with an independently seeded bit source; with probability 2^-10 a seed
    // mirrors every challenge of the first spend, so step past any such seed
    let second = (2u64..=64)
        .map(|seed| spend_with_seed(&coin, &keys, seed))
        .find(|t| t.disclosed() != first.disclosed())
        .expect("some seed must produce a differing transcript");

    let outcome = detect_double_spend(coin.guid(), &first, &second).unwrap();
    assert_eq!(outcome, DoubleSpendOutcome::OwnerCheater { identity: b"alice".to_vec() });
}

#[test]
fn honest_spends_never_abort_and_fill_the_transcript() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(42);
    let keys = BankKeyPair::generate(256, &mut rng).unwrap();
    let mut coin = Coin::mint(b"bob", 5, &mut rng).unwrap();
    withdraw(&mut coin, &keys, &mut rng);
    for seed in 0..50 {
        let transcript = spend_with_seed(&coin, &keys, seed);
        assert_eq!(transcript.len(), RIS_LENGTH);
        assert_eq!(transcript.guid(), coin.guid());
    }
}

#[test]
fn detection_rate_matches_the_security_parameter() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(0x57a7);
    let keys = BankKeyPair::generate(256, &mut rng).unwrap();
    let mut coin = Coin::mint(b"alice", 20, &mut rng).unwrap();
    withdraw(&mut coin, &keys, &mut rng);

    let trials = 1000u64;
    let mut recovered = 0u64;
    for trial in 0..trials {
        let first = spend_with_seed(&coin, &keys, 2 * trial);
        let second = spend_with_seed(&coin, &keys, 2 * trial + 1);
        match detect_double_spend(coin.guid(), &first, &second).unwrap() {
            DoubleSpendOutcome::OwnerCheater { identity } => {
                assert_eq!(identity, b"alice".to_vec());
                recovered += 1;
            }
            DoubleSpendOutcome::FalseClaim => {} // all ten challenge bits agreed, expected ~2^-10
            DoubleSpendOutcome::MerchantCheater => panic!("honest transcripts can never incriminate a merchant"),
        }
    }
    // expectation is (1 - 2^-10) * 1000 ≈ 999; anything below 990 is far outside chance
    assert!(recovered >= 990, "identity recovered in only {recovered} of {trials} trials");
}

#[test]
fn transcripts_survive_serialization_between_merchants() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(7);
    let keys = BankKeyPair::generate(256, &mut rng).unwrap();
    let mut coin = Coin::mint(b"carol", 100, &mut rng).unwrap();
    withdraw(&mut coin, &keys, &mut rng);

    let first = spend_with_seed(&coin, &keys, 10);
    let second = (11u64..=40)
        .map(|seed| spend_with_seed(&coin, &keys, seed))
        .find(|t| t.disclosed() != first.disclosed())
        .unwrap();

    // merchants ship their transcripts to the bank as ron
    let first: Transcript = ron::from_str(&ron::to_string(&first).unwrap()).unwrap();
    let second: Transcript = ron::from_str(&ron::to_string(&second).unwrap()).unwrap();
    let outcome = detect_double_spend(coin.guid(), &first, &second).unwrap();
    assert_eq!(outcome, DoubleSpendOutcome::OwnerCheater { identity: b"carol".to_vec() });
}
