//! Search-level properties of the miner: determinism, first-match-wins,
//! exhaustiveness, and agreement between the miner, the verifier and the pool.

use std::collections::HashSet;

use hook_miner::{
    create2_address, keccak256, matches, mine_parallel, Address, Flag, FlagMask, Miner,
    MiningError, MiningRequest, Salt, ALL_FLAGS_MASK,
};
use rand::Rng;

fn test_request(target: u32, max_iterations: u64) -> MiningRequest {
    MiningRequest::new(
        Address::ZERO,
        keccak256(b"test"),
        FlagMask::from_bits_retain(target),
        max_iterations,
    )
}

#[test]
fn test_derive_is_deterministic() {
    let deployer: Address = "0x4e59b44847b379578588920ca78fbf26c0b4956c".parse().unwrap();
    let hash = keccak256(b"test");
    for n in [0u64, 1, 16_384, u64::MAX] {
        let salt = Salt::from(n);
        assert_eq!(
            create2_address(&deployer, &salt, &hash),
            create2_address(&deployer, &salt, &hash)
        );
    }
}

#[test]
fn test_distinct_salts_give_distinct_addresses() {
    let mut rng = rand::thread_rng();
    let hash = keccak256(b"test");
    let salts: HashSet<u64> = (0..2_000).map(|_| rng.gen()).collect();
    let addresses: HashSet<Address> = salts
        .iter()
        .map(|&n| create2_address(&Address::ZERO, &Salt::from(n), &hash))
        .collect();
    assert_eq!(addresses.len(), salts.len());
}

#[test]
fn test_lowest_flag_scenario_is_smallest_and_reproducible() {
    let request = test_request(0x0001, 100_000);
    let first = Miner::new().mine(&request);
    let second = Miner::new().mine(&request);
    assert_eq!(first, second);

    let hash = keccak256(b"test");
    let is_hit = |n: u64| {
        create2_address(&Address::ZERO, &Salt::from(n), &hash).low_u16() as u32 & ALL_FLAGS_MASK
            == 0x0001
    };

    match first {
        Ok(found) => {
            let k = found.index();
            assert!(k < 100_000);
            assert_eq!(found.salt, Salt::from(k));
            assert!(is_hit(k));
            assert!((0..k).all(|n| !is_hit(n)), "a smaller salt also matches");
        }
        Err(err) => {
            assert_eq!(err, MiningError::NotFound { iterations: 100_000 });
            assert!((0..100_000).all(|n| !is_hit(n)));
        }
    }
}

#[test]
fn test_larger_bound_keeps_the_answer() {
    let request = test_request(0x0040, 200_000);
    let Ok(found) = Miner::new().mine(&request) else {
        // Nothing to compare; exhaustiveness is covered elsewhere.
        return;
    };
    let k = found.index();

    for bound in [k + 1, k + 2, 200_000, 1_000_000] {
        let again = Miner::new().mine(&test_request(0x0040, bound)).unwrap();
        assert_eq!(again, found, "bound {}", bound);
    }

    // Stopping just short of the match exhausts the range instead.
    assert_eq!(
        Miner::new().mine(&test_request(0x0040, k)),
        Err(MiningError::NotFound { iterations: k })
    );
}

#[test]
fn test_result_always_verifies() {
    let mut rng = rand::thread_rng();
    for _ in 0..4 {
        let target = FlagMask::from_bits_retain(rng.gen_range(0..=ALL_FLAGS_MASK));
        let request = MiningRequest::new(Address::ZERO, keccak256(b"test"), target, 300_000);
        if let Ok(found) = Miner::new().mine(&request) {
            assert!(matches(&found.address, request.target));
            assert_eq!(FlagMask::extract(&found.address), target);
            assert_eq!(
                create2_address(&request.deployer, &found.salt, &request.init_code_hash),
                found.address
            );
        }
    }
}

#[test]
fn test_out_of_domain_target_is_rejected_up_front() {
    for bits in [0x3fff + 1, 0x8000, 0x1_0000, u32::MAX] {
        let request = test_request(bits, u64::MAX);
        let err = Miner::new().mine(&request).unwrap_err();
        assert_eq!(
            err,
            MiningError::InvalidMask {
                mask: FlagMask::from_bits_retain(bits)
            }
        );
        assert_eq!(err.iterations(), 0);
        assert_eq!(mine_parallel(4, request), Err(err));
    }
}

#[test]
fn test_zero_bound_is_not_found() {
    for target in [0, 1, ALL_FLAGS_MASK] {
        assert_eq!(
            Miner::new().mine(&test_request(target, 0)),
            Err(MiningError::NotFound { iterations: 0 })
        );
    }
}

#[test]
fn test_parallel_matches_sequential_for_named_flags() {
    let target = Flag::BeforeSwap | Flag::AfterSwap;
    let request = MiningRequest::new(Address::ZERO, keccak256(b"test"), target, 250_000);
    let sequential = Miner::new().mine(&request);
    assert_eq!(mine_parallel(4, request), sequential);
    assert_eq!(mine_parallel(7, request), sequential);
}
