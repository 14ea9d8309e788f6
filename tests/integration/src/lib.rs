//! Shared fixtures for the behavioral test suite

use dollar_engine::{Address, InMemoryToken, Regulator, RegulatorParams, SettableOracle, TokenLedger};

pub fn pool_address() -> Address {
    Address::from_seed(1)
}

pub fn dao_address() -> Address {
    Address::from_seed(2)
}

pub fn user(seed: u8) -> Address {
    Address::from_seed(seed)
}

pub fn test_params() -> RegulatorParams {
    RegulatorParams {
        pool_address: pool_address(),
        dao_address: dao_address(),
        ..RegulatorParams::default()
    }
}

/// Engine with `bonded` supply committed to the reserve, all of it
/// held by the DAO address
pub fn bonded_engine(bonded: u64) -> Regulator<SettableOracle, InMemoryToken> {
    let mut token = InMemoryToken::new();
    let holder = user(100);
    token.mint(holder, bonded).unwrap();

    let mut engine = Regulator::new(SettableOracle::new(), token, test_params());
    engine.stage(holder, bonded).unwrap();
    engine.bond(bonded).unwrap();
    engine
}

/// Advance the engine through `n` neutral epochs (invalid reading)
pub fn advance_epochs(engine: &mut Regulator<SettableOracle, InMemoryToken>, n: u64) {
    engine.oracle_mut().set(0, 0, false);
    for _ in 0..n {
        engine.step().unwrap();
    }
}
