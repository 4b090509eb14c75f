use alloy::primitives::{Address, U256};
use recipe_sandbox::cheatcodes::Cheatcodes;
use recipe_sandbox::error::{ForkError, HarnessError};
use recipe_sandbox::harness::{Fixture, MCD_CDP_OWNER};
use recipe_sandbox::utils::config::HarnessConfig;
use recipe_sandbox::utils::constants::ether;

const FORK_BLOCK: u64 = 14_368_070;

fn fixture() -> Fixture {
    Fixture::new(&HarnessConfig::mainnet()).expect("fixture")
}

#[test]
fn test_each_commit_mines_one_block() {
    let mut fixture = fixture();
    let sender = fixture.sender();
    assert_eq!(fixture.fork().block_number(), FORK_BLOCK);

    fixture.deposit_to_weth(sender, ether(1)).expect("deposit");
    assert_eq!(fixture.fork().block_number(), FORK_BLOCK + 1);

    assert!(fixture.withdraw_weth(sender, ether(5)).is_err());
    assert_eq!(fixture.fork().block_number(), FORK_BLOCK + 1);
}

#[test]
fn test_reset_restores_pinned_world() {
    let mut fixture = fixture();
    let sender = fixture.sender();
    let weth = fixture.weth();
    let pristine = fixture.fork().ledger().clone();

    fixture.deposit_to_weth(sender, ether(3)).expect("deposit");
    let proxy = fixture.proxy(sender).expect("proxy");
    fixture.set_balance(weth, Address::new([0x99; 20]), ether(7));
    let redeployed = fixture.fork_mut().redeploy("SumInputs").expect("redeploy");

    fixture.fork_mut().reset().expect("reset");
    assert_eq!(fixture.fork().ledger(), &pristine);
    assert_eq!(fixture.fork().block_number(), FORK_BLOCK);
    assert_eq!(fixture.fork().proxy_owner(proxy), None);
    assert_ne!(fixture.get_addr("SumInputs").expect("registered"), redeployed);
}

#[test]
fn test_reset_to_later_block_serves_latest_pin() {
    let mut fixture = fixture();
    fixture
        .fork_mut()
        .reset_to_block(FORK_BLOCK + 100)
        .expect("later block");
    assert_eq!(fixture.fork().block_number(), FORK_BLOCK + 100);
    assert_eq!(
        fixture.balance_of(fixture.native(), fixture.sender()),
        ether(10_000)
    );
}

#[test]
fn test_reset_before_archive_is_unavailable() {
    let mut fixture = fixture();
    let err = fixture
        .fork_mut()
        .reset_to_block(FORK_BLOCK - 1)
        .expect_err("nothing pinned earlier");
    assert_eq!(
        err,
        ForkError::BlockUnavailable {
            requested: FORK_BLOCK - 1,
            earliest: Some(FORK_BLOCK)
        }
    );
    assert_eq!(fixture.fork().block_number(), FORK_BLOCK);
}

#[test]
fn test_impersonation_grants_and_revokes_signing() {
    let mut fixture = fixture();
    let native = fixture.native();
    let sender = fixture.sender();
    fixture.set_balance(native, MCD_CDP_OWNER, ether(1));

    let err = fixture
        .send_ether(MCD_CDP_OWNER, sender, ether(1))
        .expect_err("no key");
    assert!(matches!(
        err,
        HarnessError::Fork(ForkError::CannotSign(who)) if who == MCD_CDP_OWNER
    ));

    fixture.impersonate(MCD_CDP_OWNER);
    fixture
        .send_ether(MCD_CDP_OWNER, sender, ether(1))
        .expect("impersonated");
    assert_eq!(fixture.balance_of(native, MCD_CDP_OWNER), U256::ZERO);

    fixture.stop_impersonating(MCD_CDP_OWNER);
    assert!(!fixture.fork().can_sign(MCD_CDP_OWNER));
}

#[test]
fn test_reset_drops_impersonation() {
    let mut fixture = fixture();
    fixture.impersonate(MCD_CDP_OWNER);
    fixture.fork_mut().reset().expect("reset");
    assert!(!fixture.fork().can_sign(MCD_CDP_OWNER));
}

#[test]
fn test_fork_block_from_config_is_honoured() {
    let mut config = HarnessConfig::mainnet();
    config.fork_block = FORK_BLOCK + 10;
    let fixture = Fixture::new(&config).expect("fixture");
    assert_eq!(fixture.fork().block_number(), FORK_BLOCK + 10);

    config.fork_block = FORK_BLOCK - 10;
    let fixture = Fixture::new(&config).expect("fixture pins at the configured block");
    assert_eq!(fixture.fork().block_number(), FORK_BLOCK - 10);
}
