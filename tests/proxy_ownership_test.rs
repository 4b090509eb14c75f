use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use recipe_sandbox::actions::abi::IDSProxy;
use recipe_sandbox::actions::Action;
use recipe_sandbox::error::{ForkError, HarnessError, RevertReason};
use recipe_sandbox::harness::Fixture;
use recipe_sandbox::ledger::LedgerEvent;
use recipe_sandbox::utils::config::HarnessConfig;
use recipe_sandbox::utils::constants::ether;

fn setup() -> (Fixture, Address, Address, Address) {
    let mut fixture = Fixture::new(&HarnessConfig::mainnet()).expect("fixture");
    let owner = fixture.sender();
    let other = fixture.signer(1).expect("second signer");
    let proxy = fixture.proxy(owner).expect("proxy");
    (fixture, owner, other, proxy)
}

#[test]
fn test_change_owner_and_back() {
    let (mut fixture, owner, other, proxy) = setup();

    let receipt = fixture
        .executor()
        .change_owner(owner, proxy, other)
        .expect("hand over");
    assert_eq!(fixture.executor().owner(proxy), Some(other));
    assert!(receipt.events.contains(&LedgerEvent::OwnerChanged {
        proxy,
        previous: owner,
        new: other,
    }));

    fixture
        .executor()
        .change_owner(other, proxy, owner)
        .expect("hand back");
    assert_eq!(fixture.executor().owner(proxy), Some(owner));
}

#[test]
fn test_previous_owner_loses_access() {
    let (mut fixture, owner, other, proxy) = setup();
    fixture
        .executor()
        .change_owner(owner, proxy, other)
        .expect("hand over");

    let err = fixture
        .executor()
        .execute_action(owner, proxy, &Action::sum_inputs(ether(1), ether(1)))
        .expect_err("old owner");
    assert_eq!(
        err.revert_reason(),
        Some(&RevertReason::Unauthorized {
            caller: owner,
            owner: other
        })
    );
    assert_eq!(fixture.fork().proxy_of(owner), Some(proxy));
}

#[test]
fn test_non_owner_change_has_no_side_effects() {
    let (mut fixture, owner, other, proxy) = setup();
    let ledger_before = fixture.fork().ledger().clone();
    let block_before = fixture.fork().block_number();

    let err = fixture
        .executor()
        .change_owner(other, proxy, other)
        .expect_err("not the owner");
    assert!(matches!(
        err.revert_reason(),
        Some(RevertReason::Unauthorized { .. })
    ));
    assert_eq!(fixture.executor().owner(proxy), Some(owner));
    assert_eq!(fixture.fork().ledger(), &ledger_before);
    assert_eq!(fixture.fork().block_number(), block_before);
}

#[test]
fn test_zero_owner_is_rejected() {
    let (mut fixture, owner, _, proxy) = setup();
    let err = fixture
        .executor()
        .change_owner(owner, proxy, Address::ZERO)
        .expect_err("zero owner");
    assert!(matches!(
        err.revert_reason(),
        Some(RevertReason::InvalidParameter(_))
    ));

    // Hand-built payload bypasses the executor's early check.
    let data = Action::change_proxy_owner(Address::ZERO).encode_for_direct_call();
    let err = fixture
        .execute_action("ChangeProxyOwner", &data, proxy, owner)
        .expect_err("zero owner in calldata");
    assert!(matches!(
        err,
        HarnessError::Reverted {
            step: Some(0),
            reason: RevertReason::InvalidParameter(_)
        }
    ));
    assert_eq!(fixture.executor().owner(proxy), Some(owner));
}

#[test]
fn test_unknown_proxy_and_unknown_signer() {
    let (mut fixture, owner, _, _) = setup();
    let stranger_proxy = Address::new([0x5A; 20]);
    let err = fixture
        .executor()
        .execute_action(owner, stranger_proxy, &Action::sum_inputs(ether(1), ether(1)))
        .expect_err("not a proxy");
    assert_eq!(
        err.revert_reason(),
        Some(&RevertReason::UnknownTarget(stranger_proxy))
    );

    let outsider = Address::new([0x0F; 20]);
    let err = fixture
        .executor()
        .execute_action(outsider, stranger_proxy, &Action::sum_inputs(ether(1), ether(1)))
        .expect_err("cannot sign");
    assert!(matches!(err, HarnessError::Fork(ForkError::CannotSign(_))));
}

#[test]
fn test_submit_raw_proxy_call_with_value() {
    let (mut fixture, owner, _, proxy) = setup();
    let weth = fixture.weth();
    let (target, data) = Action::wrap_eth(U256::MAX)
        .encode_for_proxy_call(fixture.fork().registry())
        .expect("registered");
    let raw = IDSProxy::executeCall {
        _target: target,
        _data: data,
    }
    .abi_encode();

    fixture
        .executor()
        .submit(owner, proxy, &raw, ether(3))
        .expect("wrap everything sent");
    assert_eq!(fixture.balance_of(weth, proxy), ether(3));
}
