use alloy::primitives::{Address, U256};
use recipe_sandbox::actions::{Action, Param};
use recipe_sandbox::cheatcodes::Cheatcodes;
use recipe_sandbox::error::RevertReason;
use recipe_sandbox::harness::{
    Fixture, AAVE_OWNER, COMPOUND_OWNER, MCD_CDP_ID, MCD_CDP_OWNER,
};
use recipe_sandbox::ledger::{SubscriptionKey, SubscriptionProtocol};
use recipe_sandbox::recipe::Recipe;
use recipe_sandbox::utils::config::HarnessConfig;
use recipe_sandbox::utils::constants::ether;

fn setup() -> (Fixture, Address, Address) {
    let mut fixture = Fixture::new(&HarnessConfig::mainnet()).expect("fixture");
    let sender = fixture.sender();
    let proxy = fixture.proxy(sender).expect("proxy");
    (fixture, sender, proxy)
}

fn pull_recipe(name: &str, first: Action, weth: Address, sender: Address) -> Recipe {
    Recipe::new(
        name,
        vec![
            first,
            Action::pull_token(weth, sender, Param::<U256>::output(1).expect("in range")),
        ],
    )
}

#[test]
fn test_wrap_eth_direct_action() {
    let (mut fixture, sender, proxy) = setup();
    let weth = fixture.weth();
    let wrap_addr = fixture.get_addr("WrapEth").expect("registered");
    let data = Action::wrap_eth(ether(2)).encode_for_direct_call();

    let before = fixture.balance_of(weth, proxy);
    fixture
        .executor()
        .execute(sender, proxy, wrap_addr, &data, ether(2))
        .expect("wrap");
    assert_eq!(fixture.balance_of(weth, proxy), before + ether(2));
}

#[test]
fn test_unwrap_eth_direct_action_pays_sender() {
    let (mut fixture, sender, proxy) = setup();
    let weth = fixture.weth();
    let native = fixture.native();
    fixture.deposit_to_weth(sender, ether(2)).expect("deposit");
    fixture.send(sender, weth, proxy, ether(2)).expect("send");

    let before = fixture.balance_of(native, sender);
    let data = Action::unwrap_eth(ether(2), sender).encode_for_direct_call();
    fixture
        .execute_action("UnwrapEth", &data, proxy, sender)
        .expect("unwrap");
    assert!(fixture.balance_of(native, sender) > before);
    assert_eq!(fixture.balance_of(weth, proxy), U256::ZERO);
}

#[test]
fn test_wrap_then_unwrap_to_proxy_restores_native() {
    let (mut fixture, sender, proxy) = setup();
    let native = fixture.native();
    fixture.send_ether(sender, proxy, ether(2)).expect("fund proxy");
    let before = fixture.balance_of(native, proxy);

    let recipe = Recipe::new(
        "UnwrapRecipe",
        vec![Action::wrap_eth(ether(2)), Action::unwrap_eth(ether(2), proxy)],
    );
    fixture
        .executor()
        .execute_recipe(sender, proxy, &recipe)
        .expect("recipe");
    assert_eq!(fixture.balance_of(native, proxy), before);
}

#[test]
fn test_sum_inputs_feeds_pull() {
    let (mut fixture, sender, proxy) = setup();
    let weth = fixture.weth();
    fixture.set_balance(weth, proxy, U256::ZERO);
    fixture.deposit_to_weth(sender, ether(10)).expect("deposit");
    fixture.approve(sender, weth, proxy).expect("approve");

    let recipe = pull_recipe("TestSumInputs", Action::sum_inputs(ether(2), ether(7)), weth, sender);
    let functions_data = recipe.encode();
    fixture
        .execute_action("RecipeExecutor", &functions_data, proxy, sender)
        .expect("recipe");
    assert_eq!(fixture.balance_of(weth, proxy), ether(9));
    assert_eq!(fixture.balance_of(weth, sender), ether(1));
}

#[test]
fn test_sum_inputs_overflow_reverts_whole_recipe() {
    let (mut fixture, sender, proxy) = setup();
    let weth = fixture.weth();
    fixture.deposit_to_weth(sender, ether(10)).expect("deposit");
    fixture.approve(sender, weth, proxy).expect("approve");
    let block = fixture.fork().block_number();

    let recipe = pull_recipe("TestSumInputs", Action::sum_inputs(ether(1), U256::MAX), weth, sender);
    let err = fixture
        .executor()
        .execute_recipe(sender, proxy, &recipe)
        .expect_err("overflow");
    assert!(matches!(
        err.revert_reason(),
        Some(RevertReason::ArithmeticOverflow { .. })
    ));
    assert_eq!(fixture.balance_of(weth, proxy), U256::ZERO);
    assert_eq!(fixture.balance_of(weth, sender), ether(10));
    assert_eq!(fixture.fork().block_number(), block);
}

#[test]
fn test_sub_inputs_feeds_pull() {
    let (mut fixture, sender, proxy) = setup();
    let weth = fixture.weth();
    fixture.deposit_to_weth(sender, ether(10)).expect("deposit");
    fixture.approve(sender, weth, proxy).expect("approve");

    let recipe = pull_recipe("TestSubInputs", Action::sub_inputs(ether(9), ether(2)), weth, sender);
    fixture
        .executor()
        .execute_recipe(sender, proxy, &recipe)
        .expect("recipe");
    assert_eq!(fixture.balance_of(weth, proxy), ether(7));
}

#[test]
fn test_sub_inputs_underflow_reverts() {
    let (mut fixture, sender, proxy) = setup();
    let weth = fixture.weth();
    fixture.deposit_to_weth(sender, ether(10)).expect("deposit");
    fixture.approve(sender, weth, proxy).expect("approve");

    let recipe = pull_recipe("TestSubInputs", Action::sub_inputs(ether(1), ether(5)), weth, sender);
    let err = fixture
        .executor()
        .execute_recipe(sender, proxy, &recipe)
        .expect_err("underflow");
    assert!(matches!(
        err.revert_reason(),
        Some(RevertReason::ArithmeticUnderflow { .. })
    ));
    assert_eq!(fixture.balance_of(weth, proxy), U256::ZERO);
}

#[test]
fn test_send_token_exact_then_max() {
    let (mut fixture, sender, proxy) = setup();
    let weth = fixture.weth();
    let wrap_addr = fixture.get_addr("WrapEth").expect("registered");
    fixture
        .executor()
        .execute(
            sender,
            proxy,
            wrap_addr,
            &Action::wrap_eth(ether(4)).encode_for_direct_call(),
            ether(4),
        )
        .expect("wrap");

    let send = Action::send_token(weth, sender, ether(3)).encode_for_direct_call();
    fixture
        .execute_action("SendToken", &send, proxy, sender)
        .expect("send");
    assert_eq!(fixture.balance_of(weth, sender), ether(3));

    let send_all = Action::send_token(weth, sender, U256::MAX).encode_for_direct_call();
    fixture
        .execute_action("SendToken", &send_all, proxy, sender)
        .expect("send max");
    assert_eq!(fixture.balance_of(weth, sender), ether(4));
    assert_eq!(fixture.balance_of(weth, proxy), U256::ZERO);
}

#[test]
fn test_pull_token_exact_then_max() {
    let (mut fixture, sender, proxy) = setup();
    let weth = fixture.weth();
    fixture.deposit_to_weth(sender, ether(10)).expect("deposit");
    fixture.approve(sender, weth, proxy).expect("approve");

    let pull = Action::pull_token(weth, sender, ether(3)).encode_for_direct_call();
    fixture
        .execute_action("PullToken", &pull, proxy, sender)
        .expect("pull");
    assert_eq!(fixture.balance_of(weth, proxy), ether(3));

    let pull_all = Action::pull_token(weth, sender, U256::MAX).encode_for_direct_call();
    fixture
        .execute_action("PullToken", &pull_all, proxy, sender)
        .expect("pull max");
    assert_eq!(fixture.balance_of(weth, proxy), ether(10));
}

#[test]
fn test_pull_without_approval_reverts() {
    let (mut fixture, sender, proxy) = setup();
    let weth = fixture.weth();
    fixture.deposit_to_weth(sender, ether(10)).expect("deposit");

    let pull = Action::pull_token(weth, sender, ether(3)).encode_for_direct_call();
    let err = fixture
        .execute_action("PullToken", &pull, proxy, sender)
        .expect_err("no allowance");
    assert!(matches!(
        err.revert_reason(),
        Some(RevertReason::InsufficientAllowance { .. })
    ));
}

#[test]
fn test_automation_unsubscribe_each_protocol() {
    let mut fixture = Fixture::new(&HarnessConfig::mainnet()).expect("fixture");
    fixture
        .fork_mut()
        .reset_to_block(14_368_070)
        .expect("pinned block");
    assert_eq!(fixture.fork().block_number(), 14_368_070);
    fixture
        .fork_mut()
        .redeploy("AutomationV2Unsub")
        .expect("redeploy");

    for (owner, protocol) in [
        (MCD_CDP_OWNER, SubscriptionProtocol::Mcd),
        (COMPOUND_OWNER, SubscriptionProtocol::Compound),
        (AAVE_OWNER, SubscriptionProtocol::Aave),
    ] {
        let proxy = fixture.proxy(owner).expect("seeded proxy");
        let key = match protocol {
            SubscriptionProtocol::Mcd => SubscriptionKey::mcd(U256::from(MCD_CDP_ID)),
            SubscriptionProtocol::Compound => SubscriptionKey::compound(proxy),
            SubscriptionProtocol::Aave => SubscriptionKey::aave(proxy),
        };
        assert!(fixture.subscription(key).expect("seeded").subscribed);

        fixture.impersonate(owner);
        let unsub = Action::automation_v2_unsub(protocol, U256::from(MCD_CDP_ID));
        fixture
            .executor()
            .execute_action(owner, proxy, &unsub)
            .expect("unsubscribe");
        assert!(!fixture.subscription(key).expect("still tracked").subscribed);

        fixture
            .executor()
            .execute_action(owner, proxy, &unsub)
            .expect("second unsubscribe is a no-op");
        assert!(!fixture.subscription(key).expect("still tracked").subscribed);
        fixture.stop_impersonating(owner);
    }
}

#[test]
fn test_unsubscribe_foreign_cdp_is_unauthorized() {
    let (mut fixture, sender, proxy) = setup();
    let key = SubscriptionKey::mcd(U256::from(MCD_CDP_ID));
    let position = fixture.subscription(key).expect("seeded");
    let ledger_before = fixture.fork().ledger().clone();
    let block = fixture.fork().block_number();

    let unsub = Action::automation_v2_unsub(SubscriptionProtocol::Mcd, U256::from(MCD_CDP_ID));
    let err = fixture
        .executor()
        .execute_action(sender, proxy, &unsub)
        .expect_err("cdp belongs to another proxy");
    assert_eq!(
        err.revert_reason(),
        Some(&RevertReason::Unauthorized {
            caller: proxy,
            owner: position.proxy
        })
    );
    assert_eq!(fixture.subscription(key), Some(position));
    assert_eq!(fixture.fork().ledger(), &ledger_before);
    assert_eq!(fixture.fork().block_number(), block);
}

#[test]
fn test_unsubscribe_unknown_cdp_is_invalid() {
    let (mut fixture, sender, proxy) = setup();
    let unknown = SubscriptionKey::mcd(U256::from(MCD_CDP_ID + 1));
    let ledger_before = fixture.fork().ledger().clone();
    let block = fixture.fork().block_number();

    let unsub = Action::automation_v2_unsub(SubscriptionProtocol::Mcd, U256::from(MCD_CDP_ID + 1));
    let err = fixture
        .executor()
        .execute_action(sender, proxy, &unsub)
        .expect_err("no such position");
    assert!(matches!(
        err.revert_reason(),
        Some(RevertReason::InvalidParameter(_))
    ));
    assert_eq!(fixture.subscription(unknown), None);
    assert!(fixture
        .subscription(SubscriptionKey::mcd(U256::from(MCD_CDP_ID)))
        .expect("seeded")
        .subscribed);
    assert_eq!(fixture.fork().ledger(), &ledger_before);
    assert_eq!(fixture.fork().block_number(), block);
}

#[test]
fn test_pull_of_native_asset_reverts() {
    let (mut fixture, sender, proxy) = setup();
    let native = fixture.native();
    let before = fixture.balance_of(native, sender);

    let pull = Action::pull_token(native, sender, ether(1)).encode_for_direct_call();
    let err = fixture
        .execute_action("PullToken", &pull, proxy, sender)
        .expect_err("native asset moves as attached value");
    assert!(matches!(
        err.revert_reason(),
        Some(RevertReason::InvalidParameter(_))
    ));
    assert_eq!(fixture.balance_of(native, sender), before);
    assert_eq!(fixture.balance_of(native, proxy), U256::ZERO);
}

#[test]
fn test_unsubscribe_requires_impersonation() {
    let mut fixture = Fixture::new(&HarnessConfig::mainnet()).expect("fixture");
    let proxy = fixture.proxy(AAVE_OWNER).expect("seeded proxy");
    let unsub = Action::automation_v2_unsub(SubscriptionProtocol::Aave, U256::ZERO);
    let err = fixture
        .executor()
        .execute_action(AAVE_OWNER, proxy, &unsub)
        .expect_err("owner key unavailable");
    assert!(!err.is_revert());
    assert!(fixture
        .subscription(SubscriptionKey::aave(proxy))
        .expect("seeded")
        .subscribed);
}
