//! Replays the built-in action scenarios against a fresh fork and prints a JSON summary.
//!
//! Exit status is non-zero when any scenario misses its expectation.

use alloy::primitives::{Address, U256};
use anyhow::{bail, ensure, Context};
use recipe_sandbox::actions::{Action, Param};
use recipe_sandbox::cheatcodes::Cheatcodes;
use recipe_sandbox::error::RevertReason;
use recipe_sandbox::harness::{Fixture, AAVE_OWNER, COMPOUND_OWNER, MCD_CDP_ID, MCD_CDP_OWNER};
use recipe_sandbox::ledger::{SubscriptionKey, SubscriptionProtocol};
use recipe_sandbox::recipe::Recipe;
use recipe_sandbox::utils::config::HarnessConfig;
use recipe_sandbox::utils::constants::ether;
use recipe_sandbox::utils::env_guard;
use serde::Serialize;

type Scenario = fn(&HarnessConfig) -> anyhow::Result<String>;

const SCENARIOS: [(&str, Scenario); 10] = [
    ("wrap_eth_direct", wrap_eth_direct),
    ("unwrap_eth_recipe", unwrap_eth_recipe),
    ("sum_inputs_pull", sum_inputs_pull),
    ("sum_inputs_overflow", sum_inputs_overflow),
    ("sub_inputs_pull", sub_inputs_pull),
    ("sub_inputs_underflow", sub_inputs_underflow),
    ("send_token", send_token),
    ("pull_token", pull_token),
    ("change_owner", change_owner),
    ("automation_unsub", automation_unsub),
];

#[derive(Debug, Serialize)]
struct ScenarioReport {
    name: &'static str,
    passed: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct ReplaySummary {
    chain: String,
    chain_id: u64,
    fork_block: u64,
    passed: usize,
    failed: usize,
    scenarios: Vec<ScenarioReport>,
}

fn fixture_with_proxy(config: &HarnessConfig) -> anyhow::Result<(Fixture, Address, Address)> {
    let mut fixture = Fixture::new(config).context("building fixture")?;
    let sender = fixture.sender();
    let proxy = fixture.proxy(sender).context("building sender proxy")?;
    Ok((fixture, sender, proxy))
}

fn wrap_eth_direct(config: &HarnessConfig) -> anyhow::Result<String> {
    let (mut fixture, sender, proxy) = fixture_with_proxy(config)?;
    let weth = fixture.weth();
    let before = fixture.balance_of(weth, proxy);

    let (target, data) = Action::wrap_eth(ether(2)).encode_for_proxy_call(fixture.fork().registry())?;
    fixture
        .executor()
        .execute(sender, proxy, target, &data, ether(2))?;

    let after = fixture.balance_of(weth, proxy);
    ensure!(after == before + ether(2), "proxy WETH {before} -> {after}");
    Ok(format!("proxy WETH {before} -> {after}"))
}

fn unwrap_eth_recipe(config: &HarnessConfig) -> anyhow::Result<String> {
    let (mut fixture, sender, proxy) = fixture_with_proxy(config)?;
    let native = fixture.native();
    fixture.send_ether(sender, proxy, ether(2))?;
    let before = fixture.balance_of(native, sender);

    let recipe = Recipe::new(
        "UnwrapRecipe",
        vec![
            Action::wrap_eth(ether(2)),
            Action::unwrap_eth(ether(2), sender),
        ],
    );
    fixture.executor().execute_recipe(sender, proxy, &recipe)?;

    let after = fixture.balance_of(native, sender);
    ensure!(after == before + ether(2), "sender ETH {before} -> {after}");
    Ok(format!("sender ETH {before} -> {after}"))
}

fn recipe_then_pull(
    name: &str,
    first: Action,
    sender: Address,
    weth: Address,
) -> anyhow::Result<Recipe> {
    let pulled = Param::<U256>::output(1)?;
    Ok(Recipe::new(
        name,
        vec![first, Action::pull_token(weth, sender, pulled)],
    ))
}

fn pull_result(config: &HarnessConfig, name: &str, first: Action, expected: U256) -> anyhow::Result<String> {
    let (mut fixture, sender, proxy) = fixture_with_proxy(config)?;
    let weth = fixture.weth();
    fixture.deposit_to_weth(sender, ether(10))?;
    fixture.approve(sender, weth, proxy)?;

    let recipe = recipe_then_pull(name, first, sender, weth)?;
    fixture.executor().execute_recipe(sender, proxy, &recipe)?;

    let pulled = fixture.balance_of(weth, proxy);
    ensure!(pulled == expected, "proxy WETH {pulled}, expected {expected}");
    Ok(format!("proxy WETH {pulled}"))
}

fn expect_revert(
    config: &HarnessConfig,
    name: &str,
    first: Action,
    is_expected: fn(&RevertReason) -> bool,
) -> anyhow::Result<String> {
    let (mut fixture, sender, proxy) = fixture_with_proxy(config)?;
    let weth = fixture.weth();
    fixture.deposit_to_weth(sender, ether(10))?;
    fixture.approve(sender, weth, proxy)?;
    let ledger_before = fixture.fork().ledger().clone();

    let recipe = recipe_then_pull(name, first, sender, weth)?;
    let err = match fixture.executor().execute_recipe(sender, proxy, &recipe) {
        Ok(receipt) => bail!("recipe committed in block {}", receipt.block_number),
        Err(err) => err,
    };
    let reason = err
        .revert_reason()
        .with_context(|| format!("expected a revert, got {err}"))?;
    ensure!(is_expected(reason), "unexpected revert: {reason}");
    ensure!(
        fixture.fork().ledger() == &ledger_before,
        "reverted recipe changed the ledger"
    );
    Ok(format!("reverted: {reason}"))
}

fn sum_inputs_pull(config: &HarnessConfig) -> anyhow::Result<String> {
    pull_result(config, "TestSumInputs", Action::sum_inputs(ether(2), ether(7)), ether(9))
}

fn sum_inputs_overflow(config: &HarnessConfig) -> anyhow::Result<String> {
    expect_revert(
        config,
        "TestSumInputs",
        Action::sum_inputs(ether(1), U256::MAX),
        |reason| matches!(reason, RevertReason::ArithmeticOverflow { .. }),
    )
}

fn sub_inputs_pull(config: &HarnessConfig) -> anyhow::Result<String> {
    pull_result(config, "TestSubInputs", Action::sub_inputs(ether(9), ether(2)), ether(7))
}

fn sub_inputs_underflow(config: &HarnessConfig) -> anyhow::Result<String> {
    expect_revert(
        config,
        "TestSubInputs",
        Action::sub_inputs(ether(1), ether(5)),
        |reason| matches!(reason, RevertReason::ArithmeticUnderflow { .. }),
    )
}

fn send_token(config: &HarnessConfig) -> anyhow::Result<String> {
    let (mut fixture, sender, proxy) = fixture_with_proxy(config)?;
    let weth = fixture.weth();

    let (target, data) = Action::wrap_eth(ether(4)).encode_for_proxy_call(fixture.fork().registry())?;
    fixture
        .executor()
        .execute(sender, proxy, target, &data, ether(4))?;

    let send = Action::send_token(weth, sender, ether(3)).encode_for_direct_call();
    fixture.execute_action("SendToken", &send, proxy, sender)?;
    ensure!(fixture.balance_of(weth, sender) == ether(3), "partial send");

    let send_all = Action::send_token(weth, sender, U256::MAX).encode_for_direct_call();
    fixture.execute_action("SendToken", &send_all, proxy, sender)?;
    let received = fixture.balance_of(weth, sender);
    ensure!(received == ether(4), "sender WETH {received} after max send");
    Ok(format!("sender WETH {received}"))
}

fn pull_token(config: &HarnessConfig) -> anyhow::Result<String> {
    let (mut fixture, sender, proxy) = fixture_with_proxy(config)?;
    let weth = fixture.weth();
    fixture.deposit_to_weth(sender, ether(10))?;
    fixture.approve(sender, weth, proxy)?;

    let pull = Action::pull_token(weth, sender, ether(3)).encode_for_direct_call();
    fixture.execute_action("PullToken", &pull, proxy, sender)?;
    ensure!(fixture.balance_of(weth, proxy) == ether(3), "partial pull");

    let pull_all = Action::pull_token(weth, sender, U256::MAX).encode_for_direct_call();
    fixture.execute_action("PullToken", &pull_all, proxy, sender)?;
    let held = fixture.balance_of(weth, proxy);
    ensure!(held == ether(10), "proxy WETH {held} after max pull");
    Ok(format!("proxy WETH {held}"))
}

fn change_owner(config: &HarnessConfig) -> anyhow::Result<String> {
    let (mut fixture, sender, proxy) = fixture_with_proxy(config)?;
    let next = fixture
        .signer(1)
        .context("change_owner needs SIGNER_COUNT >= 2")?;

    fixture.executor().change_owner(sender, proxy, next)?;
    ensure!(fixture.executor().owner(proxy) == Some(next), "owner not handed over");

    fixture.executor().change_owner(next, proxy, sender)?;
    ensure!(fixture.executor().owner(proxy) == Some(sender), "owner not restored");
    Ok(format!("{proxy}: {sender} -> {next} -> {sender}"))
}

fn automation_unsub(config: &HarnessConfig) -> anyhow::Result<String> {
    let mut fixture = Fixture::new(config).context("building fixture")?;
    let block = config.chain.default_fork_block;
    fixture.fork_mut().reset_to_block(block)?;
    ensure!(fixture.fork().block_number() == block, "fork not at block {block}");
    fixture.fork_mut().redeploy("AutomationV2Unsub")?;

    let positions = [
        (MCD_CDP_OWNER, SubscriptionProtocol::Mcd),
        (COMPOUND_OWNER, SubscriptionProtocol::Compound),
        (AAVE_OWNER, SubscriptionProtocol::Aave),
    ];
    for (owner, protocol) in positions {
        let proxy = fixture.proxy(owner)?;
        let key = match protocol {
            SubscriptionProtocol::Mcd => SubscriptionKey::mcd(U256::from(MCD_CDP_ID)),
            SubscriptionProtocol::Compound => SubscriptionKey::compound(proxy),
            SubscriptionProtocol::Aave => SubscriptionKey::aave(proxy),
        };
        ensure!(
            fixture.subscription(key).is_some_and(|p| p.subscribed),
            "{} proxy {proxy} is not subscribed",
            protocol.as_str()
        );

        fixture.impersonate(owner);
        let unsub = Action::automation_v2_unsub(protocol, U256::from(MCD_CDP_ID));
        fixture.executor().execute_action(owner, proxy, &unsub)?;
        fixture.stop_impersonating(owner);

        ensure!(
            fixture.subscription(key).is_some_and(|p| !p.subscribed),
            "{} proxy {proxy} is still subscribed",
            protocol.as_str()
        );
    }
    Ok("mcd, compound and aave positions unsubscribed".to_string())
}

fn run_scenario(name: &'static str, scenario: Scenario, config: &HarnessConfig) -> ScenarioReport {
    match scenario(config) {
        Ok(detail) => {
            tracing::info!("[REPLAY] {} passed: {}", name, detail);
            ScenarioReport {
                name,
                passed: true,
                detail,
            }
        }
        Err(err) => {
            tracing::error!("[REPLAY] {} failed: {:#}", name, err);
            ScenarioReport {
                name,
                passed: false,
                detail: format!("{err:#}"),
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let applied = env_guard::load_dot_env();

    // Default to `info` when `RUST_LOG` is unset or invalid.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if applied > 0 {
        tracing::info!("[STARTUP] applied {} variables from .env", applied);
    }
    let config = HarnessConfig::load().context("loading harness configuration")?;
    tracing::info!(
        "[STARTUP] {} (chain {}) at block {}, {} signers",
        config.chain.name,
        config.chain.chain_id,
        config.fork_block,
        config.signer_count
    );

    let scenarios: Vec<ScenarioReport> = SCENARIOS
        .iter()
        .map(|(name, scenario)| run_scenario(*name, *scenario, &config))
        .collect();
    let passed = scenarios.iter().filter(|report| report.passed).count();
    let failed = scenarios.len() - passed;

    let summary = ReplaySummary {
        chain: config.chain.name.clone(),
        chain_id: config.chain.chain_id,
        fork_block: config.fork_block,
        passed,
        failed,
        scenarios,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if failed > 0 {
        bail!("{failed} of {} scenarios failed", summary.scenarios.len());
    }
    Ok(())
}
