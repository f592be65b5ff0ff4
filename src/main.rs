//! Lending Market Core Simulation.
//!
//! Demonstrates the full market lifecycle including collateral supply,
//! borrowing against the credit limit, interest accrual, lender yield,
//! flash loans, and a liquidation after a price shock.

use lending_core::*;
use rust_decimal_macros::dec;

const GOV: AccountId = AccountId(0);
const USDC: AssetId = AssetId(0);
const WETH: AssetId = AssetId(1);
const SHIB: AssetId = AssetId(3);

fn main() {
    println!("Lending Market Core Engine Simulation");
    println!("Single Market, Per-Position Isolation, Full Lifecycle\n");

    scenario_1_supply_and_borrow();
    scenario_2_lender_yield();
    scenario_3_interest_accrual();
    scenario_4_liquidation();
    scenario_5_flash_loan();
    scenario_6_isolated_market();
    scenario_7_stress_test();

    println!("\nAll simulations completed successfully.");
}

fn new_market() -> Market {
    let mut market = Market::new(MarketParams::default(), GOV);
    market.register_asset(GOV, USDC, Tier::Stable, Amount::zero()).unwrap();
    market.register_asset(GOV, WETH, Tier::CrossA, Amount::zero()).unwrap();
    market
        .register_asset(GOV, SHIB, Tier::Isolated, Amount::new_unchecked(dec!(5000)))
        .unwrap();
    market.set_time(Timestamp::from_millis(1));
    market.set_price(USDC, Price::new_unchecked(dec!(1)));
    market.set_price(WETH, Price::new_unchecked(dec!(2000)));
    market.set_price(SHIB, Price::new_unchecked(dec!(0.01)));
    market
}

/// Open, supply, borrow, repay, close.
fn scenario_1_supply_and_borrow() {
    println!("Scenario 1: Supply and Borrow\n");

    let mut market = new_market();
    let lp = AccountId(1);
    let alice = AccountId(2);

    market.deposit_liquidity(lp, Amount::new_unchecked(dec!(50000)), Amount::zero()).unwrap();
    println!("  LP deposits $50,000 of liquidity");

    let id = market.open_position(alice, false).unwrap();
    market.advance_time(1);
    market
        .supply_collateral(alice, id, WETH, Amount::new_unchecked(dec!(10)))
        .unwrap();
    println!("  Alice supplies 10 WETH @ $2,000");

    market.advance_time(1);
    let result = market.borrow(alice, id, Amount::new_unchecked(dec!(12000))).unwrap();
    println!(
        "  Alice borrows $12,000 (limit ${}, rate {:.4})",
        result.credit_limit.value(),
        result.borrow_rate
    );

    market.advance_time(1);
    let owed = market
        .ledger()
        .debt_with_interest(id, market.position_borrow_rate(id).unwrap(), market.time())
        .unwrap();
    market.repay(alice, id, owed).unwrap();
    market.advance_time(1);
    let returned = market.close_position(alice, id).unwrap();
    println!("  Alice repays and closes, {} asset(s) returned\n", returned.len());
}

/// Lender deposits earn borrower interest through the share price.
fn scenario_2_lender_yield() {
    println!("Scenario 2: Lender Yield\n");

    let mut market = new_market();
    let lp = AccountId(1);
    let bob = AccountId(2);

    market.deposit_liquidity(lp, Amount::new_unchecked(dec!(10000)), Amount::zero()).unwrap();
    let id = market.open_position(bob, false).unwrap();
    market.advance_time(1);
    market
        .supply_collateral(bob, id, WETH, Amount::new_unchecked(dec!(10)))
        .unwrap();
    market.advance_time(1);
    market.borrow(bob, id, Amount::new_unchecked(dec!(8000))).unwrap();
    println!("  Bob borrows $8,000, utilization {:.2}", market.vault().utilization());

    // a year of interest
    market.advance_time(MILLIS_PER_YEAR);
    let owed = market
        .ledger()
        .debt_with_interest(id, market.position_borrow_rate(id).unwrap(), market.time())
        .unwrap();
    market.repay(bob, id, owed).unwrap();
    println!("  One year later Bob repays ${:.2}", owed.value());
    println!("  Share price now {:.6}\n", market.vault().share_price());
}

/// The two-bucket interest rule: accruals compound, the interval itself is simple.
fn scenario_3_interest_accrual() {
    println!("Scenario 3: Interest Accrual\n");

    let mut market = new_market();
    let lp = AccountId(1);
    let carol = AccountId(2);

    market.deposit_liquidity(lp, Amount::new_unchecked(dec!(100000)), Amount::zero()).unwrap();
    let id = market.open_position(carol, false).unwrap();
    market.advance_time(1);
    market
        .supply_collateral(carol, id, WETH, Amount::new_unchecked(dec!(10)))
        .unwrap();
    market.advance_time(1);
    market.borrow(carol, id, Amount::new_unchecked(dec!(1000))).unwrap();

    let rate = market.position_borrow_rate(id).unwrap();
    println!("  Carol borrows $1,000 at rate {:.4}", rate);

    market.advance_time(MILLIS_PER_YEAR / 2);
    let accrued = market.accrue_interest(id).unwrap();
    println!("  Mid-year accrual folds in ${:.4}", accrued.value());

    market.advance_time(MILLIS_PER_YEAR / 2);
    let owed = market
        .ledger()
        .debt_with_interest(id, market.position_borrow_rate(id).unwrap(), market.time())
        .unwrap();
    println!("  End-of-year debt: ${:.4}\n", owed.value());
}

/// Price shock pushes the health factor below one; a staked liquidator closes it.
fn scenario_4_liquidation() {
    println!("Scenario 4: Liquidation\n");

    let mut market = new_market();
    let lp = AccountId(1);
    let dave = AccountId(2);
    let liquidator = AccountId(3);

    market.stake_governance_tokens(liquidator, Amount::new_unchecked(dec!(500)));
    market.deposit_liquidity(lp, Amount::new_unchecked(dec!(50000)), Amount::zero()).unwrap();

    let id = market.open_position(dave, false).unwrap();
    market.advance_time(1);
    market
        .supply_collateral(dave, id, WETH, Amount::new_unchecked(dec!(10)))
        .unwrap();
    market.advance_time(1);
    market.borrow(dave, id, Amount::new_unchecked(dec!(15000))).unwrap();
    println!("  Dave borrows $15,000 against 10 WETH @ $2,000");

    // WETH halves: limit 10 * 1000 * 0.8 = 8000 < 15000 debt
    market.advance_time(1);
    market.set_price(WETH, Price::new_unchecked(dec!(1000)));
    println!("  WETH drops to $1,000, health: {:?}", market.position_health(id).unwrap());

    let outcome = market
        .liquidate(liquidator, id, Amount::new_unchecked(dec!(14700)), Bps::new(100))
        .unwrap();
    println!(
        "  Liquidated: debt ${} closed for ${} (bonus {:.4}), {} asset(s) seized\n",
        outcome.debt_closed.value(),
        outcome.cost_paid.value(),
        outcome.bonus,
        outcome.seized.len()
    );
}

/// Flash loan of the whole idle pool, repaid with the 9 bps fee.
fn scenario_5_flash_loan() {
    println!("Scenario 5: Flash Loan\n");

    let mut market = new_market();
    let lp = AccountId(1);
    market.deposit_liquidity(lp, Amount::new_unchecked(dec!(100000)), Amount::zero()).unwrap();

    market.advance_time(1);
    let fee = market
        .flash_loan(AccountId(9), Amount::new_unchecked(dec!(100000)), |borrowed| {
            borrowed.add(Amount::new_unchecked(dec!(90)))
        })
        .unwrap();
    println!("  Borrowed $100,000 for one call, fee ${}", fee.value());
    println!("  Share price after fee: {:.6}\n", market.vault().share_price());
}

/// Isolated-tier collateral with a protocol-wide debt cap.
fn scenario_6_isolated_market() {
    println!("Scenario 6: Isolated Market\n");

    let mut market = new_market();
    let lp = AccountId(1);
    let erin = AccountId(2);

    market.deposit_liquidity(lp, Amount::new_unchecked(dec!(50000)), Amount::zero()).unwrap();
    let id = market.open_position(erin, true).unwrap();
    market.advance_time(1);
    market
        .supply_collateral(erin, id, SHIB, Amount::new_unchecked(dec!(1500000)))
        .unwrap();
    println!("  Erin supplies 1,500,000 SHIB to an isolated position");

    market.advance_time(1);
    market.borrow(erin, id, Amount::new_unchecked(dec!(5000))).unwrap();
    println!("  Borrowed $5,000, exactly at the isolation debt cap");

    market.advance_time(1);
    let blocked = market.borrow(erin, id, Amount::new_unchecked(dec!(1)));
    println!("  Next dollar rejected: {}\n", blocked.unwrap_err());
}

/// Many positions churning without breaking conservation.
fn scenario_7_stress_test() {
    println!("Scenario 7: Stress Test\n");

    let mut market = new_market();
    let lp = AccountId(1);
    market.deposit_liquidity(lp, Amount::new_unchecked(dec!(1000000)), Amount::zero()).unwrap();

    let mut open = Vec::new();
    for i in 0..100u64 {
        let owner = AccountId(100 + i);
        let id = market.open_position(owner, false).unwrap();
        market.advance_time(1);
        market
            .supply_collateral(owner, id, WETH, Amount::new_unchecked(dec!(2)))
            .unwrap();
        market.advance_time(1);
        market.borrow(owner, id, Amount::new_unchecked(dec!(1000))).unwrap();
        market.advance_time(1);
        open.push((owner, id));
    }
    println!("  100 positions opened, utilization {:.4}", market.vault().utilization());

    for (owner, id) in open {
        let owed = market
            .ledger()
            .debt_with_interest(id, market.position_borrow_rate(id).unwrap(), market.time())
            .unwrap();
        market.repay(owner, id, owed).unwrap();
        market.advance_time(1);
        market.close_position(owner, id).unwrap();
        market.advance_time(1);
    }

    let vault = market.vault();
    println!(
        "  All closed. idle ${} + borrow ${} == base ${}",
        vault.idle_balance().value(),
        vault.total_borrow().value(),
        vault.total_base().value()
    );
    let report = market.perform_upkeep();
    println!("  Upkeep report: utilization {:.4}", report.utilization);
}
