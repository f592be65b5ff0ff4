//! Conservation invariant tests.
//!
//! These tests verify the accounting identities that must hold for the
//! market to remain solvent under all operation sequences.

use lending_core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const GOV: AccountId = AccountId(0);
const USDC: AssetId = AssetId(0);
const WETH: AssetId = AssetId(1);

fn setup_market() -> Market {
    let mut market = Market::new(MarketParams::default(), GOV);
    market.register_asset(GOV, USDC, Tier::Stable, Amount::zero()).unwrap();
    market.register_asset(GOV, WETH, Tier::CrossA, Amount::zero()).unwrap();
    market.set_time(Timestamp::from_millis(1));
    market.set_price(USDC, Price::new_unchecked(dec!(1)));
    market.set_price(WETH, Price::new_unchecked(dec!(2000)));
    market
}

fn conservation_holds(market: &Market) -> bool {
    let vault = market.vault();
    vault.total_base() == vault.idle_balance().add(vault.total_borrow())
}

proptest! {
    /// total_base == idle_balance + total_borrow after any deposit/borrow/repay mix.
    #[test]
    fn base_conserved_through_borrow_cycles(
        deposits in proptest::collection::vec(1_000i64..100_000i64, 1..6),
        borrow_pct in 1i64..60i64,
    ) {
        let mut market = setup_market();

        for (i, &d) in deposits.iter().enumerate() {
            market.deposit_liquidity(
                AccountId(10 + i as u64),
                Amount::new_unchecked(Decimal::from(d)),
                Amount::zero(),
            ).unwrap();
            market.advance_time(1);
            prop_assert!(conservation_holds(&market));
        }

        let idle = market.vault().idle_balance();
        let draw = Amount::new_unchecked(idle.value() * Decimal::new(borrow_pct, 2));

        // collateral generous enough to cover any draw from these deposits
        let owner = AccountId(1);
        let id = market.open_position(owner, false).unwrap();
        market.advance_time(1);
        market.supply_collateral(owner, id, WETH, Amount::new_unchecked(dec!(10000))).unwrap();
        market.advance_time(1);
        market.borrow(owner, id, draw).unwrap();
        prop_assert!(conservation_holds(&market));

        market.advance_time(1);
        market.repay(owner, id, draw).unwrap();
        prop_assert!(conservation_holds(&market));
    }

    /// The booked borrower-interest counter never decreases.
    #[test]
    fn borrower_interest_monotone(
        intervals in proptest::collection::vec(1i64..MILLIS_PER_YEAR / 4, 1..8),
    ) {
        let mut market = setup_market();
        market.deposit_liquidity(AccountId(10), Amount::new_unchecked(dec!(100000)), Amount::zero()).unwrap();

        let owner = AccountId(1);
        let id = market.open_position(owner, false).unwrap();
        market.advance_time(1);
        market.supply_collateral(owner, id, WETH, Amount::new_unchecked(dec!(100))).unwrap();
        market.advance_time(1);
        market.borrow(owner, id, Amount::new_unchecked(dec!(50000))).unwrap();

        let mut last = market.vault().total_accrued_borrower_interest();
        for dt in intervals {
            market.advance_time(dt);
            market.accrue_interest(id).unwrap();
            let counter = market.vault().total_accrued_borrower_interest();
            prop_assert!(counter >= last);
            last = counter;
        }
    }

    /// Share price never falls from deposits, withdrawals, or repaid interest.
    #[test]
    fn share_price_never_decreases_without_losses(
        amounts in proptest::collection::vec(100i64..50_000i64, 2..8),
    ) {
        let mut market = setup_market();
        let owner = AccountId(1);

        market.deposit_liquidity(AccountId(10), Amount::new_unchecked(dec!(100000)), Amount::zero()).unwrap();
        let id = market.open_position(owner, false).unwrap();
        market.advance_time(1);
        market.supply_collateral(owner, id, WETH, Amount::new_unchecked(dec!(1000))).unwrap();

        let mut last_price = market.vault().share_price();
        for (i, &a) in amounts.iter().enumerate() {
            market.advance_time(1);
            // keep the oracle fresh across the long accrual gaps
            market.set_price(USDC, Price::new_unchecked(dec!(1)));
            market.set_price(WETH, Price::new_unchecked(dec!(2000)));
            let amount = Amount::new_unchecked(Decimal::from(a));
            if i % 2 == 0 {
                market.deposit_liquidity(AccountId(20 + i as u64), amount, Amount::zero()).unwrap();
            } else {
                market.borrow(owner, id, amount).unwrap();
                market.advance_time(MILLIS_PER_YEAR / 12);
                let owed = market
                    .ledger()
                    .debt_with_interest(id, market.position_borrow_rate(id).unwrap(), market.time())
                    .unwrap();
                market.repay(owner, id, owed).unwrap();
            }
            let price = market.vault().share_price();
            // share minting divides by the price, so allow division rounding
            // dust well below any economic significance
            let tolerance = Decimal::new(1, 20);
            prop_assert!(
                price >= last_price - tolerance,
                "share price fell: {} -> {}",
                last_price,
                price
            );
            last_price = price;
        }
    }

    /// Ledger TVL tracking mirrors the actual custody vault totals.
    #[test]
    fn tvl_mirrors_custody(
        supplies in proptest::collection::vec(1i64..1_000i64, 1..10),
    ) {
        let mut market = setup_market();

        let mut expected = Amount::zero();
        for (i, &s) in supplies.iter().enumerate() {
            let owner = AccountId(1 + i as u64);
            let id = market.open_position(owner, false).unwrap();
            market.advance_time(1);
            let amount = Amount::new_unchecked(Decimal::from(s));
            market.supply_collateral(owner, id, WETH, amount).unwrap();
            market.advance_time(1);
            expected = expected.add(amount);
        }

        let tracked = market.ledger().asset_tracking(WETH).unwrap().tvl_native;
        prop_assert_eq!(tracked, expected);
        prop_assert_eq!(market.ledger().vaults().total_of_asset(WETH), expected);
    }
}

#[test]
fn liquidation_loss_is_bounded_by_bonus() {
    // a liquidation at a discount can shave the share price, but never by
    // more than the bonus share of the closed debt
    let mut market = Market::new(MarketParams::default(), GOV);
    market.register_asset(GOV, USDC, Tier::Stable, Amount::zero()).unwrap();
    market.register_asset(GOV, WETH, Tier::CrossA, Amount::zero()).unwrap();
    market.set_time(Timestamp::from_millis(1));
    market.set_price(USDC, Price::new_unchecked(dec!(1)));
    market.set_price(WETH, Price::new_unchecked(dec!(2000)));

    market.deposit_liquidity(AccountId(10), Amount::new_unchecked(dec!(50000)), Amount::zero()).unwrap();
    market.stake_governance_tokens(AccountId(9), Amount::new_unchecked(dec!(500)));

    let owner = AccountId(1);
    let id = market.open_position(owner, false).unwrap();
    market.advance_time(1);
    market.supply_collateral(owner, id, WETH, Amount::new_unchecked(dec!(10))).unwrap();
    market.advance_time(1);
    market.borrow(owner, id, Amount::new_unchecked(dec!(15000))).unwrap();

    market.advance_time(1);
    market.set_price(WETH, Price::new_unchecked(dec!(1000)));

    let base_before = market.vault().total_base();
    let outcome = market
        .liquidate(AccountId(9), id, Amount::new_unchecked(dec!(14700)), Bps::new(200))
        .unwrap();
    let base_after = market.vault().total_base();

    let loss = base_before.saturating_sub(base_after);
    let bonus_value = outcome.debt_closed.value() * outcome.bonus;
    assert!(loss.value() <= bonus_value);
    assert!(conservation_holds(&market));
}
