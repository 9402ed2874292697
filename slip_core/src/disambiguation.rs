// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Amount disambiguation
//!
//! Slips are matched to pending orders by exact amount. Adding a random
//! number of satang (1 to 99) to every new order keeps two orders created for
//! the same nominal amount apart.
//!
//! Collisions remain possible and are not detected: two pending orders
//! perturbed to the same amount resolve to the most recently created one.

use std::sync::{Mutex, PoisonError};

use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use rust_decimal::{Decimal, RoundingStrategy};

pub const MIN_CENTS: u8 = 1;
pub const MAX_CENTS: u8 = 99;

/// Supplies the number of satang added to an order amount.
pub trait CentSource: Send {
    /// Returns a value in `1..=99`. Out of range values are clamped.
    fn next_cents(&mut self) -> u8;
}

impl<F> CentSource for F
where
    F: FnMut() -> u8 + Send,
{
    fn next_cents(&mut self) -> u8 {
        self()
    }
}

/// Draws cents uniformly from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngCentSource<R>(R);

impl<R: RngCore> RngCentSource<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl RngCentSource<StdRng> {
    /// Deterministic source, for reproducible amounts.
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng() -> Self {
        Self(StdRng::from_os_rng())
    }
}

impl<R: RngCore + Send> CentSource for RngCentSource<R> {
    fn next_cents(&mut self) -> u8 {
        self.0.random_range(MIN_CENTS..=MAX_CENTS)
    }
}

/// Adds `cents / 100` to `base`, rounded to two decimals.
///
/// Returns `None` when the sum does not fit a [`Decimal`].
pub fn perturb_amount(base: Decimal, source: &mut dyn CentSource) -> Option<Decimal> {
    let cents = source.next_cents().clamp(MIN_CENTS, MAX_CENTS);
    base.checked_add(Decimal::new(i64::from(cents), 2))
        .map(|amount| amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Shares a [`CentSource`] between concurrent order creations.
pub struct Disambiguator {
    source: Mutex<Box<dyn CentSource>>,
}

impl Disambiguator {
    pub fn new(source: impl CentSource + 'static) -> Self {
        Self {
            source: Mutex::new(Box::new(source)),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::new(RngCentSource::from_seed(seed))
    }

    /// See [`perturb_amount`].
    pub fn perturb(&self, base: Decimal) -> Option<Decimal> {
        let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        perturb_amount(base, source.as_mut())
    }
}

impl Default for Disambiguator {
    fn default() -> Self {
        Self::new(RngCentSource::from_os_rng())
    }
}

impl std::fmt::Debug for Disambiguator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disambiguator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    fn d(amount: &str) -> Decimal {
        amount.parse().unwrap()
    }

    #[rstest]
    #[case::first_cent(1, "1500.50", "1500.51")]
    #[case::last_cent(99, "1500.50", "1501.49")]
    #[case::whole_base(37, "100", "100.37")]
    #[case::clamped_low(0, "100", "100.01")]
    #[case::clamped_high(250, "100", "100.99")]
    #[case::sub_cent_base(1, "10.005", "10.02")]
    fn adds_drawn_cents(#[case] cents: u8, #[case] base: &str, #[case] expected: &str) {
        let mut source = move || cents;
        let amount = perturb_amount(d(base), &mut source).unwrap();
        assert_eq!(amount, d(expected));
        assert_eq!(amount.scale(), 2);
    }

    #[rstest]
    #[case::max(Decimal::MAX)]
    fn overflowing_amount_is_refused(#[case] base: Decimal) {
        let mut source = || MAX_CENTS;
        assert_eq!(perturb_amount(base, &mut source), None);
        assert_eq!(Disambiguator::new(|| MAX_CENTS).perturb(base), None);
    }

    #[test]
    fn rng_source_stays_in_range() {
        let mut source = RngCentSource::from_seed(7);
        for _ in 0..1_000 {
            let cents = source.next_cents();
            assert!((MIN_CENTS..=MAX_CENTS).contains(&cents));
        }
    }

    #[test]
    fn seeded_disambiguators_agree() {
        let first = Disambiguator::from_seed(42);
        let second = Disambiguator::from_seed(42);
        for _ in 0..10 {
            assert_eq!(first.perturb(d("250")), second.perturb(d("250")));
        }
    }

    #[test]
    fn perturbed_amount_is_strictly_above_base() {
        let disambiguator = Disambiguator::default();
        let base = d("1500.50");
        for _ in 0..100 {
            let amount = disambiguator.perturb(base).unwrap();
            assert!(amount > base && amount < base + Decimal::ONE);
        }
    }
}
