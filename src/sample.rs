// 🎲 Sample data generator
// Seeded synthetic inputs for demos and smoke runs. Same seed, same rows.

use crate::records::{BenchmarkRecord, CompanyRecord};
use rand::prelude::*;

pub const DEFAULT_SEED: u64 = 42;

pub const INDUSTRIES: [&str; 10] = [
    "Technology",
    "Healthcare",
    "Financial Services",
    "Consumer Goods",
    "Energy",
    "Manufacturing",
    "Retail",
    "Telecommunications",
    "Real Estate",
    "Transportation",
];

/// (country, currency) pairs the default FX table covers
pub const COUNTRIES: [(&str, &str); 5] = [
    ("Germany", "EUR"),
    ("USA", "USD"),
    ("India", "INR"),
    ("UK", "GBP"),
    ("Brazil", "BRL"),
];

pub struct SampleGenerator {
    rng: StdRng,
    fiscal_year: i32,
}

impl SampleGenerator {
    pub fn new(seed: u64) -> Self {
        SampleGenerator {
            rng: StdRng::seed_from_u64(seed),
            fiscal_year: 2024,
        }
    }

    /// Private-market rows. Industries are drawn from the first
    /// `count` entries of `INDUSTRIES` (all of them once count ≥ 10).
    pub fn companies(&mut self, count: usize) -> Vec<CompanyRecord> {
        let industry_pool = &INDUSTRIES[..count.clamp(1, INDUSTRIES.len())];

        (0..count)
            .map(|i| {
                let industry = industry_pool[self.rng.gen_range(0..industry_pool.len())];
                let (country, currency) = COUNTRIES[self.rng.gen_range(0..COUNTRIES.len())];

                CompanyRecord::new(
                    &company_name(i),
                    industry,
                    country,
                    currency,
                    self.rng.gen_range(50.0..500.0),
                    self.rng.gen_range(10.0..100.0),
                    self.rng.gen_range(6.0..16.0),
                    self.fiscal_year,
                )
            })
            .collect()
    }

    /// One benchmark row per industry. Margins and growth are fractions.
    pub fn benchmarks(&mut self) -> Vec<BenchmarkRecord> {
        INDUSTRIES
            .iter()
            .map(|industry| {
                BenchmarkRecord::new(
                    industry,
                    self.rng.gen_range(0.15..0.40),
                    self.rng.gen_range(0.02..0.12),
                    self.rng.gen_range(7.0..14.0),
                    self.rng.gen_range(10.0..500.0),
                )
            })
            .collect()
    }
}

impl Default for SampleGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

/// Company_A … Company_Z, then Company_26, Company_27, …
fn company_name(index: usize) -> String {
    if index < 26 {
        format!("Company_{}", (b'A' + index as u8) as char)
    } else {
        format!("Company_{}", index)
    }
}

// ============================================================================
// TESTS
// ============================================================================
