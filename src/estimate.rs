// Copyright 2022 Parity Technologies (UK) Ltd.
//
// Permission is hereby granted, free of charge, to any person obtaining a
// copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
// OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! Cost model for the proof-of-work search.
//!
//! An attempt passes iff every hop's shared secret falls at or below the threshold. The hops of
//! an attempt are derived from a fresh independent ephemeral key, so the per-attempt success
//! probability is the per-hop probability raised to the number of hops, and observed try counts
//! are geometrically distributed. The functions here give the closed forms; [`TryStats`] and
//! [`geometric_chi_square`] check observed counts against them.

use crate::threshold::PowThreshold;

/// Probability that a single attempt satisfies `threshold` for every hop of a `num_hops` path,
/// `(T / 2^256)^num_hops`.
pub fn success_probability(threshold: &PowThreshold, num_hops: usize) -> f64 {
	threshold.hop_probability().powi(num_hops as i32)
}

/// Expected number of attempts before the search finds a solution, `(2^256 / T)^num_hops`.
pub fn expected_attempts(threshold: &PowThreshold, num_hops: usize) -> f64 {
	success_probability(threshold, num_hops).recip()
}

/// Number of attempts within which the search succeeds with probability at least `confidence`.
/// The geometric quantile; at least 1.
pub fn attempts_for_confidence(
	threshold: &PowThreshold,
	num_hops: usize,
	confidence: f64,
) -> u64 {
	let p = success_probability(threshold, num_hops);
	// Smallest n with 1 - (1-p)^n >= confidence
	((1.0 - confidence).ln() / (1.0 - p).ln()).ceil().max(1.0) as u64
}

/// Sample statistics over observed per-run try counts.
#[derive(Clone, Copy, Debug)]
pub struct TryStats {
	pub mean: f64,
	pub variance: f64,
}

impl TryStats {
	pub fn from_tries(tries: &[u64]) -> Self {
		debug_assert!(!tries.is_empty());
		let n = tries.len() as f64;
		let mean = tries.iter().sum::<u64>() as f64 / n;
		let variance = tries
			.iter()
			.map(|tries| {
				let d = *tries as f64 - mean;
				d * d
			})
			.sum::<f64>() /
			n;
		Self { mean, variance }
	}
}

/// Pearson chi-square statistic of observed try counts against the geometric distribution with
/// the given per-attempt success probability.
///
/// Counts are binned as 1, 2, .., `num_bins - 1` plus a single tail bin for everything at or
/// above `num_bins`; compare the statistic against a critical value for `num_bins - 1` degrees
/// of freedom.
pub fn geometric_chi_square(tries: &[u64], success_probability: f64, num_bins: usize) -> f64 {
	let p = success_probability;
	let n = tries.len() as f64;
	let mut statistic = 0.0;
	for bin in 1..=num_bins {
		let (expected, observed) = if bin == num_bins {
			// Tail: P(X >= bin) = (1-p)^(bin-1)
			(
				n * (1.0 - p).powi(bin as i32 - 1),
				tries.iter().filter(|tries| **tries >= bin as u64).count(),
			)
		} else {
			// P(X = bin) = p (1-p)^(bin-1)
			(
				n * p * (1.0 - p).powi(bin as i32 - 1),
				tries.iter().filter(|tries| **tries == bin as u64).count(),
			)
		};
		let d = observed as f64 - expected;
		statistic += d * d / expected;
	}
	statistic
}
