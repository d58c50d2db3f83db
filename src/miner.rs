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

//! Proof-of-work search for circuit-build admission.
//!
//! An attempt generates a fresh ephemeral key pair and derives the shared secret for every hop
//! of the path; it wins iff every secret, read as a big-endian integer, falls at or below the
//! threshold. Requiring every hop to pass makes the expected cost grow exponentially with path
//! length, so building longer circuits costs proportionally more.

use crate::{
	crypto::{check_path, derive_shared_secrets},
	error::Error,
	kx_pair::KxPair,
	threshold::PowThreshold,
	KxPublic, SharedSecret,
};
use parking_lot::Mutex;
use rand::{CryptoRng, Rng};
use std::sync::atomic::{AtomicBool, Ordering};

const LOG_TARGET: &str = "sphinx-pow";

/// A winning attempt: the ephemeral key pair and the shared secrets it derived, one per hop in
/// routing order. Every secret satisfies the threshold the search was run with.
pub struct Solution {
	pub kx_pair: KxPair,
	pub kx_shared_secrets: Vec<SharedSecret>,
}

/// Shared found/cancelled flag. Raised by whichever worker finds a solution first, or by the
/// caller to abort an in-progress search; observed at attempt granularity.
#[derive(Default)]
pub struct StopFlag(AtomicBool);

impl StopFlag {
	pub fn new() -> Self {
		Self(AtomicBool::new(false))
	}

	pub fn stop(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	pub fn stopped(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

/// Search for an ephemeral key pair whose per-hop shared secrets all pass `threshold`, drawing
/// key pairs from `gen_pair`. Returns `Ok(None)` if `stop` is raised before a solution is
/// found.
///
/// Path errors are fatal and are reported before the first key pair is generated. A missed
/// threshold is not an error; the attempt is discarded in full and the search moves on.
pub fn mine_with(
	their_kx_publics: &[KxPublic],
	threshold: &PowThreshold,
	mut gen_pair: impl FnMut() -> KxPair,
	stop: &StopFlag,
) -> Result<Option<Solution>, Error> {
	check_path(their_kx_publics)?;
	let mut attempts: u64 = 0;
	while !stop.stopped() {
		attempts += 1;
		let kx_pair = gen_pair();
		let kx_shared_secrets = derive_shared_secrets(kx_pair.secret(), their_kx_publics)?;
		if kx_shared_secrets.iter().all(|kx_shared_secret| threshold.accepts(kx_shared_secret)) {
			log::debug!(target: LOG_TARGET, "Found solution after {attempts} attempts");
			return Ok(Some(Solution { kx_pair, kx_shared_secrets }))
		}
		log::trace!(target: LOG_TARGET, "Attempt {attempts} missed the threshold");
	}
	log::debug!(target: LOG_TARGET, "Search stopped after {attempts} attempts");
	Ok(None)
}

/// As [`mine_with`], generating ephemeral key pairs from `rng`. Runs until a solution is found;
/// never cancelled.
pub fn mine(
	rng: &mut (impl Rng + CryptoRng),
	their_kx_publics: &[KxPublic],
	threshold: &PowThreshold,
) -> Result<Solution, Error> {
	let stop = StopFlag::new();
	let solution = mine_with(their_kx_publics, threshold, || KxPair::gen(&mut *rng), &stop)?;
	Ok(solution.expect("Stop flag is never raised"))
}

/// Race `num_workers` independent searches for a single solution. Whichever worker finds one
/// first raises `stop`; attempts already in flight complete and are discarded. The caller may
/// also raise `stop` to abort, in which case `Ok(None)` is returned.
///
/// Attempts share no mutable state, so one worker per available core is a reasonable choice.
/// Any valid winner is acceptable; which worker's solution is returned is not specified.
pub fn mine_parallel(
	their_kx_publics: &[KxPublic],
	threshold: &PowThreshold,
	num_workers: usize,
	stop: &StopFlag,
) -> Result<Option<Solution>, Error> {
	check_path(their_kx_publics)?;
	let winner: Mutex<Option<Result<Solution, Error>>> = Mutex::new(None);
	std::thread::scope(|scope| {
		for _ in 0..num_workers.max(1) {
			scope.spawn(|| {
				let mut rng = rand::thread_rng();
				let result =
					mine_with(their_kx_publics, threshold, || KxPair::gen(&mut rng), stop);
				match result {
					Ok(None) => (),
					Ok(Some(solution)) => {
						stop.stop();
						let mut winner = winner.lock();
						if winner.is_none() {
							*winner = Some(Ok(solution));
						}
					},
					Err(err) => {
						// Malformed path; no point letting the other workers spin
						stop.stop();
						let mut winner = winner.lock();
						if winner.is_none() {
							*winner = Some(Err(err));
						}
					},
				}
			});
		}
	});
	winner.into_inner().transpose()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::{derive_kx_public, gen_kx_secret};
	use rand_chacha::{rand_core::SeedableRng, ChaChaRng};

	fn gen_path(rng: &mut ChaChaRng, num_hops: usize) -> Vec<KxPublic> {
		(0..num_hops).map(|_| derive_kx_public(&gen_kx_secret(rng))).collect()
	}

	fn accept_all_threshold() -> PowThreshold {
		PowThreshold::from_be_bytes([0xff; 32]).unwrap()
	}

	#[test]
	fn rejects_attempts_over_threshold() {
		let mut rng = ChaChaRng::from_seed([3; 32]);
		let their_kx_publics = gen_path(&mut rng, 1);
		let mut bytes = [0x01; 32];
		bytes[0] = 0x1f;
		let threshold = PowThreshold::from_be_bytes(bytes).unwrap();

		// Hand-craft an ephemeral key whose secret misses the threshold
		let losing_secret = loop {
			let kx_secret = gen_kx_secret(&mut rng);
			let kx_shared_secrets =
				derive_shared_secrets(&kx_secret, &their_kx_publics).unwrap();
			if !threshold.accepts(&kx_shared_secrets[0]) {
				break kx_secret
			}
		};

		// Feed the losing key first; the search must discard it and keep going
		let mut losing = Some(losing_secret);
		let stop = StopFlag::new();
		let solution = mine_with(
			&their_kx_publics,
			&threshold,
			|| match losing.take() {
				Some(kx_secret) => kx_secret.into(),
				None => KxPair::gen(&mut rng),
			},
			&stop,
		)
		.unwrap()
		.expect("Stop flag is never raised");

		assert!(losing.is_none(), "Losing key pair was never attempted");
		assert_ne!(solution.kx_pair.public(), &derive_kx_public(&losing_secret));
		assert!(solution.kx_shared_secrets.iter().all(|s| threshold.accepts(s)));
	}

	#[test]
	fn cancelled_before_start_mines_nothing() {
		let mut rng = ChaChaRng::from_seed([4; 32]);
		let their_kx_publics = gen_path(&mut rng, 2);
		let stop = StopFlag::new();
		stop.stop();
		let mut generated = false;
		let solution = mine_with(
			&their_kx_publics,
			&accept_all_threshold(),
			|| {
				generated = true;
				KxPair::gen(&mut rng)
			},
			&stop,
		)
		.unwrap();
		assert!(solution.is_none());
		assert!(!generated);
	}

	#[test]
	fn empty_path_fails_fast() {
		let mut rng = ChaChaRng::from_seed([5; 32]);
		assert!(matches!(
			mine(&mut rng, &[], &accept_all_threshold()),
			Err(Error::EmptyPath)
		));
	}

	#[test]
	fn identity_hop_key_fails_fast() {
		let mut rng = ChaChaRng::from_seed([6; 32]);
		let mut their_kx_publics = gen_path(&mut rng, 3);
		their_kx_publics[2] = [0; 32];
		assert!(matches!(
			mine(&mut rng, &their_kx_publics, &accept_all_threshold()),
			Err(Error::GroupOperation)
		));
	}

	#[test]
	fn solution_satisfies_every_hop() {
		let mut rng = ChaChaRng::from_seed([14; 32]);
		let their_kx_publics = gen_path(&mut rng, 3);
		let mut bytes = [0x01; 32];
		bytes[0] = 0x7f;
		let threshold = PowThreshold::from_be_bytes(bytes).unwrap();
		let solution = mine(&mut rng, &their_kx_publics, &threshold).unwrap();
		assert_eq!(solution.kx_shared_secrets.len(), 3);
		assert!(solution.kx_shared_secrets.iter().all(|s| threshold.accepts(s)));
		// The winning pair re-derives the same secrets
		assert_eq!(
			derive_shared_secrets(solution.kx_pair.secret(), &their_kx_publics).unwrap(),
			solution.kx_shared_secrets
		);
	}

	#[test]
	fn parallel_search_finds_valid_solution() {
		let mut rng = ChaChaRng::from_seed([15; 32]);
		let their_kx_publics = gen_path(&mut rng, 3);
		let mut bytes = [0x01; 32];
		bytes[0] = 0x3f;
		let threshold = PowThreshold::from_be_bytes(bytes).unwrap();
		let stop = StopFlag::new();
		let solution = mine_parallel(&their_kx_publics, &threshold, 4, &stop)
			.unwrap()
			.expect("Caller never cancels");
		assert!(stop.stopped());
		assert_eq!(solution.kx_shared_secrets.len(), 3);
		assert!(solution.kx_shared_secrets.iter().all(|s| threshold.accepts(s)));
	}

	#[test]
	fn parallel_search_cancelled_up_front() {
		let mut rng = ChaChaRng::from_seed([16; 32]);
		let their_kx_publics = gen_path(&mut rng, 2);
		let stop = StopFlag::new();
		stop.stop();
		let solution =
			mine_parallel(&their_kx_publics, &accept_all_threshold(), 2, &stop).unwrap();
		assert!(solution.is_none());
	}
}
