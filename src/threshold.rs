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

//! Proof-of-work difficulty threshold.

use crate::{error::Error, SharedSecret, SHARED_SECRET_SIZE};

/// Maximum permissible value, read as a big-endian integer, for every per-hop shared secret of a
/// winning attempt.
///
/// Note the inverse of the usual "difficulty" framing: a numerically smaller threshold demands
/// more leading zero bits of every derived secret and so is a harder puzzle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PowThreshold([u8; SHARED_SECRET_SIZE]);

impl PowThreshold {
	/// Construct from big-endian bytes. An all-zero threshold can never be satisfied and is
	/// rejected here, before any mining attempt is made.
	pub fn from_be_bytes(bytes: [u8; SHARED_SECRET_SIZE]) -> Result<Self, Error> {
		if bytes == [0; SHARED_SECRET_SIZE] {
			return Err(Error::DegenerateThreshold)
		}
		Ok(Self(bytes))
	}

	pub fn as_be_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
		&self.0
	}

	/// Does `kx_shared_secret`, read as a big-endian integer, pass the threshold check?
	pub fn accepts(&self, kx_shared_secret: &SharedSecret) -> bool {
		// Lexicographic order on big-endian bytes is integer order
		*kx_shared_secret <= self.0
	}

	/// Number of leading zero bits every passing shared secret is guaranteed to have.
	pub fn leading_zero_bits(&self) -> u32 {
		let mut bits = 0;
		for byte in self.0 {
			bits += byte.leading_zeros();
			if byte != 0 {
				break
			}
		}
		bits
	}

	/// Probability that a single uniformly distributed shared secret passes the threshold
	/// check, `T / 2^256`. Accurate to f64 rounding for any threshold.
	pub fn hop_probability(&self) -> f64 {
		// A 64-bit window starting at the first nonzero byte carries more precision than an
		// f64 mantissa can hold; everything below the window is negligible.
		let first = match self.0.iter().position(|byte| *byte != 0) {
			Some(first) => first,
			None => return 0.0,
		};
		let mut window = [0; 8];
		let len = (SHARED_SECRET_SIZE - first).min(8);
		window[..len].copy_from_slice(&self.0[first..first + len]);
		let exponent = -(64 + 8 * first as i32);
		u64::from_be_bytes(window) as f64 * 2f64.powi(exponent)
	}
}
