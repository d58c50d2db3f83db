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

//! Proof-of-work gated key derivation for Sphinx circuit building.
//!
//! Building a circuit requires one shared secret per hop, derived by iterated key exchange with
//! per-hop blinding ([`derive_shared_secrets`]). Admission control gates circuit building behind
//! a puzzle: the sender must find an ephemeral key pair such that every per-hop shared secret,
//! read as a big-endian integer, falls at or below a difficulty threshold ([`PowThreshold`]).
//! [`mine`], [`mine_with`] and [`mine_parallel`] run that search. Every hop must pass
//! independently, so the expected cost is `(2^256 / T)^hops` and longer circuits are
//! proportionally more expensive to build; the [`estimate`] module has the exact model.
//!
//! Packet formats, onion encryption and routing are out of scope. The winning key pair and its
//! shared secrets are handed onward to the packet-construction layer, which can re-derive the
//! secrets from the key pair alone via [`derive_shared_secrets`].

mod crypto;
mod error;
mod kx_pair;
mod miner;
mod threshold;

pub mod estimate;

pub use crypto::{
	blind_kx_public, clamp_scalar, derive_kx_public, derive_kx_shared_secret,
	derive_shared_secrets, gen_kx_secret,
};
pub use error::Error;
pub use kx_pair::KxPair;
pub use miner::{mine, mine_parallel, mine_with, Solution, StopFlag};
pub use threshold::PowThreshold;

/// Size in bytes of a [`KxPublic`].
pub const KX_PUBLIC_SIZE: usize = 32;
/// Key-exchange public key; the canonical encoding of a group element. A hop path is a slice of
/// these, in routing order.
pub type KxPublic = [u8; KX_PUBLIC_SIZE];

/// Size in bytes of a [`SharedSecret`].
pub const SHARED_SECRET_SIZE: usize = 32;
/// Per-hop shared secret: the hash of the hop's key-exchange result.
pub type SharedSecret = [u8; SHARED_SECRET_SIZE];
