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

//! Error handling.

/// Fatal errors from key derivation and mining. A missed proof-of-work attempt is expected
/// control flow, not an error, and never appears here.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
	/// The ephemeral secret scalar is zero or otherwise outside the scalar field. Indicates a
	/// programming error upstream; never retried.
	#[error("Invalid ephemeral secret scalar")]
	InvalidScalar,
	/// A hop public key is the identity point, or key exchange with it degenerated to the
	/// identity. The path is corrupt; retrying could never produce a usable circuit.
	#[error("Bad hop public key or degenerate key exchange")]
	GroupOperation,
	/// An all-zero difficulty threshold can never be satisfied.
	#[error("Unsatisfiable all-zero difficulty threshold")]
	DegenerateThreshold,
	/// A path must have at least one hop.
	#[error("Empty hop path")]
	EmptyPath,
}
