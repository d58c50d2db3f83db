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

//! Key exchange and per-hop shared-secret derivation.

use crate::{error::Error, KxPublic, SharedSecret};
use blake2::{
	digest::{
		consts::U32,
		generic_array::{sequence::Concat, GenericArray},
		Mac,
	},
	Blake2bMac,
};
use curve25519_dalek::{
	constants::ED25519_BASEPOINT_TABLE,
	montgomery::MontgomeryPoint,
	scalar::{clamp_integer, Scalar},
	traits::IsIdentity,
};
use rand::{CryptoRng, Rng};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

const KX_BLINDING_FACTOR_PERSONAL: &[u8; 16] = b"sphinx-blind-fac";
const KX_SHARED_SECRET_PERSONAL: &[u8; 16] = b"sphinx-shared-sc";

/// Apply X25519 bit clamping to the given raw bytes to produce a scalar for use with Curve25519.
/// The clamped value is reduced to canonical form; the multiplications in the blinding chain
/// require canonical scalars.
pub fn clamp_scalar(scalar: [u8; 32]) -> Scalar {
	Scalar::from_bytes_mod_order(clamp_integer(scalar))
}

/// Generate a key-exchange secret key.
pub fn gen_kx_secret(rng: &mut (impl Rng + CryptoRng)) -> Scalar {
	let mut secret = [0; 32];
	rng.fill_bytes(&mut secret);
	clamp_scalar(secret)
}

/// Derive the public key corresponding to a secret key.
pub fn derive_kx_public(kx_secret: &Scalar) -> KxPublic {
	(ED25519_BASEPOINT_TABLE * kx_secret).to_montgomery().to_bytes()
}

fn derive_kx_blinding_factor(kx_public: &KxPublic, kx_shared_secret: &SharedSecret) -> Scalar {
	let kx_public: &GenericArray<_, _> = kx_public.into();
	let key = kx_public.concat((*kx_shared_secret).into());
	let h = Blake2bMac::<U32>::new_with_salt_and_personal(&key, b"", KX_BLINDING_FACTOR_PERSONAL)
		.expect("Key, salt, and personalisation sizes are fixed and small enough");
	clamp_scalar(h.finalize().into_bytes().into())
}

/// Apply the blinding factor for `kx_shared_secret` to `kx_secret`.
fn blind_kx_secret(kx_secret: &mut Scalar, kx_public: &KxPublic, kx_shared_secret: &SharedSecret) {
	*kx_secret *= derive_kx_blinding_factor(kx_public, kx_shared_secret);
}

/// Apply the blinding factor for `kx_shared_secret` to `kx_public`. This is the receiving hop's
/// view of the sender-side secret blinding: the ephemeral public key the next hop will see.
pub fn blind_kx_public(kx_public: &KxPublic, kx_shared_secret: &SharedSecret) -> KxPublic {
	(MontgomeryPoint(*kx_public) * derive_kx_blinding_factor(kx_public, kx_shared_secret))
		.to_bytes()
}

/// Perform key exchange between `kx_public` and `kx_secret` and hash the resulting point's
/// canonical encoding into a [`SharedSecret`]. Fails if `kx_public` or the exchange result is
/// the identity.
pub fn derive_kx_shared_secret(
	kx_public: &KxPublic,
	kx_secret: &Scalar,
) -> Result<SharedSecret, Error> {
	if MontgomeryPoint(*kx_public).is_identity() {
		return Err(Error::GroupOperation)
	}
	let point = MontgomeryPoint(*kx_public) * kx_secret;
	if point.is_identity() {
		return Err(Error::GroupOperation)
	}
	let h = Blake2bMac::<U32>::new_with_salt_and_personal(
		point.as_bytes(),
		b"",
		KX_SHARED_SECRET_PERSONAL,
	)
	.expect("Key, salt, and personalisation sizes are fixed and small enough");
	Ok(h.finalize().into_bytes().into())
}

/// Check a hop path before deriving against it: it must be non-empty and no hop key may be the
/// identity.
pub(crate) fn check_path(their_kx_publics: &[KxPublic]) -> Result<(), Error> {
	if their_kx_publics.is_empty() {
		return Err(Error::EmptyPath)
	}
	if their_kx_publics.iter().any(|kx_public| MontgomeryPoint(*kx_public).is_identity()) {
		return Err(Error::GroupOperation)
	}
	Ok(())
}

/// Derive the shared secret for every hop of `their_kx_publics`, in routing order.
///
/// The first hop's secret comes from a plain exchange with `kx_secret`. After each hop, a
/// blinding factor derived from that hop's shared secret and the ephemeral public key the hop
/// saw is multiplied into the running secret, so every hop performs its exchange against a
/// different effective key and no two hops can be linked through the ephemeral key. The
/// derivation is deterministic: the same secret and path always produce the same sequence.
///
/// Returns exactly one secret per hop, or an error and nothing. Duplicate hop keys within a
/// path are a caller error and are not checked for.
pub fn derive_shared_secrets(
	kx_secret: &Scalar,
	their_kx_publics: &[KxPublic],
) -> Result<Vec<SharedSecret>, Error> {
	check_path(their_kx_publics)?;
	if bool::from(kx_secret.ct_eq(&Scalar::ZERO)) {
		return Err(Error::InvalidScalar)
	}

	let mut kx_secret = Zeroizing::new(*kx_secret);
	let mut kx_public = derive_kx_public(&kx_secret);

	let mut kx_shared_secrets = Vec::with_capacity(their_kx_publics.len());
	for (i, their_kx_public) in their_kx_publics.iter().enumerate() {
		if i != 0 {
			if i != 1 {
				// An alternative would be to use blind_kx_public, but this is much cheaper
				kx_public = derive_kx_public(&kx_secret);
			}
			let kx_shared_secret = kx_shared_secrets.last().expect(
				"On at least second iteration of loop, shared secret pushed every iteration",
			);
			blind_kx_secret(&mut kx_secret, &kx_public, kx_shared_secret);
		}
		kx_shared_secrets.push(derive_kx_shared_secret(their_kx_public, &kx_secret)?);
	}
	Ok(kx_shared_secrets)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand_chacha::{rand_core::SeedableRng, ChaChaRng};

	fn gen_their_kx_secrets_and_publics(
		rng: &mut ChaChaRng,
		num_hops: usize,
	) -> (Vec<Scalar>, Vec<KxPublic>) {
		(0..num_hops)
			.map(|_i| {
				let secret = gen_kx_secret(rng);
				let public = derive_kx_public(&secret);
				(secret, public)
			})
			.unzip()
	}

	#[test]
	fn deterministic_derivation() {
		let mut rng = ChaChaRng::from_seed([7; 32]);
		let (_, their_kx_publics) = gen_their_kx_secrets_and_publics(&mut rng, 5);
		let kx_secret = gen_kx_secret(&mut rng);
		let first = derive_shared_secrets(&kx_secret, &their_kx_publics).unwrap();
		let second = derive_shared_secrets(&kx_secret, &their_kx_publics).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn one_secret_per_hop() {
		let mut rng = ChaChaRng::from_seed([8; 32]);
		for num_hops in 1..=20 {
			let (_, their_kx_publics) = gen_their_kx_secrets_and_publics(&mut rng, num_hops);
			let kx_secret = gen_kx_secret(&mut rng);
			let kx_shared_secrets = derive_shared_secrets(&kx_secret, &their_kx_publics).unwrap();
			assert_eq!(kx_shared_secrets.len(), num_hops);
		}
	}

	#[test]
	fn matches_per_hop_derivation() {
		let mut rng = ChaChaRng::from_seed([9; 32]);
		for num_hops in 1..=6 {
			let (their_kx_secrets, their_kx_publics) =
				gen_their_kx_secrets_and_publics(&mut rng, num_hops);
			let kx_secret = gen_kx_secret(&mut rng);
			let kx_shared_secrets = derive_shared_secrets(&kx_secret, &their_kx_publics).unwrap();

			// Walk the path as the hops themselves would, each seeing only the blinded public
			// key left behind by the previous hop
			let mut kx_public = derive_kx_public(&kx_secret);
			for (their_kx_secret, kx_shared_secret) in
				their_kx_secrets.iter().zip(&kx_shared_secrets)
			{
				let hop_secret = derive_kx_shared_secret(&kx_public, their_kx_secret).unwrap();
				assert_eq!(&hop_secret, kx_shared_secret);
				kx_public = blind_kx_public(&kx_public, &hop_secret);
			}
		}
	}

	#[test]
	fn secrets_differ_between_hops() {
		let mut rng = ChaChaRng::from_seed([10; 32]);
		let (_, their_kx_publics) = gen_their_kx_secrets_and_publics(&mut rng, 8);
		let kx_secret = gen_kx_secret(&mut rng);
		let kx_shared_secrets = derive_shared_secrets(&kx_secret, &their_kx_publics).unwrap();
		for (i, a) in kx_shared_secrets.iter().enumerate() {
			for b in kx_shared_secrets.iter().skip(i + 1) {
				assert_ne!(a, b);
			}
		}
	}

	#[test]
	fn zero_scalar_rejected() {
		let mut rng = ChaChaRng::from_seed([11; 32]);
		let (_, their_kx_publics) = gen_their_kx_secrets_and_publics(&mut rng, 3);
		assert_eq!(
			derive_shared_secrets(&Scalar::ZERO, &their_kx_publics),
			Err(Error::InvalidScalar)
		);
	}

	#[test]
	fn empty_path_rejected() {
		let mut rng = ChaChaRng::from_seed([12; 32]);
		let kx_secret = gen_kx_secret(&mut rng);
		assert_eq!(derive_shared_secrets(&kx_secret, &[]), Err(Error::EmptyPath));
	}

	#[test]
	fn identity_hop_key_rejected() {
		let mut rng = ChaChaRng::from_seed([13; 32]);
		let (_, mut their_kx_publics) = gen_their_kx_secrets_and_publics(&mut rng, 3);
		their_kx_publics[1] = [0; 32];
		let kx_secret = gen_kx_secret(&mut rng);
		assert_eq!(
			derive_shared_secrets(&kx_secret, &their_kx_publics),
			Err(Error::GroupOperation)
		);
	}
}
