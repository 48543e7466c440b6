use std::convert::TryFrom;

use ed25519_dalek::Verifier;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Hash, Eq, Default, Serialize, Deserialize)]
pub struct PublicKey {
    pub public_key: Vec<u8>,
}

impl PublicKey {
    pub fn new(key: Vec<u8>) -> Self {
        PublicKey { public_key: key }
    }

    pub fn key(&self) -> Vec<u8> {
        self.public_key.clone()
    }

    pub fn verify_ed(&self, msg: &[u8], sig: &[u8]) -> bool {
        if let Ok(key) = ed25519_dalek::PublicKey::from_bytes(&self.public_key) {
            if sig.len() != 64 {
                return false;
            }
            match ed25519_dalek::Signature::try_from(sig) {
                Ok(sig) => key.verify(msg, &sig).is_ok(),
                Err(_) => false,
            }
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Keypair, Signer};
    use rand::rngs::OsRng;

    #[test]
    fn ed25519_verify() {
        let kp = Keypair::generate(&mut OsRng);
        let msg = b"are these bytes signed?";
        let sig = kp.sign(msg);

        let pk = PublicKey::new(kp.public.to_bytes().to_vec());
        assert!(pk.verify_ed(msg, &sig.to_bytes()));
        assert!(!pk.verify_ed(b"other bytes", &sig.to_bytes()));
        assert!(!pk.verify_ed(msg, &[0u8; 64]));
    }
}
