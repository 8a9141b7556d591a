//! Signing account with an opaque credential.

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use thiserror::Error;

/// Error parsing a private key into an account.
#[derive(Debug, Error)]
#[error("invalid private key: {0}")]
pub struct InvalidKey(String);

/// A signing account: an address plus the credential that controls it.
///
/// The credential is held as an opaque signer capability. It is borrowed by
/// the executor for the duration of one signing operation, never serialized,
/// and never printed; `Debug` shows the address only.
#[derive(Clone)]
pub struct Account {
    address: Address,
    signer: PrivateKeySigner,
}

impl Account {
    /// Create an account from a hex private key, with or without the `0x`
    /// prefix.
    pub fn from_private_key(private_key: &str) -> Result<Self, InvalidKey> {
        let key_str = private_key.trim_start_matches("0x");
        let signer: PrivateKeySigner = key_str.parse().map_err(|_| {
            // The parse error is not forwarded: it can echo key material.
            InvalidKey("not a valid secp256k1 private key".to_string())
        })?;
        let address = signer.address();
        Ok(Self { address, signer })
    }

    /// The address controlled by this account.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Wallet view of the credential, scoped to a single signing call.
    pub(crate) fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (DO NOT USE IN PRODUCTION)
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_account_from_private_key() {
        let account = Account::from_private_key(TEST_KEY).unwrap();
        assert_eq!(
            format!("{:?}", account.address()).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );

        // The 0x prefix is optional
        let bare = Account::from_private_key(TEST_KEY.trim_start_matches("0x")).unwrap();
        assert_eq!(bare.address(), account.address());
    }

    #[test]
    fn test_account_debug_redacts_credential() {
        let account = Account::from_private_key(TEST_KEY).unwrap();
        let debug = format!("{account:?}");
        assert!(debug.contains("0x"));
        assert!(!debug.to_lowercase().contains(&TEST_KEY[2..10].to_lowercase()));
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(Account::from_private_key("0xnotakey").is_err());
        assert!(Account::from_private_key("").is_err());
    }
}
