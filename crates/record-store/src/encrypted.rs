//! Encrypted file-backed record store.

use crate::collections::Collections;
use crate::error::StoreError;
use crate::store::RecordStore;
use crate::types::{NewNft, NewOrganization, NewUser, Nft, Organization, User};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use async_trait::async_trait;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Domain separation label mixed into the key derivation.
const KEY_DERIVATION_LABEL: &str = "reputation-api/record-store";

/// Nonce size for AES-GCM (96 bits = 12 bytes).
const NONCE_SIZE: usize = 12;

/// Derive the 32-byte snapshot key from the configured secret.
fn derive_key(secret: &SecretString) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(KEY_DERIVATION_LABEL.as_bytes());
    hasher.update(secret.expose_secret().as_bytes());
    let hash = hasher.finalize();

    let mut key = [0u8; 32];
    key.copy_from_slice(&hash);
    key
}

/// Encrypt a snapshot. Output format: [12 bytes nonce][ciphertext with auth tag]
fn encrypt(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, StoreError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher.encrypt(nonce, plaintext)?;

    let mut data = nonce_bytes.to_vec();
    data.extend(ciphertext);
    Ok(data)
}

fn decrypt(key: &[u8; 32], data: &[u8]) -> Result<Vec<u8>, StoreError> {
    if data.len() < NONCE_SIZE {
        return Err(StoreError::Encryption("Snapshot too short".into()));
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);

    cipher.decrypt(nonce, &data[NONCE_SIZE..]).map_err(|_| {
        StoreError::Encryption(
            "Failed to decrypt snapshot. The secret may have changed.".to_string(),
        )
    })
}

/// Record store persisted as one AES-256-GCM encrypted JSON snapshot.
///
/// Records are served from memory. Every successful mutation rewrites the
/// snapshot before the change becomes visible; if the write fails the
/// mutation is discarded.
pub struct EncryptedFileStore {
    data: RwLock<Collections>,
    storage_path: PathBuf,
    key: [u8; 32],
}

impl EncryptedFileStore {
    /// Open the store at `storage_path`, loading the existing snapshot if any.
    pub async fn open(
        storage_path: impl Into<PathBuf>,
        secret: &SecretString,
    ) -> Result<Self, StoreError> {
        let storage_path = storage_path.into();
        let key = derive_key(secret);
        let collections = load_snapshot(&storage_path, &key).await?;

        info!(
            "Opened encrypted record store with {} users at {:?}",
            collections.user_count(),
            storage_path
        );

        Ok(Self {
            data: RwLock::new(collections),
            storage_path,
            key,
        })
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Apply `f` to a copy of the collections, persist it, then publish it.
    ///
    /// The write lock is held throughout, so mutations are serialized.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Collections) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut data = self.data.write().await;
        let mut next = data.clone();
        let out = f(&mut next)?;

        if let Err(e) = self.save(&next).await {
            error!(path = ?self.storage_path, "Failed to persist record store: {}", e);
            return Err(e);
        }

        *data = next;
        Ok(out)
    }

    async fn save(&self, collections: &Collections) -> Result<(), StoreError> {
        let plaintext = serde_json::to_vec(collections)?;
        let data = encrypt(&self.key, &plaintext)?;

        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write atomically using temp file + rename
        let temp_path = self.storage_path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.storage_path).await?;

        debug!(
            "Saved encrypted snapshot ({} bytes) to {:?}",
            data.len(),
            self.storage_path
        );
        Ok(())
    }
}

/// Load a snapshot. A missing file yields empty collections.
async fn load_snapshot(path: &Path, key: &[u8; 32]) -> Result<Collections, StoreError> {
    if !fs::try_exists(path).await? {
        info!("Snapshot not found at {:?}, starting with empty store", path);
        return Ok(Collections::new());
    }

    let data = fs::read(path).await?;
    let plaintext = decrypt(key, &data)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

#[async_trait]
impl RecordStore for EncryptedFileStore {
    fn backend(&self) -> &'static str {
        "encrypted-file"
    }

    async fn find_user_by_address(&self, address: &str) -> Result<Option<User>, StoreError> {
        Ok(self.data.read().await.user(address).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.mutate(|c| c.insert_user(user)).await
    }

    async fn find_all_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.data.read().await.users())
    }

    async fn count_users(&self) -> Result<usize, StoreError> {
        Ok(self.data.read().await.user_count())
    }

    async fn adjust_score(&self, address: &str, delta: i64) -> Result<User, StoreError> {
        self.mutate(|c| c.adjust_score(address, delta)).await
    }

    async fn insert_organization(
        &self,
        organization: NewOrganization,
    ) -> Result<Organization, StoreError> {
        self.mutate(|c| c.insert_organization(organization)).await
    }

    async fn find_organization(&self, id: &str) -> Result<Option<Organization>, StoreError> {
        Ok(self.data.read().await.organization(id).cloned())
    }

    async fn find_all_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        Ok(self.data.read().await.organizations())
    }

    async fn add_member(&self, id: &str, address: &str) -> Result<Organization, StoreError> {
        self.mutate(|c| c.add_member(id, address)).await
    }

    async fn insert_nft(&self, nft: NewNft) -> Result<Nft, StoreError> {
        self.mutate(|c| c.insert_nft(nft)).await
    }

    async fn find_nft(&self, id: &str) -> Result<Option<Nft>, StoreError> {
        Ok(self.data.read().await.nft(id).cloned())
    }

    async fn find_nfts_by_owner(&self, owner: &str) -> Result<Vec<Nft>, StoreError> {
        Ok(self.data.read().await.nfts_by_owner(owner))
    }

    async fn find_all_nfts(&self) -> Result<Vec<Nft>, StoreError> {
        Ok(self.data.read().await.nfts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn secret(value: &str) -> SecretString {
        SecretString::new(value.to_string())
    }

    #[test]
    fn test_encryption_round_trip() {
        let key = [0x42u8; 32];
        let data = b"Hello, World!";

        let encrypted = encrypt(&key, data).unwrap();
        assert_ne!(&encrypted[..], &data[..]);
        assert!(encrypted.len() > data.len()); // nonce + tag

        let decrypted = decrypt(&key, &encrypted).unwrap();
        assert_eq!(decrypted, data);
    }

    #[test]
    fn test_decryption_rejects_wrong_key_and_tampering() {
        let key = derive_key(&secret("one"));
        let other = derive_key(&secret("two"));
        assert_ne!(key, other);

        let mut encrypted = encrypt(&key, b"Sensitive information").unwrap();
        assert!(decrypt(&other, &encrypted).is_err());

        if let Some(byte) = encrypted.last_mut() {
            *byte ^= 0xFF;
        }
        assert!(decrypt(&key, &encrypted).is_err());
        assert!(decrypt(&key, &[0u8; 4]).is_err());
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = EncryptedFileStore::open(dir.path().join("records.enc"), &secret("s"))
            .await
            .unwrap();

        assert_eq!(store.count_users().await.unwrap(), 0);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("records.enc");

        {
            let store = EncryptedFileStore::open(&path, &secret("s")).await.unwrap();
            store
                .insert_user(NewUser::new("0x123", "TestUser"))
                .await
                .unwrap();
            store.adjust_score("0x123", 42).await.unwrap();
        }

        let raw = std::fs::read(&path).unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("TestUser"));

        let store = EncryptedFileStore::open(&path, &secret("s")).await.unwrap();
        let user = store.find_user_by_address("0x123").await.unwrap().unwrap();
        assert_eq!(user.username, "TestUser");
        assert_eq!(user.score, 42);
    }

    #[tokio::test]
    async fn test_wrong_secret_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.enc");

        let store = EncryptedFileStore::open(&path, &secret("right")).await.unwrap();
        store
            .insert_user(NewUser::new("0x1", "alice"))
            .await
            .unwrap();
        drop(store);

        let result = EncryptedFileStore::open(&path, &secret("wrong")).await;
        assert!(matches!(result, Err(StoreError::Encryption(_))));
    }

    #[tokio::test]
    async fn test_rejected_mutation_leaves_snapshot_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.enc");
        let store = EncryptedFileStore::open(&path, &secret("s")).await.unwrap();

        store
            .insert_user(NewUser::new("0x1", "alice"))
            .await
            .unwrap();
        let before = std::fs::read(&path).unwrap();

        let err = store
            .insert_user(NewUser::new("0x1", "mallory"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));

        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back_mutation() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        let path = data_dir.join("records.enc");
        let store = EncryptedFileStore::open(&path, &secret("s")).await.unwrap();

        store
            .insert_user(NewUser::new("0x1", "alice"))
            .await
            .unwrap();

        // A regular file where the snapshot directory should be makes every save fail
        std::fs::remove_dir_all(&data_dir).unwrap();
        std::fs::write(&data_dir, b"not a directory").unwrap();

        let err = store
            .insert_user(NewUser::new("0x2", "bob"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(store.count_users().await.unwrap(), 1);
        assert!(store.find_user_by_address("0x2").await.unwrap().is_none());

        let err = store.adjust_score("0x1", 5).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        let alice = store.find_user_by_address("0x1").await.unwrap().unwrap();
        assert_eq!(alice.score, 0);
    }
}
