use chirpy_types::models::{Account, Post, RefreshToken};
use tracing::{info, warn};

use crate::DataStore;
use crate::error::{Result, StoreError};

/// Number of random bytes behind each refresh-token value (hex encoded on the wire).
pub const REFRESH_TOKEN_BYTES: usize = 10;

impl DataStore {
    // -- Posts --

    /// All posts, in ascending id order.
    pub fn list_posts(&self) -> Result<Vec<Post>> {
        Ok(self.load()?.posts.into_values().collect())
    }

    pub fn get_post(&self, id: u32) -> Result<Post> {
        self.load()?
            .posts
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("post", id))
    }

    /// Body validation is up to the caller.
    pub fn create_post(&self, body: &str) -> Result<Post> {
        let post = self.mutate(|doc| {
            let post = Post {
                id: doc
                    .next_post_id()
                    .ok_or(StoreError::IdExhausted { kind: "post" })?,
                body: body.to_string(),
            };
            doc.posts.insert(post.id, post.clone());
            Ok(post)
        })?;

        info!("Created post {}", post.id);
        Ok(post)
    }

    // -- Accounts --

    /// Insert a new account. Emails are not checked for uniqueness here.
    /// The returned record has its password hash cleared.
    pub fn create_account(&self, email: &str, password_hash: &[u8]) -> Result<Account> {
        let account = self.mutate(|doc| {
            let account = Account {
                id: doc
                    .next_account_id()
                    .ok_or(StoreError::IdExhausted { kind: "account" })?,
                email: email.to_string(),
                password_hash: password_hash.to_vec(),
                ..Default::default()
            };
            doc.accounts.insert(account.id, account.clone());
            Ok(account)
        })?;

        info!("Created account {}", account.id);
        Ok(account.redacted())
    }

    /// First account (in id order) with a matching email.
    pub fn find_account_by_email(&self, email: &str) -> Result<Account> {
        self.load()?
            .accounts
            .into_values()
            .find(|account| account.email == email)
            .ok_or_else(|| StoreError::not_found("account", email))
    }

    /// Soft lookup: a missing id yields `Account::default()` rather than an
    /// error. Check `is_zero()` before trusting the result.
    pub fn find_account_by_id(&self, id: u32) -> Result<Account> {
        Ok(self.load()?.accounts.remove(&id).unwrap_or_default())
    }

    /// Upsert `record` at `id`. Returns the stored record with its password
    /// hash cleared.
    pub fn update_account(&self, id: u32, record: Account) -> Result<Account> {
        let stored = self.mutate(|doc| {
            doc.accounts.insert(id, record.clone());
            Ok(record)
        })?;

        info!("Updated account {}", id);
        Ok(stored.redacted())
    }

    // -- Refresh tokens --

    /// Generate a random token value and record it for `account_id`.
    pub fn issue_refresh_token(&self, account_id: u32) -> Result<RefreshToken> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        self.entropy.fill(&mut bytes)?;
        self.store_refresh_token(&hex::encode(bytes), account_id)
    }

    /// Record `token` for `account_id` and point the account at it. The
    /// account back-reference is only set when the account exists.
    pub fn store_refresh_token(&self, token: &str, account_id: u32) -> Result<RefreshToken> {
        let expires_at = self
            .token_ttl
            .map(|ttl| {
                chrono::Utc::now()
                    .checked_add_signed(ttl)
                    .ok_or(StoreError::ExpiryOutOfRange { ttl })
            })
            .transpose()?;

        let refresh_token = self.mutate(|doc| {
            let refresh_token = RefreshToken {
                id: doc
                    .next_refresh_token_id()
                    .ok_or(StoreError::IdExhausted {
                        kind: "refresh token",
                    })?,
                account_id,
                token: token.to_string(),
                expires_at,
                is_valid: true,
            };
            doc.refresh_tokens
                .insert(refresh_token.id, refresh_token.clone());

            match doc.accounts.get_mut(&account_id) {
                Some(account) => account.refresh_token_id = Some(refresh_token.id),
                None => warn!(
                    "Refresh token {} issued for unknown account {}",
                    refresh_token.id, account_id
                ),
            }
            Ok(refresh_token)
        })?;

        info!(
            "Issued refresh token {} for account {}",
            refresh_token.id, account_id
        );
        Ok(refresh_token)
    }

    pub fn get_refresh_token(&self, id: u32) -> Result<RefreshToken> {
        self.load()?
            .refresh_tokens
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("refresh token", id))
    }

    /// Look a token up by its opaque value.
    pub fn find_refresh_token(&self, token: &str) -> Result<RefreshToken> {
        self.load()?
            .refresh_tokens
            .into_values()
            .find(|t| t.token == token)
            .ok_or_else(|| StoreError::not_found("refresh token", "<redacted>"))
    }

    /// Mark a token invalid and persist the change. Invalidating a token
    /// that is already invalid is a no-op and does not rewrite the file.
    pub fn invalidate_token(&self, id: u32) -> Result<RefreshToken> {
        self.mutate_if_changed(|doc| {
            let token = doc
                .refresh_tokens
                .get_mut(&id)
                .ok_or_else(|| StoreError::not_found("refresh token", id))?;

            if !token.is_valid {
                return Ok((token.clone(), false));
            }

            token.is_valid = false;
            info!("Invalidated refresh token {}", id);
            Ok((token.clone(), true))
        })
    }

    /// Invalidate the token the account currently points at.
    pub fn invalidate_all_tokens_for_account(&self, account_id: u32) -> Result<RefreshToken> {
        let account = self.find_account_by_id(account_id)?;
        if account.is_zero() {
            return Err(StoreError::not_found("account", account_id));
        }

        let token_id = account
            .refresh_token_id
            .ok_or_else(|| StoreError::not_found("refresh token for account", account_id))?;

        self.invalidate_token(token_id)
    }
}
