use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{CaptchaCode, CaptchaRepository, Result};

use super::MemoryStore;

#[async_trait]
impl CaptchaRepository for MemoryStore {
    async fn insert(&self, code: &str, secret_code: &str, time: DateTime<Utc>) -> Result<()> {
        let id = self.captcha_ids.next();
        self.captchas.insert(
            secret_code.to_string(),
            CaptchaCode { id, time, code: code.to_string(), secret_code: secret_code.to_string() },
        );
        Ok(())
    }

    async fn find_by_secret(&self, secret_code: &str) -> Result<Option<CaptchaCode>> {
        Ok(self.captchas.get(secret_code).map(|c| c.clone()))
    }

    async fn delete_by_secret(&self, secret_code: &str) -> Result<()> {
        self.captchas.remove(secret_code);
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut removed = 0;
        self.captchas.retain(|_, c| {
            let keep = c.time >= cutoff;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
