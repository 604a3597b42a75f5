use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;

use crate::auth::repo::User;

const HEADER: [&str; 5] = ["full_name", "gender", "age", "username", "user_uuid"];

/// Append-only signup audit log. Denormalized copy of every registered user
/// (minus the password hash), one CSV row per signup. There is no transaction
/// spanning this file and the users table; a crash between the two writes
/// leaves them inconsistent.
pub struct AuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn append(&self, user: &User) -> anyhow::Result<()> {
        let _guard = self.lock.lock().expect("audit log lock poisoned");

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create audit log dir {}", dir.display()))?;
        }

        let existed = self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("open audit log {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if !existed {
            writer.write_record(HEADER).context("write audit header")?;
        }
        writer
            .write_record([
                user.full_name.as_str(),
                user.gender.as_str(),
                &user.age.to_string(),
                user.username.as_str(),
                user.user_uuid.as_str(),
            ])
            .context("write audit row")?;
        writer.flush().context("flush audit log")?;
        Ok(())
    }
}
