//! Application settings persistence.

use anyhow::Result;
use rebounce_models::AppSettings;
use redb::{Database, ReadableDatabase, TableDefinition};
use std::sync::Arc;

const SETTINGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");
const SETTINGS_KEY: &str = "app";

/// Settings storage
#[derive(Clone)]
pub struct SettingsStorage {
    db: Arc<Database>,
}

impl SettingsStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        // Create table
        let write_txn = db.begin_write()?;
        write_txn.open_table(SETTINGS_TABLE)?;
        write_txn.commit()?;

        let storage = Self { db };

        // Seed defaults on first run
        if storage.get()?.is_none() {
            storage.update(AppSettings::default())?;
        }

        Ok(storage)
    }

    pub fn get(&self) -> Result<Option<AppSettings>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTINGS_TABLE)?;

        if let Some(data) = table.get(SETTINGS_KEY)? {
            let settings: AppSettings = serde_json::from_slice(data.value())?;
            Ok(Some(settings))
        } else {
            Ok(None)
        }
    }

    /// Settings document with defaults applied when nothing is stored yet.
    pub fn load(&self) -> Result<AppSettings> {
        Ok(self.get()?.unwrap_or_default())
    }

    pub fn update(&self, settings: AppSettings) -> Result<()> {
        // Validate before saving
        settings.validate()?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SETTINGS_TABLE)?;
            let serialized = serde_json::to_vec(&settings)?;
            table.insert(SETTINGS_KEY, serialized.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Read-modify-write helper; returns the stored document.
    pub fn modify<F>(&self, mutate: F) -> Result<AppSettings>
    where
        F: FnOnce(&mut AppSettings),
    {
        let mut settings = self.load()?;
        mutate(&mut settings);
        self.update(settings.clone())?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebounce_models::Trigger;
    use tempfile::tempdir;

    fn setup_test_storage() -> (SettingsStorage, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        let storage = SettingsStorage::new(db).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_defaults_seeded_on_first_open() {
        let (storage, _temp_dir) = setup_test_storage();

        let settings = storage.get().unwrap();
        assert!(settings.is_some());

        let settings = settings.unwrap();
        assert_eq!(settings.dashboard.port, 6185);
        assert_eq!(settings.trigger, Trigger::None);
        assert!(!settings.restart_switch);
    }

    #[test]
    fn test_update_round_trip() {
        let (storage, _temp_dir) = setup_test_storage();

        let mut settings = AppSettings::default();
        settings.dashboard.port = 7000;
        settings.restart_switch = true;
        settings.trigger = Trigger::Cron {
            expression: "0 3 * * *".to_string(),
        };
        settings.timezone = "Asia/Shanghai".to_string();
        storage.update(settings.clone()).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_invalid_trigger_rejected() {
        let (storage, _temp_dir) = setup_test_storage();

        let before = storage.load().unwrap();
        let mut settings = before.clone();
        settings.trigger = Trigger::Cron {
            expression: "* *".to_string(),
        };

        assert!(storage.update(settings).is_err());
        // Stored document untouched by the rejected write.
        assert_eq!(storage.load().unwrap(), before);
    }

    #[test]
    fn test_modify_persists() {
        let (storage, _temp_dir) = setup_test_storage();

        let returned = storage
            .modify(|settings| settings.restart_switch = true)
            .unwrap();
        assert!(returned.restart_switch);
        assert!(storage.load().unwrap().restart_switch);
    }
}
