//! Versioned schema upgrades.
//!
//! The registry is append-only: every entry targets a strictly greater
//! version than the one before it. On reopen the store runs the entries with
//! `stored < version <= running`, so a database is only ever moved forward
//! and an entry at or below the stored marker never runs again.

use rusqlite::{params, Connection};

use ragdb_core::{RagConfig, RagError, Result, SchemaVersion};

use crate::schema::SETTINGS_ROW_ID;

type StepFn = Box<dyn Fn(&Connection, &RagConfig) -> Result<()> + Send + Sync>;

/// One named unit of schema change. Must be safe to re-run.
pub struct UpgradeStep {
    name: &'static str,
    description: &'static str,
    apply: StepFn,
}

impl UpgradeStep {
    /// Create a step from a function.
    pub fn new<F>(name: &'static str, description: &'static str, apply: F) -> Self
    where
        F: Fn(&Connection, &RagConfig) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name,
            description,
            apply: Box::new(apply),
        }
    }

    /// Create a step that runs a batch of SQL.
    pub fn sql(name: &'static str, description: &'static str, sql: &'static str) -> Self {
        Self::new(name, description, move |conn, _| {
            conn.execute_batch(sql)
                .map_err(|e| RagError::database(e.to_string()))
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Human-readable description, reported when the step runs.
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Run the step against an open connection.
    pub fn apply(&self, conn: &Connection, config: &RagConfig) -> Result<()> {
        (self.apply)(conn, config)
    }
}

impl std::fmt::Debug for UpgradeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpgradeStep")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// The steps that bring a database up to one target version.
#[derive(Debug)]
pub struct Upgrade {
    version: SchemaVersion,
    steps: Vec<UpgradeStep>,
}

impl Upgrade {
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn steps(&self) -> &[UpgradeStep] {
        &self.steps
    }
}

/// Ordered, append-only table of upgrades.
#[derive(Debug, Default)]
pub struct UpgradeRegistry {
    upgrades: Vec<Upgrade>,
}

impl UpgradeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The upgrades shipped with this release.
    ///
    /// New entries go at the end.
    pub fn builtin() -> Self {
        Self {
            upgrades: vec![
                Upgrade {
                    version: SchemaVersion::new(0, 3, 4),
                    steps: vec![UpgradeStep::new(
                        "add_settings_table",
                        "Create settings table for storing current configuration",
                        add_settings_table,
                    )],
                },
                Upgrade {
                    version: SchemaVersion::new(0, 4, 0),
                    steps: vec![UpgradeStep::sql(
                        "add_documents_uri_index",
                        "Create index on documents(uri) for lookups by origin",
                        "CREATE INDEX IF NOT EXISTS idx_documents_uri ON documents(uri);",
                    )],
                },
            ],
        }
    }

    /// Append an upgrade. `version` must be greater than every registered one.
    pub fn register(&mut self, version: SchemaVersion, steps: Vec<UpgradeStep>) -> Result<&mut Self> {
        if let Some(last) = self.upgrades.last() {
            if version <= last.version {
                return Err(RagError::invalid_argument(format!(
                    "upgrade {} registered after {}; versions must be strictly ascending",
                    version, last.version
                )));
            }
        }

        self.upgrades.push(Upgrade { version, steps });
        Ok(self)
    }

    /// Upgrades with `stored < version <= running`, in ascending order.
    pub fn pending(
        &self,
        stored: SchemaVersion,
        running: SchemaVersion,
    ) -> impl Iterator<Item = &Upgrade> {
        self.upgrades
            .iter()
            .filter(move |u| u.version > stored && u.version <= running)
    }

    /// Every registered upgrade.
    pub fn upgrades(&self) -> &[Upgrade] {
        &self.upgrades
    }
}

/// 0.3.4: settings snapshot table, seeded with the active configuration.
fn add_settings_table(conn: &Connection, config: &RagConfig) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            id INTEGER PRIMARY KEY DEFAULT 1,
            settings TEXT NOT NULL DEFAULT '{}'
        );
        "#,
    )
    .map_err(|e| RagError::database(e.to_string()))?;

    let settings_json = serde_json::to_string(config)?;
    conn.execute(
        "INSERT OR IGNORE INTO settings (id, settings) VALUES (?1, ?2)",
        params![SETTINGS_ROW_ID, settings_json],
    )
    .map_err(|e| RagError::database(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SchemaVersion {
        s.parse().unwrap()
    }

    fn noop(name: &'static str) -> UpgradeStep {
        UpgradeStep::new(name, name, |_, _| Ok(()))
    }

    fn registry(versions: &[&str]) -> UpgradeRegistry {
        let mut registry = UpgradeRegistry::new();
        for version in versions {
            registry.register(v(version), vec![noop("step")]).unwrap();
        }
        registry
    }

    fn pending_versions(registry: &UpgradeRegistry, stored: &str, running: &str) -> Vec<String> {
        registry
            .pending(v(stored), v(running))
            .map(|u| u.version().to_string())
            .collect()
    }

    #[test]
    fn test_register_requires_ascending_versions() {
        let mut registry = UpgradeRegistry::new();
        registry.register(v("0.2.0"), vec![noop("a")]).unwrap();
        registry.register(v("0.3.0"), vec![noop("b")]).unwrap();

        assert!(registry.register(v("0.3.0"), vec![noop("dup")]).is_err());
        assert!(registry.register(v("0.1.0"), vec![noop("old")]).is_err());
        assert_eq!(registry.upgrades().len(), 2);
    }

    #[test]
    fn test_pending_is_bounded_on_both_sides() {
        let registry = registry(&["0.2.0", "0.3.4", "0.5.0", "1.0.0"]);

        assert_eq!(pending_versions(&registry, "0.3.0", "0.5.0"), vec!["0.3.4", "0.5.0"]);
        assert_eq!(
            pending_versions(&registry, "0.0.0", "9.9.9"),
            vec!["0.2.0", "0.3.4", "0.5.0", "1.0.0"]
        );
    }

    #[test]
    fn test_applied_versions_are_not_pending() {
        let registry = registry(&["0.3.4"]);
        assert!(pending_versions(&registry, "0.3.4", "0.4.0").is_empty());
        assert!(pending_versions(&registry, "0.4.0", "0.4.0").is_empty());
    }

    #[test]
    fn test_older_binary_runs_nothing() {
        let registry = registry(&["0.3.4", "0.5.0"]);
        assert!(pending_versions(&registry, "0.5.0", "0.3.0").is_empty());
    }

    #[test]
    fn test_builtin_registry() {
        let registry = UpgradeRegistry::builtin();
        let versions: Vec<_> = registry.upgrades().iter().map(|u| u.version()).collect();
        assert_eq!(versions, vec![v("0.3.4"), v("0.4.0")]);
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert!(*versions.last().unwrap() <= SchemaVersion::current());
        assert_eq!(registry.upgrades()[0].steps()[0].name(), "add_settings_table");
    }

    #[test]
    fn test_add_settings_table_is_rerunnable() {
        let conn = Connection::open_in_memory().unwrap();
        let config = RagConfig::default();

        add_settings_table(&conn, &config).unwrap();
        add_settings_table(&conn, &config).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
