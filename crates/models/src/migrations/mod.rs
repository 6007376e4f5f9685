//! Registered migrations, in application order

use std::sync::Arc;

use nms_orm::{Migration, MigrationConfig, MigrationManager, OrmResult};

mod m20190225030305_make_organization_network_ids_required;

pub use m20190225030305_make_organization_network_ids_required::MakeOrganizationNetworkIdsRequired;

/// Every migration this crate ships
pub fn all() -> Vec<Arc<dyn Migration>> {
    vec![Arc::new(MakeOrganizationNetworkIdsRequired)]
}

/// A manager holding every migration, using `config`
pub fn manager(config: MigrationConfig) -> OrmResult<MigrationManager> {
    let mut manager = MigrationManager::with_config(config);
    manager.register_all(all())?;
    Ok(manager)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_and_timestamped() {
        let manager = manager(MigrationConfig::default()).unwrap();
        assert_eq!(manager.len(), all().len());

        for migration in manager.migrations() {
            let timestamp: String = migration.name().chars().take(14).collect();
            assert!(
                timestamp.chars().all(|c| c.is_ascii_digit()),
                "{} does not start with a timestamp",
                migration.name()
            );
        }
    }
}
