use async_trait::async_trait;
use nms_orm::{ColumnSpec, DataTypes, DefaultValue, Migration, OrmResult, QueryInterface};

const TABLE: &str = "Organizations";
const COLUMN: &str = "networkIDs";

/// Makes `Organizations.networkIDs` required, defaulting to an empty list
pub struct MakeOrganizationNetworkIdsRequired;

impl MakeOrganizationNetworkIdsRequired {
    /// Name already recorded in the meta table of deployed databases
    pub const NAME: &'static str = "20190225030305-make-organization-networkIDs-required.js";

    // Default is the literal text `[]`; the store reads it as a JSON empty list
    fn network_ids(types: &DataTypes, allow_null: bool) -> ColumnSpec {
        ColumnSpec::new(types.json())
            .allow_null(allow_null)
            .default_value(DefaultValue::text("[]"))
    }
}

#[async_trait]
impl Migration for MakeOrganizationNetworkIdsRequired {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn up(&self, query: &dyn QueryInterface, types: &DataTypes) -> OrmResult<()> {
        query
            .change_column(TABLE, COLUMN, Self::network_ids(types, false))
            .await
    }

    async fn down(&self, query: &dyn QueryInterface, types: &DataTypes) -> OrmResult<()> {
        query
            .change_column(TABLE, COLUMN, Self::network_ids(types, true))
            .await
    }
}
