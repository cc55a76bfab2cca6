use cyder_tools::log::error;

use super::{classify_query_error, DbConnection, DbResult};
use crate::controller::BaseError;
use crate::utils::trimmed;
use crate::{db_execute, db_object};

db_object! {
    // `id` is assigned by the database on insert.
    #[derive(Insertable, Debug)]
    #[diesel(table_name = tb_coxos)]
    pub struct NewMaintenanceRecord {
        pub coxo_id: String,
        pub data_manut: String,
        pub usuario: String,
    }

    #[derive(Queryable, Selectable, Debug)]
    #[diesel(table_name = tb_coxos)]
    pub struct MaintenanceSummary {
        pub id: i32,
        pub coxo_id: String,
        pub data_manut: String,
    }
}

#[derive(Debug, Default, Clone)]
pub struct MaintenanceQueryPayload {
    pub coxo_id: Option<String>,
    pub data_manut: Option<String>,
}

/// Builds the filters from decoded query pairs. A repeated key keeps its last
/// value and unknown keys are ignored.
impl FromIterator<(String, String)> for MaintenanceQueryPayload {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut payload = MaintenanceQueryPayload::default();
        for (key, value) in pairs {
            match key.as_str() {
                "coxo_id" => payload.coxo_id = Some(value),
                "data_manut" => payload.data_manut = Some(value),
                _ => {}
            }
        }
        payload
    }
}

impl MaintenanceQueryPayload {
    /// Trims both filters; a filter left empty is treated as absent.
    pub fn normalize(self) -> MaintenanceQueryPayload {
        MaintenanceQueryPayload {
            coxo_id: trimmed(self.coxo_id.as_deref()),
            data_manut: trimmed(self.data_manut.as_deref()),
        }
    }
}

impl NewMaintenanceRecord {
    pub fn insert_one(conn: &mut DbConnection, record: &NewMaintenanceRecord) -> DbResult<()> {
        db_execute!(conn, {
            diesel::insert_into(tb_coxos::table)
                .values(NewMaintenanceRecordDb::to_db(record))
                .execute(conn)
                .map_err(|e| {
                    error!("failed to insert maintenance for coxo {}: {}", record.coxo_id, e);
                    classify_query_error(e, BaseError::Insert)
                })?;
            Ok(())
        })
    }
}

impl MaintenanceSummary {
    /// Lists `id, coxo_id, data_manut` in the order the database returns them,
    /// narrowed by every filter present in `payload`.
    pub fn list(
        conn: &mut DbConnection,
        payload: &MaintenanceQueryPayload,
    ) -> DbResult<Vec<MaintenanceSummary>> {
        db_execute!(conn, {
            let mut query = tb_coxos::table
                .select(MaintenanceSummaryDb::as_select())
                .into_boxed();

            if let Some(val) = payload.coxo_id.clone() {
                query = query.filter(tb_coxos::dsl::coxo_id.eq(val));
            }
            if let Some(val) = payload.data_manut.clone() {
                query = query.filter(tb_coxos::dsl::data_manut.eq(val));
            }

            let list = query
                .load::<MaintenanceSummaryDb>(conn)
                .map_err(|e| {
                    error!("failed to list maintenances: {}", e);
                    classify_query_error(e, BaseError::Query)
                })?;

            Ok(list
                .into_iter()
                .map(|db| db.from_db())
                .collect::<Vec<MaintenanceSummary>>())
        })
    }
}
